//! Publish runs triggered by farm events.
//!
//! For each event the configured publish plugin paths are resolved and the
//! publish command is started with an environment overlay and a JSON seed of
//! the publish context. The seed starts from the `PyblishContextData` the
//! submitter stored on the job, so a publish started on the farm continues
//! with the data of the workstation publish that created the job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use super::event::{EventPayload, FarmEvent};
use super::listener::{EventHandler, HandlerOutcome};
use crate::config::{LogLevel, PublishSettings};
use crate::submit::{CONTEXT_DATA_KEY, EnvOverlay};

/// Environment variable listing publish plugin directories
pub const PLUGIN_PATH_VAR: &str = "PYBLISHPLUGINPATH";

/// Task scripts inside the event plugin directory
const PRE_TASK_SCRIPT: &str = "OnPreTask.py";
const POST_TASK_SCRIPT: &str = "OnPostTask.py";

/// Everything needed to start one publish run
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub event: FarmEvent,
    /// Joined plugin search path; `None` when no plugins are configured
    pub plugin_path: Option<OsString>,
    pub overlay: EnvOverlay,
    pub log_level: LogLevel,
    /// Initial publish context data
    pub context_seed: Map<String, Value>,
    pub pre_task_script: Option<PathBuf>,
    pub post_task_script: Option<PathBuf>,
}

impl PublishPlan {
    /// Job properties the shim has to set on the farm job
    pub fn job_updates(&self) -> Vec<(String, String)> {
        let mut updates = Vec::new();
        if let Some(path) = &self.post_task_script {
            updates.push(("JobPostTaskScript".to_string(), path.display().to_string()));
        }
        if let Some(path) = &self.pre_task_script {
            updates.push(("JobPreTaskScript".to_string(), path.display().to_string()));
        }
        updates
    }
}

fn split_semicolons(value: &str) -> impl Iterator<Item = PathBuf> + '_ {
    value
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn split_env_paths(value: Option<&String>) -> Vec<PathBuf> {
    value
        .map(|v| {
            std::env::split_paths(v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn join(paths: &[PathBuf]) -> Option<OsString> {
    if paths.is_empty() {
        return None;
    }
    match std::env::join_paths(paths) {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!("Cannot join search paths {:?}: {}", paths, e);
            None
        }
    }
}

/// Task script enabled by a non-empty config entry and present on disk
fn task_script(plugin_dir: Option<&Path>, enabled_by: &str, file: &str) -> Option<PathBuf> {
    if enabled_by.trim().is_empty() {
        return None;
    }
    let path = plugin_dir?.join(file);
    if path.exists() {
        tracing::info!("Adding {}: {}", file.trim_end_matches(".py"), path.display());
        Some(path)
    } else {
        tracing::warn!("{} enabled but {} does not exist", file, path.display());
        None
    }
}

/// Work out how to publish for `event`.
///
/// `env` is a snapshot of the listener's environment; it is read, never
/// modified.
pub fn plan_publish(
    event: FarmEvent,
    payload: &EventPayload,
    settings: &PublishSettings,
    env: &HashMap<String, String>,
) -> PublishPlan {
    let (pre_task_script, post_task_script) = if event == FarmEvent::JobSubmitted {
        let dir = settings.plugin_dir.as_deref();
        (
            task_script(dir, &settings.on_pre_task_paths, PRE_TASK_SCRIPT),
            task_script(dir, &settings.on_post_task_paths, POST_TASK_SCRIPT),
        )
    } else {
        (None, None)
    };

    let mut overlay = EnvOverlay::new();
    let job_env = payload
        .job
        .as_ref()
        .map(|j| j.environment.clone())
        .unwrap_or_default();
    if !job_env.is_empty() {
        tracing::info!("Getting environment from job:");
    }
    for (key, value) in &job_env {
        tracing::info!("{}={}", key, value);
        overlay.set(key, value);
    }

    // Interpreter search paths: configured, then the job's, then inherited
    let mut python_paths: Vec<PathBuf> = split_semicolons(&settings.python_search_paths).collect();
    python_paths.extend(split_env_paths(job_env.get("PYTHONPATH")));
    python_paths.extend(split_env_paths(env.get("PYTHONPATH")));
    for path in &python_paths {
        tracing::info!("Extending search path with: {}", path.display());
    }
    if let Some(joined) = join(&python_paths) {
        overlay.set("PYTHONPATH", joined);
    }

    let entry = event.config_entry();
    let mut plugin_paths: Vec<PathBuf> = settings
        .paths
        .get(event.name())
        .map(|p| split_semicolons(p).collect())
        .unwrap_or_default();
    plugin_paths.extend(split_env_paths(env.get(&entry)));

    let plugin_path = join(&plugin_paths);
    match &plugin_path {
        Some(path) => {
            tracing::info!("Setting {} to: \"{}\"", PLUGIN_PATH_VAR, path.to_string_lossy());
            overlay.set(PLUGIN_PATH_VAR, path.clone());
        }
        None => {
            tracing::info!("No plugins found.");
            // Keep inherited plugin paths out of the publish process
            overlay.set(PLUGIN_PATH_VAR, "");
        }
    }

    PublishPlan {
        event,
        plugin_path,
        overlay,
        log_level: settings.log_level(),
        context_seed: context_seed(event, payload),
        pre_task_script,
        post_task_script,
    }
}

/// Rebuild the publish context data from the job
fn context_seed(event: FarmEvent, payload: &EventPayload) -> Map<String, Value> {
    let mut seed = Map::new();

    let stored = payload
        .job
        .as_ref()
        .and_then(|j| j.extra_info.get(CONTEXT_DATA_KEY));
    match stored.map(|s| serde_json::from_str::<Value>(s)) {
        Some(Ok(Value::Object(data))) => seed.extend(data),
        Some(Ok(_)) => tracing::warn!("{} is not a JSON object, ignoring", CONTEXT_DATA_KEY),
        Some(Err(e)) => tracing::warn!("Failed to decode {}: {}", CONTEXT_DATA_KEY, e),
        None => tracing::warn!("No Pyblish data found."),
    }

    let job = payload
        .job
        .as_ref()
        .and_then(|j| serde_json::to_value(j).ok())
        .unwrap_or(Value::Null);
    seed.insert("deadlineJob".to_string(), job);
    seed.insert(
        "deadlineAdditionalData".to_string(),
        Value::Object(payload.additional.clone()),
    );
    seed.insert("deadlineEvent".to_string(), json!(event.name()));
    seed
}

/// Start the publish command for a plan and wait for it.
///
/// The context seed is written to a temp JSON file passed as the last
/// argument; it is removed once the process exits.
pub async fn run_publish(
    plan: &PublishPlan,
    settings: &PublishSettings,
    temp_dir: &Path,
) -> Result<ExitStatus> {
    let seed_path = temp_dir.join(format!("{}.context.json", uuid::Uuid::new_v4()));
    let seed = serde_json::to_string_pretty(&plan.context_seed)
        .with_context(|| "Failed to serialize publish context")?;
    std::fs::write(&seed_path, seed)
        .with_context(|| format!("Failed to write context seed: {}", seed_path.display()))?;

    tracing::info!(
        "Publishing {} with {} {:?}",
        plan.event,
        settings.command,
        settings.args
    );

    let status = Command::new(&settings.command)
        .args(&settings.args)
        .arg(&seed_path)
        .envs(plan.overlay.iter())
        .env("PYBLISH_LOG_LEVEL", plan.log_level.as_str())
        .stdin(Stdio::null())
        .status()
        .await
        .with_context(|| format!("Failed to spawn {}", settings.command));

    if let Err(e) = std::fs::remove_file(&seed_path) {
        tracing::warn!("Failed to remove {}: {}", seed_path.display(), e);
    }

    let status = status?;
    if !status.success() {
        tracing::error!("Publish for {} failed: {}", plan.event, status);
    }
    Ok(status)
}

/// Handler publishing on every event it is registered for
pub struct PublishHandler {
    settings: PublishSettings,
    env: HashMap<String, String>,
    temp_dir: PathBuf,
}

impl PublishHandler {
    pub fn new(settings: PublishSettings, env: HashMap<String, String>, temp_dir: PathBuf) -> Self {
        Self {
            settings,
            env,
            temp_dir,
        }
    }
}

#[async_trait]
impl EventHandler for PublishHandler {
    async fn handle(&self, event: FarmEvent, payload: &EventPayload) -> Result<HandlerOutcome> {
        let plan = plan_publish(event, payload, &self.settings, &self.env);
        let job_updates = plan.job_updates();

        if plan.plugin_path.is_none() {
            return Ok(HandlerOutcome {
                job_updates,
                published: false,
            });
        }

        let status = run_publish(&plan, &self.settings, &self.temp_dir).await?;
        if !status.success() {
            anyhow::bail!("Publish process for {} exited with {}", event, status);
        }

        Ok(HandlerOutcome {
            job_updates,
            published: true,
        })
    }
}
