//! Ordered job submission to the render farm.
//!
//! A publish run produces a [`SubmissionBatch`] of job/plugin descriptor
//! pairs. The [`Submitter`] walks it in dependency order:
//!
//! 1. Entries with an `order` go first, ascending, keeping encounter order
//!    within a group; entries without one follow.
//! 2. Each job gets the context-level job defaults, the publish data blobs
//!    and one `JobDependencyN` key per id recorded for the previous group.
//! 3. Job and plugin settings are rendered to a pair of temp files and
//!    handed to the [`SubmitCommand`] (normally `deadlinecommand`).
//! 4. The `JobID=` token in its output is recorded for the next group.
//!
//! The first failing job aborts the rest of the batch. Jobs already on the
//! farm stay there and are reported in [`BatchError::submitted`].
//!
//! # Example
//!
//! ```rust,ignore
//! use deadline_bridge::submit::{DeadlineCommand, Submitter, locate_deadline_bin};
//!
//! let command = DeadlineCommand::new(locate_deadline_bin(None)?);
//! let submitter = Submitter::new(command, std::env::temp_dir());
//! let batch = SubmissionBatch::from_context(&context);
//! let report = submitter.submit(&context, &batch).await?;
//! ```

mod command;
mod error;
mod files;
mod order;
mod render;

pub use command::{DeadlineCommand, EnvOverlay, SubmitCommand, locate_deadline_bin, parse_job_id};
pub use error::{BatchError, SubmissionError};
pub use files::SubmissionFiles;
pub use order::{OrderGroups, submission_sequence};
pub use render::{
    JOB_DEPENDENCY, inject_dependencies, parse_flat, render_job_file, render_plugin_file,
    strip_dependencies,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::domain::{
    BatchEntry, DEADLINE_DATA, DEADLINE_JOB_DATA, Entity, JobSettings, PublishContext,
    SubmissionBatch,
};

/// Extra info key carrying the serialized context data
pub const CONTEXT_DATA_KEY: &str = "PyblishContextData";

/// Extra info key carrying the serialized instance data
pub const INSTANCE_DATA_KEY: &str = "PyblishInstanceData";

/// Context data keys that never travel with a job
const CONTEXT_DATA_EXCLUDED: &[&str] = &["results", "deadlineJob", DEADLINE_DATA];

/// A job accepted by the farm
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedJob {
    pub label: String,
    pub order: Option<i64>,
    pub job_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Jobs submitted during one pass, in submission order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionReport {
    pub jobs: Vec<SubmittedJob>,
}

/// A rendered job that has not been handed to the farm
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub label: String,
    pub order: Option<i64>,
    pub job_file: String,
    pub plugin_file: String,
    pub auxiliary_files: Vec<PathBuf>,
    /// Stand-in id used for dependency keys of later groups
    pub placeholder_id: String,
}

/// Builds the final job settings of each batch entry
struct JobPreparer<'a> {
    context: &'a PublishContext,
    defaults: JobSettings,
    context_blob: String,
}

impl<'a> JobPreparer<'a> {
    fn new(context: &'a PublishContext) -> Self {
        let defaults = match context.data.get(DEADLINE_JOB_DATA) {
            Some(Value::Object(map)) => {
                let (defaults, dropped) = JobSettings::from_json_map(map);
                for d in dropped {
                    tracing::warn!(
                        "Setting \"{}\" in context {} dropped: {}",
                        d.key,
                        DEADLINE_JOB_DATA,
                        d.reason
                    );
                }
                defaults
            }
            Some(_) => {
                tracing::warn!("Context {} is not an object, ignoring", DEADLINE_JOB_DATA);
                JobSettings::default()
            }
            None => JobSettings::default(),
        };

        Self {
            context,
            defaults,
            context_blob: data_blob(&context.data, CONTEXT_DATA_EXCLUDED),
        }
    }

    /// Final settings for one entry, or None if its entity is unknown
    fn prepare(&self, item: &BatchEntry, dependencies: &[String]) -> Option<JobSettings> {
        let mut job = item.entry.job.clone();
        job.merge_defaults(&self.defaults);

        match item.entity {
            Entity::Context => {}
            Entity::Instance(index) => {
                let Some(instance) = self.context.instances.get(index) else {
                    tracing::warn!("Unsupported entity for {}: no instance #{}", item.label, index);
                    return None;
                };
                job.extra_info_key_value.insert(
                    INSTANCE_DATA_KEY.to_string(),
                    data_blob(&instance.data, &[DEADLINE_DATA]),
                );
            }
        }
        job.extra_info_key_value
            .insert(CONTEXT_DATA_KEY.to_string(), self.context_blob.clone());

        if item.entry.order.is_some() {
            // Dependencies of ordered jobs come only from the previous group
            for key in strip_dependencies(&mut job) {
                tracing::warn!("Dropping {} of {}: set from the order groups", key, item.label);
            }
            inject_dependencies(&mut job, dependencies);
        }
        Some(job)
    }
}

/// JSON-encode a data map without the excluded keys
fn data_blob(data: &Map<String, Value>, excluded: &[&str]) -> String {
    let filtered: Map<String, Value> = data
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::to_string(&filtered).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize publish data: {}", e);
        "{}".to_string()
    })
}

/// Submits batches through a [`SubmitCommand`]
pub struct Submitter<C> {
    command: C,
    temp_dir: PathBuf,
}

impl<C: SubmitCommand> Submitter<C> {
    /// `temp_dir` receives the job/plugin file pairs
    pub fn new(command: C, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    /// Submit every entry of the batch, one at a time, in dependency order.
    pub async fn submit(
        &self,
        context: &PublishContext,
        batch: &SubmissionBatch,
    ) -> Result<SubmissionReport, BatchError> {
        let preparer = JobPreparer::new(context);
        let mut groups = OrderGroups::from_entries(&batch.entries);
        let mut report = SubmissionReport::default();

        for index in submission_sequence(&batch.entries) {
            let item = &batch.entries[index];
            let dependencies = item
                .entry
                .order
                .map(|order| groups.dependencies_for(order).to_vec())
                .unwrap_or_default();

            let Some(job) = preparer.prepare(item, &dependencies) else {
                continue;
            };
            let job_text = render_job_file(&job);
            let plugin_text = render_plugin_file(&item.entry.plugin);
            tracing::info!("job data:\n\n{}", job_text);
            tracing::info!("plugin data:\n\n{}", plugin_text);

            match self
                .submit_one(&job_text, &plugin_text, &item.entry.auxiliary_files)
                .await
            {
                Ok(job_id) => {
                    tracing::info!("Submitted {} as job {}", item.label, job_id);
                    if let Some(order) = item.entry.order {
                        groups.record(order, job_id.clone());
                    }
                    report.jobs.push(SubmittedJob {
                        label: item.label.clone(),
                        order: item.entry.order,
                        job_id,
                        submitted_at: Utc::now(),
                    });
                }
                Err(source) => {
                    tracing::error!("Submission of {} failed: {}", item.label, source);
                    return Err(BatchError {
                        label: item.label.clone(),
                        submitted: report,
                        source,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn submit_one(
        &self,
        job_text: &str,
        plugin_text: &str,
        auxiliary_files: &[PathBuf],
    ) -> Result<String, SubmissionError> {
        let files = SubmissionFiles::write(&self.temp_dir, job_text, plugin_text)?;

        let mut args = vec![files.job_path.clone(), files.plugin_path.clone()];
        args.extend(auxiliary_files.iter().cloned());

        let result = self.command.submit(&args).await;
        files.remove();
        let output = result?;
        tracing::info!("{}", output.trim_end());

        let job_id = parse_job_id(&output).map(str::to_string);
        match job_id {
            Some(id) => Ok(id),
            None => Err(SubmissionError::MissingJobId { output }),
        }
    }
}

/// Render a batch in submission order without contacting the farm.
///
/// Dependency keys point at placeholder ids of the form `<order N job M>`.
pub fn plan(context: &PublishContext, batch: &SubmissionBatch) -> Vec<PlannedJob> {
    let preparer = JobPreparer::new(context);
    let mut groups = OrderGroups::from_entries(&batch.entries);
    let mut planned = Vec::new();

    for index in submission_sequence(&batch.entries) {
        let item = &batch.entries[index];
        let dependencies = item
            .entry
            .order
            .map(|order| groups.dependencies_for(order).to_vec())
            .unwrap_or_default();
        let Some(job) = preparer.prepare(item, &dependencies) else {
            continue;
        };

        let placeholder_id = match item.entry.order {
            Some(order) => {
                let id = format!("<order {} job {}>", order, groups.job_ids(order).len());
                groups.record(order, id.clone());
                id
            }
            None => format!("<job {}>", planned.len()),
        };

        planned.push(PlannedJob {
            label: item.label.clone(),
            order: item.entry.order,
            job_file: render_job_file(&job),
            plugin_file: render_plugin_file(&item.entry.plugin),
            auxiliary_files: item.entry.auxiliary_files.clone(),
            placeholder_id,
        });
    }

    planned
}
