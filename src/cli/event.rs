//! Event command implementation

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use deadline_bridge::config::Config;
use deadline_bridge::events::{EventListener, EventPayload, FarmEvent, FarmJob, PublishHandler};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}: {}", what, path.display()))
}

/// Handle one farm event.
///
/// Job properties the event plugin has to set are printed as `Key=Value`
/// lines on stdout.
pub async fn event_command(
    name: &str,
    job_path: Option<&Path>,
    data_path: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let event: FarmEvent = name.parse()?;

    let job = job_path
        .map(|p| read_json::<FarmJob>(p, "farm job"))
        .transpose()?;
    let additional = match data_path {
        Some(p) => match read_json::<Value>(p, "event data")? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        },
        None => Map::new(),
    };

    let handler = PublishHandler::new(
        config.publish.clone(),
        std::env::vars().collect(),
        config.deadline.temp_dir(),
    );
    let mut listener = EventListener::for_all_events(Arc::new(handler));

    let result = listener
        .dispatch(event, &EventPayload { job, additional })
        .await;
    listener.cleanup();

    if let Some(outcome) = result? {
        for (key, value) in &outcome.job_updates {
            println!("{}={}", key, value);
        }
        if !outcome.published {
            tracing::info!("Nothing published for {}", event);
        }
    }

    Ok(())
}
