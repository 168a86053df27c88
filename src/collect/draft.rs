//! Draft post-processing settings

use serde_json::{Map, Value, json};

use super::scene::Format;
use crate::domain::{DEADLINE_JOB_DATA, EXTRA_INFO_KEY_VALUE, PublishContext};

/// Add the Draft extra info keys to the context-level job settings.
///
/// Frame size is only written when the host reported a format.
pub fn extract_draft(context: &mut PublishContext, format: Option<Format>) {
    let job_data = context
        .data
        .entry(DEADLINE_JOB_DATA.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !job_data.is_object() {
        tracing::warn!("Context {} is not an object, replacing it", DEADLINE_JOB_DATA);
        *job_data = Value::Object(Map::new());
    }
    let Value::Object(job_data) = job_data else {
        return;
    };

    let extra = job_data
        .entry(EXTRA_INFO_KEY_VALUE.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !extra.is_object() {
        *extra = Value::Object(Map::new());
    }
    let Value::Object(extra) = extra else {
        return;
    };

    extra.insert("DraftExtraArgs".to_string(), json!(""));
    extra.insert("DraftVersion".to_string(), json!(""));
    extra.insert("DraftUsername".to_string(), json!(""));
    extra.insert("DraftUploadToShotgun".to_string(), json!("False"));
    extra.insert("DraftEntity".to_string(), json!(""));

    match format {
        Some(format) => {
            extra.insert("DraftFrameWidth".to_string(), json!(format.width));
            extra.insert("DraftFrameHeight".to_string(), json!(format.height));
        }
        None => tracing::debug!("No format reported, skipping Draft frame size"),
    }
}
