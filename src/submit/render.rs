//! Rendering settings into the farm tool's flat `Key=Value` files.
//!
//! Values are written verbatim: embedded newlines or `=` are not escaped.

use std::fmt::Write;

use crate::domain::{
    ENVIRONMENT_KEY_VALUE, EXTRA_INFO, EXTRA_INFO_KEY_VALUE, JobSettings, PluginSettings,
};

/// Prefix of the synthetic keys holding dependency job ids
pub const JOB_DEPENDENCY: &str = "JobDependency";

/// Index of a `JobDependencyN` key
fn dependency_index(key: &str) -> Option<usize> {
    key.strip_prefix(JOB_DEPENDENCY)
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse().ok())
}

/// Render a job file.
///
/// The structured keys come first, expanded into indexed keys
/// (`ExtraInfo0=..`, `ExtraInfoKeyValue0=name=value`, ..); plain settings
/// follow in key order, with `JobDependencyN` keys last in numeric order.
pub fn render_job_file(job: &JobSettings) -> String {
    let mut out = String::new();

    for (index, value) in job.extra_info.iter().enumerate() {
        let _ = writeln!(out, "{}{}={}", EXTRA_INFO, index, value);
    }
    for (index, (name, value)) in job.extra_info_key_value.iter().enumerate() {
        let _ = writeln!(out, "{}{}={}={}", EXTRA_INFO_KEY_VALUE, index, name, value);
    }
    for (index, (name, value)) in job.environment_key_value.iter().enumerate() {
        let _ = writeln!(out, "{}{}={}={}", ENVIRONMENT_KEY_VALUE, index, name, value);
    }
    let mut dependencies = Vec::new();
    for (key, value) in &job.values {
        match dependency_index(key) {
            Some(index) => dependencies.push((index, key, value)),
            None => {
                let _ = writeln!(out, "{}={}", key, value);
            }
        }
    }
    dependencies.sort_by_key(|(index, _, _)| *index);
    for (_, key, value) in dependencies {
        let _ = writeln!(out, "{}={}", key, value);
    }

    out
}

/// Render a plugin file; no keys are expanded
pub fn render_plugin_file(plugin: &PluginSettings) -> String {
    let mut out = String::new();
    for (key, value) in &plugin.values {
        let _ = writeln!(out, "{}={}", key, value);
    }
    out
}

/// Remove every `JobDependencyN` key, returning the removed keys
pub fn strip_dependencies(job: &mut JobSettings) -> Vec<String> {
    let stale: Vec<String> = job
        .values
        .keys()
        .filter(|key| dependency_index(key).is_some())
        .cloned()
        .collect();
    for key in &stale {
        job.values.remove(key);
    }
    stale
}

/// Add one `JobDependencyN` key per id, numbered from 0 in the given order
pub fn inject_dependencies(job: &mut JobSettings, job_ids: &[String]) {
    for (index, job_id) in job_ids.iter().enumerate() {
        job.insert(format!("{}{}", JOB_DEPENDENCY, index), job_id.clone());
    }
}

/// Split flat file text back into `(key, value)` pairs.
///
/// Only the first `=` separates key from value. Lines without `=` are ignored.
pub fn parse_flat(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
