//! Shared test utilities for submission tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use deadline_bridge::PublishContext;
use deadline_bridge::submit::{SubmissionError, SubmitCommand, parse_flat};

/// One call the fake farm tool received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Vec<PathBuf>,
    /// Job file content at call time
    pub job_file: String,
    /// Plugin file content at call time
    pub plugin_file: String,
}

impl RecordedCall {
    pub fn job_pairs(&self) -> Vec<(String, String)> {
        parse_flat(&self.job_file)
    }

    pub fn job_value(&self, key: &str) -> Option<String> {
        self.job_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// `JobDependencyN` values in key order
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps: Vec<(usize, String)> = self
            .job_pairs()
            .into_iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("JobDependency")
                    .and_then(|n| n.parse::<usize>().ok())
                    .map(|n| (n, v))
            })
            .collect();
        deps.sort();
        deps.into_iter().map(|(_, v)| v).collect()
    }
}

/// Scripted reply of the fake farm tool
#[derive(Debug, Clone)]
pub enum Reply {
    Stdout(String),
    ExitFailure(String),
}

/// Stand-in for deadlinecommand that records every call.
///
/// Without scripted replies it answers `JobID=job-N` with N counting from 1.
pub struct FakeDeadline {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl FakeDeadline {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_replies(replies: Vec<Reply>) -> Self {
        let fake = Self::new();
        *fake.replies.lock().unwrap() = replies.into();
        fake
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmitCommand for FakeDeadline {
    async fn submit(&self, args: &[PathBuf]) -> Result<String, SubmissionError> {
        let job_file = std::fs::read_to_string(&args[0]).expect("job file exists during call");
        let plugin_file =
            std::fs::read_to_string(&args[1]).expect("plugin file exists during call");

        let number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                args: args.to_vec(),
                job_file,
                plugin_file,
            });
            calls.len()
        };

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Stdout(out)) => Ok(out),
            Some(Reply::ExitFailure(err)) => Err(SubmissionError::ExitStatus {
                status: "exit status: 1".to_string(),
                stdout: String::new(),
                stderr: err,
            }),
            None => Ok(format!("Submitting job...\nJobID=job-{}\nResult=Success\n", number)),
        }
    }
}

/// A job/plugin descriptor named `name`, optionally in an order group
pub fn entry(name: &str, order: Option<i64>) -> Value {
    let mut e = json!({
        "job": {"Name": name, "Plugin": "Nuke"},
        "plugin": {"WriteNode": name}
    });
    if let Some(order) = order {
        e["order"] = json!(order);
    }
    e
}

/// Context whose own deadlineData holds `entries`
pub fn context_with(entries: Vec<Value>) -> PublishContext {
    serde_json::from_value(json!({
        "data": {
            "user": "ana",
            "deadlineData": entries
        }
    }))
    .expect("valid context")
}

/// Job names in the order they reached the farm
pub fn submitted_names(calls: &[RecordedCall]) -> Vec<String> {
    calls
        .iter()
        .map(|c| c.job_value("Name").unwrap_or_default())
        .collect()
}
