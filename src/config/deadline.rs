//! Submission tool settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the farm's submission tool lives and how it is called
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineSettings {
    /// Directory containing `deadlinecommand`.
    /// When unset, the macOS installer's path file and then `DEADLINE_PATH`
    /// are consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Directory for job/plugin file pairs (OS temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    /// Upper bound for one submission call in seconds.
    /// Unset means the call blocks until the tool exits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl DeadlineSettings {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}
