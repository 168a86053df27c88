//! Settings for publish runs triggered by farm events

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Log level handed to the publish process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Name as understood by the publish process
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publish settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Program that runs the publish pipeline
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments placed before the context seed path
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Event plugin directory holding `OnPreTask.py` / `OnPostTask.py`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<PathBuf>,

    /// Extra interpreter search paths, `;`-separated
    #[serde(default)]
    pub python_search_paths: String,

    /// DEBUG, INFO, WARNING or ERROR; anything else means DEBUG
    #[serde(default = "default_logging_level")]
    pub logging_level: String,

    /// Non-empty enables the pre-task script on submitted jobs
    #[serde(default)]
    pub on_pre_task_paths: String,

    /// Non-empty enables the post-task script on submitted jobs
    #[serde(default)]
    pub on_post_task_paths: String,

    /// Publish plugin paths per event name (e.g. `OnJobFinished`), `;`-separated
    #[serde(default)]
    pub paths: HashMap<String, String>,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            plugin_dir: None,
            python_search_paths: String::new(),
            logging_level: default_logging_level(),
            on_pre_task_paths: String::new(),
            on_post_task_paths: String::new(),
            paths: HashMap::new(),
        }
    }
}

impl PublishSettings {
    pub fn log_level(&self) -> LogLevel {
        match self.logging_level.trim().to_uppercase().as_str() {
            "INFO" => LogLevel::Info,
            "WARNING" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }
}

fn default_command() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-m".to_string(), "pyblish_deadline.publish".to_string()]
}

fn default_logging_level() -> String {
    "DEBUG".to_string()
}
