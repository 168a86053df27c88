//! Configuration loading and management

mod collect;
mod deadline;
mod io;
mod publish;

pub use collect::CollectSettings;
pub use deadline::DeadlineSettings;
pub use publish::{LogLevel, PublishSettings};

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Submission tool location and submission behaviour
    #[serde(default)]
    pub deadline: DeadlineSettings,

    /// Publish runs triggered by farm events
    #[serde(default)]
    pub publish: PublishSettings,

    /// Scene extraction
    #[serde(default)]
    pub collect: CollectSettings,
}

impl Config {
    /// Create a config with defaults for every section
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
