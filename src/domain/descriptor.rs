//! Job and plugin descriptors as handed over by the publish pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};

use super::setting::{Scalar, SettingValue, Unrepresentable};

/// Job keys that carry structured values and get expanded into indexed keys
pub const EXTRA_INFO: &str = "ExtraInfo";
pub const EXTRA_INFO_KEY_VALUE: &str = "ExtraInfoKeyValue";
pub const ENVIRONMENT_KEY_VALUE: &str = "EnvironmentKeyValue";

/// A setting that failed the capability check and was left out
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSetting {
    /// Setting key; nested keys are written as `Parent.child`
    pub key: String,
    pub reason: Unrepresentable,
}

/// Submission settings for one farm job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSettings {
    /// Plain `Key=Value` settings
    pub values: BTreeMap<String, SettingValue>,
    /// `ExtraInfo0..9` entries
    pub extra_info: Vec<Scalar>,
    /// `ExtraInfoKeyValueN=name=value` entries
    pub extra_info_key_value: BTreeMap<String, String>,
    /// `EnvironmentKeyValueN=name=value` entries
    pub environment_key_value: BTreeMap<String, String>,
}

impl JobSettings {
    /// Build job settings from a JSON object.
    ///
    /// Values that cannot be written to the job file are returned alongside
    /// the settings instead of failing the whole descriptor.
    pub fn from_json_map(map: &Map<String, Value>) -> (Self, Vec<DroppedSetting>) {
        let mut settings = JobSettings::default();
        let mut dropped = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                EXTRA_INFO => match value {
                    Value::Array(items) => {
                        for (index, item) in items.iter().enumerate() {
                            match Scalar::from_json(item) {
                                Ok(scalar) => settings.extra_info.push(scalar),
                                Err(reason) => dropped.push(DroppedSetting {
                                    key: format!("{}.{}", EXTRA_INFO, index),
                                    reason,
                                }),
                            }
                        }
                    }
                    other => match Scalar::from_json(other) {
                        Ok(scalar) => settings.extra_info.push(scalar),
                        Err(reason) => dropped.push(DroppedSetting {
                            key: key.clone(),
                            reason,
                        }),
                    },
                },
                EXTRA_INFO_KEY_VALUE | ENVIRONMENT_KEY_VALUE => {
                    let target = if key == EXTRA_INFO_KEY_VALUE {
                        &mut settings.extra_info_key_value
                    } else {
                        &mut settings.environment_key_value
                    };
                    match value {
                        Value::Object(pairs) => {
                            for (name, inner) in pairs {
                                match Scalar::from_json(inner) {
                                    Ok(scalar) => {
                                        target.insert(name.clone(), scalar.to_string());
                                    }
                                    Err(reason) => dropped.push(DroppedSetting {
                                        key: format!("{}.{}", key, name),
                                        reason,
                                    }),
                                }
                            }
                        }
                        _ => dropped.push(DroppedSetting {
                            key: key.clone(),
                            reason: Unrepresentable {
                                kind: "non-object key/value list",
                            },
                        }),
                    }
                }
                _ => match SettingValue::from_json(value) {
                    Ok(setting) => {
                        settings.values.insert(key.clone(), setting);
                    }
                    Err(reason) => dropped.push(DroppedSetting {
                        key: key.clone(),
                        reason,
                    }),
                },
            }
        }

        (settings, dropped)
    }

    /// Set a plain setting
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a plain setting
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Fill in defaults underneath these settings.
    ///
    /// Keys already present here win, and so do names inside the key/value
    /// maps. `ExtraInfo` is positional: a non-empty list here replaces the
    /// default list, with a warning.
    pub fn merge_defaults(&mut self, defaults: &JobSettings) {
        for (key, value) in &defaults.values {
            self.values
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        if self.extra_info.is_empty() {
            self.extra_info = defaults.extra_info.clone();
        } else if !defaults.extra_info.is_empty() {
            tracing::warn!(
                "{} of the entry replaces {} default value(s)",
                EXTRA_INFO,
                defaults.extra_info.len()
            );
        }
        for (name, value) in &defaults.extra_info_key_value {
            self.extra_info_key_value
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        for (name, value) in &defaults.environment_key_value {
            self.environment_key_value
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// Plugin settings for one farm job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings {
    pub values: BTreeMap<String, SettingValue>,
}

impl PluginSettings {
    /// Build plugin settings from a JSON object, returning the dropped keys
    pub fn from_json_map(map: &Map<String, Value>) -> (Self, Vec<DroppedSetting>) {
        let mut values = BTreeMap::new();
        let mut dropped = Vec::new();
        for (key, value) in map {
            match SettingValue::from_json(value) {
                Ok(setting) => {
                    values.insert(key.clone(), setting);
                }
                Err(reason) => dropped.push(DroppedSetting {
                    key: key.clone(),
                    reason,
                }),
            }
        }
        (Self { values }, dropped)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Reasons a `deadlineData` element cannot be submitted at all
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedEntry {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("entry has no \"{0}\" object")]
    MissingSection(&'static str),

    #[error("\"order\" must be an integer, got {0}")]
    InvalidOrder(String),

    #[error("\"auxiliaryFiles\" must be a path or a list of paths")]
    InvalidAuxiliaryFiles,
}

/// One job/plugin pair requested through `deadlineData`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeadlineEntry {
    pub job: JobSettings,
    pub plugin: PluginSettings,
    /// Dependency group; jobs without one are submitted last, unchained
    pub order: Option<i64>,
    /// Extra files passed to the submission command after the job/plugin pair
    pub auxiliary_files: Vec<PathBuf>,
}

impl DeadlineEntry {
    pub fn new(job: JobSettings, plugin: PluginSettings) -> Self {
        Self {
            job,
            plugin,
            order: None,
            auxiliary_files: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Parse one `deadlineData` element.
    ///
    /// Returns the entry along with any settings that were dropped.
    pub fn from_json(value: &Value) -> Result<(Self, Vec<DroppedSetting>), MalformedEntry> {
        let object = value.as_object().ok_or(MalformedEntry::NotAnObject)?;

        let job_map = object
            .get("job")
            .and_then(Value::as_object)
            .ok_or(MalformedEntry::MissingSection("job"))?;
        let plugin_map = object
            .get("plugin")
            .and_then(Value::as_object)
            .ok_or(MalformedEntry::MissingSection("plugin"))?;

        let order = match object.get("order") {
            None => None,
            Some(v) => Some(
                v.as_i64()
                    .ok_or_else(|| MalformedEntry::InvalidOrder(v.to_string()))?,
            ),
        };

        let auxiliary_files = match object.get("auxiliaryFiles") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(path)) => vec![PathBuf::from(path)],
            Some(Value::Array(paths)) => paths
                .iter()
                .map(|p| p.as_str().map(PathBuf::from))
                .collect::<Option<Vec<_>>>()
                .ok_or(MalformedEntry::InvalidAuxiliaryFiles)?,
            Some(_) => return Err(MalformedEntry::InvalidAuxiliaryFiles),
        };

        let (job, mut dropped) = JobSettings::from_json_map(job_map);
        let (plugin, plugin_dropped) = PluginSettings::from_json_map(plugin_map);
        dropped.extend(plugin_dropped.into_iter().map(|d| DroppedSetting {
            key: format!("plugin.{}", d.key),
            reason: d.reason,
        }));

        Ok((
            Self {
                job,
                plugin,
                order,
                auxiliary_files,
            },
            dropped,
        ))
    }
}

/// Split a `deadlineData` value into its elements.
///
/// Older submitters store a single object instead of a list.
pub fn deadline_data_elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}
