//! Publish context and instances as exported by the publish pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Family every instance must carry to be submitted to the farm
pub const DEADLINE_FAMILY: &str = "deadline";

/// Data key holding the job/plugin descriptors
pub const DEADLINE_DATA: &str = "deadlineData";

/// Context data key holding job settings shared by every job of the run
pub const DEADLINE_JOB_DATA: &str = "deadlineJobData";

/// One publish run: context-level data plus the instances collected for it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishContext {
    #[serde(default)]
    pub data: Map<String, Value>,

    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl PublishContext {
    /// Load a context from its JSON representation
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Add a new instance and return it for filling in
    pub fn create_instance(&mut self, name: impl Into<String>) -> &mut Instance {
        self.instances.push(Instance::new(name));
        let last = self.instances.len() - 1;
        &mut self.instances[last]
    }

    /// Label for log messages about an entity of this context
    pub fn entity_label(&self, entity: Entity) -> String {
        match entity {
            Entity::Context => "context".to_string(),
            Entity::Instance(index) => self
                .instances
                .get(index)
                .map(|i| format!("instance \"{}\"", i.name))
                .unwrap_or_else(|| format!("instance #{}", index)),
        }
    }
}

/// A single publishable item, e.g. one write node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,

    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Map::new(),
        }
    }

    /// Set a data value
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Families listed under `data.families`
    pub fn families(&self) -> Vec<&str> {
        self.data
            .get("families")
            .and_then(Value::as_array)
            .map(|f| f.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether this instance should be handed to the farm.
    ///
    /// `publish` defaults to true and is read the way the pipeline reads it:
    /// `false`, `null`, zero and empty strings, lists or objects turn it off.
    /// The `deadline` family is required.
    pub fn is_eligible(&self) -> bool {
        let publish = self.data.get("publish").is_none_or(is_truthy);
        publish && self.families().contains(&DEADLINE_FAMILY)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Where a descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Context,
    /// Index into [`PublishContext::instances`]
    Instance(usize),
}
