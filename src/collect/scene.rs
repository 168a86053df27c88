//! Write node selection from an exported scene description

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::domain::{DEADLINE_DATA, DEADLINE_FAMILY, PublishContext};

/// Family given to every selected write node
pub const RENDER_FAMILY: &str = "deadline.render";

static PRINTF_PADDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(?:0(\d+))?d").expect("valid regex"));

/// Scene state exported by the compositing host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    pub root: RootSettings,

    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
}

/// Script-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootSettings {
    pub first_frame: i64,
    pub last_frame: i64,

    /// Running the NukeX flavour of the host
    #[serde(default)]
    pub nukex: bool,

    /// Host version, e.g. `14.0v5`
    pub version_string: String,

    #[serde(default)]
    pub format: Option<Format>,

    /// Script file, passed to the farm as an auxiliary file when known
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub width: u32,
    pub height: u32,
}

/// One node of the script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,

    #[serde(rename = "class")]
    pub class_name: String,

    #[serde(default)]
    pub disabled: bool,

    /// Output path with printf-style frame padding
    #[serde(default)]
    pub file: String,

    /// Node-level frame range override
    #[serde(default)]
    pub use_limit: bool,

    #[serde(default)]
    pub first: Option<i64>,

    #[serde(default)]
    pub last: Option<i64>,

    /// Asset-tracking component name
    #[serde(default)]
    pub fcompname: Option<String>,
}

impl NodeDescription {
    pub fn is_enabled_write(&self) -> bool {
        self.class_name == "Write" && !self.disabled
    }

    /// Frame range to render: the node's limits when enabled, else the root range
    pub fn frame_range(&self, root: &RootSettings) -> (i64, i64) {
        match (self.use_limit, self.first, self.last) {
            (true, Some(first), Some(last)) => (first, last),
            _ => (root.first_frame, root.last_frame),
        }
    }
}

/// Rewrite printf frame padding (`%04d`, `%d`) in the file name into the
/// farm's `####` form. Directories are left alone.
pub fn hash_padding(path: &str) -> String {
    let name_start = path.rfind(|c| c == '/' || c == '\\').map_or(0, |i| i + 1);
    let (dir, name) = path.split_at(name_start);
    let name = PRINTF_PADDING.replace_all(name, |caps: &regex::Captures| {
        let width = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        "#".repeat(width)
    });
    format!("{}{}", dir, name)
}

/// Host version without the release suffix: `14.0v5` -> `14.0`
pub fn major_version(version_string: &str) -> &str {
    version_string.split('v').next().unwrap_or(version_string)
}

/// Create one instance per enabled write node.
///
/// Each instance carries a single `deadlineData` entry rendering the node.
/// Returns the number of instances created.
pub fn select_write_nodes(scene: &SceneDescription, context: &mut PublishContext) -> usize {
    let root = &scene.root;

    let mut plugin_base = Map::new();
    plugin_base.insert("EnforceRenderOrder".to_string(), json!(true));
    plugin_base.insert("NukeX".to_string(), json!(root.nukex));
    plugin_base.insert(
        "Version".to_string(),
        json!(major_version(&root.version_string)),
    );

    let mut created = 0;
    for node in scene.nodes.iter().filter(|n| n.is_enabled_write()) {
        let (start, end) = node.frame_range(root);
        let frames = format!("{}-{}", start, end);
        let output_dir = Path::new(&node.file)
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let job = json!({
            "Name": node.name,
            "Plugin": "Nuke",
            "Frames": frames,
            "OutputFilename0": hash_padding(&node.file),
        });

        let mut plugin = plugin_base.clone();
        plugin.insert("WriteNode".to_string(), json!(node.name));

        let mut entry = json!({ "job": job, "plugin": plugin });
        if let Some(script) = &root.script {
            entry["auxiliaryFiles"] = json!(script);
        }

        // Component name is optional metadata
        let mut components = Map::new();
        if let Some(name) = node.fcompname.as_ref().filter(|n| !n.is_empty()) {
            components.insert(name.clone(), json!({}));
        }

        let instance = context.create_instance(node.name.clone());
        instance.set_data("family", json!(RENDER_FAMILY));
        instance.set_data("families", json!([DEADLINE_FAMILY, RENDER_FAMILY]));
        instance.set_data("deadlineOutput", json!(output_dir));
        instance.set_data("deadlineFrames", json!(frames));
        instance.set_data(DEADLINE_DATA, Value::Array(vec![entry]));
        instance.set_data("ftrackComponents", Value::Object(components));
        instance.set_data("ftrackAssetType", json!("img"));

        tracing::debug!("Selected write node {} ({})", node.name, frames);
        created += 1;
    }

    created
}
