//! Scene extraction settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectSettings {
    /// Reject write nodes rendering to a local drive (Windows only)
    #[serde(default = "default_validate_output_location")]
    pub validate_output_location: bool,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            validate_output_location: default_validate_output_location(),
        }
    }
}

fn default_validate_output_location() -> bool {
    true
}
