//! Extraction of farm jobs from the compositing host's scene.
//!
//! The host exports a [`SceneDescription`] (root settings plus nodes); this
//! module turns its write nodes into publish instances ready for submission,
//! adds the Draft post-processing keys and checks output locations.

mod draft;
mod scene;
mod validate;

pub use draft::extract_draft;
pub use scene::{
    Format, NodeDescription, RENDER_FAMILY, RootSettings, SceneDescription, hash_padding,
    major_version, select_write_nodes,
};
pub use validate::{ValidationError, validate_output_location};

use crate::domain::PublishContext;

/// Check the `deadlineOutput` of every render instance.
///
/// Returns all failures rather than stopping at the first one.
pub fn validate_context_outputs(context: &PublishContext, os: &str) -> Vec<ValidationError> {
    context
        .instances
        .iter()
        .filter(|i| i.families().contains(&RENDER_FAMILY))
        .filter_map(|i| i.data.get("deadlineOutput").and_then(|v| v.as_str()))
        .filter_map(|path| validate_output_location(path, os).err())
        .collect()
}
