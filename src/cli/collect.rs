//! Collect command implementation

use anyhow::{Context, Result, bail};
use std::path::Path;

use deadline_bridge::PublishContext;
use deadline_bridge::collect::{
    SceneDescription, extract_draft, select_write_nodes, validate_context_outputs,
};
use deadline_bridge::config::Config;

/// Build (or extend) a publish context from an exported scene
pub fn collect_command(
    scene_path: &Path,
    context_path: Option<&Path>,
    draft: bool,
    output: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let content = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene description: {}", scene_path.display()))?;
    let scene: SceneDescription = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scene description: {}", scene_path.display()))?;

    let mut context = match context_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read publish context: {}", path.display()))?;
            PublishContext::from_json(&content)
                .with_context(|| format!("Failed to parse publish context: {}", path.display()))?
        }
        None => PublishContext::default(),
    };

    let created = select_write_nodes(&scene, &mut context);
    tracing::info!("Selected {} write node(s)", created);

    if draft {
        extract_draft(&mut context, scene.root.format);
    }

    if config.collect.validate_output_location {
        let errors = validate_context_outputs(&context, std::env::consts::OS);
        if !errors.is_empty() {
            for e in &errors {
                tracing::error!("{}", e);
            }
            bail!("{} write node(s) render to a local drive", errors.len());
        }
    }

    let json = serde_json::to_string_pretty(&context)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write publish context: {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
