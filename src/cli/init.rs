//! Init command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;

use deadline_bridge::config::Config;

/// Default configuration content for deadline-bridge init
pub const DEFAULT_CONFIG: &str = r#"# deadline-bridge configuration
# =============================
#
# Submits publish jobs to the Deadline render farm and runs publish plugins
# when the farm raises lifecycle events.

# ============================================================================
# DEADLINE - Where deadlinecommand lives and how it is called
# ============================================================================
#
# Available options:
#   path          - Directory containing deadlinecommand. When unset, the
#                   macOS installer file /Users/Shared/Thinkbox/DEADLINE_PATH
#                   and then the DEADLINE_PATH environment variable are used.
#   temp_dir      - Where job/plugin file pairs are written (default: OS temp dir)
#   timeout_secs  - Give up on a single submission after this many seconds.
#                   Leave unset to wait for deadlinecommand however long it takes.

[deadline]
# path = "/opt/Thinkbox/Deadline10/bin"
# temp_dir = "/tmp"
# timeout_secs = 120

# ============================================================================
# PUBLISH - Publish runs started by farm events
# ============================================================================
#
# Available options:
#   command              - Program running the publish pipeline
#   args                 - Arguments before the context seed path
#   plugin_dir           - Event plugin directory with OnPreTask.py / OnPostTask.py
#   python_search_paths  - Extra interpreter paths, separated by ";"
#   logging_level        - DEBUG, INFO, WARNING or ERROR
#   on_pre_task_paths    - Non-empty adds OnPreTask.py to submitted jobs
#   on_post_task_paths   - Non-empty adds OnPostTask.py to submitted jobs

[publish]
command = "python"
args = ["-m", "pyblish_deadline.publish"]
python_search_paths = ""
logging_level = "DEBUG"
on_pre_task_paths = ""
on_post_task_paths = ""

# Publish plugin paths per event, separated by ";". Events without an entry
# (and without an <Event>Paths environment variable) do not publish.
[publish.paths]
# OnJobSubmitted = "/pipeline/plugins/submitted"
# OnJobFinished = "/pipeline/plugins/finished;/pipeline/plugins/shared"

# ============================================================================
# COLLECT - Scene extraction
# ============================================================================

[collect]
# Reject write nodes rendering to C: (Windows only)
validate_output_location = true
"#;

/// Write the default configuration file.
///
/// With `deadline_path` the file is generated from the defaults with the
/// install directory filled in, instead of the commented template.
pub fn init_command(
    config_path: Option<PathBuf>,
    force: bool,
    deadline_path: Option<PathBuf>,
) -> Result<()> {
    // Default to global config path
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    match deadline_path {
        Some(path) => {
            let mut config = Config::with_defaults();
            config.deadline.path = Some(path);
            config.save_to_file(&config_path)?;
        }
        None => {
            if let Some(parent) = config_path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&config_path, DEFAULT_CONFIG)?;
        }
    }
    println!("Created: {}", config_path.display());

    Ok(())
}
