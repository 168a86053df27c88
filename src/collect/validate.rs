//! Output location checks

/// An output the farm workers cannot reach
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Output path is not a network path: {0}")]
    LocalOutput(String),
}

/// Reject outputs written to the local system drive.
///
/// Only applies on Windows (`os == "windows"`), where render nodes map shares
/// to drive letters and `C:` is always the machine's own disk.
pub fn validate_output_location(path: &str, os: &str) -> Result<(), ValidationError> {
    if os != "windows" {
        return Ok(());
    }

    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.eq_ignore_ascii_case(&'c') => {
            Err(ValidationError::LocalOutput(path.to_string()))
        }
        _ => Ok(()),
    }
}
