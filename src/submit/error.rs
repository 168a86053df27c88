//! Submission errors

use std::path::PathBuf;
use std::time::Duration;

use super::SubmissionReport;

/// Failure of a single call to the farm's submission tool
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(
        "Deadline install directory not found: set deadline.path in the config or DEADLINE_PATH"
    )]
    Locate,

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Submission command exited with {status}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ExitStatus {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("No JobID found in submission output:\n{output}")]
    MissingJobId { output: String },

    #[error("Failed to write submission file {}: {source}", .path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Submission command did not finish within {0:?}")]
    Timeout(Duration),
}

/// A batch that stopped at a failing job.
///
/// Jobs submitted before the failure stay on the farm; they are listed in
/// `submitted`.
#[derive(Debug, thiserror::Error)]
#[error("Submitting {label} failed after {} job(s) were submitted: {source}", .submitted.jobs.len())]
pub struct BatchError {
    /// Entity whose job failed
    pub label: String,
    pub submitted: SubmissionReport,
    #[source]
    pub source: SubmissionError,
}
