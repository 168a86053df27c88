//! The farm's command-line submission tool

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::SubmissionError;

/// File written by the macOS installer with the Deadline bin directory
const MACOS_DEADLINE_PATH_FILE: &str = "/Users/Shared/Thinkbox/DEADLINE_PATH";

static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"JobID=(\S+)").expect("valid regex"));

/// Pull the job id out of the submission tool's stdout
pub fn parse_job_id(output: &str) -> Option<&str> {
    JOB_ID
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Runs one submission: job file, plugin file and auxiliary files in, stdout out
#[async_trait]
pub trait SubmitCommand: Send + Sync {
    /// Submit with the given positional arguments and return captured stdout
    async fn submit(&self, args: &[PathBuf]) -> Result<String, SubmissionError>;
}

/// Environment variables layered over the inherited environment of a child
/// process. Built per invocation; the parent's environment is never touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverlay {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(|v| v.as_os_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Overlay for the submission tool.
    ///
    /// Windows resolves DLLs from `PATH` before the working directory, so the
    /// install directory is prepended there.
    pub fn for_deadline(bin_dir: &Path, current_path: Option<OsString>, prepend_path: bool) -> Self {
        let mut overlay = Self::new();
        if prepend_path {
            let mut dirs = vec![bin_dir.to_path_buf()];
            if let Some(path) = current_path {
                dirs.extend(std::env::split_paths(&path));
            }
            let joined = std::env::join_paths(&dirs)
                .unwrap_or_else(|_| bin_dir.as_os_str().to_os_string());
            overlay.set("PATH", joined);
        }
        overlay
    }
}

/// Resolve the Deadline bin directory.
///
/// Order: explicit configuration, the macOS installer's path file, then the
/// `DEADLINE_PATH` environment variable.
pub fn locate_deadline_bin(configured: Option<&Path>) -> Result<PathBuf, SubmissionError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    let macos_file = Path::new(MACOS_DEADLINE_PATH_FILE);
    if macos_file.exists() {
        match std::fs::read_to_string(macos_file) {
            Ok(content) if !content.trim().is_empty() => {
                return Ok(PathBuf::from(content.trim()));
            }
            Ok(_) => tracing::warn!("{} is empty", MACOS_DEADLINE_PATH_FILE),
            Err(e) => tracing::warn!("Failed to read {}: {}", MACOS_DEADLINE_PATH_FILE, e),
        }
    }

    match std::env::var_os("DEADLINE_PATH") {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(SubmissionError::Locate),
    }
}

/// `deadlinecommand` invoked as a child process
#[derive(Debug, Clone)]
pub struct DeadlineCommand {
    bin_dir: PathBuf,
    executable: PathBuf,
    overlay: EnvOverlay,
    timeout: Option<Duration>,
}

impl DeadlineCommand {
    /// Use the `deadlinecommand` binary inside `bin_dir`
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        let bin_dir = bin_dir.into();
        let executable = bin_dir.join(format!(
            "deadlinecommand{}",
            std::env::consts::EXE_SUFFIX
        ));
        let overlay =
            EnvOverlay::for_deadline(&bin_dir, std::env::var_os("PATH"), cfg!(windows));
        Self {
            bin_dir,
            executable,
            overlay,
            timeout: None,
        }
    }

    /// Use a specific executable, still running from `bin_dir`
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Bound each submission call. Without a timeout the call blocks until
    /// the tool exits.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_command(&self, args: &[PathBuf]) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args)
            .current_dir(&self.bin_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(self.overlay.iter())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            // CREATE_NO_WINDOW
            cmd.creation_flags(0x0800_0000);
        }

        cmd
    }
}

#[async_trait]
impl SubmitCommand for DeadlineCommand {
    async fn submit(&self, args: &[PathBuf]) -> Result<String, SubmissionError> {
        let program = self.executable.display().to_string();
        tracing::debug!("Running {} {:?}", program, args);

        let output = self.build_command(args).output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| SubmissionError::Timeout(limit))?,
            None => output.await,
        }
        .map_err(|source| SubmissionError::Launch {
            program: program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            return Err(SubmissionError::ExitStatus {
                status: output.status.to_string(),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id_from_tool_output() {
        let output = "Warnings: none\nJobID=abc123\n";
        assert_eq!(parse_job_id(output), Some("abc123"));
    }

    #[test]
    fn test_parse_job_id_handles_crlf_and_trailing_text() {
        let output = "Result=Success\r\nJobID=5f2a9c\r\nThe job was submitted successfully.\r\n";
        assert_eq!(parse_job_id(output), Some("5f2a9c"));
    }

    #[test]
    fn test_parse_job_id_missing() {
        assert_eq!(parse_job_id("Error: could not connect\n"), None);
        assert_eq!(parse_job_id("JobID=\n"), None);
    }

    #[test]
    fn test_overlay_prepends_install_dir() {
        let current = std::env::join_paths(["/usr/bin", "/bin"]).unwrap();
        let overlay =
            EnvOverlay::for_deadline(Path::new("/opt/deadline/bin"), Some(current), true);

        let path = overlay.get("PATH").unwrap();
        let dirs: Vec<_> = std::env::split_paths(path).collect();
        assert_eq!(dirs[0], PathBuf::from("/opt/deadline/bin"));
        assert_eq!(dirs.len(), 3);
    }

    #[test]
    fn test_overlay_is_empty_when_path_untouched() {
        let overlay = EnvOverlay::for_deadline(Path::new("/opt/deadline/bin"), None, false);
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_locate_prefers_configured_path() {
        let bin = locate_deadline_bin(Some(Path::new("/farm/bin"))).unwrap();
        assert_eq!(bin, PathBuf::from("/farm/bin"));
    }
}
