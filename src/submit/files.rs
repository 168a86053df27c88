//! Temporary job/plugin file pairs

use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::SubmissionError;

/// Job and plugin files written for one submission.
///
/// Both files share a random submission id so concurrent publishers never
/// collide in a shared temp directory.
#[derive(Debug)]
pub struct SubmissionFiles {
    pub id: Uuid,
    pub job_path: PathBuf,
    pub plugin_path: PathBuf,
}

impl SubmissionFiles {
    /// Write both files into `dir`
    pub fn write(dir: &Path, job_text: &str, plugin_text: &str) -> Result<Self, SubmissionError> {
        let id = Uuid::new_v4();
        let files = Self {
            id,
            job_path: dir.join(format!("{}.job.txt", id)),
            plugin_path: dir.join(format!("{}.plugin.txt", id)),
        };

        std::fs::write(&files.job_path, job_text).map_err(|source| SubmissionError::TempFile {
            path: files.job_path.clone(),
            source,
        })?;

        if let Err(source) = std::fs::write(&files.plugin_path, plugin_text) {
            let path = files.plugin_path.clone();
            files.remove();
            return Err(SubmissionError::TempFile { path, source });
        }

        Ok(files)
    }

    /// Delete both files. Failures are logged, never returned.
    pub fn remove(self) {
        for path in [&self.job_path, &self.plugin_path] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove submission file {}: {}", path.display(), e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_shares_submission_id() {
        let dir = tempfile::tempdir().unwrap();
        let files = SubmissionFiles::write(dir.path(), "Name=a\n", "Version=14\n").unwrap();

        let id = files.id.to_string();
        assert!(files.job_path.ends_with(format!("{}.job.txt", id)));
        assert!(files.plugin_path.ends_with(format!("{}.plugin.txt", id)));
        assert_eq!(std::fs::read_to_string(&files.job_path).unwrap(), "Name=a\n");

        let (job, plugin) = (files.job_path.clone(), files.plugin_path.clone());
        files.remove();
        assert!(!job.exists());
        assert!(!plugin.exists());
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = SubmissionFiles::write(&missing, "", "").unwrap_err();
        assert!(matches!(err, SubmissionError::TempFile { .. }));
    }
}
