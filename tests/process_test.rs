//! Real child process tests using shell scripts as the farm tool
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use deadline_bridge::submit::{DeadlineCommand, SubmissionError, SubmitCommand, Submitter};
use deadline_bridge::{PublishContext, SubmissionBatch};
use serde_json::json;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_deadlinecommand_in_bin_dir_is_used() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    // Fails unless the job file names the job and the cwd is the bin dir
    write_script(
        bin.path(),
        "deadlinecommand",
        r#"grep -q '^Name=beauty$' "$1" || exit 3
test -f ./deadlinecommand || exit 4
echo "Result=Success"
echo "JobID=5f2a9c01"
echo "The job was submitted successfully.""#,
    );

    let context: PublishContext = serde_json::from_value(json!({
        "data": {"deadlineData": [{
            "job": {"Name": "beauty", "Plugin": "Nuke"},
            "plugin": {"WriteNode": "Write1"}
        }]}
    }))
    .unwrap();
    let submitter = Submitter::new(DeadlineCommand::new(bin.path()), work.path());

    let report = submitter
        .submit(&context, &SubmissionBatch::from_context(&context))
        .await
        .unwrap();

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].job_id, "5f2a9c01");
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_nonzero_exit_reports_output() {
    let bin = tempfile::tempdir().unwrap();
    let script = write_script(
        bin.path(),
        "failing",
        "echo partial\necho 'repository offline' >&2\nexit 2",
    );
    let command = DeadlineCommand::new(bin.path()).with_executable(script);

    let err = command
        .submit(&[PathBuf::from("job.txt"), PathBuf::from("plugin.txt")])
        .await
        .unwrap_err();

    match err {
        SubmissionError::ExitStatus { stdout, stderr, .. } => {
            assert_eq!(stdout.trim(), "partial");
            assert_eq!(stderr.trim(), "repository offline");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_executable_is_launch_error() {
    let bin = tempfile::tempdir().unwrap();
    let command = DeadlineCommand::new(bin.path());

    let err = command.submit(&[]).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Launch { .. }));
}

#[tokio::test]
async fn test_timeout_stops_waiting() {
    let bin = tempfile::tempdir().unwrap();
    let script = write_script(bin.path(), "slow", "sleep 5\necho JobID=late");
    let command = DeadlineCommand::new(bin.path())
        .with_executable(script)
        .with_timeout(Some(Duration::from_millis(200)));

    let err = command.submit(&[]).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Timeout(_)));
}
