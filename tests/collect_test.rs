//! Scene description to farm submission, end to end

mod common;

use common::{FakeDeadline, RecordedCall};
use serde_json::json;

use deadline_bridge::collect::{
    SceneDescription, extract_draft, select_write_nodes, validate_context_outputs,
};
use deadline_bridge::submit::Submitter;
use deadline_bridge::{PublishContext, SubmissionBatch};

fn scene() -> SceneDescription {
    serde_json::from_value(json!({
        "root": {
            "first_frame": 1001,
            "last_frame": 1100,
            "nukex": true,
            "version_string": "14.0v5",
            "format": {"width": 2048, "height": 858},
            "script": "/shots/010/comp_v003.nk"
        },
        "nodes": [
            {"name": "Write_beauty", "class": "Write", "file": "/renders/010/beauty.%04d.exr",
             "fcompname": "beauty"},
            {"name": "Write_off", "class": "Write", "disabled": true, "file": "/renders/off.%04d.exr"},
            {"name": "Blur1", "class": "Blur"},
            {"name": "Write_slap", "class": "Write", "file": "/renders/010/slap.%d.jpg",
             "use_limit": true, "first": 1010, "last": 1020}
        ]
    }))
    .unwrap()
}

fn extra_info_kv(call: &RecordedCall, name: &str) -> Option<String> {
    call.job_pairs()
        .into_iter()
        .filter(|(k, _)| k.starts_with("ExtraInfoKeyValue"))
        .find_map(|(_, v)| {
            v.split_once('=')
                .filter(|(n, _)| *n == name)
                .map(|(_, value)| value.to_string())
        })
}

#[tokio::test]
async fn test_write_nodes_become_nuke_jobs() {
    let scene = scene();
    let mut context = PublishContext::default();
    assert_eq!(select_write_nodes(&scene, &mut context), 2);
    extract_draft(&mut context, scene.root.format);

    let temp = tempfile::tempdir().unwrap();
    let submitter = Submitter::new(FakeDeadline::new(), temp.path());
    let batch = SubmissionBatch::from_context(&context);
    let report = submitter.submit(&context, &batch).await.unwrap();

    assert_eq!(report.jobs.len(), 2);
    let calls = submitter.command().calls();

    let beauty = &calls[0];
    assert_eq!(beauty.job_value("Name").as_deref(), Some("Write_beauty"));
    assert_eq!(beauty.job_value("Plugin").as_deref(), Some("Nuke"));
    assert_eq!(beauty.job_value("Frames").as_deref(), Some("1001-1100"));
    assert_eq!(
        beauty.job_value("OutputFilename0").as_deref(),
        Some("/renders/010/beauty.####.exr")
    );
    assert!(beauty.plugin_file.contains("NukeX=True\n"));
    assert!(beauty.plugin_file.contains("Version=14.0\n"));
    assert!(beauty.plugin_file.contains("EnforceRenderOrder=True\n"));
    assert!(beauty.plugin_file.contains("WriteNode=Write_beauty\n"));
    assert_eq!(beauty.args[2].to_string_lossy(), "/shots/010/comp_v003.nk");

    assert_eq!(extra_info_kv(beauty, "DraftFrameWidth").as_deref(), Some("2048"));
    assert_eq!(
        extra_info_kv(beauty, "DraftUploadToShotgun").as_deref(),
        Some("False")
    );

    let slap = &calls[1];
    assert_eq!(slap.job_value("Frames").as_deref(), Some("1010-1020"));
    assert_eq!(
        slap.job_value("OutputFilename0").as_deref(),
        Some("/renders/010/slap.#.jpg")
    );
}

#[test]
fn test_collected_instances_carry_publish_data() {
    let mut context = PublishContext::default();
    select_write_nodes(&scene(), &mut context);

    let beauty = &context.instances[0];
    assert!(beauty.is_eligible());
    assert_eq!(beauty.data["deadlineOutput"], "/renders/010");
    assert_eq!(beauty.data["deadlineFrames"], "1001-1100");
    assert_eq!(beauty.data["ftrackComponents"], json!({"beauty": {}}));
    assert_eq!(beauty.data["ftrackAssetType"], "img");

    let slap = &context.instances[1];
    assert_eq!(slap.data["ftrackComponents"], json!({}));
}

#[test]
fn test_local_outputs_flagged_on_windows_only() {
    let scene: SceneDescription = serde_json::from_value(json!({
        "root": {"first_frame": 1, "last_frame": 1, "version_string": "13.2"},
        "nodes": [
            {"name": "Local", "class": "Write", "file": "C:/renders/local.%04d.exr"},
            {"name": "Share", "class": "Write", "file": "//farm/renders/share.%04d.exr"}
        ]
    }))
    .unwrap();
    let mut context = PublishContext::default();
    select_write_nodes(&scene, &mut context);

    assert_eq!(validate_context_outputs(&context, "windows").len(), 1);
    assert!(validate_context_outputs(&context, "linux").is_empty());
}
