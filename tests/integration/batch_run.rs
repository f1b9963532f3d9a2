// End-to-end batch runs over temporary trees with a stand-in encoder

use crate::common::fixtures::{
    COMPRESSED_LEN, context, copying_encoder, failing_encoder, fake_encoder, read_log, software_settings,
    sparse_file, video_tree,
};
use squeeze::engine::{discover, plan_invocations, run_plan};
use std::fs;
use tempfile::TempDir;

const MIB: u64 = 1024 * 1024;

#[test]
fn replaces_originals_and_reports_savings() {
    let root = video_tree(&[]);
    sparse_file(&root.path().join("Clip 1/lesson.mp4"), 100 * MIB);
    sparse_file(&root.path().join("Clip 2/demo.mp4.mp4"), 50 * MIB);
    let tools = TempDir::new().unwrap();
    let settings = software_settings(&fake_encoder(tools.path()));
    let ctx = context(tools.path());

    let plan = discover(root.path()).unwrap();
    assert_eq!(plan.len(), 2);
    let stats = run_plan(&ctx, &plan, 0, &settings);

    let first = root.path().join("Clip 1/lesson.mp4");
    let renamed = root.path().join("Clip 2/demo.mp4");
    assert_eq!(fs::metadata(&first).unwrap().len(), COMPRESSED_LEN);
    assert_eq!(fs::metadata(&renamed).unwrap().len(), COMPRESSED_LEN);
    assert!(!root.path().join("Clip 2/demo.mp4.mp4").exists());
    assert!(find_temps(root.path()).is_empty());

    assert_eq!(stats.total_dirs, 2);
    assert_eq!(stats.processed_dirs, 2);
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.processed_videos, 2);
    assert_eq!(stats.failed_videos, 0);
    assert_eq!(stats.renamed_videos, 1);
    assert_eq!(stats.total_original_bytes, 150 * MIB);
    assert_eq!(stats.total_compressed_bytes, 2 * COMPRESSED_LEN);

    let log = read_log(&ctx);
    assert_eq!(log.matches("PROCESSING SUMMARY:").count(), 1);
    assert!(log.contains("Cleaned filename: demo.mp4.mp4 -> demo.mp4"));
    assert!(log.contains("Folder 'Clip 1' summary:"));
    assert!(log.contains("Total space saved: 150.00 MB"));
    assert!(ctx.summary_emitted());
}

#[test]
fn failed_encodes_leave_originals_alone() {
    let root = video_tree(&[]);
    let source = root.path().join("Broken/bad.mkv");
    sparse_file(&source, 4 * MIB);
    let tools = TempDir::new().unwrap();
    let settings = software_settings(&failing_encoder(tools.path()));
    let ctx = context(tools.path());

    let plan = discover(root.path()).unwrap();
    let stats = run_plan(&ctx, &plan, 0, &settings);

    assert_eq!(fs::metadata(&source).unwrap().len(), 4 * MIB);
    assert!(find_temps(root.path()).is_empty());
    assert_eq!(stats.failed_videos, 1);
    assert_eq!(stats.processed_videos, 0);
    assert_eq!(stats.total_original_bytes, 0);

    let log = read_log(&ctx);
    assert!(log.contains("✗ Error converting bad.mkv"));
    assert!(log.contains("Invalid data found when processing input"));
}

#[test]
fn names_normalizing_alike_keep_separate_outputs() {
    let root = video_tree(&[]);
    let dir = root.path().join("Clip 1");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("talk.mp4.mp4"), "AAAA-first-video").unwrap();
    fs::write(dir.join("talk.mp4.mp4.mp4"), "BBBB-second-video").unwrap();
    let tools = TempDir::new().unwrap();
    let settings = software_settings(&copying_encoder(tools.path()));
    let ctx = context(tools.path());

    let plan = discover(root.path()).unwrap();
    let stats = run_plan(&ctx, &plan, 0, &settings);

    assert_eq!(fs::read_to_string(dir.join("talk.mp4")).unwrap(), "AAAA-first-video");
    assert_eq!(
        fs::read_to_string(dir.join("talk.mp4.mp4.mp4")).unwrap(),
        "BBBB-second-video"
    );
    assert!(!dir.join("talk.mp4.mp4").exists());
    assert!(find_temps(root.path()).is_empty());
    assert_eq!(stats.processed_videos, 2);
    assert_eq!(stats.failed_videos, 0);
    assert_eq!(stats.renamed_videos, 1);
}

#[test]
fn start_offset_skips_earlier_directories() {
    let root = video_tree(&["a/one.mp4", "b/two.mp4", "c/three.mp4"]);
    let tools = TempDir::new().unwrap();
    let settings = software_settings(&fake_encoder(tools.path()));
    let ctx = context(tools.path());

    let plan = discover(root.path()).unwrap();
    let stats = run_plan(&ctx, &plan, 1, &settings);

    assert_eq!(stats.total_dirs, 3);
    assert_eq!(stats.processed_dirs, 2);
    assert_eq!(stats.processed_videos, 2);
    assert_eq!(fs::metadata(root.path().join("a/one.mp4")).unwrap().len(), 0);
    assert_eq!(
        fs::metadata(root.path().join("c/three.mp4")).unwrap().len(),
        COMPRESSED_LEN
    );
    assert!(read_log(&ctx).contains("Starting from directory 1: b"));
}

#[test]
fn dry_run_plans_without_touching_files() {
    let root = video_tree(&["x/1.mp4", "x/2.mov", "y/3.avi.avi", "z/notes.txt"]);
    let tools = TempDir::new().unwrap();
    let settings = software_settings(&fake_encoder(tools.path()));

    let plan = discover(root.path()).unwrap();
    let planned = plan_invocations(&plan, 0, &settings);

    assert_eq!(planned.len(), 3);
    let (entry, invocation) = &planned[2];
    assert_eq!(entry.normalized_name, "3.avi");
    assert_eq!(
        invocation.args.last().unwrap(),
        entry.temp_path().as_os_str()
    );
    assert!(root.path().join("y/3.avi.avi").exists());
    assert!(find_temps(root.path()).is_empty());
}

fn find_temps(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("temp_"))
        .map(|e| e.into_path())
        .collect()
}
