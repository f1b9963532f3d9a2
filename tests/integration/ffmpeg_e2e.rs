// Real ffmpeg runs; skipped when ffmpeg with libx264 is not installed

use crate::common::ffmpeg_runner::{generate_test_video, is_ffmpeg_available};
use crate::common::fixtures::{context, read_log};
use squeeze::engine::{
    EncoderSettings, EncodingProfile, FrameRate, HwBackend, Resolution, RunSettings, discover,
    ffmpeg_version, run_plan,
};
use std::fs;
use tempfile::TempDir;

macro_rules! require_ffmpeg {
    () => {
        if !is_ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg with libx264 not available");
            return;
        }
    };
}

fn software(resolution: Resolution, frame_rate: FrameRate) -> RunSettings {
    RunSettings {
        profile: EncodingProfile::new(resolution, frame_rate, 1),
        backend: HwBackend::Software,
        encoder: EncoderSettings::default(),
        live_progress: false,
    }
}

#[test]
fn version_is_reported() {
    require_ffmpeg!();
    let version = ffmpeg_version(&EncoderSettings::default()).unwrap();
    assert!(version.starts_with("ffmpeg version"));
}

#[test]
fn downscales_and_replaces_in_place() {
    require_ffmpeg!();
    let root = TempDir::new().unwrap();
    let dir = root.path().join("Lesson 1");
    fs::create_dir(&dir).unwrap();
    generate_test_video(&dir.join("clip.mp4.mp4"), 1.0, 640, 480).unwrap();

    let tools = TempDir::new().unwrap();
    let ctx = context(tools.path());
    let settings = software(
        Resolution::Fixed {
            width: 320,
            height: 240,
        },
        FrameRate::Fixed { num: 15, den: 1 },
    );

    let stats = run_plan(&ctx, &discover(root.path()).unwrap(), 0, &settings);

    assert_eq!(stats.processed_videos, 1, "log:\n{}", read_log(&ctx));
    assert_eq!(stats.renamed_videos, 1);
    let output = dir.join("clip.mp4");
    assert!(output.exists());
    assert!(!dir.join("clip.mp4.mp4").exists());
    assert_eq!(
        fs::metadata(&output).unwrap().len(),
        stats.total_compressed_bytes
    );
}

#[test]
fn corrupt_input_is_reported_as_failed() {
    require_ffmpeg!();
    let root = TempDir::new().unwrap();
    let source = root.path().join("garbage.mkv");
    fs::write(&source, b"definitely not a matroska file").unwrap();

    let tools = TempDir::new().unwrap();
    let ctx = context(tools.path());
    let stats = run_plan(
        &ctx,
        &discover(root.path()).unwrap(),
        0,
        &software(Resolution::Original, FrameRate::Original),
    );

    assert_eq!(stats.failed_videos, 1);
    assert!(source.exists());
    assert!(!root.path().join("temp_garbage.mkv").exists());
}
