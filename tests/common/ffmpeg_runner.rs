#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::Path;
/// Real FFmpeg helpers for the end-to-end tests
use std::process::{Command, Stdio};

/// Generate a small H.264 test clip with ffmpeg's test source
pub fn generate_test_video(
    output_path: &Path,
    duration_secs: f32,
    width: u32,
    height: u32,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!(
            "testsrc=duration={}:size={}x{}:rate=30",
            duration_secs, width, height
        ))
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("ultrafast")
        .arg("-threads")
        .arg("1")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-an")
        .arg(output_path);

    let output = cmd.output().context("Failed to generate test video")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Failed to generate test video: {}", stderr);
    }

    Ok(())
}

/// Check if FFmpeg (with libx264) is available
pub fn is_ffmpeg_available() -> bool {
    let Ok(output) = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-encoders")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    else {
        return false;
    };
    output.status.success() && String::from_utf8_lossy(&output.stdout).contains("libx264")
}
