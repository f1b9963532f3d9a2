#![allow(dead_code)]

// Video trees and stand-in encoders for tests that don't need a real ffmpeg

use squeeze::engine::{
    EncoderSettings, EncodingProfile, FrameRate, HwBackend, Resolution, RunContext, RunLog,
    RunSettings,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write an executable shell script into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes a fixed 10-byte payload to its last argument (the output path)
#[cfg(unix)]
pub fn fake_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-ffmpeg",
        "for last; do :; done\nprintf 'compressed' > \"$last\"",
    )
}

/// Writes a partial output, then blocks until it is killed
#[cfg(unix)]
pub fn stalling_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "stalling-ffmpeg",
        "for last; do :; done\nprintf 'partial' > \"$last\"\nexec sleep 30",
    )
}

/// Complains on stderr and exits non-zero without producing output
#[cfg(unix)]
pub fn failing_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "failing-ffmpeg",
        "echo 'Invalid data found when processing input' >&2\nexit 1",
    )
}

/// Copies the `-i` input to the output path unchanged
#[cfg(unix)]
pub fn copying_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "copying-ffmpeg",
        "while [ $# -gt 1 ]; do\n  if [ \"$1\" = \"-i\" ]; then src=\"$2\"; fi\n  shift\ndone\ncat \"$src\" > \"$1\"",
    )
}

pub const COMPRESSED_LEN: u64 = 10;

/// Create `path` (and its parents) with an apparent size of `len` bytes
pub fn sparse_file(path: &Path, len: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().set_len(len).unwrap();
}

pub fn touch(path: &Path) {
    sparse_file(path, 0);
}

/// Build a tree from relative file paths; directories end with '/'
pub fn video_tree(paths: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    for rel in paths {
        let path = root.path().join(rel);
        if rel.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            touch(&path);
        }
    }
    root
}

/// Run context logging to `run.log` inside `log_dir`, without echoing to stdout
pub fn context(log_dir: &Path) -> RunContext {
    RunContext::new(RunLog::open(&log_dir.join("run.log"), false).unwrap())
}

pub fn read_log(ctx: &RunContext) -> String {
    fs::read_to_string(ctx.log.path()).unwrap()
}

/// Software encode at source resolution and frame rate through `ffmpeg`
pub fn software_settings(ffmpeg: &Path) -> RunSettings {
    RunSettings {
        profile: EncodingProfile::new(Resolution::Original, FrameRate::Original, 1),
        backend: HwBackend::Software,
        encoder: EncoderSettings {
            ffmpeg_path: ffmpeg.to_path_buf(),
            ..EncoderSettings::default()
        },
        live_progress: false,
    }
}
