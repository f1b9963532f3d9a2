use super::ffmpeg_cmd::Invocation;
use super::hw_config::EncoderSettings;
use super::invoke::run_with_timeout;
use anyhow::{Context, Result};

/// Check that the configured ffmpeg runs and return its version line
pub fn ffmpeg_version(settings: &EncoderSettings) -> Result<String> {
    let mut inv = Invocation::new(&settings.ffmpeg_path);
    inv.arg("-version");

    let run = run_with_timeout(&inv, settings.probe_timeout).with_context(|| {
        format!(
            "Failed to execute {}. Is ffmpeg installed and in PATH?",
            settings.ffmpeg_path.display()
        )
    })?;

    if !run.status.success() {
        anyhow::bail!("ffmpeg command failed with status: {}", run.status);
    }

    Ok(parse_version_line(&run.stdout))
}

fn parse_version_line(output: &str) -> String {
    output
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("Unknown version")
        .to_string()
}
