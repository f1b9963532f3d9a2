// Sequential batch loop: directories in plan order, files in natural order

use super::core::{
    DirectoryPlan, EncoderSettings, EncodingProfile, Invocation, MediaEntry, ProgressParser,
    TranscodeOutcome, base_name, build_invocation, list_media, transcode_entry,
};
use super::hardware::HwBackend;
use super::interrupt::RunContext;
use crate::stats::{RunStatistics, describe_change, format_bytes, format_clock};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Everything fixed for the duration of a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub profile: EncodingProfile,
    pub backend: HwBackend,
    pub encoder: EncoderSettings,
    /// Redraw a progress line on stdout while each file encodes
    pub live_progress: bool,
}

impl RunSettings {
    pub fn invocation_for(&self, entry: &MediaEntry) -> Invocation {
        build_invocation(
            &entry.source_path,
            &entry.temp_path(),
            &self.profile,
            self.backend,
            &self.encoder,
        )
    }
}

/// Process the plan from `start` onwards and return the final statistics.
///
/// Per-file failures are logged and counted; only the interrupt flag or the
/// end of the plan stops the loop. The summary is emitted before returning.
pub fn run_plan(
    ctx: &RunContext,
    plan: &DirectoryPlan,
    start: usize,
    settings: &RunSettings,
) -> RunStatistics {
    let directories = plan.directories();
    ctx.update_stats(|s| s.total_dirs = directories.len());
    log_header(ctx, &directories, start, settings);

    for dir in directories.iter().skip(start) {
        if ctx.interrupt.is_interrupted() {
            break;
        }
        process_directory(ctx, dir, settings);
    }

    ctx.emit_summary();
    if ctx.interrupt.is_interrupted() {
        ctx.log.line("Processing interrupted by user. Summary displayed above.");
    }
    ctx.stats()
}

fn log_header(ctx: &RunContext, directories: &[&Path], start: usize, settings: &RunSettings) {
    let log = &ctx.log;
    log.line("Video compression process started");
    log.line(format!("Hardware acceleration: {}", settings.backend.display_name()));
    log.line(format!("Encoder: {}", settings.backend.ffmpeg_name()));
    log.line(format!("Target resolution: {}", settings.profile.resolution));
    log.line(format!("Target FPS: {}", settings.profile.frame_rate));
    log.line(format!("Threads: {}", settings.profile.threads));
    log.line(format!(
        "Found {} directories with video files to process",
        directories.len()
    ));
    if let Some(first) = directories.get(start) {
        log.line(format!(
            "Starting from directory {}: {}",
            start,
            base_name(first)
        ));
    }
    log.line("Directory processing order:");
    for (i, dir) in directories.iter().enumerate() {
        log.line(format!("  {}. {}", i, base_name(dir)));
    }
    log.rule('=');
}

fn process_directory(ctx: &RunContext, dir: &Path, settings: &RunSettings) {
    let log = &ctx.log;
    let name = base_name(dir);
    let stats = ctx.stats();
    log.line(format!(
        "Processing directory ({}/{}): {}",
        stats.processed_dirs + 1,
        stats.total_dirs,
        name
    ));
    log.line(format!("Full path: {}", dir.display()));

    let entries = match list_media(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to list directory");
            log.line(format!("Error reading directory {}: {}", dir.display(), e));
            Vec::new()
        }
    };

    if entries.is_empty() {
        log.line("No video files found in this directory");
        ctx.update_stats(|s| s.finish_directory());
        return;
    }

    ctx.update_stats(|s| s.begin_directory(dir, entries.len()));
    log.line(format!(
        "Found {} video(s) to process in this directory",
        entries.len()
    ));

    for (i, entry) in entries.iter().enumerate() {
        if ctx.interrupt.is_interrupted() {
            break;
        }
        process_entry(ctx, entry, i + 1, entries.len(), settings);
    }

    let summary = ctx
        .stats()
        .directory(dir)
        .map(|d| d.summary_lines())
        .unwrap_or_default();
    for line in summary {
        log.line(line);
    }

    ctx.update_stats(|s| s.finish_directory());
    log.line(format!("Finished processing directory: {}", name));
    log.rule('-');
}

fn process_entry(
    ctx: &RunContext,
    entry: &MediaEntry,
    index: usize,
    count: usize,
    settings: &RunSettings,
) {
    let log = &ctx.log;
    log.line(format!(
        "  Converting video {}/{}: {}",
        index, count, entry.raw_name
    ));
    if entry.is_renamed() {
        log.line(format!(
            "    Cleaned filename: {} -> {}",
            entry.raw_name, entry.normalized_name
        ));
    }

    let invocation = settings.invocation_for(entry);
    debug!(command = %invocation, "invoking encoder");

    let live = settings.live_progress && io::stdout().is_terminal();
    let mut drew_progress = false;
    let outcome = transcode_entry(ctx, entry, &invocation, |p: &ProgressParser| {
        if live {
            draw_progress(p);
            drew_progress = true;
        }
    });
    if drew_progress {
        println!();
    }

    match &outcome {
        TranscodeOutcome::Succeeded {
            original_bytes,
            compressed_bytes,
        } => {
            log.line(format!("    ✓ Successfully converted: {}", entry.raw_name));
            if entry.is_renamed() {
                log.line(format!("    Renamed to: {}", entry.normalized_name));
            }
            log.line(format!("    Original size: {}", format_bytes(*original_bytes)));
            log.line(format!(
                "    Compressed size: {}",
                format_bytes(*compressed_bytes)
            ));
            log.line(format!(
                "    {}",
                describe_change(*original_bytes, *compressed_bytes)
            ));
        }
        TranscodeOutcome::Failed { reason } => {
            log.line(format!("    ✗ Error converting {}: {}", entry.raw_name, reason));
        }
        TranscodeOutcome::Skipped { reason } => {
            log.line(format!(
                "  ⚠ Skipping video {}/{}: {} ({})",
                index, count, entry.raw_name, reason
            ));
        }
    }
}

fn draw_progress(progress: &ProgressParser) {
    let speed = progress
        .speed
        .map(|s| format!("{:.2}x", s))
        .unwrap_or_else(|| "-".to_string());
    print!(
        "\r    Progress: {} | Speed: {}   ",
        format_clock(progress.out_time_s()),
        speed
    );
    let _ = io::stdout().flush();
}

/// Every invocation a run over the plan would execute, without touching files
pub fn plan_invocations(
    plan: &DirectoryPlan,
    start: usize,
    settings: &RunSettings,
) -> Vec<(MediaEntry, Invocation)> {
    plan.directories()
        .into_iter()
        .skip(start)
        .flat_map(|dir| match list_media(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to list directory");
                Vec::new()
            }
        })
        .map(|entry| {
            let invocation = settings.invocation_for(&entry);
            (entry, invocation)
        })
        .collect()
}
