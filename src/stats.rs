// Statistics tracking and summaries

use crate::engine::core::{MediaEntry, TranscodeOutcome};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Counters for one planned directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    pub path: PathBuf,

    /// Eligible files listed when the directory was entered
    pub found: usize,

    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub renamed: usize,

    /// Bytes of originals that were successfully replaced
    pub original_bytes: u64,

    /// Bytes of the compressed files that replaced them
    pub compressed_bytes: u64,
}

impl DirectoryStats {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    fn record(&mut self, entry: &MediaEntry, outcome: &TranscodeOutcome) {
        match outcome {
            TranscodeOutcome::Succeeded {
                original_bytes,
                compressed_bytes,
            } => {
                self.processed += 1;
                self.original_bytes += original_bytes;
                self.compressed_bytes += compressed_bytes;
                if entry.is_renamed() {
                    self.renamed += 1;
                }
            }
            TranscodeOutcome::Failed { .. } => self.failed += 1,
            TranscodeOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Per-directory report. Empty when nothing was replaced.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.original_bytes == 0 {
            return Vec::new();
        }
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());

        let mut lines = vec![
            format!("Folder '{}' summary:", name),
            format!("  Videos processed: {}", self.processed),
            format!("  Videos failed: {}", self.failed),
            format!("  Original size: {}", format_bytes(self.original_bytes)),
            format!("  Compressed size: {}", format_bytes(self.compressed_bytes)),
        ];
        lines.extend(
            size_change_lines(self.original_bytes, self.compressed_bytes, false)
                .into_iter()
                .map(|l| format!("  {}", l)),
        );
        lines
    }
}

/// Aggregate for a whole run. Written only by the processing loop.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub total_dirs: usize,
    pub processed_dirs: usize,
    pub total_videos: usize,
    pub processed_videos: usize,
    pub failed_videos: usize,
    pub skipped_videos: usize,
    pub renamed_videos: usize,
    pub total_original_bytes: u64,
    pub total_compressed_bytes: u64,
    pub directories: Vec<DirectoryStats>,
    pub started: Instant,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self {
            total_dirs: 0,
            processed_dirs: 0,
            total_videos: 0,
            processed_videos: 0,
            failed_videos: 0,
            skipped_videos: 0,
            renamed_videos: 0,
            total_original_bytes: 0,
            total_compressed_bytes: 0,
            directories: Vec::new(),
            started: Instant::now(),
        }
    }
}

impl RunStatistics {
    /// Start counting a directory that holds `found` eligible files
    pub fn begin_directory(&mut self, dir: &Path, found: usize) {
        self.total_videos += found;
        let mut stats = DirectoryStats::new(dir);
        stats.found = found;
        self.directories.push(stats);
    }

    pub fn finish_directory(&mut self) {
        self.processed_dirs += 1;
    }

    pub fn directory(&self, dir: &Path) -> Option<&DirectoryStats> {
        self.directories.iter().rev().find(|d| d.path == dir)
    }

    fn directory_mut(&mut self, dir: &Path) -> &mut DirectoryStats {
        // Almost always the directory currently being processed
        match self.directories.iter().rposition(|d| d.path == dir) {
            Some(index) => &mut self.directories[index],
            None => {
                self.directories.push(DirectoryStats::new(dir));
                let last = self.directories.len() - 1;
                &mut self.directories[last]
            }
        }
    }

    /// Fold one finalized outcome into the directory and global counters
    pub fn record_outcome(&mut self, dir: &Path, entry: &MediaEntry, outcome: &TranscodeOutcome) {
        self.directory_mut(dir).record(entry, outcome);

        match outcome {
            TranscodeOutcome::Succeeded {
                original_bytes,
                compressed_bytes,
            } => {
                self.processed_videos += 1;
                self.total_original_bytes += original_bytes;
                self.total_compressed_bytes += compressed_bytes;
                if entry.is_renamed() {
                    self.renamed_videos += 1;
                }
            }
            TranscodeOutcome::Failed { .. } => self.failed_videos += 1,
            TranscodeOutcome::Skipped { .. } => self.skipped_videos += 1,
        }
    }

    /// Global report, printable at any point of the run
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=".repeat(80),
            "PROCESSING SUMMARY:".to_string(),
            format!(
                "Directories processed: {}/{}",
                self.processed_dirs, self.total_dirs
            ),
            format!("Videos found: {}", self.total_videos),
            format!("Videos successfully processed: {}", self.processed_videos),
            format!("Videos failed: {}", self.failed_videos),
            format!("Videos skipped: {}", self.skipped_videos),
            format!("Videos renamed: {}", self.renamed_videos),
            format!(
                "Total original size: {}",
                format_bytes(self.total_original_bytes)
            ),
            format!(
                "Total compressed size: {}",
                format_bytes(self.total_compressed_bytes)
            ),
        ];
        if self.total_original_bytes > 0 {
            lines.extend(size_change_lines(
                self.total_original_bytes,
                self.total_compressed_bytes,
                true,
            ));
        }
        lines.push(format!(
            "Elapsed: {}",
            format_duration(self.started.elapsed().as_secs_f64())
        ));
        lines
    }
}

/// Percentage of `original` saved by `compressed`. Negative when the file grew.
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

/// Saved-and-reduction pair, or the increase equivalent
fn size_change_lines(original: u64, compressed: u64, overall: bool) -> [String; 2] {
    let percent = reduction_percent(original, compressed);
    let (space, prefix) = if overall {
        ("Total space", "Overall ")
    } else {
        ("Space", "")
    };
    let ratio = |word: &str| {
        if overall {
            format!("{}{}", prefix, word.to_lowercase())
        } else {
            word.to_string()
        }
    };

    if original > compressed {
        [
            format!("{} saved: {}", space, format_bytes(original - compressed)),
            format!("{}: {:.2}%", ratio("Reduction"), percent),
        ]
    } else {
        [
            format!("{} increased: {}", space, format_bytes(compressed - original)),
            format!("{}: {:.2}%", ratio("Increase"), -percent),
        ]
    }
}

/// One-line result for a single converted file
pub fn describe_change(original: u64, compressed: u64) -> String {
    let percent = reduction_percent(original, compressed);
    if original > compressed {
        format!(
            "Reduction: {:.2}% (saved {})",
            percent,
            format_bytes(original - compressed)
        )
    } else {
        format!(
            "Increase: {:.2}% (added {})",
            -percent,
            format_bytes(compressed - original)
        )
    }
}

/// Format bytes as human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in seconds as human-readable time
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// `HH:MM:SS` clock for the live progress line
pub fn format_clock(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}
