use super::naming::{normalize_name, temp_name_for};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid resolution '{0}' (expected original, 1080p, 720p, 480p, 360p or WIDTHxHEIGHT)")]
    Resolution(String),
    #[error("invalid frame rate '{0}' (expected original, N or N/D with N, D > 0)")]
    FrameRate(String),
    #[error("invalid backend '{0}' (expected auto, software, qsv or vaapi)")]
    Backend(String),
}

/// Target output dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Original,
    Fixed { width: u32, height: u32 },
}

/// Resolution presets offered to the user, in menu order
pub const RESOLUTION_PRESETS: &[(&str, &str)] = &[
    ("1080p", "1080p (Full HD)"),
    ("720p", "720p (HD)"),
    ("480p", "480p (SD)"),
    ("360p", "360p"),
    ("original", "Keep original resolution"),
];

impl FromStr for Resolution {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let fixed = |width: u32, height: u32| -> Result<Self, ParseError> {
            Ok(Resolution::Fixed { width, height })
        };
        match lower.as_str() {
            "original" => Ok(Resolution::Original),
            "1080p" => fixed(1920, 1080),
            "720p" => fixed(1280, 720),
            "480p" => fixed(854, 480),
            "360p" => fixed(640, 360),
            other => {
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| ParseError::Resolution(s.to_string()))?;
                match (w.parse::<u32>(), h.parse::<u32>()) {
                    (Ok(width), Ok(height)) if width > 0 && height > 0 => fixed(width, height),
                    _ => Err(ParseError::Resolution(s.to_string())),
                }
            }
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Original => write!(f, "original"),
            Resolution::Fixed { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

/// Target output frame rate as a positive rational
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRate {
    #[default]
    Original,
    Fixed { num: u32, den: u32 },
}

/// Frame rate presets offered to the user, in menu order
pub const FRAME_RATE_PRESETS: &[(&str, &str)] = &[
    ("original", "Keep original FPS"),
    ("60", "60 FPS"),
    ("30", "30 FPS"),
    ("24", "24 FPS (Cinema)"),
    ("15", "15 FPS"),
    ("12", "12 FPS"),
];

impl FromStr for FrameRate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("original") {
            return Ok(FrameRate::Original);
        }
        let (num, den) = trimmed.split_once('/').unwrap_or((trimmed, "1"));
        match (num.parse::<u32>(), den.parse::<u32>()) {
            (Ok(num), Ok(den)) if num > 0 && den > 0 => Ok(FrameRate::Fixed { num, den }),
            _ => Err(ParseError::FrameRate(s.to_string())),
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRate::Original => write!(f, "original"),
            FrameRate::Fixed { num, den: 1 } => write!(f, "{}", num),
            FrameRate::Fixed { num, den } => write!(f, "{}/{}", num, den),
        }
    }
}

/// Immutable encode settings shared by every invocation in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfile {
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
    pub threads: u32,
}

impl EncodingProfile {
    pub fn new(resolution: Resolution, frame_rate: FrameRate, threads: u32) -> Self {
        Self {
            resolution,
            frame_rate,
            threads: threads.max(1),
        }
    }
}

/// A video file discovered in a planned directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub source_path: PathBuf,
    pub directory: PathBuf,
    pub raw_name: String,
    pub normalized_name: String,
}

impl MediaEntry {
    pub fn new(directory: &Path, raw_name: &str) -> Self {
        Self {
            source_path: directory.join(raw_name),
            directory: directory.to_path_buf(),
            raw_name: raw_name.to_string(),
            normalized_name: normalize_name(raw_name),
        }
    }

    /// Entry whose compressed output keeps the file's current name
    pub fn keeping_name(directory: &Path, raw_name: &str) -> Self {
        Self {
            normalized_name: raw_name.to_string(),
            ..Self::new(directory, raw_name)
        }
    }

    /// Whether the swap will also rename the file
    pub fn is_renamed(&self) -> bool {
        self.raw_name != self.normalized_name
    }

    /// Where the encoder writes while the entry is at risk
    pub fn temp_path(&self) -> PathBuf {
        self.directory.join(temp_name_for(&self.normalized_name))
    }

    /// Final location of the compressed file
    pub fn final_path(&self) -> PathBuf {
        self.directory.join(&self.normalized_name)
    }
}

/// Result of one attempt at an entry. Never retried within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TranscodeOutcome {
    Succeeded {
        original_bytes: u64,
        compressed_bytes: u64,
    },
    Failed {
        reason: String,
    },
    Skipped {
        reason: String,
    },
}

/// Parser for ffmpeg `-progress` output (key=value lines)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub speed: Option<f64>,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output
    pub fn parse_line(&mut self, line: &str) {
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "out_time_us" => {
                    if let Ok(us) = value.trim().parse::<u64>() {
                        self.out_time_us = us;
                    }
                }
                "speed" => {
                    // Speed is in format "1.23x", strip the 'x'
                    let speed_str = value.trim().trim_end_matches('x');
                    if let Ok(s) = speed_str.parse::<f64>() {
                        self.speed = Some(s);
                    }
                }
                "progress" => {
                    if value.trim() == "end" {
                        self.is_complete = true;
                    }
                }
                _ => {}
            }
        }
    }

    /// Encoded media time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }
}
