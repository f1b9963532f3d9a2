// Global configuration management

use crate::engine::core::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_VAAPI_DEVICE, EncoderSettings, FrameRate, ParseError, Resolution,
};
use crate::engine::hardware::BackendChoice;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::System;

/// Upper bound for the automatic thread count
pub const AUTO_THREAD_CAP: u32 = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// original, 1080p, 720p, 480p, 360p or WIDTHxHEIGHT
    #[serde(default = "default_original")]
    pub resolution: String,

    /// original, N or N/D
    #[serde(default = "default_original")]
    pub fps: String,

    /// Encoder threads; 0 picks min(4, cores)
    #[serde(default)]
    pub threads: u32,

    /// auto, software, qsv or vaapi
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_vainfo_path")]
    pub vainfo_path: PathBuf,

    #[serde(default = "default_vaapi_device")]
    pub vaapi_device: String,

    /// Seconds before a capability probe is abandoned
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Where compression_log_*.txt files go (current directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_original() -> String {
    "original".to_string()
}

fn default_backend() -> String {
    "auto".to_string()
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_vainfo_path() -> PathBuf {
    PathBuf::from("vainfo")
}

fn default_vaapi_device() -> String {
    DEFAULT_VAAPI_DEVICE.to_string()
}

fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            resolution: default_original(),
            fps: default_original(),
            threads: 0,
            backend: default_backend(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            vainfo_path: default_vainfo_path(),
            vaapi_device: default_vaapi_device(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl DefaultsConfig {
    pub fn resolution(&self) -> Result<Resolution, ParseError> {
        self.resolution.parse()
    }

    pub fn frame_rate(&self) -> Result<FrameRate, ParseError> {
        self.fps.parse()
    }

    pub fn backend(&self) -> Result<BackendChoice, ParseError> {
        self.backend.parse()
    }

    /// Configured thread count, with 0 resolved against the machine
    pub fn threads(&self) -> u32 {
        resolve_threads(self.threads, available_cores())
    }
}

impl EncoderConfig {
    pub fn to_settings(&self) -> EncoderSettings {
        EncoderSettings {
            ffmpeg_path: self.ffmpeg_path.clone(),
            vainfo_path: self.vainfo_path.clone(),
            vaapi_device: self.vaapi_device.clone(),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs.max(1)),
        }
    }
}

/// Logical CPUs reported by the OS (at least 1)
pub fn available_cores() -> u32 {
    let mut system = System::new();
    system.refresh_cpu();
    (system.cpus().len() as u32).max(1)
}

/// 0 means auto: min(4, cores). Anything else is clamped to 1..=cores.
pub fn resolve_threads(requested: u32, cores: u32) -> u32 {
    let cores = cores.max(1);
    match requested {
        0 => AUTO_THREAD_CAP.min(cores),
        n => n.clamp(1, cores),
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("squeeze")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("squeeze")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only home still gets the built-in defaults
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!(error = %format!("{:#}", e), "could not create default config file");
                eprintln!(
                    "Using built-in defaults. Run 'squeeze init-config' to create a config file."
                );
            }

            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Directory the run log is written to
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
