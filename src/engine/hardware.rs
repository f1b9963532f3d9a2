//! Hardware encoding detection and backend selection

use crate::engine::core::{
    EncoderSettings, Invocation, InvokeError, ParseError, build_probe_cmd, run_with_timeout,
    tail_lines,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// vainfo only lists capabilities, so it gets a shorter leash than a probe encode
const VAINFO_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Backend Selection
// ============================================================================

/// Encoding execution paths, one H.264 encoder each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HwBackend {
    Software, // libx264
    Qsv,      // Intel Quick Sync
    Vaapi,    // VA-API (Intel/AMD)
}

impl HwBackend {
    /// Selection order, best first. Software is the fallback and always last.
    pub const PRIORITY: [HwBackend; 3] = [HwBackend::Vaapi, HwBackend::Qsv, HwBackend::Software];

    /// Position in [`HwBackend::PRIORITY`] (0 = preferred)
    pub fn rank(&self) -> usize {
        match self {
            Self::Vaapi => 0,
            Self::Qsv => 1,
            Self::Software => 2,
        }
    }

    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Software => "libx264",
            Self::Qsv => "h264_qsv",
            Self::Vaapi => "h264_vaapi",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Software)
    }

    /// Get user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Software => "Software (libx264)",
            Self::Qsv => "Intel Quick Sync",
            Self::Vaapi => "VAAPI",
        }
    }
}

impl fmt::Display for HwBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Software => "software",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
        };
        write!(f, "{}", name)
    }
}

/// User preference for the backend: probe and rank, or insist on one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    #[default]
    Auto,
    Force(HwBackend),
}

impl FromStr for BackendChoice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "software" | "sw" | "cpu" => Ok(Self::Force(HwBackend::Software)),
            "qsv" => Ok(Self::Force(HwBackend::Qsv)),
            "vaapi" => Ok(Self::Force(HwBackend::Vaapi)),
            _ => Err(ParseError::Backend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Force(backend) => write!(f, "{}", backend),
        }
    }
}

// ============================================================================
// Capability Probing
// ============================================================================

/// Result of probing one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareProbe {
    pub backend: HwBackend,
    pub available: bool,
    pub reason: String,
}

impl HardwareProbe {
    fn available(backend: HwBackend, reason: impl Into<String>) -> Self {
        Self {
            backend,
            available: true,
            reason: reason.into(),
        }
    }

    fn unavailable(backend: HwBackend, reason: impl Into<String>) -> Self {
        Self {
            backend,
            available: false,
            reason: reason.into(),
        }
    }
}

/// Probe every backend once, in priority order. Never fails: problems are
/// reported as unavailable with a reason.
pub fn probe_backends(settings: &EncoderSettings) -> Vec<HardwareProbe> {
    HwBackend::PRIORITY
        .iter()
        .map(|backend| probe_backend(*backend, settings))
        .collect()
}

/// Probe a single backend
pub fn probe_backend(backend: HwBackend, settings: &EncoderSettings) -> HardwareProbe {
    let probe = match backend {
        HwBackend::Software => {
            HardwareProbe::available(backend, "Software encoding is always available")
        }
        HwBackend::Qsv => run_probe_encode(backend, settings),
        HwBackend::Vaapi => match vaapi_precheck(settings) {
            Some(blocked) => blocked,
            None => run_probe_encode(backend, settings),
        },
    };
    debug!(
        backend = %probe.backend,
        available = probe.available,
        reason = %probe.reason,
        "capability probe"
    );
    probe
}

/// Pick the best available backend.
///
/// With [`BackendChoice::Force`], the forced backend wins if its probe passed;
/// otherwise the ranking is used as if `Auto` had been requested.
pub fn select_backend(probes: &[HardwareProbe], choice: BackendChoice) -> HwBackend {
    let is_available = |backend: HwBackend| {
        backend == HwBackend::Software
            || probes
                .iter()
                .any(|p| p.backend == backend && p.available)
    };

    if let BackendChoice::Force(forced) = choice {
        if is_available(forced) {
            return forced;
        }
        warn!(backend = %forced, "requested backend unavailable, falling back to automatic selection");
    }

    HwBackend::PRIORITY
        .into_iter()
        .find(|backend| is_available(*backend))
        .unwrap_or(HwBackend::Software)
}

fn run_probe_encode(backend: HwBackend, settings: &EncoderSettings) -> HardwareProbe {
    let Some(cmd) = build_probe_cmd(backend, settings) else {
        return HardwareProbe::available(backend, "No probe required");
    };

    match run_with_timeout(&cmd, settings.probe_timeout) {
        Ok(run) if run.status.success() => HardwareProbe::available(
            backend,
            format!("{} hardware acceleration available", backend.display_name()),
        ),
        Ok(run) => {
            debug!(backend = %backend, stderr = %tail_lines(&run.stderr, 5), "probe encode failed");
            HardwareProbe::unavailable(
                backend,
                format!("{} test encode failed ({})", backend.display_name(), run.status),
            )
        }
        Err(InvokeError::NotFound(program)) => {
            HardwareProbe::unavailable(backend, format!("{} not found", program.display()))
        }
        Err(InvokeError::TimedOut(_)) => HardwareProbe::unavailable(
            backend,
            format!("{} test timed out", backend.display_name()),
        ),
        Err(e) => HardwareProbe::unavailable(
            backend,
            format!("Error testing {}: {}", backend.display_name(), e),
        ),
    }
}

/// Cheap VAAPI checks before spending a probe encode. `Some` means unavailable.
fn vaapi_precheck(settings: &EncoderSettings) -> Option<HardwareProbe> {
    let backend = HwBackend::Vaapi;

    if !Path::new(&settings.vaapi_device).exists() {
        let found = detect_render_device()
            .map(|d| format!(" (found {})", d))
            .unwrap_or_default();
        return Some(HardwareProbe::unavailable(
            backend,
            format!("Render device {} missing{}", settings.vaapi_device, found),
        ));
    }

    let vainfo = Invocation::new(&settings.vainfo_path);
    match run_with_timeout(&vainfo, VAINFO_TIMEOUT) {
        Ok(run) if !run.status.success() => Some(HardwareProbe::unavailable(
            backend,
            "vainfo reports no usable VAAPI device",
        )),
        Ok(run) if !vainfo_supports_h264_encode(&run.stdout) => Some(HardwareProbe::unavailable(
            backend,
            "VAAPI available but H.264 encoding not supported",
        )),
        Ok(_) => None,
        // vainfo is optional tooling; let the probe encode decide
        Err(InvokeError::NotFound(_)) => None,
        Err(InvokeError::TimedOut(_)) => Some(HardwareProbe::unavailable(
            backend,
            "vainfo test timed out",
        )),
        Err(e) => Some(HardwareProbe::unavailable(
            backend,
            format!("Error checking VAAPI: {}", e),
        )),
    }
}

/// Look for an H.264 profile with an encode entrypoint in `vainfo` output
pub fn vainfo_supports_h264_encode(output: &str) -> bool {
    output.lines().any(|line| {
        let lower = line.to_ascii_lowercase();
        lower.contains("vaprofileh264") && lower.contains("entrypointenc")
    })
}

/// Detect available render device
/// Scans /dev/dri/renderD* and returns the first available
pub fn detect_render_device() -> Option<String> {
    let dri_path = Path::new("/dev/dri");

    if !dri_path.exists() {
        return None;
    }

    let mut devices: Vec<_> = std::fs::read_dir(dri_path)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("renderD"))
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();

    // Sort to get renderD128 before renderD129, etc.
    devices.sort();

    devices.first().map(|p| p.to_string_lossy().to_string())
}
