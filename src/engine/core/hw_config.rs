//! External encoder settings.
//!
//! Contains `EncoderSettings`: which binaries to run and which accelerator
//! device the VAAPI path binds to.

use std::path::PathBuf;
use std::time::Duration;

/// Render node used by VAAPI when nothing else is configured
pub const DEFAULT_VAAPI_DEVICE: &str = "/dev/dri/renderD128";

/// Upper bound for each capability probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// How the external encoder is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// ffmpeg binary (bare name resolved through PATH, or a full path)
    pub ffmpeg_path: PathBuf,

    /// vainfo binary used as a VAAPI pre-check. Missing vainfo is not fatal.
    pub vainfo_path: PathBuf,

    /// DRM render node the VAAPI device context is bound to
    pub vaapi_device: String,

    /// Synthetic probe encodes are killed after this long
    pub probe_timeout: Duration,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            vainfo_path: PathBuf::from("vainfo"),
            vaapi_device: DEFAULT_VAAPI_DEVICE.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}
