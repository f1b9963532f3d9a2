use super::hw_config::EncoderSettings;
use super::types::{EncodingProfile, FrameRate, Resolution};
use crate::engine::hardware::HwBackend;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Constant rate factor for libx264
pub const SOFTWARE_CRF: u32 = 23;

/// Speed preset shared by libx264 and h264_qsv
pub const SPEED_PRESET: &str = "faster";

/// Constant quantizer for h264_vaapi
pub const VAAPI_QP: u32 = 23;

/// Synthetic source used by the capability probes
const PROBE_SOURCE: &str = "testsrc=duration=1:size=320x240:rate=1";

/// A fully resolved external encoder invocation.
///
/// Building one has no side effects; the same inputs always produce the same
/// program and argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Arguments as UTF-8 (lossy), for display and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    /// Shell-quoted command line, suitable for copy/paste
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program.to_string_lossy();
        let mut parts = vec![program.into_owned()];
        parts.extend(self.args_lossy());
        match shlex::try_join(parts.iter().map(String::as_str)) {
            Ok(line) => write!(f, "{}", line),
            // Arguments with NUL bytes cannot be quoted; show them raw
            Err(_) => write!(f, "{}", parts.join(" ")),
        }
    }
}

/// Build the encoder invocation for one file on the selected backend
pub fn build_invocation(
    source: &Path,
    dest: &Path,
    profile: &EncodingProfile,
    backend: HwBackend,
    settings: &EncoderSettings,
) -> Invocation {
    match backend {
        HwBackend::Software => build_software_cmd(source, dest, profile, settings),
        HwBackend::Qsv => build_qsv_cmd(source, dest, profile, settings),
        HwBackend::Vaapi => build_vaapi_cmd(source, dest, profile, settings),
    }
}

fn fps_filter(frame_rate: &FrameRate) -> Option<String> {
    match frame_rate {
        FrameRate::Original => None,
        fixed => Some(format!("fps={}", fixed)),
    }
}

/// Attach the filter graph, only when at least one filter is active
fn apply_filters(cmd: &mut Invocation, filters: Vec<String>) {
    if !filters.is_empty() {
        cmd.arg("-vf").arg(filters.join(","));
    }
}

/// Progress reporting plus unconditional overwrite of the destination
fn apply_output(cmd: &mut Invocation, dest: &Path) {
    cmd.args(["-progress", "pipe:1", "-nostats", "-y"]);
    cmd.arg(dest);
}

/// Build libx264 software encoding command
pub fn build_software_cmd(
    source: &Path,
    dest: &Path,
    profile: &EncodingProfile,
    settings: &EncoderSettings,
) -> Invocation {
    let mut cmd = Invocation::new(&settings.ffmpeg_path);
    cmd.arg("-hide_banner");
    cmd.arg("-i").arg(source);

    let mut filters = Vec::new();
    if let Resolution::Fixed { width, height } = profile.resolution {
        filters.push(format!("scale={}x{}", width, height));
    }
    filters.extend(fps_filter(&profile.frame_rate));
    apply_filters(&mut cmd, filters);

    cmd.arg("-c:v").arg(HwBackend::Software.ffmpeg_name());
    cmd.arg("-preset").arg(SPEED_PRESET);
    cmd.arg("-crf").arg(SOFTWARE_CRF.to_string());
    cmd.arg("-threads").arg(profile.threads.to_string());
    apply_output(&mut cmd, dest);
    cmd
}

/// Build Intel Quick Sync encoding command (frames stay on the GPU)
pub fn build_qsv_cmd(
    source: &Path,
    dest: &Path,
    profile: &EncodingProfile,
    settings: &EncoderSettings,
) -> Invocation {
    let mut cmd = Invocation::new(&settings.ffmpeg_path);
    cmd.arg("-hide_banner");
    cmd.args(["-init_hw_device", "qsv=qsv"]);
    cmd.args(["-hwaccel", "qsv", "-hwaccel_output_format", "qsv"]);
    cmd.arg("-i").arg(source);

    let mut filters = Vec::new();
    if let Resolution::Fixed { width, height } = profile.resolution {
        filters.push(format!("scale_qsv={}x{}", width, height));
    }
    filters.extend(fps_filter(&profile.frame_rate));
    apply_filters(&mut cmd, filters);

    cmd.arg("-c:v").arg(HwBackend::Qsv.ffmpeg_name());
    cmd.arg("-preset").arg(SPEED_PRESET);
    cmd.arg("-threads").arg(profile.threads.to_string());
    apply_output(&mut cmd, dest);
    cmd
}

/// Build VAAPI encoding command bound to the configured render node.
/// Thread count does not apply to the VAAPI encoder and is omitted.
pub fn build_vaapi_cmd(
    source: &Path,
    dest: &Path,
    profile: &EncodingProfile,
    settings: &EncoderSettings,
) -> Invocation {
    let mut cmd = Invocation::new(&settings.ffmpeg_path);
    cmd.arg("-hide_banner");
    cmd.arg("-init_hw_device")
        .arg(format!("vaapi=va:{}", settings.vaapi_device));
    cmd.args(["-hwaccel", "vaapi", "-hwaccel_output_format", "vaapi"]);
    cmd.arg("-i").arg(source);

    let mut filters = Vec::new();
    if let Resolution::Fixed { width, height } = profile.resolution {
        // scale_vaapi takes w=/h= options rather than WxH
        filters.push(format!("scale_vaapi=w={}:h={}", width, height));
    }
    filters.extend(fps_filter(&profile.frame_rate));
    apply_filters(&mut cmd, filters);

    cmd.arg("-c:v").arg(HwBackend::Vaapi.ffmpeg_name());
    cmd.arg("-qp").arg(VAAPI_QP.to_string());
    apply_output(&mut cmd, dest);
    cmd
}

/// One-second synthetic encode through the backend, discarding the output.
/// Software needs no probe and returns `None`.
pub fn build_probe_cmd(backend: HwBackend, settings: &EncoderSettings) -> Option<Invocation> {
    let mut cmd = Invocation::new(&settings.ffmpeg_path);
    cmd.arg("-hide_banner");
    match backend {
        HwBackend::Software => return None,
        HwBackend::Qsv => {
            cmd.args(["-init_hw_device", "qsv=qsv"]);
            cmd.args(["-f", "lavfi", "-i", PROBE_SOURCE]);
            cmd.arg("-c:v").arg(HwBackend::Qsv.ffmpeg_name());
        }
        HwBackend::Vaapi => {
            cmd.arg("-init_hw_device")
                .arg(format!("vaapi=va:{}", settings.vaapi_device));
            cmd.args(["-filter_hw_device", "va"]);
            cmd.args(["-f", "lavfi", "-i", PROBE_SOURCE]);
            cmd.args(["-vf", "format=nv12,hwupload"]);
            cmd.arg("-c:v").arg(HwBackend::Vaapi.ffmpeg_name());
        }
    }
    cmd.args(["-t", "1", "-f", "null", "-"]);
    Some(cmd)
}
