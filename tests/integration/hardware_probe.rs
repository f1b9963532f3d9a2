// Backend probing against stand-in ffmpeg/vainfo binaries

use crate::common::fixtures::write_script;
use squeeze::engine::{
    BackendChoice, EncoderSettings, HwBackend, probe_backends, select_backend,
};
use std::time::Duration;
use tempfile::TempDir;

fn settings(dir: &TempDir, ffmpeg_exit: i32) -> EncoderSettings {
    let device = dir.path().join("renderD128");
    std::fs::write(&device, b"").unwrap();
    EncoderSettings {
        ffmpeg_path: write_script(dir.path(), "ffmpeg", &format!("exit {}", ffmpeg_exit)),
        vainfo_path: dir.path().join("no-vainfo"),
        vaapi_device: device.to_string_lossy().into_owned(),
        probe_timeout: Duration::from_secs(5),
    }
}

#[test]
fn working_encoder_selects_vaapi_first() {
    let dir = TempDir::new().unwrap();
    let probes = probe_backends(&settings(&dir, 0));

    assert_eq!(probes.len(), 3);
    assert!(probes.iter().all(|p| p.available));
    assert_eq!(select_backend(&probes, BackendChoice::Auto), HwBackend::Vaapi);
    assert_eq!(
        select_backend(&probes, BackendChoice::Force(HwBackend::Qsv)),
        HwBackend::Qsv
    );
}

#[test]
fn failing_probe_encodes_fall_back_to_software() {
    let dir = TempDir::new().unwrap();
    let probes = probe_backends(&settings(&dir, 1));

    let software = probes
        .iter()
        .find(|p| p.backend == HwBackend::Software)
        .unwrap();
    assert!(software.available);
    assert!(
        probes
            .iter()
            .filter(|p| p.backend.is_hardware())
            .all(|p| !p.available)
    );
    assert_eq!(
        select_backend(&probes, BackendChoice::Force(HwBackend::Vaapi)),
        HwBackend::Software
    );
}

#[test]
fn vainfo_without_h264_encode_blocks_vaapi() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir, 0);
    settings.vainfo_path = write_script(
        dir.path(),
        "vainfo",
        "echo '      VAProfileH264Main               :\tVAEntrypointVLD'",
    );

    let probes = probe_backends(&settings);
    let vaapi = probes.iter().find(|p| p.backend == HwBackend::Vaapi).unwrap();
    assert!(!vaapi.available);
    assert!(vaapi.reason.contains("H.264"));
    assert_eq!(select_backend(&probes, BackendChoice::Auto), HwBackend::Qsv);
}
