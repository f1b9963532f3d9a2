// Snapshot tests for the encoder command line of each backend

use squeeze::engine::{
    EncoderSettings, EncodingProfile, HwBackend, Invocation, build_invocation, build_probe_cmd,
};
use std::path::Path;

fn render(inv: &Invocation) -> String {
    let mut parts = vec![inv.program.to_string_lossy().into_owned()];
    parts.extend(inv.args_lossy());
    parts.join(" ")
}

fn command(backend: HwBackend, resolution: &str, fps: &str) -> String {
    let profile = EncodingProfile::new(resolution.parse().unwrap(), fps.parse().unwrap(), 4);
    render(&build_invocation(
        Path::new("/in/a.mp4"),
        Path::new("/in/temp_a.mp4"),
        &profile,
        backend,
        &EncoderSettings::default(),
    ))
}

#[test]
fn software_scaled() {
    insta::assert_snapshot!(
        command(HwBackend::Software, "720p", "30"),
        @"ffmpeg -hide_banner -i /in/a.mp4 -vf scale=1280x720,fps=30 -c:v libx264 -preset faster -crf 23 -threads 4 -progress pipe:1 -nostats -y /in/temp_a.mp4"
    );
}

#[test]
fn software_original_has_no_filters() {
    insta::assert_snapshot!(
        command(HwBackend::Software, "original", "original"),
        @"ffmpeg -hide_banner -i /in/a.mp4 -c:v libx264 -preset faster -crf 23 -threads 4 -progress pipe:1 -nostats -y /in/temp_a.mp4"
    );
}

#[test]
fn qsv_scaled() {
    insta::assert_snapshot!(
        command(HwBackend::Qsv, "720p", "30"),
        @"ffmpeg -hide_banner -init_hw_device qsv=qsv -hwaccel qsv -hwaccel_output_format qsv -i /in/a.mp4 -vf scale_qsv=1280x720,fps=30 -c:v h264_qsv -preset faster -threads 4 -progress pipe:1 -nostats -y /in/temp_a.mp4"
    );
}

#[test]
fn vaapi_scaled_ntsc() {
    insta::assert_snapshot!(
        command(HwBackend::Vaapi, "480p", "30000/1001"),
        @"ffmpeg -hide_banner -init_hw_device vaapi=va:/dev/dri/renderD128 -hwaccel vaapi -hwaccel_output_format vaapi -i /in/a.mp4 -vf scale_vaapi=w=854:h=480,fps=30000/1001 -c:v h264_vaapi -qp 23 -progress pipe:1 -nostats -y /in/temp_a.mp4"
    );
}

#[test]
fn vaapi_probe_uploads_frames() {
    let inv = build_probe_cmd(HwBackend::Vaapi, &EncoderSettings::default()).unwrap();
    insta::assert_snapshot!(
        render(&inv),
        @"ffmpeg -hide_banner -init_hw_device vaapi=va:/dev/dri/renderD128 -filter_hw_device va -f lavfi -i testsrc=duration=1:size=320x240:rate=1 -vf format=nv12,hwupload -c:v h264_vaapi -t 1 -f null -"
    );
    assert!(build_probe_cmd(HwBackend::Software, &EncoderSettings::default()).is_none());
}

#[test]
fn paths_with_spaces_stay_single_arguments() {
    let profile = EncodingProfile::new("original".parse().unwrap(), "original".parse().unwrap(), 2);
    let inv = build_invocation(
        Path::new("/videos/Module 1/intro part.mp4"),
        Path::new("/videos/Module 1/temp_intro_part.mp4"),
        &profile,
        HwBackend::Software,
        &EncoderSettings::default(),
    );
    let args = inv.args_lossy();
    assert!(args.contains(&"/videos/Module 1/intro part.mp4".to_string()));
    assert_eq!(args.last().unwrap(), "/videos/Module 1/temp_intro_part.mp4");
}
