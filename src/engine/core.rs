mod ffmpeg_cmd;
mod ffmpeg_info;
mod hw_config;
mod invoke;
mod log;
mod naming;
mod scan;
mod transcode;
mod types;

pub use ffmpeg_cmd::{
    Invocation, SOFTWARE_CRF, SPEED_PRESET, VAAPI_QP, build_invocation, build_probe_cmd,
    build_qsv_cmd, build_software_cmd, build_vaapi_cmd,
};
pub use ffmpeg_info::ffmpeg_version;
pub use hw_config::{DEFAULT_PROBE_TIMEOUT, DEFAULT_VAAPI_DEVICE, EncoderSettings};
pub use invoke::{
    CapturedRun, EncoderRun, InvokeError, run_with_timeout, spawn_encoder, tail_lines,
    wait_encoder,
};
pub use log::RunLog;
pub use naming::{
    NaturalKey, TEMP_PREFIX, VIDEO_EXTENSIONS, has_video_extension, is_eligible, natural_cmp,
    natural_sort_key, normalize_name, temp_name_for,
};
pub use scan::{
    CandidateDirectory, DirectoryPlan, base_name, discover, find_orphaned_temporaries,
    has_eligible_media, list_media, select_start_offset,
};
pub use transcode::{TranscodeError, TranscodeState, transcode_entry};
pub use types::{
    EncodingProfile, FRAME_RATE_PRESETS, FrameRate, MediaEntry, ParseError, ProgressParser,
    RESOLUTION_PRESETS, Resolution, TranscodeOutcome,
};
