pub mod ffmpeg_runner;
pub mod fixtures;
