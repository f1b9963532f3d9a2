pub mod config;
pub mod engine;
pub mod prompt;
pub mod stats;
