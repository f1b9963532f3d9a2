// Batch re-encoding engine - independent of the CLI

pub mod core;
pub mod hardware;
pub mod interrupt;
pub mod runner;

pub use core::*;
pub use hardware::{BackendChoice, HardwareProbe, HwBackend, probe_backends, select_backend};
pub use interrupt::{INTERRUPTED_EXIT_CODE, InterruptState, RunContext, install_handler};
pub use runner::{RunSettings, plan_invocations, run_plan};
