//! Per-file lifecycle: size, encode to a temporary, verify, swap into place.

use super::ffmpeg_cmd::Invocation;
use super::invoke::{InvokeError, spawn_encoder, wait_encoder};
use super::types::{MediaEntry, ProgressParser, TranscodeOutcome};
use crate::engine::interrupt::RunContext;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;
use tracing::{debug, warn};

/// Where an entry is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeState {
    Pending,
    Sizing,
    Invoking,
    Verifying,
    Swapping,
    Done,
    Failed,
    Skipped,
}

impl TranscodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }
}

/// Why an entry did not end in Done
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("file no longer exists")]
    EntryVanished,

    #[error("encoder failed ({status}): {diagnostic}")]
    InvocationFailed { status: String, diagnostic: String },

    #[error("could not start encoder: {0}")]
    Launch(#[from] InvokeError),

    #[error("conversion failed (output missing)")]
    OutputMissing,

    #[error("interrupted")]
    Interrupted,

    #[error("cannot rename: {} already exists", .0.display())]
    NameTaken(PathBuf),

    #[error(
        "original deleted but the compressed file could not be moved into place; it remains at {}: {}",
        .temp.display(),
        .source
    )]
    SwapIncomplete {
        temp: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected error: {0}")]
    Io(#[from] io::Error),
}

impl TranscodeError {
    pub fn into_outcome(self) -> TranscodeOutcome {
        match self {
            Self::EntryVanished | Self::Interrupted => TranscodeOutcome::Skipped {
                reason: self.to_string(),
            },
            _ => TranscodeOutcome::Failed {
                reason: self.to_string(),
            },
        }
    }
}

/// ffmpeg stopped because it was signalled rather than because it failed
fn was_signalled(status: &ExitStatus, stderr: &str) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if status.signal().is_some() {
            return true;
        }
    }
    #[cfg(not(unix))]
    let _ = status;

    stderr.contains("received signal")
}

fn remove_temp(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed temporary output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temporary output"),
    }
}

fn sizing(entry: &MediaEntry) -> Result<u64, TranscodeError> {
    match fs::metadata(&entry.source_path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TranscodeError::EntryVanished),
        Err(e) => Err(e.into()),
    }
}

/// Delete the original, then move the compressed file to the final name
fn swap(entry: &MediaEntry, temp: &Path) -> Result<(), TranscodeError> {
    let target = entry.final_path();
    // A file that appeared at the new name since listing must not be replaced
    if entry.is_renamed() && fs::symlink_metadata(&target).is_ok_and(|m| !m.is_dir()) {
        remove_temp(temp);
        return Err(TranscodeError::NameTaken(target));
    }

    match fs::remove_file(&entry.source_path) {
        Ok(()) => {}
        // Gone already; the compressed file is the only copy left to place
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(file = %entry.source_path.display(), "original vanished during encode");
        }
        Err(e) => {
            remove_temp(temp);
            return Err(e.into());
        }
    }

    fs::rename(temp, &target).map_err(|source| TranscodeError::SwapIncomplete {
        temp: temp.to_path_buf(),
        source,
    })
}

struct Transition<'a> {
    entry: &'a MediaEntry,
    state: TranscodeState,
}

impl Transition<'_> {
    fn to(&mut self, next: TranscodeState) {
        debug!(file = %self.entry.raw_name, from = ?self.state, to = ?next, "transcode state");
        self.state = next;
    }
}

/// Drive one entry through its lifecycle and record the outcome in `ctx`.
///
/// `invocation` must write to `entry.temp_path()`. The temporary file is
/// registered as at risk from launch until verification so an interrupt can
/// remove it; the swap runs under the interrupt swap guard and the outcome is
/// recorded before that guard is released.
pub fn transcode_entry<P>(
    ctx: &RunContext,
    entry: &MediaEntry,
    invocation: &Invocation,
    on_progress: P,
) -> TranscodeOutcome
where
    P: FnMut(&ProgressParser),
{
    let mut state = Transition {
        entry,
        state: TranscodeState::Pending,
    };

    let result = run(ctx, entry, invocation, on_progress, &mut state);
    let outcome = match result {
        Ok(outcome) => {
            state.to(TranscodeState::Done);
            outcome
        }
        Err(e) => {
            let outcome = e.into_outcome();
            state.to(match outcome {
                TranscodeOutcome::Skipped { .. } => TranscodeState::Skipped,
                _ => TranscodeState::Failed,
            });
            outcome
        }
    };
    debug_assert!(state.state.is_terminal());

    // Successful swaps were recorded under the swap guard
    if !matches!(outcome, TranscodeOutcome::Succeeded { .. }) {
        ctx.record(entry, &outcome);
    }
    outcome
}

fn run<P>(
    ctx: &RunContext,
    entry: &MediaEntry,
    invocation: &Invocation,
    on_progress: P,
    state: &mut Transition<'_>,
) -> Result<TranscodeOutcome, TranscodeError>
where
    P: FnMut(&ProgressParser),
{
    let temp = entry.temp_path();

    state.to(TranscodeState::Sizing);
    if !entry.source_path.exists() {
        return Err(TranscodeError::EntryVanished);
    }
    let original_bytes = sizing(entry)?;

    state.to(TranscodeState::Invoking);
    let at_risk = ctx.interrupt.mark_at_risk(&temp);
    let child = match at_risk.launch(|| spawn_encoder(invocation)) {
        Ok(Some(child)) => child,
        Ok(None) => return Err(TranscodeError::Interrupted),
        Err(e) => return Err(e.into()),
    };
    let run = wait_encoder(invocation, child, on_progress);
    at_risk.clear_pid();

    let run = match run {
        Ok(run) => run,
        Err(e) => {
            remove_temp(&temp);
            return Err(e.into());
        }
    };

    // A signalled encoder may still exit 0 with a truncated file
    if ctx.interrupt.is_interrupted() || was_signalled(&run.status, &run.stderr) {
        remove_temp(&temp);
        return Err(TranscodeError::Interrupted);
    }
    if !run.status.success() {
        remove_temp(&temp);
        let diagnostic = run.diagnostic();
        return Err(TranscodeError::InvocationFailed {
            status: run.status.to_string(),
            diagnostic: if diagnostic.is_empty() {
                "Unknown error".to_string()
            } else {
                diagnostic
            },
        });
    }

    state.to(TranscodeState::Verifying);
    let compressed_bytes = match fs::metadata(&temp) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(TranscodeError::OutputMissing),
        Err(e) => {
            remove_temp(&temp);
            return Err(e.into());
        }
    };

    let _swap = ctx.interrupt.swap_guard();
    if ctx.interrupt.is_interrupted() {
        remove_temp(&temp);
        return Err(TranscodeError::Interrupted);
    }
    drop(at_risk);

    state.to(TranscodeState::Swapping);
    swap(entry, &temp)?;

    let outcome = TranscodeOutcome::Succeeded {
        original_bytes,
        compressed_bytes,
    };
    ctx.record(entry, &outcome);
    Ok(outcome)
}
