//! Cooperative cancellation and the state shared with the interrupt handler.
//!
//! The processing loop owns the run; the handler thread only ever sets the
//! interrupted flag, terminates the in-flight encoder, deletes the at-risk
//! temporary file and prints the summary.

use crate::engine::core::{MediaEntry, RunLog, TranscodeOutcome};
use crate::stats::RunStatistics;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Exit status used after a user interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug)]
struct AtRisk {
    path: PathBuf,
    pid: Option<u32>,
}

/// Interrupted flag plus the temporary file that must not outlive an abort
#[derive(Debug, Default)]
pub struct InterruptState {
    interrupted: AtomicBool,
    at_risk: Mutex<Option<AtRisk>>,
    swap_lock: Mutex<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked by the loop at the top of every directory and file
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn request_interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Mark `path` as at risk until the returned guard is dropped
    pub fn mark_at_risk(&self, path: &Path) -> AtRiskGuard<'_> {
        *lock(&self.at_risk) = Some(AtRisk {
            path: path.to_path_buf(),
            pid: None,
        });
        AtRiskGuard { state: self }
    }

    pub fn at_risk_path(&self) -> Option<PathBuf> {
        lock(&self.at_risk).as_ref().map(|r| r.path.clone())
    }

    /// Held across delete-original/move-temp so a graceful interrupt cannot
    /// split the pair
    pub fn swap_guard(&self) -> MutexGuard<'_, ()> {
        lock(&self.swap_lock)
    }

    /// Terminate the in-flight encoder and delete the at-risk file.
    /// Returns the path that was removed, if any.
    pub fn cleanup_at_risk(&self) -> io::Result<Option<PathBuf>> {
        let Some(at_risk) = lock(&self.at_risk).take() else {
            return Ok(None);
        };

        if let Some(pid) = at_risk.pid {
            terminate(pid);
        }

        match fs::remove_file(&at_risk.path) {
            Ok(()) => Ok(Some(at_risk.path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Clears the at-risk marker when the entry's outcome is settled
#[derive(Debug)]
pub struct AtRiskGuard<'a> {
    state: &'a InterruptState,
}

impl AtRiskGuard<'_> {
    /// Start the encoder and record its PID while holding the at-risk lock.
    ///
    /// Returns `Ok(None)` without calling `spawn` once an interrupt has been
    /// requested. Either the handler's cleanup sees the PID, or the launch
    /// sees the interrupt.
    pub fn launch<E>(&self, spawn: impl FnOnce() -> Result<Child, E>) -> Result<Option<Child>, E> {
        let mut at_risk = lock(&self.state.at_risk);
        if self.state.is_interrupted() {
            return Ok(None);
        }
        let child = spawn()?;
        match at_risk.as_mut() {
            Some(entry) => entry.pid = Some(child.id()),
            None => debug!(pid = child.id(), "encoder launched without an at-risk entry"),
        }
        Ok(Some(child))
    }

    /// Forget the PID once the child has been reaped
    pub fn clear_pid(&self) {
        if let Some(at_risk) = lock(&self.state.at_risk).as_mut() {
            at_risk.pid = None;
        }
    }
}

impl Drop for AtRiskGuard<'_> {
    fn drop(&mut self) {
        lock(&self.state.at_risk).take();
    }
}

#[cfg(unix)]
fn terminate(pid: u32) {
    debug!(pid, "terminating encoder");
    // SAFETY: kill(2) has no memory-safety preconditions; a stale PID at worst
    // yields ESRCH.
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(pid: u32) {
    debug!(pid, "encoder termination is unix-only; relying on console Ctrl+C");
}

/// Everything a run shares between the processing loop and the interrupt handler
#[derive(Debug)]
pub struct RunContext {
    pub interrupt: InterruptState,
    pub log: RunLog,
    stats: Mutex<RunStatistics>,
    summary_emitted: AtomicBool,
}

impl RunContext {
    pub fn new(log: RunLog) -> Self {
        Self {
            interrupt: InterruptState::new(),
            log,
            stats: Mutex::new(RunStatistics::default()),
            summary_emitted: AtomicBool::new(false),
        }
    }

    /// Mutate the statistics. Only the processing loop calls this.
    pub fn update_stats<R>(&self, f: impl FnOnce(&mut RunStatistics) -> R) -> R {
        f(&mut lock(&self.stats))
    }

    /// Record a finalized outcome for an entry
    pub fn record(&self, entry: &MediaEntry, outcome: &TranscodeOutcome) {
        self.update_stats(|stats| stats.record_outcome(&entry.directory, entry, outcome));
    }

    /// Copy of the statistics as they stand
    pub fn stats(&self) -> RunStatistics {
        lock(&self.stats).clone()
    }

    pub fn summary_emitted(&self) -> bool {
        self.summary_emitted.load(Ordering::SeqCst)
    }

    /// Write the global summary to the run log. Only the first call prints.
    pub fn emit_summary(&self) {
        if self.summary_emitted.swap(true, Ordering::SeqCst) {
            return;
        }
        let stats = self.stats();
        for line in stats.summary_lines() {
            self.log.line(line);
        }
        self.log
            .line(format!("Detailed log saved to: {}", self.log.path().display()));
        self.log.rule('=');
    }

    /// Interrupt handler body: flag, wait out any swap, clean up, report.
    /// The caller decides whether to exit the process afterwards.
    pub fn handle_interrupt(&self) {
        self.interrupt.request_interrupt();
        self.log.line("Received interrupt signal. Cleaning up...");

        let _swap = self.interrupt.swap_guard();
        match self.interrupt.cleanup_at_risk() {
            Ok(Some(path)) => self
                .log
                .line(format!("Cleaned up temporary file: {}", path.display())),
            Ok(None) => {}
            Err(e) => self
                .log
                .line(format!("Error cleaning up temporary file: {}", e)),
        }

        self.emit_summary();
    }
}

/// Route Ctrl+C, SIGTERM and SIGHUP to [`RunContext::handle_interrupt`], then exit
pub fn install_handler(ctx: Arc<RunContext>) -> Result<()> {
    ctrlc::set_handler(move || {
        ctx.handle_interrupt();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("Failed to install interrupt handler")
}
