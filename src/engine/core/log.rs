use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Append-only run report: every line goes to the log file as
/// `[YYYY-mm-dd HH:MM:SS] message` and, unless quiet, to stdout.
///
/// Shared between the processing loop and the interrupt handler.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
    echo: bool,
}

impl RunLog {
    /// Create `compression_log_YYYYmmdd_HHMMSS.txt` inside `dir`
    pub fn create_in(dir: &Path, echo: bool) -> Result<Self> {
        let name = format!(
            "compression_log_{}.txt",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        Self::open(&dir.join(name), echo)
    }

    /// Append to an explicit file, creating it if needed
    pub fn open(path: &Path, echo: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            echo,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one report line. A failed file write goes to tracing and the run carries on.
    pub fn line(&self, message: impl AsRef<str>) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let formatted = format!("[{}] {}", timestamp, message.as_ref());

        if self.echo {
            println!("{}", formatted);
        }

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", formatted) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append to run log");
        }
    }

    /// Horizontal rule used between report sections
    pub fn rule(&self, c: char) {
        self.line(c.to_string().repeat(80));
    }
}
