//! Running the external encoder as a child process.

use super::ffmpeg_cmd::Invocation;
use super::types::ProgressParser;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting on a bounded child
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("timed out after {}s", .0.as_secs_f32())]
    TimedOut(Duration),
    #[error("failed to run {}: {source}", .program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exit status plus captured streams of a finished child
#[derive(Debug)]
pub struct CapturedRun {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of a real transcode invocation
#[derive(Debug)]
pub struct EncoderRun {
    pub status: ExitStatus,
    pub stderr: String,
    pub progress: ProgressParser,
}

impl EncoderRun {
    /// Last lines of stderr, which is where ffmpeg explains a failure
    pub fn diagnostic(&self) -> String {
        tail_lines(&self.stderr, 10)
    }
}

fn spawn(invocation: &Invocation) -> Result<Child, InvokeError> {
    invocation
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                InvokeError::NotFound(invocation.program.clone())
            } else {
                InvokeError::Io {
                    program: invocation.program.clone(),
                    source: e,
                }
            }
        })
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(stream) = stream {
            for line in BufReader::new(stream).lines().map_while(Result::ok) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    })
}

/// Run a short command, killing it if it outlives `timeout`
pub fn run_with_timeout(
    invocation: &Invocation,
    timeout: Duration,
) -> Result<CapturedRun, InvokeError> {
    let mut child = spawn(invocation)?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let io_err = |source| InvokeError::Io {
        program: invocation.program.clone(),
        source,
    };

    let start = Instant::now();
    let status = loop {
        match child.try_wait().map_err(io_err)? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvokeError::TimedOut(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(CapturedRun {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// Start the encoder with piped stdout/stderr and no stdin
pub fn spawn_encoder(invocation: &Invocation) -> Result<Child, InvokeError> {
    spawn(invocation)
}

/// Drive a spawned encoder to completion.
///
/// `on_progress` sees every parsed `-progress` line.
pub fn wait_encoder<P>(
    invocation: &Invocation,
    mut child: Child,
    mut on_progress: P,
) -> Result<EncoderRun, InvokeError>
where
    P: FnMut(&ProgressParser),
{
    let stderr = drain(child.stderr.take());
    let mut progress = ProgressParser::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            progress.parse_line(&line);
            on_progress(&progress);
        }
    }

    let status = child.wait().map_err(|source| InvokeError::Io {
        program: invocation.program.clone(),
        source,
    })?;
    let stderr = stderr
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    Ok(EncoderRun {
        status,
        stderr,
        progress,
    })
}

/// Keep the last `n` non-empty lines of a block of output
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
