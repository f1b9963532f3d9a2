// Interactive numbered menus for values not given on the command line

use crate::engine::core::{FRAME_RATE_PRESETS, FrameRate, RESOLUTION_PRESETS, Resolution, base_name};
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Operation cancelled by user.")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type PromptResult<T> = Result<T, PromptError>;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

/// Prompter bound to the process's stdin/stdout
pub fn stdio() -> Prompter<io::StdinLock<'static>, io::Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// One trimmed line; end of input counts as cancellation
    fn ask(&mut self, question: &str) -> PromptResult<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    pub fn header(&mut self) -> PromptResult<()> {
        writeln!(self.output, "\n{}", "=".repeat(50))?;
        writeln!(self.output, "ENCODING CONFIGURATION")?;
        writeln!(self.output, "{}", "=".repeat(50))?;
        Ok(())
    }

    pub fn choose_resolution(&mut self) -> PromptResult<Resolution> {
        writeln!(self.output, "\nSelect target resolution:")?;
        for (i, (_, desc)) in RESOLUTION_PRESETS.iter().enumerate() {
            writeln!(self.output, "  {}: {}", i + 1, desc)?;
        }
        let last = RESOLUTION_PRESETS.len();

        loop {
            let choice = self.ask(&format!("\nEnter choice (1-{}): ", last))?;
            let picked = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| RESOLUTION_PRESETS.get(i));
            if let Some((value, desc)) = picked {
                if let Ok(resolution) = value.parse() {
                    writeln!(self.output, "Selected: {}", desc)?;
                    return Ok(resolution);
                }
            }
            writeln!(self.output, "Invalid choice. Please enter 1-{}.", last)?;
        }
    }

    pub fn choose_frame_rate(&mut self) -> PromptResult<FrameRate> {
        writeln!(self.output, "\nSelect target FPS:")?;
        for (i, (_, desc)) in FRAME_RATE_PRESETS.iter().enumerate() {
            writeln!(self.output, "  {}: {}", i, desc)?;
        }
        let last = FRAME_RATE_PRESETS.len() - 1;

        loop {
            let choice = self.ask(&format!("\nEnter choice (0-{}): ", last))?;
            let picked = choice
                .parse::<usize>()
                .ok()
                .and_then(|i| FRAME_RATE_PRESETS.get(i));
            if let Some((value, desc)) = picked {
                if let Ok(frame_rate) = value.parse() {
                    writeln!(self.output, "Selected: {}", desc)?;
                    return Ok(frame_rate);
                }
            }
            writeln!(self.output, "Invalid choice. Please enter 0-{}.", last)?;
        }
    }

    /// Empty input takes `default`
    pub fn choose_threads(&mut self, max: u32, default: u32) -> PromptResult<u32> {
        writeln!(
            self.output,
            "\nSelect number of threads (Max available: {}):",
            max
        )?;
        writeln!(self.output, "  1: 1 thread (slowest, lowest CPU usage)")?;
        for n in [2, 4, 8] {
            if n < max {
                writeln!(self.output, "  {}: {} threads", n, n)?;
            }
        }
        writeln!(
            self.output,
            "  {}: {} threads (fastest, highest CPU usage)",
            max, max
        )?;

        loop {
            let input = self.ask(&format!("\nEnter number of threads (1-{}): ", max))?;
            if input.is_empty() {
                writeln!(self.output, "Using default: {} threads", default)?;
                return Ok(default);
            }
            match input.parse::<u32>() {
                Ok(n) if (1..=max).contains(&n) => {
                    writeln!(self.output, "Selected: {} threads", n)?;
                    return Ok(n);
                }
                Ok(_) => writeln!(self.output, "Invalid choice. Please enter 1-{}.", max)?,
                Err(_) => writeln!(self.output, "Invalid input. Please enter a number.")?,
            }
        }
    }

    /// Raw start index as typed; range checking is left to the planner
    pub fn choose_start(&mut self, directories: &[&Path]) -> PromptResult<Option<i64>> {
        writeln!(self.output, "\nDirectories found (sorted order):")?;
        for (i, dir) in directories.iter().enumerate() {
            writeln!(self.output, "  {}: {}", i, base_name(dir))?;
        }
        writeln!(
            self.output,
            "\nEnter the number of the directory to start from (or press Enter to start from the beginning):"
        )?;

        let input = self.ask("Choice: ")?;
        if input.is_empty() {
            writeln!(self.output, "Starting from the beginning.")?;
            return Ok(None);
        }
        match input.parse::<i64>() {
            Ok(index) if index >= 0 && (index as usize) < directories.len() => Ok(Some(index)),
            _ => {
                writeln!(self.output, "Invalid input. Starting from the beginning.")?;
                Ok(None)
            }
        }
    }
}
