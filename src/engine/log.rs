//! Run log
//!
//! Append-only `GAQET.log.txt` under Basedir, mirrored to the console.
//! Bullet lines are colorized on the console only: green for `✓`, red for
//! `ERROR!`; the file keeps the raw text.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::error::PipelineError;

pub const BULLET_OK: &str = "\t\u{2713}\t";
pub const BULLET_FIX: &str = "\tERROR!\t";
pub const HEADER_RULE: &str = "-----";

const GREEN: &str = "\u{1b}[92m";
const RED: &str = "\u{1b}[31m";
const RESET: &str = "\u{1b}[0m";

pub struct RunLog {
    file: File,
    path: PathBuf,
    /// Disable ANSI coloring (tests, non-tty consumers).
    plain: bool,
}

impl RunLog {
    pub fn create(basedir: &Path) -> Result<Self, PipelineError> {
        let path = basedir.join("GAQET.log.txt");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file,
            path,
            plain: false,
        })
    }

    pub fn plain(mut self) -> Self {
        self.plain = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` to the log file and echo it, coloring bullet lines.
    pub fn emit(&mut self, message: &str) {
        for line in message.split('\n') {
            if self.plain {
                println!("{}", line);
            } else if line.contains(BULLET_OK) {
                println!("{}{}{}", GREEN, line, RESET);
            } else if line.contains(BULLET_FIX) {
                println!("{}{}{}", RED, line, RESET);
            } else {
                println!("{}", line);
            }
        }
        // Mirror failures to the log file even when the write itself has
        // nowhere to go; a broken log must not kill the pipeline.
        if let Err(e) = writeln!(self.file, "{}", message) {
            tracing::warn!(error = %e, "could not append to run log");
        }
        let _ = self.file.flush();
    }

    /// Emit a step status with the right bullet for its outcome.
    pub fn emit_status(&mut self, status: &str) {
        if status.contains("Failed") {
            self.emit(&format!("{}{}\n", BULLET_FIX, status));
        } else {
            self.emit(&format!("{}{}\n", BULLET_OK, status));
        }
    }

    pub fn section(&mut self, title: &str) {
        self.emit(&format!("{}{}{}\n", HEADER_RULE, title, HEADER_RULE));
    }
}
