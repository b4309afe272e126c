/*!
 * Session logging collaborator.
 *
 * One `SessionLogger` is created per process and passed explicitly into
 * the engine and orchestrator; there is no global logging state. The
 * logger appends timestamped lines to a per-session file and has an
 * explicit lifecycle: create on start, flush during the run, shutdown
 * (optionally deleting the file) on exit.
 */

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use parking_lot::Mutex;
use uuid::Uuid;

/// File-backed logger scoped to one translation session
pub struct SessionLogger {
    /// Log file path, `None` for a disabled logger
    path: Option<PathBuf>,
    /// Open handle, guarded for concurrent writers
    file: Mutex<Option<File>>,
}

impl SessionLogger {
    /// Create a session log file in the given directory.
    ///
    /// The file name carries a short session id so parallel app instances
    /// never collide.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;

        let session_id = Uuid::new_v4().to_string();
        let path = dir.join(format!(
            "session_{}_{}.log",
            Local::now().format("%Y%m%d_%H%M%S"),
            &session_id[..8]
        ));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open session log {:?}", path))?;

        Ok(Self {
            path: Some(path),
            file: Mutex::new(Some(file)),
        })
    }

    /// A logger that swallows all writes, for tests and `--quiet` runs
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
        }
    }

    /// Path of the log file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Log an informational message
    pub fn info(&self, message: &str) {
        self.write_line("INFO", message);
    }

    /// Log a warning
    pub fn warning(&self, message: &str) {
        self.write_line("WARN", message);
    }

    /// Log an error
    pub fn error(&self, message: &str) {
        self.write_line("ERROR", message);
    }

    /// Record an outgoing provider request
    pub fn request(&self, provider: &str, model: &str, prompt_chars: usize) {
        self.write_line(
            "REQUEST",
            &format!("provider={} model={} prompt_chars={}", provider, model, prompt_chars),
        );
    }

    /// Record a provider response
    pub fn response(&self, provider: &str, elapsed: Duration, response_chars: usize) {
        self.write_line(
            "RESPONSE",
            &format!(
                "provider={} elapsed_ms={} response_chars={}",
                provider,
                elapsed.as_millis(),
                response_chars
            ),
        );
    }

    /// Flush buffered content to disk
    pub fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }

    /// Close the session log, optionally deleting the file
    pub fn shutdown(&self, delete: bool) {
        let mut guard = self.file.lock();
        if let Some(mut file) = guard.take() {
            let _ = file.flush();
        }
        if delete {
            if let Some(path) = &self.path {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to delete session log {:?}: {}", path, e);
                }
            }
        }
    }

    fn write_line(&self, level: &str, message: &str) {
        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            if writeln!(file, "[{}] [{}] {}", timestamp, level, message).is_err() {
                // A dead log file should never take the pipeline down.
                *guard = None;
            }
        }
    }
}
