//! Line oriented log sinks.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::Result;

pub const START_MARKER: &str = "=== Start of ranking download ===";

/// Anything that accepts finished log lines. Fetch tasks log their retries concurrently,
/// so implementations have to be shareable across tasks.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Prints every line to stdout and appends it to a log file.
pub struct ConsoleFileLog {
    file: Mutex<File>,
}

impl ConsoleFileLog {
    /// Truncates the file at `path` and writes the start marker.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::create(path.as_ref())?;
        writeln!(file, "{START_MARKER}")?;
        drop(file);

        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for ConsoleFileLog {
    fn emit(&self, line: &str) {
        println!("{line}");
        // Poisoning leaves the handle intact.
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            eprintln!("Couldn't append to the log file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_starts_with_marker_and_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "stale contents\n").unwrap();

        let log = ConsoleFileLog::create(&path).unwrap();
        log.emit("first");
        crate::info_time!(log, "second {}", 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], START_MARKER);
        assert_eq!(lines[1], "first");
        assert!(lines[2].ends_with(" : second 2"));
    }
}
