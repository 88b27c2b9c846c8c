//! Step Logger
//!
//! Append-only JSONL log of applied steps, one [`StepLogEntry`] per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use story_events::StepLogEntry;

/// Writes step log entries to a JSONL file.
pub struct StepLogger {
    writer: Option<BufWriter<File>>,
    entry_count: u64,
}

impl StepLogger {
    /// Create a logger writing to `path`, truncating any previous log
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            entry_count: 0,
        })
    }

    /// Create a logger that discards entries
    pub fn null() -> Self {
        Self {
            writer: None,
            entry_count: 0,
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn log(&mut self, entry: &StepLogEntry) -> std::io::Result<()> {
        self.entry_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = entry.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, entries: &[StepLogEntry]) -> std::io::Result<()> {
        for entry in entries {
            self.log(entry)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for StepLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush step log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use story_events::{EventView, RecordKind, StepOutcome};

    fn entry(step: usize) -> StepLogEntry {
        StepLogEntry {
            day: 1,
            step,
            event: EventView {
                index: step - 1,
                kind: RecordKind::Dialogue,
                speaker: Some("Theseus".into()),
                addressees: vec!["Ariadne".into()],
                text: "Hold the thread".into(),
                mood: Some("hopeful".into()),
            },
            outcome: StepOutcome::Applied,
            effects: Vec::new(),
        }
    }

    #[test]
    fn test_step_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.jsonl");

        let mut logger = StepLogger::new(&path).unwrap();
        logger.log_batch(&[entry(1), entry(2)]).unwrap();
        logger.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(StepLogEntry::from_jsonl(&lines[1]).unwrap(), entry(2));
    }

    #[test]
    fn test_null_logger() {
        let mut logger = StepLogger::null();
        logger.log(&entry(1)).unwrap();
        assert_eq!(logger.entry_count(), 1);
    }
}
