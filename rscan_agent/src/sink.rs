//! Resumable JSON-lines report sink.
//!
//! One line per package report, appended. Opening an existing file first
//! replays the URLs of the reports already present so a rerun can skip
//! them; a line that does not decode aborts the run rather than risking
//! duplicate or lost records.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;

use crate::package::PackageReport;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("report sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("existing output line {line} is not a valid report: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RecordUrl {
    url: String,
}

#[derive(Debug)]
pub struct ReportSink {
    file: Mutex<File>,
}

impl ReportSink {
    /// Open (or create) the sink at `path`. Returns the sink plus the set
    /// of URLs already recorded in it.
    pub fn open(path: &Path) -> Result<(ReportSink, HashSet<String>), SinkError> {
        let mut completed = HashSet::new();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for (n, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: RecordUrl = serde_json::from_str(&line)
                    .map_err(|source| SinkError::Corrupt { line: n + 1, source })?;
                completed.insert(record.url);
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok((
            ReportSink {
                file: Mutex::new(file),
            },
            completed,
        ))
    }

    /// Append one report. Serialization happens outside the lock; the
    /// write and flush inside it, so concurrent workers never interleave
    /// lines.
    pub fn write(&self, report: &PackageReport) -> Result<(), SinkError> {
        let line = serde_json::to_string(report)?;
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}
