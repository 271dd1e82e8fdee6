use std::fmt;
use std::path::PathBuf;

use crate::error::ExtractionFailure;

/// An archive whose contents were written to disk.
#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    pub archive: PathBuf,
    pub target: PathBuf,
    /// 0 for the source archive
    pub depth: usize,
    pub files: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nested deeper than the configured maximum
    DepthLimit,
    /// Same content as an archive it is nested in
    Cycle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DepthLimit => f.write_str("depth limit reached"),
            SkipReason::Cycle => f.write_str("archive contains itself"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedArchive {
    pub archive: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of one expansion run.
#[derive(Debug, Default)]
pub struct ExpansionReport {
    pub destination: PathBuf,
    /// In extraction order
    pub extracted: Vec<ExtractedArchive>,
    pub failures: Vec<ExtractionFailure>,
    pub skipped: Vec<SkippedArchive>,
}

impl ExpansionReport {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn files_written(&self) -> usize {
        self.extracted.iter().map(|a| a.files).sum()
    }
}

impl fmt::Display for ExpansionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} archives extracted, {} files written, {} failed, {} skipped",
            self.extracted.len(),
            self.files_written(),
            self.failures.len(),
            self.skipped.len()
        )
    }
}
