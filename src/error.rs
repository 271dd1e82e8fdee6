use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before any archive is expanded.
#[derive(Error, Debug)]
pub enum UnnestError {
    #[error("source archive not found: {0}")]
    MissingSource(String),

    #[error("cannot create destination {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One archive that could not be extracted. The run continues past it.
#[derive(Error, Debug)]
#[error("failed to extract {}: {cause:#}", .archive.display())]
pub struct ExtractionFailure {
    pub archive: PathBuf,
    pub cause: anyhow::Error,
}
