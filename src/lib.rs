//! # deepunzip
//!
//! Recursively extract a ZIP archive: the outer archive is extracted into a
//! destination directory, then every ZIP archive found in the extracted tree
//! is extracted into a sibling directory named after it, until no archives
//! remain.
//!
//! ## Features
//!
//! - Local archives, or an outer archive fetched over HTTP(S) with Range requests
//! - ZIP64, STORED and DEFLATE entries, with CRC-32 verification
//! - Entries that would escape the destination are skipped
//! - A failing nested archive is reported without stopping its siblings
//! - Depth limit and detection of archives that contain themselves
//!
//! ## Example
//!
//! ```no_run
//! use deepunzip::{ArchiveSource, ExpandOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ExpandOptions::new(ArchiveSource::parse("bundle.zip"), "out");
//!     let report = deepunzip::run(&options).await?;
//!
//!     for failure in &report.failures {
//!         eprintln!("{failure}");
//!     }
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod scan;
pub mod unnest;
pub mod zip;

pub use cli::Cli;
pub use config::{ArchiveSource, ExpandOptions};
pub use error::{ExtractionFailure, UnnestError};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt};
pub use report::{ExpansionReport, ExtractedArchive, SkipReason, SkippedArchive};
pub use unnest::run;
pub use zip::{ZipExtractor, ZipFileEntry};
