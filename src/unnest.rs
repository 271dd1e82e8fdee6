//! Recursive expansion of an archive and the archives nested inside it.
//!
//! An archive is extracted completely, then the directory it was written to
//! is scanned and every nested archive found there is expanded into a
//! sibling directory, depth first, in scan order. A failed archive is
//! recorded and its siblings still run.

use anyhow::{Context, anyhow, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ArchiveSource, ExpandOptions};
use crate::error::{ExtractionFailure, UnnestError};
use crate::io::{HttpRangeReader, LocalFileReader, ReadAt, RemoteNotFound};
use crate::report::{ExpansionReport, ExtractedArchive, SkipReason, SkippedArchive};
use crate::scan::{find_nested_archives, nested_target};
use crate::zip::{Fingerprint, ZipExtractor};

/// Expand `options.source` into `options.destination`.
///
/// Fails only when the source does not exist or the destination cannot be
/// created; in both cases nothing has been extracted. Every other problem
/// ends up in [`ExpansionReport::failures`].
pub async fn run(options: &ExpandOptions) -> Result<ExpansionReport, UnnestError> {
    let opened = open_source(&options.source).await?;

    std::fs::create_dir_all(&options.destination).map_err(|source| UnnestError::Destination {
        path: options.destination.clone(),
        source,
    })?;

    let mut unnester = Unnester::new(options);
    let archive = options.source.display_path();
    match opened {
        Ok(reader) => {
            if let ArchiveSource::Local(path) = &options.source {
                unnester.mark_expanded(path);
            }
            let mut ancestry = Vec::new();
            unnester
                .expand(reader, &archive, &options.destination, 0, &mut ancestry)
                .await;
        }
        Err(cause) => unnester.fail(&archive, cause),
    }

    Ok(unnester.finish())
}

/// Open the top-level archive.
///
/// The outer error means the source does not exist; the inner one is an
/// ordinary extraction failure for the source archive.
async fn open_source(
    source: &ArchiveSource,
) -> Result<anyhow::Result<Arc<dyn ReadAt>>, UnnestError> {
    match source {
        ArchiveSource::Local(path) => {
            if !path.exists() {
                return Err(UnnestError::MissingSource(path.display().to_string()));
            }
            Ok(open_local(path))
        }
        ArchiveSource::Remote(url) => match HttpRangeReader::new(url.clone()).await {
            Ok(reader) => Ok(Ok(Arc::new(reader) as Arc<dyn ReadAt>)),
            Err(e) if e.is::<RemoteNotFound>() => Err(UnnestError::MissingSource(url.clone())),
            Err(e) => Ok(Err(e)),
        },
    }
}

fn open_local(path: &Path) -> anyhow::Result<Arc<dyn ReadAt>> {
    if !path.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    Ok(Arc::new(LocalFileReader::new(path)?))
}

/// State of one expansion run.
pub struct Unnester<'a> {
    options: &'a ExpandOptions,
    report: ExpansionReport,
    /// Archives already handled in this run, by canonical path
    expanded: HashSet<PathBuf>,
}

impl<'a> Unnester<'a> {
    pub fn new(options: &'a ExpandOptions) -> Self {
        Self {
            options,
            report: ExpansionReport::new(options.destination.clone()),
            expanded: HashSet::new(),
        }
    }

    pub fn finish(self) -> ExpansionReport {
        self.report
    }

    /// Returns false if `archive` was already expanded in this run.
    fn mark_expanded(&mut self, archive: &Path) -> bool {
        let key = archive
            .canonicalize()
            .unwrap_or_else(|_| archive.to_path_buf());
        self.expanded.insert(key)
    }

    fn fail(&mut self, archive: &Path, cause: anyhow::Error) {
        let failure = ExtractionFailure {
            archive: archive.to_path_buf(),
            cause,
        };
        tracing::error!(archive = %archive.display(), "{failure}");
        self.report.failures.push(failure);
    }

    fn skip(&mut self, archive: &Path, reason: SkipReason) {
        tracing::warn!(archive = %archive.display(), "skipping nested archive: {reason}");
        self.report.skipped.push(SkippedArchive {
            archive: archive.to_path_buf(),
            reason,
        });
    }

    /// Extract `archive` into `target`, then expand whatever archives it
    /// contained. `ancestry` holds the fingerprints of the enclosing archives.
    async fn expand(
        &mut self,
        reader: Arc<dyn ReadAt>,
        archive: &Path,
        target: &Path,
        depth: usize,
        ancestry: &mut Vec<Fingerprint>,
    ) {
        let fingerprint = match self.extract(reader, archive, target, depth, ancestry).await {
            Ok(Some(fingerprint)) => fingerprint,
            Ok(None) => return,
            Err(cause) => {
                self.fail(archive, cause);
                return;
            }
        };

        let nested = find_nested_archives(target, &self.options.extensions);
        if nested.is_empty() {
            return;
        }
        tracing::debug!(
            archive = %archive.display(),
            count = nested.len(),
            "found nested archives"
        );

        ancestry.push(fingerprint);
        for nested_archive in nested {
            self.expand_nested(&nested_archive, depth + 1, ancestry)
                .await;
        }
        ancestry.pop();
    }

    async fn expand_nested(
        &mut self,
        archive: &Path,
        depth: usize,
        ancestry: &mut Vec<Fingerprint>,
    ) {
        if !self.mark_expanded(archive) {
            tracing::debug!(archive = %archive.display(), "already expanded in this run");
            return;
        }
        if depth > self.options.max_depth {
            self.skip(archive, SkipReason::DepthLimit);
            return;
        }

        let reader = match LocalFileReader::new(archive) {
            Ok(reader) => Arc::new(reader) as Arc<dyn ReadAt>,
            Err(cause) => {
                self.fail(archive, cause);
                return;
            }
        };
        let target = nested_target(archive);

        Box::pin(self.expand(reader, archive, &target, depth, ancestry)).await;
    }

    /// Extract a single archive. `Ok(None)` means it was skipped.
    async fn extract(
        &mut self,
        reader: Arc<dyn ReadAt>,
        archive: &Path,
        target: &Path,
        depth: usize,
        ancestry: &[Fingerprint],
    ) -> anyhow::Result<Option<Fingerprint>> {
        let extractor = ZipExtractor::new(reader);
        let index = extractor.index().await?;

        if ancestry.contains(&index.fingerprint) {
            self.skip(archive, SkipReason::Cycle);
            return Ok(None);
        }

        if target.exists() && !target.is_dir() {
            return Err(anyhow!(
                "{} exists and is not a directory",
                target.display()
            ));
        }
        tokio::fs::create_dir_all(target)
            .await
            .with_context(|| format!("Creating {}", target.display()))?;

        tracing::info!(
            archive = %archive.display(),
            target = %target.display(),
            depth,
            entries = index.entries.len(),
            "extracting archive"
        );
        let files = extractor.extract_all(&index, target).await?;

        self.report.extracted.push(ExtractedArchive {
            archive: archive.to_path_buf(),
            target: target.to_path_buf(),
            depth,
            files,
        });
        Ok(Some(index.fingerprint))
    }
}
