use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{ArchiveIndex, CompressionMethod, ZipFileEntry};

/// Upper bound for the initial output buffer; the declared size is untrusted.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// Read the archive's Central Directory
    pub async fn index(&self) -> Result<ArchiveIndex> {
        self.parser.read_index().await
    }

    /// Decompress an entry into memory, verifying its size and CRC-32.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{} is encrypted, which is not supported", entry.file_name);
        }

        // bounds-checks compressed_size against the archive before allocating
        let data_offset = self.parser.data_offset(entry).await?;
        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut compressed)
            .await
            .with_context(|| format!("Reading data of {}", entry.file_name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                let mut out =
                    Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
                DeflateDecoder::new(compressed.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .with_context(|| format!("Inflating {}", entry.file_name))?;
                out
            }
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
                method,
                entry.file_name
            ),
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = flate2::Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }

    /// Extract an entry to disk, replacing any existing file.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Creating {}", parent.display()))?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        fs::write(output_path, &data)
            .await
            .with_context(|| format!("Writing {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // owner rw stays set so the next run can overwrite
            fs::set_permissions(output_path, std::fs::Permissions::from_mode(mode | 0o600))
                .await
                .with_context(|| format!("Setting permissions on {}", output_path.display()))?;
        }

        Ok(())
    }

    /// Extract every entry of `index` under `dest`.
    ///
    /// Entries whose names escape `dest` are skipped. Returns the number of
    /// files written.
    pub async fn extract_all(&self, index: &ArchiveIndex, dest: &Path) -> Result<usize> {
        let mut written = 0;

        for entry in &index.entries {
            let Some(relative) = entry.enclosed_path() else {
                tracing::warn!(entry = %entry.file_name, "skipping entry with unsafe path");
                continue;
            };
            let output_path = dest.join(relative);

            if entry.is_directory {
                fs::create_dir_all(&output_path)
                    .await
                    .with_context(|| format!("Creating {}", output_path.display()))?;
                continue;
            }

            tracing::debug!(entry = %entry.file_name, "extracting");
            self.extract_to_file(entry, &output_path).await?;
            written += 1;
        }

        Ok(written)
    }
}
