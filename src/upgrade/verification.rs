use crate::core::GhexError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Chunk size used when streaming a file through the hasher.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// One line of a checksum manifest such as `checksums.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    /// Lowercase hex SHA-256 digest
    pub checksum: String,
    /// File name as written in the manifest (may include a directory prefix)
    pub filename: String,
}

/// SHA-256 checksum computation and verification for downloaded release assets.
///
/// All digests are lowercase hex strings without any algorithm prefix, matching
/// the format produced by `sha256sum`.
///
/// # Examples
///
/// ```rust
/// use ghex_cli::upgrade::ChecksumVerifier;
///
/// assert_eq!(
///     ChecksumVerifier::calculate_bytes(b"Hello, World!"),
///     "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
/// );
/// ```
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Hash an in-memory buffer.
    #[must_use]
    pub fn calculate_bytes(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Hash everything a reader yields, in fixed-size chunks.
    ///
    /// # Errors
    ///
    /// Propagates read errors from `reader`.
    pub fn calculate_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::IoError`] when the file cannot be opened or read.
    pub fn calculate_file(path: &Path) -> Result<String, GhexError> {
        debug!("Computing SHA256 checksum for: {}", path.display());
        let file = File::open(path)?;
        Ok(Self::calculate_reader(BufReader::new(file))?)
    }

    /// Verify that a file hashes to `expected`.
    ///
    /// The expected value is trimmed and compared case-insensitively. Hashing
    /// runs on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// - [`GhexError::ChecksumMismatch`] when the digests differ
    /// - [`GhexError::IoError`] when the file cannot be read
    pub async fn verify(path: &Path, expected: &str) -> Result<(), GhexError> {
        info!("Verifying checksum for: {}", path.display());

        let owned: PathBuf = path.to_path_buf();
        let actual = tokio::task::spawn_blocking(move || Self::calculate_file(&owned))
            .await
            .map_err(|e| GhexError::Other {
                message: format!("Checksum task failed: {e}"),
            })??;

        let expected = expected.trim().to_lowercase();
        if actual != expected {
            return Err(GhexError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        info!("Checksum verification successful");
        Ok(())
    }

    /// Parse a checksum manifest.
    ///
    /// Each useful line is `<hex> <filename>`. Blank lines, `#` comments and
    /// lines with fewer than two tokens are skipped. The filename is the last
    /// token on the line.
    #[must_use]
    pub fn parse_manifest(text: &str) -> Vec<ChecksumEntry> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 2 {
                    return None;
                }
                Some(ChecksumEntry {
                    checksum: parts[0].to_lowercase(),
                    filename: parts[parts.len() - 1].to_string(),
                })
            })
            .collect()
    }

    /// Look up the digest for `filename`.
    ///
    /// An exact match wins; otherwise an entry whose name ends with
    /// `"/" + filename` is accepted, so `dist/ghex-linux-amd64.tar.gz` matches
    /// `ghex-linux-amd64.tar.gz`.
    #[must_use]
    pub fn find_checksum(entries: &[ChecksumEntry], filename: &str) -> Option<String> {
        if let Some(entry) = entries.iter().find(|e| e.filename == filename) {
            return Some(entry.checksum.clone());
        }

        let suffix = format!("/{filename}");
        entries.iter().find(|e| e.filename.ends_with(&suffix)).map(|e| e.checksum.clone())
    }
}
