//! Pull the ghex executable out of a downloaded release archive.
//!
//! Entries are matched by base name only, so archives that nest the binary in
//! a directory (`ghex-linux-amd64/ghex`) work as well as flat ones. Tarballs
//! for non-Windows targets only ever yield the bare `ghex`; a stray
//! `ghex.exe` in them is ignored.

use crate::core::GhexError;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive container formats found in releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.tar.gz`
    TarGz,
    /// `.zip`
    Zip,
}

impl ArchiveFormat {
    /// Format implied by an asset name: zip for `.zip`, tar+gzip for anything else.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".zip") { Self::Zip } else { Self::TarGz }
    }
}

/// Extract the executable for `os` from `archive` into `dest_dir`.
///
/// See [`binary_candidates`] for which entry names are accepted. Runs on the
/// blocking thread pool. Returns the path of the extracted file, which is
/// marked executable on Unix.
///
/// # Errors
///
/// Returns [`GhexError::ExtractFailed`] if the archive cannot be read or holds
/// no matching entry.
pub async fn extract_binary(
    archive: &Path,
    format: ArchiveFormat,
    binary: &str,
    os: &str,
    dest_dir: &Path,
) -> Result<PathBuf, GhexError> {
    let archive_owned = archive.to_path_buf();
    let binary = binary.to_string();
    let os = os.to_string();
    let dest_dir = dest_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        extract_binary_blocking(&archive_owned, format, &binary, &os, &dest_dir)
    })
    .await
    .map_err(|e| GhexError::ExtractFailed {
        archive: archive.to_path_buf(),
        reason: format!("extraction task failed: {e}"),
    })?
}

/// Synchronous form of [`extract_binary`].
///
/// # Errors
///
/// See [`extract_binary`].
pub fn extract_binary_blocking(
    archive: &Path,
    format: ArchiveFormat,
    binary: &str,
    os: &str,
    dest_dir: &Path,
) -> Result<PathBuf, GhexError> {
    let failed = |reason: String| GhexError::ExtractFailed {
        archive: archive.to_path_buf(),
        reason,
    };
    let candidates = binary_candidates(binary, format, os);

    let file = File::open(archive).map_err(|e| failed(format!("cannot open archive: {e}")))?;
    let extracted = match format {
        ArchiveFormat::TarGz => extract_from_tar_gz(file, &candidates, dest_dir),
        ArchiveFormat::Zip => extract_from_zip(file, &candidates, dest_dir),
    }
    .map_err(|e| failed(e.to_string()))?;

    let path =
        extracted.ok_or_else(|| failed(format!("binary '{binary}' not found in archive")))?;

    crate::upgrade::replace::set_executable(&path)
        .map_err(|e| failed(format!("cannot mark binary executable: {e}")))?;
    debug!("Extracted {}", path.display());
    Ok(path)
}

/// Entry base names accepted for `os`, in order of preference.
///
/// `.tar.gz` for a non-Windows target: only `binary`. Windows targets and
/// zip archives: `binary.exe`, then `binary`.
#[must_use]
pub fn binary_candidates(binary: &str, format: ArchiveFormat, os: &str) -> Vec<String> {
    if format == ArchiveFormat::TarGz && os != "windows" {
        vec![binary.to_string()]
    } else {
        vec![format!("{binary}.exe"), binary.to_string()]
    }
}

fn base_name_matches(entry: &Path, candidates: &[String]) -> Option<String> {
    let name = entry.file_name()?.to_str()?;
    candidates.iter().any(|c| c == name).then(|| name.to_string())
}

fn write_entry(mut reader: impl Read, dest_dir: &Path, name: &str) -> io::Result<PathBuf> {
    let out_path = dest_dir.join(name);
    let mut out = File::create(&out_path)?;
    io::copy(&mut reader, &mut out)?;
    Ok(out_path)
}

fn extract_from_tar_gz(
    file: File,
    candidates: &[String],
    dest_dir: &Path,
) -> io::Result<Option<PathBuf>> {
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    // Streamed, so the first match is taken
    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let entry_path = entry.path()?.into_owned();
        if let Some(name) = base_name_matches(&entry_path, candidates) {
            return write_entry(entry, dest_dir, &name).map(Some);
        }
    }

    Ok(None)
}

fn extract_from_zip(
    file: File,
    candidates: &[String],
    dest_dir: &Path,
) -> io::Result<Option<PathBuf>> {
    let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;

    let mut best: Option<(usize, usize, String)> = None;
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(io::Error::other)?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = base_name_matches(&PathBuf::from(entry.name()), candidates) else {
            continue;
        };
        let rank = candidates.iter().position(|c| *c == name).unwrap_or(usize::MAX);
        if best.as_ref().is_none_or(|(best_rank, _, _)| rank < *best_rank) {
            best = Some((rank, index, name));
        }
    }

    match best {
        Some((_, index, name)) => {
            let entry = archive.by_index(index).map_err(io::Error::other)?;
            write_entry(entry, dest_dir, &name).map(Some)
        }
        None => Ok(None),
    }
}
