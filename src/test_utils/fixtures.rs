//! On-disk fixtures: release archives and fake installed binaries.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;

/// Builder for an in-memory release archive.
///
/// ```rust,ignore
/// let bytes = ReleaseArchive::new()
///     .file("ghex-linux-amd64/ghex", b"new build")
///     .tar_gz();
/// ```
#[derive(Debug, Default, Clone)]
pub struct ReleaseArchive {
    entries: Vec<(String, Vec<u8>)>,
}

impl ReleaseArchive {
    /// Empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    #[must_use]
    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.to_string(), content.to_vec()));
        self
    }

    /// Encode as `.tar.gz`.
    ///
    /// # Panics
    ///
    /// Panics on encoder errors, which cannot happen for in-memory buffers.
    #[must_use]
    pub fn tar_gz(&self) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_slice()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Encode as `.zip`.
    ///
    /// # Panics
    ///
    /// Panics on encoder errors, which cannot happen for in-memory buffers.
    #[must_use]
    pub fn zip(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), zip::write::SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// Write `content` to `path` as an executable, creating parent directories.
///
/// # Panics
///
/// Panics on I/O errors.
pub fn install_fake_binary(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
