use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::sanitize::{redact_path, sanitize_filename};

/// Extension of the only document type forwarded to the printer.
pub const PRINTABLE_EXTENSION: &str = "pdf";

/// Process-wide counter appended to every stored name.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Holds extracted attachments on disk for the duration of one print attempt.
pub struct AttachmentStore {
    directory: PathBuf,
}

impl AttachmentStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `content` under a fresh, collision-resistant name ending in
    /// `.pdf` and returns its path.
    ///
    /// The file only becomes visible under its final name once fully written.
    pub fn save(&self, suggested_name: Option<&str>, content: &[u8]) -> Result<PathBuf, StorageError> {
        self.ensure_directory()?;

        let filename = unique_filename(suggested_name);
        let final_path = self.directory.join(&filename);
        let partial_path = self.directory.join(format!(".{}.part", filename));

        if let Err(e) = write_exclusive(&partial_path, content) {
            let _ = std::fs::remove_file(&partial_path);
            return Err(StorageError::WriteFile {
                path: partial_path,
                source: e,
            });
        }

        if let Err(e) = std::fs::rename(&partial_path, &final_path) {
            let _ = std::fs::remove_file(&partial_path);
            return Err(StorageError::RenameFile {
                from: partial_path,
                to: final_path,
                source: e,
            });
        }

        debug!(
            file = %redact_path(&final_path),
            bytes = content.len(),
            "Saved attachment"
        );
        Ok(final_path)
    }

    /// Deletes a saved attachment. Failures are logged, never returned.
    ///
    /// Returns whether the file was removed.
    pub fn remove(&self, path: &Path) -> bool {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(file = %redact_path(path), "Removed attachment");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %redact_path(path), "Attachment already gone");
                false
            }
            Err(e) => {
                warn!(file = %redact_path(path), "Failed to remove attachment: {}", e);
                false
            }
        }
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        let path = &self.directory;
        if path.is_dir() {
            return Ok(());
        }
        if path.exists() {
            return Err(StorageError::NotADirectory(path.clone()));
        }
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.clone(),
            source: e,
        })
    }
}

/// Creates `path` with O_CREAT | O_EXCL and writes `content` to it.
fn write_exclusive(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Builds `<base>_<timestamp>_<token>_<seq>.pdf`.
///
/// The base is the sanitized suggestion when it already names a PDF,
/// otherwise a random one.
fn unique_filename(suggested_name: Option<&str>) -> String {
    let base = suggested_name
        .and_then(sanitize_filename)
        .and_then(|name| printable_stem(&name).map(str::to_string))
        .unwrap_or_else(|| format!("print-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]));

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let token = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    format!(
        "{}_{}_{}_{}.{}",
        base, timestamp, token, sequence, PRINTABLE_EXTENSION
    )
}

/// Returns the name without its extension if the extension is the printable
/// one (case-insensitive).
fn printable_stem(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || !ext.eq_ignore_ascii_case(PRINTABLE_EXTENSION) {
        return None;
    }
    Some(stem)
}
