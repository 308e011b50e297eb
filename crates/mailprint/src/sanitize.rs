//! Helpers for turning untrusted names into safe file names and for keeping
//! full paths out of log output.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Sanitizes an attachment filename so it cannot escape the target directory
/// or carry shell-hostile characters.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let filename = filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();

    let filename = filename.trim_matches(|c| c == '.' || c == '_');
    if filename.is_empty() {
        return None;
    }

    // Keep room for the disambiguating suffix added by the attachment store.
    const MAX_LEN: usize = 160;
    if filename.len() > MAX_LEN {
        let ext_start = filename.rfind('.').unwrap_or(filename.len());
        let ext = match &filename[ext_start..] {
            e if e.len() <= 16 => e,
            _ => "",
        };
        let mut cut = MAX_LEN - ext.len();
        while !filename.is_char_boundary(cut) {
            cut -= 1;
        }
        Some(format!("{}{}", &filename[..cut], ext))
    } else {
        Some(filename.to_string())
    }
}
