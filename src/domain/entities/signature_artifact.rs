//! Signature artifact naming
//!
//! A signed document `name.ext` is accompanied by `name.ext.p7s`, either
//! next to it or under an output directory. The presence of that file is
//! the only signal used to treat a document as already signed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of a detached signature container, without the dot
pub const SIGNATURE_EXTENSION: &str = "p7s";

/// Returns the container path for `file`.
///
/// Without an output directory the container sits next to the document;
/// with one it is placed directly inside that directory under the same
/// base name.
pub fn signature_path_for(file: &Path, output_dir: Option<&Path>) -> PathBuf {
    let mut name: OsString = file.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(SIGNATURE_EXTENSION);

    match output_dir {
        Some(dir) => dir.join(name),
        None => file.with_file_name(name),
    }
}

/// Returns true when `path` itself is a signature container
pub fn is_signature_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SIGNATURE_EXTENSION))
}

/// Normalises a document extension to `.ext` form.
///
/// Returns `None` for blank input.
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Returns true when a sibling container exists for `file`
pub fn has_signature_artifact(file: &Path) -> bool {
    signature_path_for(file, None).is_file()
}
