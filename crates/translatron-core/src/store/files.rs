//! JSON document primitives for the file-backed store.
//!
//! The raw file-manager duties live here: shallow directory listing, document
//! reads that distinguish absent from corrupt, safe joining of client-supplied
//! paths onto the storage root, and whole-document rewrites.
//!
//! # Atomic Write Strategy
//!
//! All document writes go through write-then-rename:
//!
//! 1. Write to `<name>.json.tmp`
//! 2. Rename to `<name>.json` (atomic on Unix)

use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::StoreError;

/// The per-project metadata document. Never counted as a language document.
pub(crate) const PROJECT_META: &str = "project.json";

/// Outcome of reading a JSON document.
pub(crate) enum DocRead {
    /// No file at that path.
    Missing,
    /// File exists but is not valid JSON.
    Corrupt,
    /// Parsed document.
    Doc(Value),
}

/// Read and parse a JSON document.
pub(crate) async fn read_doc(path: &Path) -> Result<DocRead, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DocRead::Missing),
        Err(e) => return Err(StoreError::Io(e)),
    };
    match serde_json::from_str(&raw) {
        Ok(doc) => Ok(DocRead::Doc(doc)),
        Err(_) => Ok(DocRead::Corrupt),
    }
}

/// Rewrite a document in place, creating parent folders as needed.
pub(crate) async fn write_doc(path: &Path, doc: &Value) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    let json = serde_json::to_string_pretty(doc)?;
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Shallow listing of `(name, is_dir)` pairs, sorted by name.
/// Returns `None` if the directory does not exist.
pub(crate) async fn list_dir(path: &Path) -> Result<Option<Vec<(String, bool)>>, StoreError> {
    let mut reader = match fs::read_dir(path).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::Io(e)),
    };
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await?.is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(Some(entries))
}

/// True for `<language>.json` documents; `project.json` is metadata.
pub(crate) fn is_language_doc(name: &str) -> bool {
    name != PROJECT_META && name.ends_with(".json")
}

/// Join a slash-delimited relative path onto the storage root.
///
/// Leading and trailing slashes are tolerated (clients address the root as
/// `/`). Empty, `.`, and `..` segments are rejected so a client path can
/// never escape the root.
pub(crate) fn safe_join(root: &Path, rel: &str) -> Result<PathBuf, StoreError> {
    let mut out = root.to_path_buf();
    for segment in rel.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return Err(StoreError::Invalid(format!("bad path: {rel}")));
        }
        out.push(segment);
    }
    Ok(out)
}
