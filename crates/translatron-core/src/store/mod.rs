//! File-backed store for directories, projects, and translation documents.
//!
//! # Filesystem Layout
//!
//! The storage root holds a tree of plain folders. A folder is a Project iff
//! it contains at least one per-language document:
//!
//! ```text
//! <root>/
//! ├── marketing/                  # plain directory
//! │   └── website/                # project
//! │       ├── project.json        # metadata: {name, languages}
//! │       ├── en.json             # nested key/value translations
//! │       └── de.json
//! └── app/                        # project
//!     ├── project.json
//!     └── en.json
//! ```
//!
//! Language documents are nested JSON objects whose leaf string values are
//! translations, addressed by dot-delimited key paths.
//!
//! # Concurrency
//!
//! Writes are whole-document rewrites (write temp, then rename). Concurrent
//! writers targeting the same `(project, language)` document are not
//! serialized; whichever rewrite finishes last wins.

mod files;
pub(crate) mod keypath;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use files::DocRead;

/// Typed failure surface of the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key already exists: {0}")]
    KeyConflict(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One child of a directory listing. A project is never also a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub is_project: bool,
}

/// `language -> flattened dot-path/value map`.
pub type ProjectTranslations = BTreeMap<String, BTreeMap<String, String>>;

/// File-backed store rooted at one storage directory.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf, StoreError> {
        files::safe_join(&self.root, rel)
    }

    fn language_doc(&self, project_id: &str, language: &str) -> Result<PathBuf, StoreError> {
        validate_language(language)?;
        Ok(self.resolve(project_id)?.join(format!("{language}.json")))
    }

    /// Shallow listing of the directory at `path`. Children are classified as
    /// projects iff their folder contains at least one language document.
    pub async fn get_directory(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
        let dir = self.resolve(path)?;
        let entries = files::list_dir(&dir)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let mut out = Vec::new();
        for (name, is_dir) in entries {
            if !is_dir {
                continue;
            }
            let is_project = self.contains_language_doc(&dir.join(&name)).await?;
            out.push(DirEntry {
                name,
                is_directory: !is_project,
                is_project,
            });
        }
        Ok(out)
    }

    async fn contains_language_doc(&self, dir: &Path) -> Result<bool, StoreError> {
        let entries = files::list_dir(dir).await?.unwrap_or_default();
        Ok(entries
            .iter()
            .any(|(name, is_dir)| !is_dir && files::is_language_doc(name)))
    }

    /// Merge every readable language document of a project into
    /// `{language -> flattened key/value map}`.
    ///
    /// A document that fails to parse is skipped with a warning; the call
    /// still succeeds with the remaining languages.
    pub async fn load_project(&self, project_id: &str) -> Result<ProjectTranslations, StoreError> {
        let dir = self.resolve(project_id)?;
        let entries = files::list_dir(&dir)
            .await?
            .ok_or_else(|| StoreError::NotFound(project_id.to_string()))?;

        let mut translations = ProjectTranslations::new();
        for (name, is_dir) in entries {
            if is_dir || !files::is_language_doc(&name) {
                continue;
            }
            let Some(language) = name.strip_suffix(".json") else {
                continue;
            };
            match files::read_doc(&dir.join(&name)).await? {
                DocRead::Doc(doc) => {
                    translations.insert(language.to_string(), keypath::flatten(&doc));
                }
                DocRead::Corrupt => {
                    log::warn!("skipping corrupt language document {name} in project {project_id}");
                }
                DocRead::Missing => {}
            }
        }
        Ok(translations)
    }

    /// Read-modify-write of one language document: creates the document and
    /// intermediate folders if absent, sets the (possibly nested) key.
    /// An unparseable existing document reads as empty and is rewritten.
    pub async fn save_key(
        &self,
        project_id: &str,
        language: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        let doc_path = self.language_doc(project_id, language)?;
        let mut doc = match files::read_doc(&doc_path).await? {
            DocRead::Doc(doc) => doc,
            DocRead::Missing => Value::Object(Map::new()),
            DocRead::Corrupt => {
                log::warn!("rewriting corrupt language document {language}.json in project {project_id}");
                Value::Object(Map::new())
            }
        };
        keypath::set(&mut doc, key, Value::String(value.to_string()));
        files::write_doc(&doc_path, &doc).await
    }

    /// Move the value from `old_key` to `new_key` within one language
    /// document. The target must be unoccupied; on failure the document is
    /// left unchanged.
    pub async fn rename_key(
        &self,
        project_id: &str,
        language: &str,
        old_key: &str,
        new_key: &str,
    ) -> Result<(), StoreError> {
        validate_key(old_key)?;
        validate_key(new_key)?;
        let doc_path = self.language_doc(project_id, language)?;
        let mut doc = match files::read_doc(&doc_path).await? {
            DocRead::Doc(doc) => doc,
            DocRead::Missing => return Err(StoreError::KeyNotFound(old_key.to_string())),
            DocRead::Corrupt => {
                return Err(StoreError::Corrupt(format!("{project_id}/{language}.json")))
            }
        };
        if keypath::get(&doc, new_key).is_some() {
            return Err(StoreError::KeyConflict(new_key.to_string()));
        }
        let value = keypath::remove(&mut doc, old_key)
            .ok_or_else(|| StoreError::KeyNotFound(old_key.to_string()))?;
        keypath::set(&mut doc, new_key, value);
        files::write_doc(&doc_path, &doc).await
    }

    /// Delete a key. Succeeds as a no-op when the key (or the whole
    /// document) is already absent.
    pub async fn remove_key(
        &self,
        project_id: &str,
        language: &str,
        key: &str,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        let doc_path = self.language_doc(project_id, language)?;
        let mut doc = match files::read_doc(&doc_path).await? {
            DocRead::Doc(doc) => doc,
            DocRead::Missing | DocRead::Corrupt => return Ok(()),
        };
        if keypath::remove(&mut doc, key).is_none() {
            return Ok(());
        }
        files::write_doc(&doc_path, &doc).await
    }

    /// Create a project folder at `path/id` with a metadata document and one
    /// empty stub document per initial language.
    pub async fn create_project(
        &self,
        id: &str,
        path: &str,
        name: &str,
        languages: &[String],
    ) -> Result<(), StoreError> {
        validate_segment(id)?;
        for language in languages {
            validate_language(language)?;
        }
        let target = self.resolve(path)?.join(id);
        self.ensure_vacant(&target, id).await?;
        fs::create_dir_all(&target).await?;

        let meta = serde_json::json!({ "name": name, "languages": languages });
        files::write_doc(&target.join(files::PROJECT_META), &meta).await?;
        for language in languages {
            files::write_doc(
                &target.join(format!("{language}.json")),
                &Value::Object(Map::new()),
            )
            .await?;
        }
        Ok(())
    }

    /// Create a plain directory folder at `path/id`.
    pub async fn create_directory(&self, id: &str, path: &str) -> Result<(), StoreError> {
        validate_segment(id)?;
        let target = self.resolve(path)?.join(id);
        self.ensure_vacant(&target, id).await?;
        fs::create_dir_all(&target).await?;
        Ok(())
    }

    async fn ensure_vacant(&self, target: &Path, id: &str) -> Result<(), StoreError> {
        match fs::metadata(target).await {
            Ok(_) => Err(StoreError::AlreadyExists(id.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

fn validate_language(language: &str) -> Result<(), StoreError> {
    let well_formed = !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("bad language: {language:?}")))
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if !key.is_empty() && key.split('.').all(|segment| !segment.is_empty()) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("bad key: {key:?}")))
    }
}

fn validate_segment(id: &str) -> Result<(), StoreError> {
    let well_formed =
        !id.is_empty() && id != "." && id != ".." && !id.contains('/') && !id.contains('\\');
    if well_formed {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("bad id: {id:?}")))
    }
}

// ============================================================================
// TESTS
// ============================================================================
