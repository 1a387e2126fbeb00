//! The RPC-callable operations façade.
//!
//! One method per store primitive. Mutating methods take the originating
//! session, delegate to the store, and on success broadcast exactly one
//! [`ChangeEvent`] to every other registered session. On failure the error
//! is relayed to the caller and nothing is broadcast. Read-only methods
//! never broadcast.

use crate::events::{ChangeEvent, ChangeKind};
use crate::notifier::ChangesNotifier;
use crate::session::SessionId;
use crate::store::{DirEntry, ProjectTranslations, Store, StoreError};
use serde_json::json;
use std::sync::Arc;

pub struct Operations {
    store: Store,
    notifier: Arc<ChangesNotifier>,
}

impl Operations {
    pub fn new(store: Store, notifier: Arc<ChangesNotifier>) -> Self {
        Self { store, notifier }
    }

    /// The session registry this façade broadcasts through.
    pub fn notifier(&self) -> &Arc<ChangesNotifier> {
        &self.notifier
    }

    pub async fn load_project(&self, project_id: &str) -> Result<ProjectTranslations, StoreError> {
        self.store.load_project(project_id).await
    }

    pub async fn get_directory(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
        self.store.get_directory(path).await
    }

    pub async fn save_key(
        &self,
        origin: &SessionId,
        project_id: &str,
        language: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.store.save_key(project_id, language, key, value).await?;
        self.notifier.broadcast(
            origin,
            &ChangeEvent {
                kind: ChangeKind::KeyAdded,
                project_id: project_id.to_string(),
                language: Some(language.to_string()),
                path: key.to_string(),
                payload: json!({ "key": key, "value": value }),
            },
        );
        Ok(())
    }

    pub async fn rename_key(
        &self,
        origin: &SessionId,
        project_id: &str,
        language: &str,
        old_key: &str,
        new_key: &str,
    ) -> Result<(), StoreError> {
        self.store
            .rename_key(project_id, language, old_key, new_key)
            .await?;
        self.notifier.broadcast(
            origin,
            &ChangeEvent {
                kind: ChangeKind::KeyRenamed,
                project_id: project_id.to_string(),
                language: Some(language.to_string()),
                path: new_key.to_string(),
                payload: json!({ "oldKey": old_key, "newKey": new_key }),
            },
        );
        Ok(())
    }

    pub async fn remove_key(
        &self,
        origin: &SessionId,
        project_id: &str,
        language: &str,
        key: &str,
    ) -> Result<(), StoreError> {
        self.store.remove_key(project_id, language, key).await?;
        self.notifier.broadcast(
            origin,
            &ChangeEvent {
                kind: ChangeKind::KeyRemoved,
                project_id: project_id.to_string(),
                language: Some(language.to_string()),
                path: key.to_string(),
                payload: json!({ "key": key }),
            },
        );
        Ok(())
    }

    pub async fn create_project(
        &self,
        origin: &SessionId,
        id: &str,
        path: &str,
        name: &str,
        languages: &[String],
    ) -> Result<(), StoreError> {
        self.store.create_project(id, path, name, languages).await?;
        self.notifier.broadcast(
            origin,
            &ChangeEvent {
                kind: ChangeKind::ProjectCreated,
                project_id: id.to_string(),
                language: None,
                path: path.to_string(),
                payload: json!({ "name": name, "languages": languages }),
            },
        );
        Ok(())
    }

    pub async fn create_directory(
        &self,
        origin: &SessionId,
        id: &str,
        directory_name: &str,
        path: &str,
    ) -> Result<(), StoreError> {
        self.store.create_directory(id, path).await?;
        self.notifier.broadcast(
            origin,
            &ChangeEvent {
                kind: ChangeKind::DirectoryCreated,
                project_id: id.to_string(),
                language: None,
                path: path.to_string(),
                payload: json!({ "name": directory_name }),
            },
        );
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
