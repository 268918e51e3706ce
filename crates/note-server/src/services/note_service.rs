//! Note operations on top of the selected backend

use crate::storage::BackendSelector;
use note_core::{CreateNoteRequest, Note, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub struct NoteService {
    selector: Arc<BackendSelector>,
}

impl NoteService {
    pub fn new(selector: Arc<BackendSelector>) -> Self {
        Self { selector }
    }

    /// All notes, in the order the backend lists their keys.
    ///
    /// A key that disappears between listing and fetching fails the whole
    /// call with `NotFound`.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let backend = self.selector.backend().await?;
        let keys = backend.keys().await?;
        debug!("Listing {} notes", keys.len());

        let mut notes = Vec::with_capacity(keys.len());
        for key in &keys {
            notes.push(backend.get(key).await?);
        }
        Ok(notes)
    }

    pub async fn get_note(&self, id: &str) -> Result<Note> {
        self.selector.backend().await?.get(id).await
    }

    /// Store a new note under a freshly generated id and return the id
    pub async fn create_note(&self, request: &CreateNoteRequest) -> Result<String> {
        let id = Note::generate_id();
        self.selector.backend().await?.set(&id, request).await?;

        info!("Created note {}", id);
        Ok(id)
    }

    /// Replace the note at `id`, creating it if absent
    pub async fn update_note(&self, id: &str, request: &CreateNoteRequest) -> Result<()> {
        self.selector.backend().await?.set(id, request).await?;

        info!("Updated note {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::storage::MemoryBackend;
    use async_trait::async_trait;
    use note_core::{Backend, NoteError};
    use std::collections::{HashMap, HashSet};
    use tokio_test::{assert_err, assert_ok};

    fn memory_service() -> NoteService {
        NoteService::new(Arc::new(BackendSelector::new(Settings::default())))
    }

    /// Lists a key it can't return, like a remote store racing a writer
    struct VanishingBackend {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl Backend for VanishingBackend {
        async fn get(&self, id: &str) -> Result<Note> {
            self.inner.get(id).await
        }

        async fn set(&self, id: &str, request: &CreateNoteRequest) -> Result<()> {
            self.inner.set(id, request).await
        }

        async fn keys(&self) -> Result<Vec<String>> {
            let mut keys = self.inner.keys().await?;
            keys.push("gone".to_string());
            Ok(keys)
        }
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let service = memory_service();

        let id = assert_ok!(service.create_note(&CreateNoteRequest::new("buy milk")).await);
        let note = assert_ok!(service.get_note(&id).await);
        assert_eq!(note, Note { id: id.clone(), message: "buy milk".to_string() });

        assert_ok!(service.update_note(&id, &CreateNoteRequest::new("buy eggs")).await);
        let note = service.get_note(&id).await.unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.message, "buy eggs");

        let err = assert_err!(service.get_note("xyz").await);
        assert!(matches!(err, NoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_creates_missing_note() {
        let service = memory_service();

        service.update_note("chosen-id", &CreateNoteRequest::new("hi")).await.unwrap();
        assert_eq!(service.get_note("chosen-id").await.unwrap().message, "hi");
    }

    #[tokio::test]
    async fn test_list_returns_created_notes() {
        let service = memory_service();
        assert!(service.list_notes().await.unwrap().is_empty());

        let mut created = HashMap::new();
        for i in 0..10 {
            let message = format!("note {}", i);
            let id = service.create_note(&CreateNoteRequest::new(&message)).await.unwrap();
            created.insert(id, message);
        }
        assert_eq!(created.len(), 10);

        let listed: HashMap<_, _> = service
            .list_notes()
            .await
            .unwrap()
            .into_iter()
            .map(|note| (note.id, note.message))
            .collect();
        assert_eq!(listed, created);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates() {
        let service = Arc::new(memory_service());

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_note(&CreateNoteRequest::new(format!("note {}", i)))
                        .await
                })
            })
            .collect();

        let ids: HashSet<String> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();
        assert_eq!(ids.len(), 100);

        let backend = service.selector.backend().await.unwrap();
        let keys: HashSet<String> = backend.keys().await.unwrap().into_iter().collect();
        assert_eq!(keys, ids);
    }

    #[tokio::test]
    async fn test_list_fails_fast_on_vanished_key() {
        let backend = Arc::new(VanishingBackend {
            inner: MemoryBackend::new(),
        });
        backend.set("kept", &CreateNoteRequest::new("still here")).await.unwrap();
        let service = NoteService::new(Arc::new(BackendSelector::with_backend(backend)));

        let err = assert_err!(service.list_notes().await);
        assert!(matches!(err, NoteError::NotFound(id) if id == "gone"));
    }
}
