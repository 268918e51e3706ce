//! In-memory note backend using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use note_core::{Backend, CreateNoteRequest, Note, NoteError, Result};

/// Process-local note store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBackend {
    notes: DashMap<String, Note>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, id: &str) -> Result<Note> {
        self.notes
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NoteError::NotFound(id.to_string()))
    }

    async fn set(&self, id: &str, request: &CreateNoteRequest) -> Result<()> {
        self.notes.insert(id.to_string(), Note::new(id, request));
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::with_capacity(self.len());
        keys.extend(self.notes.iter().map(|entry| entry.key().clone()));
        Ok(keys)
    }
}
