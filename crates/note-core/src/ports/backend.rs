//! Storage backend trait

use crate::{CreateNoteRequest, Note, Result};
use async_trait::async_trait;

/// Note storage backend
///
/// `set` is an upsert: it creates the note when `id` is absent and replaces
/// its message otherwise. `keys` returns an owned snapshot in no particular
/// order.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, id: &str) -> Result<Note>;
    async fn set(&self, id: &str, request: &CreateNoteRequest) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}
