//! Note data model

use serde::{Deserialize, Serialize};

/// Payload for both creating and updating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub message: String,
}

impl CreateNoteRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A stored note
///
/// The `id` is always assigned by the server. Stored records may omit it,
/// in which case the storage key fills it in (see [`Note::decode`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: String,
    pub message: String,
}

impl Note {
    /// Build the note stored at `id` from a request payload
    pub fn new(id: impl Into<String>, request: &CreateNoteRequest) -> Self {
        Self {
            id: id.into(),
            message: request.message.clone(),
        }
    }

    /// Generate a fresh note identifier
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Serialize for a remote store
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a stored record; the key it was stored under wins over
    /// whatever id the payload carries.
    pub fn decode(id: &str, raw: &[u8]) -> crate::Result<Self> {
        let mut note: Note = serde_json::from_slice(raw)?;
        note.id = id.to_string();
        Ok(note)
    }
}
