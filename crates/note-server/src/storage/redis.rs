//! Redis note backend
//!
//! Each note is a Redis string keyed by its id, holding the JSON-encoded note.

use async_trait::async_trait;
use note_core::{Backend, CreateNoteRequest, Note, NoteError, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis. Fails with `BackendUnavailable` if the server can't
    /// be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis at {}", redact(url));

        let client = redis::Client::open(url)
            .map_err(|e| NoteError::Config(format!("Invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;

        info!("Redis connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&self, id: &str) -> Result<Note> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(id).await.map_err(unavailable)?;

        match raw {
            Some(raw) => Note::decode(id, &raw),
            None => Err(NoteError::NotFound(id.to_string())),
        }
    }

    async fn set(&self, id: &str, request: &CreateNoteRequest) -> Result<()> {
        debug!("Writing note {} to Redis", id);

        let payload = Note::new(id, request).encode()?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(id, payload)
            .await
            .map_err(unavailable)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.keys("*").await.map_err(unavailable)
    }
}

fn unavailable(e: redis::RedisError) -> NoteError {
    NoteError::BackendUnavailable(format!("Redis error: {}", e))
}

/// Strip credentials from a Redis URL before logging it
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
