//! Storage layer
//!
//! Three interchangeable note backends behind `note_core::Backend`, and the
//! selector that builds exactly one of them per process.

pub mod gcs;
pub mod memory;
pub mod redis;

pub use self::gcs::GcsBackend;
pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

use crate::config::{BackendKind, Settings};
use note_core::{Backend, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Lazily constructs the configured backend on first use.
///
/// Initialization runs at most once even under concurrent first requests;
/// every caller gets the same instance. A failed construction leaves the slot
/// empty so a later call can try again.
pub struct BackendSelector {
    settings: Settings,
    backend: OnceCell<Arc<dyn Backend>>,
}

impl BackendSelector {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            backend: OnceCell::new(),
        }
    }

    /// Selector around an already-built backend
    #[cfg(test)]
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            settings: Settings::default(),
            backend: OnceCell::from(backend),
        }
    }

    pub async fn backend(&self) -> Result<Arc<dyn Backend>> {
        self.backend
            .get_or_try_init(|| build_backend(&self.settings))
            .await
            .cloned()
    }
}

async fn build_backend(settings: &Settings) -> Result<Arc<dyn Backend>> {
    let kind = settings.backend_kind();
    if BackendKind::parse(&settings.backend).is_none() {
        warn!("Unknown backend '{}', falling back to memory", settings.backend);
    }
    info!("Initializing {} backend", kind);

    let backend: Arc<dyn Backend> = match kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Redis => Arc::new(RedisBackend::connect(&settings.redis_url()).await?),
        BackendKind::Gcs => Arc::new(GcsBackend::from_settings(
            settings.bucket.as_deref(),
            settings.storage_emulator_host.as_deref(),
            settings.gcs_access_token.as_deref(),
        )?),
    };

    info!("{} backend ready", kind);
    Ok(backend)
}
