//! Note Core Library
//!
//! Domain types, error taxonomy, and the storage backend port for the Note API.

pub mod error;
pub mod model;
pub mod ports;

pub use error::{NoteError, Result};
pub use model::{CreateNoteRequest, Note};
pub use ports::Backend;
