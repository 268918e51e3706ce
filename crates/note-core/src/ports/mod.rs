//! Port traits (interfaces) for dependency injection

pub mod backend;

pub use backend::Backend;
