//! HTTP handlers

pub mod health;
pub mod notes;

pub use health::health;
