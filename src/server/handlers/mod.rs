//! HTTP handlers for the server.

pub mod documents;
pub mod presets;
pub mod settings;
