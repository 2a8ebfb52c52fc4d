//! # Error Types
//!
//! Each module owns its error enum; [`ProformaError`] gathers them for the
//! CLI and the HTTP server.

use thiserror::Error;

use crate::export::ExportError;
use crate::export::assets::AssetError;
use crate::invoice::InvoiceError;
use crate::overlay::OverlayError;
use crate::settings::SettingsError;

/// Main error type for proforma operations
#[derive(Debug, Error)]
pub enum ProformaError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Unknown preset name
    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),

    /// Image encoding or decoding failed
    #[error("Image error: {0}")]
    Image(String),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server bind or runtime failure
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ProformaError {
    fn from(e: image::ImageError) -> Self {
        ProformaError::Image(e.to_string())
    }
}
