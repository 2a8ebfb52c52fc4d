//! # Proforma - Invoice Template Rendering
//!
//! Proforma turns an invoice/quotation document plus a set of per-account
//! template settings into a fixed-width A4 page, a PNG preview, or a
//! paginated PDF. It provides:
//!
//! - **Settings model**: typed, always-complete template settings resolved
//!   from partial stored records
//! - **Preset catalog**: read-only named design presets
//! - **Layout**: settings-driven section layout into positioned nodes
//! - **Freeform overlay**: a decorative vector layer above the document
//! - **Export**: oversampled capture, A4 pagination and PDF assembly
//!
//! ## Quick Start
//!
//! ```
//! use proforma::{
//!     export::{Exporter, ExportConfig, Stage, View},
//!     invoice::InvoiceDocument,
//!     layout,
//!     presets,
//! };
//!
//! # async fn example() -> Result<(), proforma::ProformaError> {
//! let settings = presets::apply_preset(presets::by_name("modern").unwrap());
//! let rendered = layout::render(&InvoiceDocument::sample(), &settings);
//!
//! let mut stage = Stage::new();
//! stage.mount(View::new("invoice", rendered));
//!
//! let exporter = Exporter::with_defaults(ExportConfig::default())?;
//! let artifact = exporter.export_to_pdf(&mut stage, "invoice").await?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`invoice`] | Document data and money formatting |
//! | [`settings`] | Template settings, resolution and persistence |
//! | [`presets`] | Named preset catalog |
//! | [`layout`] | Section layout into positioned nodes |
//! | [`raster`] | Painting, fonts and PNG previews |
//! | [`overlay`] | Freeform decorative layer |
//! | [`export`] | Capture, pagination and PDF assembly |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod error;
pub mod export;
pub mod invoice;
pub mod layout;
pub mod overlay;
pub mod presets;
pub mod raster;
pub mod server;
pub mod settings;

// Re-exports for convenience
pub use error::ProformaError;
pub use export::{ExportArtifact, ExportConfig, Exporter};
pub use invoice::InvoiceDocument;
pub use layout::{RenderedDocument, render};
pub use settings::TemplateSettings;
