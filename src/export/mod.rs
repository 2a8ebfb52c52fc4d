//! # Pagination & Export Pipeline
//!
//! Turns a mounted [`View`] into a paginated PDF.
//!
//! ## Pipeline
//!
//! ```text
//! Stage ─find(id)─→ View                       TargetNotFound if absent
//!   1. preload images (concurrent, per-image timeout, failures → absent)
//!   2. CaptureGuard: hide screen-only controls, strip shadow/animation
//!   3. Rasterizer::capture at 2× on white; overlay composited on top
//!   4. one page if the scaled height fits, else slice into page bands
//!   5. PDF (one image per page)
//!   guard dropped → styling restored, on every exit path
//! ```
//!
//! The same artifact can be handed out as raw bytes or base64
//! ([`ExportOutput`]).

pub mod assets;
pub mod capture;
pub mod paginate;
pub mod pdf;
pub mod stage;

pub use assets::{HttpImageFetcher, ImageFetcher, preload_images};
pub use capture::{PixelRasterizer, Rasterizer};
pub use paginate::PageGeometry;
pub use stage::{CaptureGuard, Control, Stage, View, ViewSnapshot, ViewStyle};

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::RenderedDocument;
use crate::raster::AssetMap;

/// Default oversampling factor for capture.
pub const DEFAULT_OVERSAMPLE: f32 = 2.0;

/// Default per-image preload timeout.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures of one export attempt. No partial artifact accompanies any of
/// them.
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("Export target not found: {0}")]
    TargetNotFound(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Export produced an empty artifact")]
    EmptyArtifact,
}

/// Export tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub oversample: f32,
    pub image_timeout: Duration,
    pub page: PageGeometry,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            oversample: DEFAULT_OVERSAMPLE,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            page: PageGeometry::A4,
        }
    }
}

/// Terminal encoding of an artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEncoding {
    #[default]
    File,
    Base64,
}

/// A finished PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// An artifact in its terminal encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum ExportOutput {
    File {
        file_name: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
    Base64 {
        file_name: String,
        data: String,
    },
}

impl ExportArtifact {
    pub fn encode(self, encoding: OutputEncoding) -> ExportOutput {
        match encoding {
            OutputEncoding::File => ExportOutput::File {
                file_name: self.file_name,
                bytes: self.bytes,
            },
            OutputEncoding::Base64 => ExportOutput::Base64 {
                file_name: self.file_name,
                data: STANDARD.encode(&self.bytes),
            },
        }
    }
}

/// Deterministic artifact name for a document number.
///
/// ```
/// use proforma::export::artifact_file_name;
///
/// assert_eq!(artifact_file_name("QT/2026/0142"), "Quotation_QT-2026-0142.pdf");
/// assert_eq!(artifact_file_name("  "), "Quotation_document.pdf");
/// ```
pub fn artifact_file_name(document_number: &str) -> String {
    let cleaned: String = document_number
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    let stem = if cleaned.is_empty() { "document" } else { cleaned };
    format!("Quotation_{}.pdf", stem)
}

/// The export pipeline with its collaborators.
#[derive(Clone)]
pub struct Exporter {
    config: ExportConfig,
    rasterizer: Arc<dyn Rasterizer>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl Exporter {
    pub fn new(config: ExportConfig, rasterizer: Arc<dyn Rasterizer>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            config,
            rasterizer,
            fetcher,
        }
    }

    /// Built-in rasterizer and HTTP/file/data-URL image fetcher.
    pub fn with_defaults(config: ExportConfig) -> Result<Self, ExportError> {
        let fetcher = HttpImageFetcher::new().map_err(|e| ExportError::Capture(e.to_string()))?;
        Ok(Self::new(config, Arc::new(PixelRasterizer), Arc::new(fetcher)))
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Preload every image `document` references.
    pub async fn preload(&self, document: &RenderedDocument) -> AssetMap {
        let sources = document.image_sources();
        let assets = preload_images(Arc::clone(&self.fetcher), &sources, self.config.image_timeout).await;
        if assets.len() < sources.len() {
            tracing::warn!(
                document = %document.document_number,
                missing = sources.len() - assets.len(),
                "rendering with missing images"
            );
        }
        assets
    }

    /// Export the view mounted as `element_id` to PDF.
    ///
    /// Callers must not run two exports against the same view concurrently;
    /// the `&mut Stage` borrow enforces that within one task.
    pub async fn export_to_pdf(&self, stage: &mut Stage, element_id: &str) -> Result<ExportArtifact, ExportError> {
        let view = stage
            .get_mut(element_id)
            .ok_or_else(|| ExportError::TargetNotFound(element_id.to_string()))?;

        let document_number = view.document.document_number.clone();
        let job = uuid::Uuid::new_v4();
        tracing::info!(%job, target_id = element_id, document = %document_number, "export started");

        let assets = self.preload(&view.document).await;

        let raster = {
            let guard = CaptureGuard::new(view);
            let mut raster = self.rasterizer.capture(guard.view(), self.config.oversample, &assets)?;
            if let Some(overlay) = guard.view().overlay() {
                overlay.render_into(&mut raster);
            }
            raster
        };

        let pages = paginate::paginate(&raster, &self.config.page);
        if pages.is_empty() {
            return Err(ExportError::Capture("capture produced an empty raster".to_string()));
        }
        let bytes = pdf::assemble(&pages, &self.config.page)?;
        if bytes.is_empty() {
            return Err(ExportError::EmptyArtifact);
        }

        tracing::info!(
            %job,
            document = %document_number,
            pages = pages.len(),
            bytes = bytes.len(),
            raster_width = raster.width(),
            raster_height = raster.height(),
            "export finished"
        );

        Ok(ExportArtifact {
            file_name: artifact_file_name(&document_number),
            bytes,
            page_count: pages.len(),
        })
    }
}
