//! Preview and export handlers.
//!
//! Both take the invoice document as the JSON body and render it with the
//! account's resolved settings.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::export::{ExportError, ExportOutput, OutputEncoding, Stage, View};
use crate::invoice::InvoiceDocument;
use crate::layout::{RenderedDocument, render};
use crate::raster::{PreviewSize, preview_png};

use super::super::state::AppState;

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub account: Option<String>,
    #[serde(default)]
    pub size: PreviewSize,
}

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub account: Option<String>,
    #[serde(default)]
    pub encoding: OutputEncoding,
}

async fn render_for(
    state: &AppState,
    account: Option<&str>,
    doc: &InvoiceDocument,
) -> Result<RenderedDocument, (StatusCode, String)> {
    doc.validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    doc.reconcile();

    let settings = match account {
        Some(account) => state
            .store
            .load_resolved(account)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?,
        None => Default::default(),
    };
    Ok(render(doc, &settings))
}

/// POST /api/preview - Render a PNG preview.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
    Json(doc): Json<InvoiceDocument>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rendered = render_for(&state, query.account.as_deref(), &doc).await?;
    let assets = state.exporter.preload(&rendered).await;

    let png = preview_png(&rendered, query.size, &assets).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("PNG encoding error: {}", e),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

fn export_error(e: ExportError) -> (StatusCode, String) {
    let status = match e {
        ExportError::TargetNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// POST /api/export - Export a PDF, as a download or base64 JSON.
///
/// A second export of a document number that is still exporting gets 409.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
    Json(doc): Json<InvoiceDocument>,
) -> Result<Response, (StatusCode, String)> {
    let number = doc.meta.number.clone();
    let _slot = state.begin_export(&number).ok_or((
        StatusCode::CONFLICT,
        format!("Export of '{}' already in progress", number),
    ))?;

    let rendered = render_for(&state, query.account.as_deref(), &doc).await?;

    let mut stage = Stage::new();
    stage.mount(View::new(number.as_str(), rendered).with_editor_chrome());
    let artifact = state
        .exporter
        .export_to_pdf(&mut stage, &number)
        .await
        .map_err(export_error)?;

    let response = match artifact.encode(query.encoding) {
        ExportOutput::File { file_name, bytes } => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        output @ ExportOutput::Base64 { .. } => Json(output).into_response(),
    };
    Ok(response)
}
