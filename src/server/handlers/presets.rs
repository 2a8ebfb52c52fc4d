//! Preset catalog handlers.

use axum::{Json, extract::Path, http::StatusCode};
use serde::Serialize;

use crate::presets::{self, TemplatePreset};

/// Catalog entry as shown in the preset picker.
#[derive(Debug, Serialize)]
pub struct PresetSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub swatch: [&'static str; 3],
    pub tags: &'static [&'static str],
}

impl From<&TemplatePreset> for PresetSummary {
    fn from(preset: &TemplatePreset) -> Self {
        Self {
            name: preset.name,
            description: preset.description,
            swatch: preset.swatch,
            tags: preset.tags,
        }
    }
}

/// GET /api/presets - List presets in display order.
pub async fn list() -> Json<Vec<PresetSummary>> {
    Json(presets::catalog().iter().map(PresetSummary::from).collect())
}

/// GET /api/presets/:name - Full preset, settings included.
pub async fn get(Path(name): Path<String>) -> Result<Json<&'static TemplatePreset>, (StatusCode, String)> {
    presets::by_name(&name)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("Preset '{}' not found", name)))
}
