//! Settings handlers.
//!
//! Edits of the current settings go through [`SettingsStore::update`], so
//! concurrent edits of one account are applied one after the other.
//! Wholesale replacements save the complete record directly.
//!
//! [`SettingsStore::update`]: crate::settings::SettingsStore::update

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::presets;
use crate::settings::{
    PartialSettings, SectionId, SettingsChange, SettingsError, TemplateSettings, move_section, resolve,
    update_field,
};

use super::super::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn settings_error(e: SettingsError) -> (StatusCode, String) {
    let status = match e {
        SettingsError::UnknownField(_) | SettingsError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SettingsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

async fn load(state: &AppState, account: &str) -> Result<TemplateSettings, (StatusCode, String)> {
    state.store.load_resolved(account).await.map_err(settings_error)
}

async fn save(state: &AppState, account: &str, settings: TemplateSettings) -> ApiResult<TemplateSettings> {
    state.store.save(account, &settings).await.map_err(settings_error)?;
    tracing::info!(account = %account, "settings saved");
    Ok(Json(settings))
}

async fn update(state: &AppState, account: &str, change: SettingsChange) -> ApiResult<TemplateSettings> {
    let settings = state.store.update(account, change).await.map_err(settings_error)?;
    tracing::info!(account = %account, "settings updated");
    Ok(Json(settings))
}

/// Body of a single-field update.
#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub key: String,
    pub value: Value,
}

/// Body of a section move.
#[derive(Debug, Deserialize)]
pub struct SectionMove {
    pub section: SectionId,
    pub index: usize,
}

/// GET /api/settings/:account - Resolved settings (defaults when unsaved).
pub async fn get(State(state): State<Arc<AppState>>, Path(account): Path<String>) -> ApiResult<TemplateSettings> {
    Ok(Json(load(&state, &account).await?))
}

/// PUT /api/settings/:account - Replace the record; missing fields default.
pub async fn put(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
    Json(partial): Json<PartialSettings>,
) -> ApiResult<TemplateSettings> {
    save(&state, &account, resolve(Some(&partial))).await
}

/// POST /api/settings/:account/field - Update one field by its key.
pub async fn field(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
    Json(FieldUpdate { key, value }): Json<FieldUpdate>,
) -> ApiResult<TemplateSettings> {
    update(
        &state,
        &account,
        Box::new(move |current: TemplateSettings| update_field(&current, &key, value)),
    )
    .await
}

/// POST /api/settings/:account/preset/:name - Apply a preset wholesale.
pub async fn apply_preset(
    State(state): State<Arc<AppState>>,
    Path((account, name)): Path<(String, String)>,
) -> ApiResult<TemplateSettings> {
    let preset = presets::by_name(&name).ok_or((StatusCode::NOT_FOUND, format!("Preset '{}' not found", name)))?;
    save(&state, &account, presets::apply_preset(preset)).await
}

/// POST /api/settings/:account/section-order - Move one section.
pub async fn section_order(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
    Json(change): Json<SectionMove>,
) -> ApiResult<TemplateSettings> {
    let SectionMove { section, index } = change;
    update(
        &state,
        &account,
        Box::new(move |mut settings: TemplateSettings| -> Result<TemplateSettings, SettingsError> {
            settings.section_order = move_section(&settings.section_order, section, index);
            Ok(settings)
        }),
    )
    .await
}
