//! # HTTP Server for Template Settings, Previews and Exports
//!
//! ## Usage
//!
//! ```bash
//! proforma serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/presets` | | preset summaries |
//! | GET | `/api/presets/:name` | | full preset |
//! | GET | `/api/settings/:account` | | resolved settings |
//! | PUT | `/api/settings/:account` | partial settings | resolved settings |
//! | POST | `/api/settings/:account/field` | `{key, value}` | settings |
//! | POST | `/api/settings/:account/preset/:name` | | settings |
//! | POST | `/api/settings/:account/section-order` | `{section, index}` | settings |
//! | POST | `/api/preview?account=&size=` | invoice | PNG |
//! | POST | `/api/export?account=&encoding=` | invoice | PDF or base64 JSON |

mod handlers;
mod state;

pub use state::{AppState, ExportSlot, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ProformaError;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Presets
        .route("/api/presets", get(handlers::presets::list))
        .route("/api/presets/:name", get(handlers::presets::get))
        // Settings
        .route(
            "/api/settings/:account",
            get(handlers::settings::get).put(handlers::settings::put),
        )
        .route("/api/settings/:account/field", post(handlers::settings::field))
        .route(
            "/api/settings/:account/preset/:name",
            post(handlers::settings::apply_preset),
        )
        .route(
            "/api/settings/:account/section-order",
            post(handlers::settings::section_order),
        )
        // Documents
        .route("/api/preview", post(handlers::documents::preview))
        .route("/api/export", post(handlers::documents::export))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use proforma::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), proforma::ProformaError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ProformaError> {
    let app_state = Arc::new(AppState::in_memory(config.clone())?);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| ProformaError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    tracing::info!(
        listen = %config.listen_addr,
        oversample = config.export.oversample,
        image_timeout_secs = config.export.image_timeout.as_secs(),
        "proforma HTTP server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| ProformaError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::invoice::InvoiceDocument;
    use crate::settings::{SectionId, TemplateSettings};

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::in_memory(ServerConfig::default()).unwrap());
        (router(Arc::clone(&state)), state)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_json() -> Value {
        serde_json::to_value(InvoiceDocument::sample()).unwrap()
    }

    // ── presets ──

    #[tokio::test]
    async fn lists_presets() {
        let (app, _) = app();
        let response = app.oneshot(get_request("/api/presets")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "classic");
    }

    #[tokio::test]
    async fn unknown_preset_is_404() {
        let (app, _) = app();
        let response = app.oneshot(get_request("/api/presets/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── settings ──

    #[tokio::test]
    async fn unsaved_account_gets_defaults() {
        let (app, _) = app();
        let response = app.oneshot(get_request("/api/settings/acme")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::to_value(TemplateSettings::default()).unwrap());
    }

    #[tokio::test]
    async fn field_update_persists() {
        let (app, state) = app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/settings/acme/field",
                json!({"key": "primary_color", "value": "#000000"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = state.store.load_resolved("acme").await.unwrap();
        assert_eq!(stored.palette.primary_color, "#000000");
    }

    #[tokio::test]
    async fn concurrent_field_updates_are_all_kept() {
        let (app, state) = app();
        // each value differs from the default
        let updates = [
            ("show_logo", false),
            ("show_image_column", true),
            ("show_discount_column", true),
            ("show_terms", false),
            ("show_signature", false),
            ("show_customer_phone", false),
        ];

        let mut tasks = tokio::task::JoinSet::new();
        for (key, value) in updates {
            let app = app.clone();
            tasks.spawn(async move {
                app.oneshot(json_request(
                    "POST",
                    "/api/settings/acme/field",
                    json!({"key": key, "value": value}),
                ))
                .await
                .unwrap()
                .status()
            });
        }
        while let Some(status) = tasks.join_next().await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        let stored = serde_json::to_value(state.store.load_resolved("acme").await.unwrap()).unwrap();
        for (key, value) in updates {
            assert_eq!(stored[key], value, "{}", key);
        }
    }

    #[tokio::test]
    async fn unknown_field_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/settings/acme/field",
                json!({"key": "no_such_field", "value": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn section_move_persists_full_permutation() {
        let (app, state) = app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/settings/acme/section-order",
                json!({"section": "totals", "index": 0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = state.store.load_resolved("acme").await.unwrap();
        assert_eq!(stored.section_order[0], SectionId::Totals);
        assert_eq!(stored.section_order.len(), SectionId::CANONICAL.len());
    }

    #[tokio::test]
    async fn preset_application_replaces_settings() {
        let (app, state) = app();
        let response = app
            .oneshot(json_request("POST", "/api/settings/acme/preset/minimal", json!(null)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = state.store.load_resolved("acme").await.unwrap();
        let preset = crate::presets::by_name("minimal").unwrap();
        assert_eq!(stored, preset.settings);
    }

    // ── documents ──

    #[tokio::test]
    async fn preview_returns_png() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/api/preview?size=thumbnail", sample_json()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn export_returns_pdf_download() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/api/export?account=acme", sample_json()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("Quotation_QT-2026-0142.pdf"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn export_base64_returns_json() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/api/export?encoding=base64", sample_json()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["encoding"], "base64");
        assert_eq!(body["file_name"], "Quotation_QT-2026-0142.pdf");
        assert!(body["data"].as_str().unwrap().starts_with("JVBER"));
    }

    #[tokio::test]
    async fn concurrent_export_of_same_document_conflicts() {
        let (app, state) = app();
        let _running = state.begin_export("QT/2026/0142").unwrap();
        let response = app
            .oneshot(json_request("POST", "/api/export", sample_json()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn inconsistent_totals_are_rejected() {
        let (app, _) = app();
        let mut doc = sample_json();
        doc["totals"]["grand_total"] = json!(1.0);
        let response = app.oneshot(json_request("POST", "/api/export", doc)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
