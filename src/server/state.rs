//! Server state and configuration.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::export::{ExportConfig, Exporter};
use crate::settings::{MemorySettingsStore, SettingsStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    pub export: ExportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            export: ExportConfig::default(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn SettingsStore>,
    pub exporter: Exporter,
    /// Document numbers with an export in flight.
    in_flight: Mutex<HashSet<String>>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn SettingsStore>, exporter: Exporter) -> Self {
        Self {
            config,
            store,
            exporter,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// State with an in-memory store and the default exporter.
    pub fn in_memory(config: ServerConfig) -> Result<Self, crate::export::ExportError> {
        let exporter = Exporter::with_defaults(config.export.clone())?;
        Ok(Self::new(config, Arc::new(MemorySettingsStore::new()), exporter))
    }

    /// Claim the export slot for `document_number`. `None` when an export
    /// of the same document is already running.
    pub fn begin_export(self: &Arc<Self>, document_number: &str) -> Option<ExportSlot> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(document_number.to_string()) {
            return None;
        }
        Some(ExportSlot {
            state: Arc::clone(self),
            document_number: document_number.to_string(),
        })
    }
}

/// Releases its document's export slot on drop.
pub struct ExportSlot {
    state: Arc<AppState>,
    document_number: String,
}

impl Drop for ExportSlot {
    fn drop(&mut self) {
        let mut in_flight = self.state.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.document_number);
    }
}
