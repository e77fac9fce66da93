/// Shared application state
use remix_export::ExportSession;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ExportSession>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(session: Arc<ExportSession>, max_upload_bytes: usize) -> Self {
        Self {
            session,
            max_upload_bytes,
        }
    }
}
