/// Accepted upload formats
use axum::Json;
use remix_core::SourceFormat;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub extension: &'static str,
    pub mime_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
}

/// GET /api/formats
pub async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: SourceFormat::ALL
            .iter()
            .map(|format| FormatInfo {
                extension: format.extension(),
                mime_type: format.mime_type(),
            })
            .collect(),
    })
}
