/// Export API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use remix_core::{EffectParameters, RemixError, SampleRate};
use remix_export::{ExportOutput, SourceSummary};
use std::path::Path;

const REVERB_BYPASSED: HeaderName = HeaderName::from_static("x-reverb-bypassed");

/// Uploaded file plus the slider values sent with it
#[derive(Debug)]
pub struct ExportForm {
    pub file_name: String,
    pub file_data: Vec<u8>,
    pub params: EffectParameters,
}

/// POST /api/export
/// Upload a file with effect settings and download the edited WAV
pub async fn export_track(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let form = parse_form(&headers, body).await?;
    let extension = extension_of(&form.file_name);

    tracing::debug!(
        "Export request for {} ({} bytes): {:?}",
        form.file_name,
        form.file_data.len(),
        form.params
    );

    let output = app_state
        .session
        .export_edited(form.file_data, &extension, form.params)
        .await?;

    wav_response(&form.file_name, output)
}

/// POST /api/source
/// Decode a file and keep it for repeated exports
pub async fn load_source(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SourceSummary>> {
    let form = parse_form(&headers, body).await?;
    let summary = app_state
        .session
        .load_source(form.file_data, &form.file_name)
        .await?;
    Ok(Json(summary))
}

/// GET /api/source
pub async fn get_source(State(app_state): State<AppState>) -> Result<Json<SourceSummary>> {
    app_state
        .session
        .loaded_source()
        .await
        .map(Json)
        .ok_or_else(|| RemixError::invalid_parameter("no source loaded").into())
}

/// POST /api/source/export
/// Render the loaded source with JSON effect parameters
pub async fn export_source(
    State(app_state): State<AppState>,
    Json(params): Json<EffectParameters>,
) -> Result<Response> {
    let name = app_state
        .session
        .loaded_source()
        .await
        .map(|summary| summary.name)
        .unwrap_or_default();
    let output = app_state.session.export_loaded(params).await?;
    wav_response(&name, output)
}

/// Parse the multipart export form
///
/// `pitch` and `tempo` drive the same playback rate; when both are sent the
/// pitch value wins.
pub async fn parse_form(headers: &HeaderMap, body: Bytes) -> Result<ExportForm> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServerError::BadRequest("Missing Content-Type".to_string()))?;

    if !content_type.starts_with("multipart/form-data") {
        return Err(ServerError::BadRequest(
            "Expected multipart/form-data".to_string(),
        ));
    }

    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| ServerError::BadRequest("Missing boundary".to_string()))?;

    // Convert Bytes to a stream for multer
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut tempo: Option<f64> = None;
    let mut pitch: Option<f64> = None;
    let mut params = EffectParameters::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let file_name = field.file_name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read file: {}", e)))?;
            file = Some((file_name, data.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read {}: {}", name, e)))?;

        match name.as_str() {
            "tempo" => tempo = Some(parse_number(&name, &value)?),
            "pitch" => pitch = Some(parse_number(&name, &value)?),
            "cutoff" => params.low_pass_cutoff_hz = parse_number(&name, &value)?,
            "mix" => params.reverb_mix = parse_number(&name, &value)?,
            "sample_rate" if !value.trim().is_empty() => {
                params.output_sample_rate = Some(SampleRate::new(parse_number(&name, &value)?));
            }
            _ => {}
        }
    }

    if let Some(ratio) = pitch.or(tempo) {
        params.tempo_ratio = ratio;
    }

    let (file_name, file_data) =
        file.ok_or_else(|| ServerError::BadRequest("Missing file".to_string()))?;

    Ok(ExportForm {
        file_name,
        file_data,
        params,
    })
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        RemixError::invalid_parameter(format!("{} must be a number, got {:?}", name, value)).into()
    })
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

/// Download name: the upload's stem with `-edited.wav`, restricted to
/// characters that are safe inside a quoted header value
pub fn download_name(file_name: &str) -> String {
    let stem: String = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim();

    if stem.is_empty() {
        "export-edited.wav".to_string()
    } else {
        format!("{stem}-edited.wav")
    }
}

fn wav_response(file_name: &str, output: ExportOutput) -> Result<Response> {
    let disposition = format!("attachment; filename=\"{}\"", download_name(file_name));
    let bypassed = if output.reverb_bypassed { "true" } else { "false" };

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (REVERB_BYPASSED, bypassed.to_string()),
        ],
        output.container,
    )
        .into_response())
}
