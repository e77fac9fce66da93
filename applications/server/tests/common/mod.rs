//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use remix_audio::wav;
use remix_core::{PcmBuffer, SampleRate, SourceFormat};
use remix_export::{
    ExportOptions, ExportSession, ImpulseResponseSource, MissingImpulseResponse,
    StaticImpulseResponse,
};
use remix_server::{api, AppState};
use std::sync::Arc;

pub const BOUNDARY: &str = "remix-test-boundary";

/// Router backed by a session with the given impulse source
pub fn create_test_app(
    impulse: Arc<dyn ImpulseResponseSource>,
    options: ExportOptions,
    max_upload_bytes: usize,
) -> Router {
    let session = ExportSession::with_impulse_source(impulse).with_options(options);
    api::router(AppState::new(Arc::new(session), max_upload_bytes))
}

/// Router whose reverb always fails
pub fn dry_app() -> Router {
    create_test_app(
        Arc::new(MissingImpulseResponse),
        ExportOptions::default(),
        64 * 1024 * 1024,
    )
}

/// Router with a short in-memory impulse response
pub fn wet_app() -> Router {
    let tail: Vec<f32> = (0..200).map(|i| (-(i as f32) / 40.0).exp()).collect();
    let ir = PcmBuffer::new(vec![tail], SampleRate::TELEPHONE).unwrap();
    create_test_app(
        Arc::new(StaticImpulseResponse::new(
            wav::encode(&ir).unwrap(),
            SourceFormat::Wav,
        )),
        ExportOptions::default(),
        64 * 1024 * 1024,
    )
}

/// Mono 8 kHz sine as a WAV file
pub fn tone_wav(frames: usize) -> Vec<u8> {
    let tone: Vec<f32> = (0..frames)
        .map(|i| 0.5 * (i as f32 * 0.3).sin())
        .collect();
    wav::encode(&PcmBuffer::new(vec![tone], SampleRate::TELEPHONE).unwrap()).unwrap()
}

/// multipart/form-data body with one file part and text fields
pub fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart form to `uri`
pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
