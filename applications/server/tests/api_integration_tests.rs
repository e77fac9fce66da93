/// API integration tests
/// Tests complete HTTP request/response cycles against the export pipeline
mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{
    body_bytes, body_json, create_test_app, dry_app, multipart_body, multipart_request, tone_wav,
    wet_app,
};
use remix_export::{ExportOptions, MissingImpulseResponse, ReverbFallback};
use std::sync::Arc;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = dry_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["exporting"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_formats_lists_allow_list() {
    let request = Request::builder()
        .uri("/api/formats")
        .body(Body::empty())
        .unwrap();

    let json = body_json(dry_app().oneshot(request).await.unwrap()).await;
    let extensions: Vec<&str> = json["formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["extension"].as_str().unwrap())
        .collect();
    assert_eq!(extensions, vec!["mp3", "ogg", "wav"]);
    assert_eq!(json["formats"][0]["mime_type"], "audio/mpeg");
}

#[tokio::test]
async fn test_export_returns_wav_download() {
    let source = tone_wav(8_000);
    let body = multipart_body(
        Some(("My Song.wav", source.as_slice())),
        &[("tempo", "2.0"), ("cutoff", "1500"), ("mix", "0")],
    );

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"My Song-edited.wav\""
    );
    assert_eq!(response.headers()["x-reverb-bypassed"], "false");

    let container = body_bytes(response).await;
    assert_eq!(container.len(), 44 + 4_000 * 2);
    assert_eq!(&container[..4], b"RIFF");
}

#[tokio::test]
async fn test_pitch_overrides_tempo() {
    let source = tone_wav(8_000);
    let body = multipart_body(
        Some(("a.wav", source.as_slice())),
        &[("tempo", "2.0"), ("pitch", "0.5")],
    );

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.len(), 44 + 16_000 * 2);
}

#[tokio::test]
async fn test_output_sample_rate_field() {
    let source = tone_wav(8_000);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[("sample_rate", "16000")]);

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let container = body_bytes(response).await;
    assert_eq!(u32::from_le_bytes(container[24..28].try_into().unwrap()), 16_000);
    assert_eq!(container.len(), 44 + 16_000 * 2);
}

#[tokio::test]
async fn test_unsupported_format_is_400() {
    let body = multipart_body(Some(("track.flac", &b"fLaC\0\0\0\""[..])), &[]);

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("MP3, OGG, or WAV"));
}

#[tokio::test]
async fn test_invalid_parameters_are_400() {
    let source = tone_wav(800);
    for fields in [
        vec![("tempo", "0")],
        vec![("mix", "1.5")],
        vec![("cutoff", "loud")],
    ] {
        let body = multipart_body(Some(("a.wav", source.as_slice())), &fields);
        let response = dry_app()
            .oneshot(multipart_request("/api/export", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{fields:?}");
    }
}

#[tokio::test]
async fn test_corrupt_file_is_422() {
    let body = multipart_body(Some(("a.mp3", b"garbage".repeat(200).as_slice())), &[]);

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_file_is_400() {
    let body = multipart_body(None, &[("tempo", "1.0")]);
    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing file");
}

#[tokio::test]
async fn test_non_multipart_is_400() {
    let request = Request::builder()
        .uri("/api/export")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = dry_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_impulse_with_reverb_is_500() {
    let source = tone_wav(800);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[("mix", "0.5")]);

    let response = dry_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_dry_only_fallback_sets_header() {
    let app = create_test_app(
        Arc::new(MissingImpulseResponse),
        ExportOptions {
            reverb_fallback: ReverbFallback::DryOnly,
            ..ExportOptions::default()
        },
        1024 * 1024,
    );
    let source = tone_wav(800);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[("mix", "0.5")]);

    let response = app
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-reverb-bypassed"], "true");
}

#[tokio::test]
async fn test_reverb_export() {
    let source = tone_wav(4_000);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[("mix", "0.4")]);

    let response = wet_app()
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-reverb-bypassed"], "false");
    assert_eq!(body_bytes(response).await.len(), source.len());
}

#[tokio::test]
async fn test_output_duration_limit() {
    let app = create_test_app(
        Arc::new(MissingImpulseResponse),
        ExportOptions {
            max_output_secs: Some(60.0),
            ..ExportOptions::default()
        },
        1024 * 1024,
    );
    // A tenth of a second stretched a million times
    let source = tone_wav(800);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[("tempo", "1e-6")]);

    let response = app
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn test_upload_limit() {
    let app = create_test_app(
        Arc::new(MissingImpulseResponse),
        ExportOptions::default(),
        1_024,
    );
    let source = tone_wav(8_000);
    let body = multipart_body(Some(("a.wav", source.as_slice())), &[]);

    let response = app
        .oneshot(multipart_request("/api/export", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_loaded_source_flow() {
    let app = dry_app();

    let request = Request::builder()
        .uri("/api/source")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let source = tone_wav(8_000);
    let body = multipart_body(Some(("loop.wav", source.as_slice())), &[]);
    let response = app
        .clone()
        .oneshot(multipart_request("/api/source", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["name"], "loop.wav");
    assert_eq!(summary["format"], "wav");
    assert_eq!(summary["frames"], 8_000);

    let request = Request::builder()
        .uri("/api/source/export")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"tempo_ratio": 0.5}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"loop-edited.wav\""
    );
    assert_eq!(body_bytes(response).await.len(), 44 + 16_000 * 2);
}
