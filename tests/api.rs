//! HTTP API tests against the router, without a network listener.
#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::RgbImage;
use lecture_a11y::api::{create_router, AppState, ServerOptions, StatusResponse, FILE_ID_HEADER};
use lecture_a11y::docx::docx_bytes;
use lecture_a11y::jobs::{JobStatus, JobStore};
use lecture_a11y::{Captioner, ConversionConfig, ConvertError};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "lecture-a11y-test-boundary";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

struct FixedCaptioner;

#[async_trait]
impl Captioner for FixedCaptioner {
    async fn caption(&self, _image: &RgbImage) -> Result<String, ConvertError> {
        Ok("그림".to_string())
    }
}

struct Harness {
    dir: TempDir,
    jobs: JobStore,
    app: Router,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = ConversionConfig::builder()
        .output_dir(dir.path().join("static"))
        .build()
        .unwrap();
    let jobs = JobStore::in_memory().await.unwrap();
    let state = AppState::new(config, Arc::new(FixedCaptioner), jobs.clone());
    let app = create_router(state, &ServerOptions::default());
    Harness { dir, jobs, app }
}

fn upload(uri: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_reports_running() {
    let h = harness().await;
    let resp = h
        .app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn braille_rejects_spreadsheet() {
    let h = harness().await;
    let resp = h
        .app
        .oneshot(upload("/braille", "grades.xlsx", b"PK\x03\x04rest"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["code"], "unsupported_input");
    assert!(body["error"].as_str().unwrap().contains("grades.xlsx"));
    assert!(!h.dir.path().join("static").exists());
}

#[tokio::test]
async fn process_rejects_word_documents() {
    let h = harness().await;
    let resp = h
        .app
        .oneshot(upload("/process", "notes.docx", &docx_bytes(["x"]).unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["code"], "unsupported_format");
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let h = harness().await;
    let req = Request::builder()
        .method("POST")
        .uri("/braille")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn braille_upload_returns_brf_and_records_job() {
    let h = harness().await;
    let data = docx_bytes(["가나", "사"]).unwrap();
    let resp = h
        .app
        .clone()
        .oneshot(upload("/braille", "week1: notes.docx", &data))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains(&urlencoding::encode("week1_ notes.brf").into_owned()));
    let file_id = resp.headers()[FILE_ID_HEADER].to_str().unwrap().to_string();

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "⠫⠉\n⠇");
    assert!(h.dir.path().join("static/week1_ notes.brf").exists());

    let job = h.jobs.get(&file_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.original_name, "week1: notes.docx");

    let resp = h
        .app
        .oneshot(
            Request::get(format!("/status/{file_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let status: StatusResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status.status, JobStatus::Done);
    assert!(status.path.unwrap().ends_with("week1_ notes.brf"));
}

fn deck_bytes(dir: &std::path::Path) -> Vec<u8> {
    let path = dir.join("deck.pptx");
    common::write_deck(&path);
    std::fs::read(path).unwrap()
}

/// Checks the Word response headers and returns the job's file id.
async fn assert_docx_download(h: &Harness, resp: axum::response::Response, file_name: &str) -> String {
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], DOCX_CONTENT_TYPE);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"), "{disposition}");
    assert!(
        disposition.contains(&urlencoding::encode(file_name).into_owned()),
        "{disposition}"
    );
    let file_id = resp.headers()[FILE_ID_HEADER].to_str().unwrap().to_string();

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK\x03\x04"));
    assert_eq!(
        bytes.as_ref(),
        std::fs::read(h.dir.path().join("static").join(file_name)).unwrap()
    );
    file_id
}

#[tokio::test]
async fn process_returns_captioned_docx_and_records_job() {
    let h = harness().await;
    let data = deck_bytes(h.dir.path());
    let resp = h
        .app
        .clone()
        .oneshot(upload("/process", "Week 2.pptx", &data))
        .await
        .unwrap();

    let file_id = assert_docx_download(&h, resp, "Week 2_vlm.docx").await;
    let text = std::fs::read_to_string(h.dir.path().join("static/Week 2_vlm.txt")).unwrap();
    assert!(text.contains("=== SLIDE 1 IMAGE 2 ===\n그림\n"), "{text}");

    let job = h.jobs.get(&file_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.original_name, "Week 2.pptx");
    assert!(job.result_path.unwrap().ends_with("Week 2_vlm.docx"));

    let resp = h
        .app
        .oneshot(
            Request::get(format!("/status/{file_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status: StatusResponse = serde_json::from_slice(
        &to_bytes(resp.into_body(), usize::MAX).await.unwrap(),
    )
    .unwrap();
    assert_eq!(status.status, JobStatus::Done);
}

#[tokio::test]
async fn process_text_returns_plain_docx() {
    let h = harness().await;
    let data = deck_bytes(h.dir.path());
    let resp = h
        .app
        .clone()
        .oneshot(upload("/process/text", "Week 2.pptx", &data))
        .await
        .unwrap();

    let file_id = assert_docx_download(&h, resp, "Week 2.docx").await;
    let text = std::fs::read_to_string(h.dir.path().join("static/Week 2.txt")).unwrap();
    assert!(!text.contains("IMAGE"), "{text}");

    let job = h.jobs.get(&file_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert!(job.result_path.unwrap().ends_with("Week 2.docx"));
}

#[tokio::test]
async fn corrupt_word_document_is_bad_request() {
    let h = harness().await;
    let resp = h
        .app
        .oneshot(upload("/braille", "broken.docx", b"PK\x03\x04not really a zip"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["code"], "corrupt_document");
}

#[tokio::test]
async fn unknown_status_is_404() {
    let h = harness().await;
    let resp = h
        .app
        .oneshot(
            Request::get("/status/00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["code"], "not_found");
}
