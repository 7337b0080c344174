//! API request handlers.
//!
//! Upload handlers share one flow: read the `file` field, validate its name
//! for the pipeline, store it in a temp file with the same extension, create
//! a job, run the conversion, record the outcome and stream the result back.
//! Validation happens before the job row exists, so a rejected upload leaves
//! no trace in the job table or the output directory.

use super::error::ApiError;
use super::types::{AppState, RootResponse, StatusResponse};
use crate::convert::{convert_text, convert_to_braille, convert_with_captions, ensure_docx};
use crate::error::ConvertError;
use crate::jobs::JobStore;
use crate::pipeline::source::{extension_of, SourceFormat};
use axum::{
    body::Body,
    extract::{Multipart, Path as UrlPath, State},
    http::header,
    response::Response,
    Json,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const BRF_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Header carrying the job identifier of a conversion response.
pub const FILE_ID_HEADER: &str = "x-file-id";

#[derive(Debug, Clone, Copy)]
enum Pipeline {
    Captions,
    Text,
    Braille,
}

impl Pipeline {
    fn validate(self, original_name: &str) -> Result<(), ConvertError> {
        let path = Path::new(original_name);
        match self {
            Pipeline::Captions | Pipeline::Text => SourceFormat::lecture_from_path(path).map(|_| ()),
            Pipeline::Braille => ensure_docx(path),
        }
    }
}

/// An upload stored on disk for the duration of one request.
struct Upload {
    original_name: String,
    file: NamedTempFile,
}

impl Upload {
    fn path_str(&self) -> String {
        self.file.path().to_string_lossy().into_owned()
    }
}

async fn receive_upload(mut multipart: Multipart, pipeline: Pipeline) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Upload field 'file' has no file name"))?;

        pipeline.validate(&original_name)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        let suffix = format!(".{}", extension_of(Path::new(&original_name)));
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| ApiError::internal(format!("tempfile: {e}")))?;
        file.write_all(&data)
            .map_err(|e| ApiError::internal(format!("tempfile write: {e}")))?;

        info!("Received '{}' ({} bytes) for {:?}", original_name, data.len(), pipeline);
        return Ok(Upload { original_name, file });
    }
    Err(ApiError::bad_request("Missing multipart field 'file'"))
}

/// Record the outcome of a conversion on its job row.
async fn finish_job(
    jobs: &JobStore,
    file_id: &str,
    result: Result<PathBuf, ConvertError>,
) -> Result<PathBuf, ApiError> {
    match result {
        Ok(path) => {
            jobs.complete(file_id, &path.to_string_lossy()).await?;
            Ok(path)
        }
        Err(e) => {
            warn!("Job {} failed: {}", file_id, e);
            if let Err(db) = jobs.fail(file_id).await {
                warn!("Could not mark job {} failed: {}", file_id, db);
            }
            Err(e.into())
        }
    }
}

async fn file_response(path: &Path, content_type: &str, file_id: &str) -> Result<Response, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::internal(format!("cannot read {}: {e}", path.display())))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&filename)
    );

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(FILE_ID_HEADER, file_id)
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Lecture material converter is running".to_string(),
    })
}

/// POST /process
///
/// PDF or PPTX upload; responds with the captioned Word document.
pub async fn process_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = receive_upload(multipart, Pipeline::Captions).await?;
    let job = state.jobs.create(&upload.original_name).await?;

    let result = convert_with_captions(
        upload.path_str(),
        Some(&upload.original_name),
        state.captioner.as_ref(),
        &state.config,
    )
    .await
    .map(|out| out.docx_path);

    let path = finish_job(&state.jobs, &job.file_id, result).await?;
    file_response(&path, DOCX_CONTENT_TYPE, &job.file_id).await
}

/// POST /process/text
///
/// PDF or PPTX upload; responds with the text-only Word document.
pub async fn process_text_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = receive_upload(multipart, Pipeline::Text).await?;
    let job = state.jobs.create(&upload.original_name).await?;

    let result = convert_text(upload.path_str(), Some(&upload.original_name), &state.config)
        .await
        .map(|out| out.docx_path);

    let path = finish_job(&state.jobs, &job.file_id, result).await?;
    file_response(&path, DOCX_CONTENT_TYPE, &job.file_id).await
}

/// POST /braille
///
/// Word upload; responds with the `.brf` file.
pub async fn braille_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = receive_upload(multipart, Pipeline::Braille).await?;
    let job = state.jobs.create(&upload.original_name).await?;

    let result = convert_to_braille(upload.path_str(), Some(&upload.original_name), &state.config)
        .await
        .map(|out| out.brf_path);

    let path = finish_job(&state.jobs, &job.file_id, result).await?;
    file_response(&path, BRF_CONTENT_TYPE, &job.file_id).await
}

/// GET /status/:file_id
pub async fn status_handler(
    State(state): State<AppState>,
    UrlPath(file_id): UrlPath<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state.jobs.get(&file_id).await?;
    Ok(Json(StatusResponse {
        file_id: job.file_id,
        status: job.status,
        path: job.result_path,
    }))
}
