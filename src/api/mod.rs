//! HTTP API for lecture material conversion.
//!
//! # Endpoints
//!
//! - `GET /` - liveness message
//! - `POST /process` - PDF/PPTX upload → captioned Word document
//! - `POST /process/text` - PDF/PPTX upload → text-only Word document
//! - `POST /braille` - Word upload → `.brf`
//! - `GET /status/:file_id` - job status
//! - `/static/*` - generated files
//!
//! Uploads are multipart forms with a single `file` field. Errors are JSON
//! `{"error": "...", "code": "..."}` with a 4xx/5xx status.
//!
//! ```bash
//! curl -F "file=@week1.pptx" -OJ http://localhost:8000/process
//! curl -F "file=@week1.docx" -OJ http://localhost:8000/braille
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::{ApiError, ErrorBody};
pub use handlers::FILE_ID_HEADER;
pub use server::{cors_layer, create_router, serve};
pub use types::{AppState, RootResponse, ServerOptions, StatusResponse, DEFAULT_MAX_UPLOAD_BYTES};
