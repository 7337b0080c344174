//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium and the zip reader both want a file-system path, so URL inputs are
//! downloaded into a `TempDir` that lives as long as the [`ResolvedInput`].
//! The leading bytes are checked against the extension before returning so
//! callers get a meaningful error rather than a parser failure deep inside
//! pdfium or the zip reader.

use crate::error::ConvertError;
use crate::pipeline::source::{extension_of, SourceFormat};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input: either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the document was downloaded to a temp directory,
    /// kept alive until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the document regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local document path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ConvertError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))?;
        Ok(ResolvedInput::Local(PathBuf::from(input)))
    }
}

/// Validate that `path` exists and its leading bytes match its extension.
///
/// Files with an extension outside [`SourceFormat`] are accepted untouched;
/// the pipeline that receives them rejects them with a format error.
pub fn resolve_local(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let Some(format) = SourceFormat::from_path(path) else {
        return Ok(());
    };

    let mut f = std::fs::File::open(path).map_err(|_| ConvertError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let mut magic = [0u8; 4];
    let n = f.read(&mut magic).unwrap_or(0);
    check_magic(path, format, &magic[..n])?;

    debug!("Resolved local {} document: {}", format, path.display());
    Ok(())
}

fn check_magic(path: &Path, format: SourceFormat, head: &[u8]) -> Result<(), ConvertError> {
    if head == format.magic() {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    magic[..head.len().min(4)].copy_from_slice(&head[..head.len().min(4)]);
    Err(ConvertError::NotADocument {
        path: path.to_path_buf(),
        expected: match format {
            SourceFormat::Pdf => "PDF",
            SourceFormat::Pptx => "PowerPoint",
            SourceFormat::Docx => "Word",
        },
        magic,
    })
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ConvertError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("timed out after {timeout_secs}s")
        } else {
            e.to_string()
        };
        ConvertError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| ConvertError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(format) = SourceFormat::from_path(&file_path) {
        check_magic(&file_path, format, &bytes[..bytes.len().min(4)])?;
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it carries a known extension.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && !extension_of(Path::new(last)).is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
