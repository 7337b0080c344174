//! Output rendering: paragraph groups → `.txt` and `.docx` files.
//!
//! Every file is written to `<name>.tmp` next to its destination and renamed
//! into place, so a reader (or the `/static` file server) never sees a
//! half-written document.

use crate::docx;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Plain text of an assembled document: groups joined by `\n`.
pub fn render_text(groups: &[String]) -> String {
    groups.join("\n")
}

/// Write the plain-text rendering to `dir/txt_name` and the Word rendering,
/// one paragraph per line, to `dir/docx_name`.
pub async fn write_text_and_docx(
    groups: &[String],
    dir: &Path,
    txt_name: &str,
    docx_name: &str,
) -> Result<(PathBuf, PathBuf), ConvertError> {
    let text = render_text(groups);

    let txt_path = dir.join(txt_name);
    write_atomic(&txt_path, text.as_bytes()).await?;

    let docx_path = dir.join(docx_name);
    let bytes = tokio::task::spawn_blocking(move || docx::docx_bytes(text.split('\n')))
        .await
        .map_err(|e| ConvertError::Internal(format!("docx task panicked: {}", e)))??;
    write_atomic(&docx_path, &bytes).await?;

    Ok((txt_path, docx_path))
}

/// Write `contents` to `path` via a temp file + rename.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConvertError> {
    let write_err = |e| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}
