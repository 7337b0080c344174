//! Output file naming.
//!
//! Uploaded file names come straight from browsers and may contain path
//! separators or characters Windows refuses. Every output stem goes through
//! [`sanitize_filename`] before it touches the file system.

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Suffix appended to the stem of captioned outputs.
pub const VLM_SUFFIX: &str = "_vlm";
pub const TXT_EXT: &str = "txt";
pub const DOCX_EXT: &str = "docx";
pub const BRF_EXT: &str = "brf";

const FORBIDDEN: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Make `name` safe to use as a file name.
///
/// NFKC-normalises, replaces each of `\ / : * ? " < > |` with `_` and trims
/// leading and trailing spaces and periods. Applying it twice gives the same
/// result as applying it once.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .nfkc()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim_matches(|c| c == ' ' || c == '.').to_string()
}

/// Pick the stem for the outputs of one conversion.
///
/// Uses the sanitized `desired` name when it is non-empty, otherwise the
/// sanitized stem of `source`. Falls back to `"output"` when both are empty.
pub fn output_stem(desired: Option<&str>, source: &Path) -> String {
    if let Some(d) = desired {
        // Callers usually pass the upload's original name; drop its extension.
        let stem = Path::new(d)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(d);
        let s = sanitize_filename(stem);
        if !s.is_empty() {
            return s;
        }
    }
    let s = source
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_filename)
        .unwrap_or_default();
    if s.is_empty() {
        "output".to_string()
    } else {
        s
    }
}

/// `<stem>.<ext>`
pub fn with_ext(stem: &str, ext: &str) -> String {
    format!("{stem}.{ext}")
}

/// `<stem>_vlm.<ext>`
pub fn vlm_name(stem: &str, ext: &str) -> String {
    format!("{stem}{VLM_SUFFIX}.{ext}")
}
