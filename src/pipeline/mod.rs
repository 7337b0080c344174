//! Pipeline stages for PDF/PPTX conversion.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ caption ──▶ assemble ──▶ render
//! (URL/path) (pdf/pptx)  (text)   (VLM)      (order)      (.txt/.docx)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local
//!    file and check its leading bytes
//! 2. [`extract`]: dispatch to [`pdf`] or [`pptx`] on the blocking pool;
//!    produces an [`extract::ExtractedDocument`]
//! 3. [`clean`]: strip bullets, private-use glyphs and control characters
//! 4. [`caption`]: one VLM call per image with retry/backoff, via
//!    [`encode`] for the request body and [`postprocess`] for the answer
//! 5. [`assemble`]: interleave text blocks and captions in strict order
//! 6. [`render`]: write the plain-text and Word outputs atomically

pub mod assemble;
pub mod caption;
pub mod clean;
pub mod encode;
pub mod extract;
pub mod input;
pub mod pdf;
pub mod postprocess;
pub mod pptx;
pub mod render;
pub mod source;
