//! # lecture-a11y
//!
//! Convert lecture materials into formats blind and low-vision students can
//! use: slide decks and PDFs become plain text and Word documents with
//! vision-model image descriptions, and Word handouts become Korean Braille
//! (`.brf`).
//!
//! ## Pipelines
//!
//! ```text
//! PDF / PPTX
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, check magic bytes
//!  ├─ 2. Extract   text per page/slide + embedded images (spawn_blocking)
//!  ├─ 3. Clean     drop bullets, private-use glyphs and control characters
//!  ├─ 4. Caption   one VLM call per image, retried, control tokens stripped
//!  ├─ 5. Assemble  text block, then that unit's captions, in strict order
//!  └─ 6. Output    <stem>_vlm.txt + <stem>_vlm.docx (atomic writes)
//!
//! DOCX
//!  │
//!  ├─ 1. Read      paragraph text (docx-rs, raw XML fallback)
//!  ├─ 2. Prepare   allow-list → NFKC → substitutions → blank unknown chars
//!  ├─ 3. Braille   Korean Braille cells (braillify)
//!  └─ 4. Output    <stem>.brf (Unicode or ASCII Braille)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lecture_a11y::{convert, convert_to_braille, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ConversionConfig::builder().output_dir("out").build()?;
//!     let output = convert("week1.pptx", &config).await?;
//!     println!("{}", output.docx_path.display());
//!
//!     let brf = convert_to_braille("handout.docx", None, &config).await?;
//!     println!("{} cells", brf.cells);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP API ([`api`]) and SQLite job table ([`jobs`]) |
//! | `cli`    | on      | The `lecture2a11y` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "server")]
pub mod api;
pub mod braille;
pub mod config;
pub mod convert;
pub mod docx;
pub mod error;
#[cfg(feature = "server")]
pub mod jobs;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BrailleEncoding, ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_text, convert_to_braille, convert_with_captions};
pub use error::{CellError, ConvertError};
pub use output::{BrailleOutput, ConversionOutput, ConversionStats};
pub use pipeline::caption::{Captioner, VlmCaptioner};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
