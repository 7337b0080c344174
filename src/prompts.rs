//! Prompts for VLM image captioning.
//!
//! Callers can override the default via
//! [`crate::config::ConversionConfig::caption_prompt`]; the constants here are
//! used only when no override is provided.

/// System message framing the captioning task.
pub const CAPTION_SYSTEM_PROMPT: &str = "You describe images from lecture materials for \
blind and low-vision students. Answer with the description only: no preamble, no markdown, \
no speaker labels.";

/// Default per-image instruction ("Describe this image in detail in Korean.").
///
/// The lecture materials this service targets are Korean; the caption lands
/// in the same document as the slide text and should read in the same language.
pub const DEFAULT_CAPTION_PROMPT: &str = "이 이미지를 한국어로 자세히 설명해줘.";

/// Resolve the instruction actually sent for an image.
pub fn caption_prompt(custom: Option<&str>) -> &str {
    match custom {
        Some(p) if !p.trim().is_empty() => p,
        _ => DEFAULT_CAPTION_PROMPT,
    }
}
