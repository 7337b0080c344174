//! Caption generation: turn an extracted image into a short description.
//!
//! [`Captioner`] is the seam between the document assembler and whatever
//! produces captions. Production uses [`VlmCaptioner`], which sends the image
//! to a vision-language model through `edgequake-llm`; tests plug in fakes.
//!
//! ## Provider lifecycle
//!
//! Resolving a provider reads environment variables and may build HTTP
//! clients, so it happens lazily on the first caption request and at most
//! once per captioner. Concurrent first callers wait on the same
//! initialisation (`tokio::sync::OnceCell::get_or_try_init`); a failed
//! initialisation is not cached, so the next request tries again.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Each call is retried
//! with exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) and bounded
//! by `api_timeout_secs`. With the defaults a caption fails after three
//! attempts and 1.5 s of backoff.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pipeline::{encode, postprocess};
use crate::prompts::{caption_prompt, CAPTION_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Model used when a provider is named without a model.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-nano";

/// Produces a caption for one image.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &RgbImage) -> Result<String, ConvertError>;
}

/// Captioner backed by a vision-language model.
pub struct VlmCaptioner {
    config: ConversionConfig,
    provider: OnceCell<Arc<dyn LLMProvider>>,
}

impl VlmCaptioner {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            config: config.clone(),
            provider: OnceCell::new(),
        }
    }

    /// Resolve the provider now instead of on the first request.
    pub async fn warm_up(&self) -> Result<(), ConvertError> {
        self.provider().await?;
        info!("Caption provider ready");
        Ok(())
    }

    /// `true` once a provider has been resolved.
    pub fn is_ready(&self) -> bool {
        self.provider.initialized()
    }

    async fn provider(&self) -> Result<&Arc<dyn LLMProvider>, ConvertError> {
        self.provider
            .get_or_try_init(|| async { resolve_provider(&self.config) })
            .await
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Captioner for VlmCaptioner {
    async fn caption(&self, image: &RgbImage) -> Result<String, ConvertError> {
        let provider = self.provider().await?;

        let image_data = encode::encode_image(image).map_err(|e| {
            ConvertError::Internal(format!("Image encoding failed: {}", e))
        })?;
        let messages = vec![
            ChatMessage::system(CAPTION_SYSTEM_PROMPT),
            ChatMessage::user_with_images(
                caption_prompt(self.config.caption_prompt.as_deref()),
                vec![image_data],
            ),
        ];
        let options = self.options();
        let call_timeout = Duration::from_secs(self.config.api_timeout_secs);

        let mut last_err = String::from("no attempt made");
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(
                    "Caption retry {}/{} after {}ms",
                    attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Caption: {} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    return Ok(postprocess::clean_caption(&response.content));
                }
                Ok(Err(e)) => {
                    last_err = e.to_string();
                    warn!("Caption attempt {} failed: {}", attempt + 1, last_err);
                }
                Err(_) => {
                    last_err = format!("timed out after {}s", self.config.api_timeout_secs);
                    warn!("Caption attempt {} {}", attempt + 1, last_err);
                }
            }
        }

        Err(ConvertError::CaptionUnavailable {
            detail: format!(
                "{} (after {} attempts)",
                last_err,
                self.config.max_retries + 1
            ),
        })
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ConvertError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ConvertError::CaptionUnavailable {
            detail: format!("provider '{provider_name}' could not be created: {e}"),
        }
    })
}

/// Resolve the vision provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`), API key read from
///    the provider's usual environment variable.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &ConversionConfig) -> Result<Arc<dyn LLMProvider>, ConvertError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ConvertError::CaptionUnavailable {
            detail: format!(
                "no vision provider could be auto-detected from the environment; \
                set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider ({e})"
            ),
        })?;

    Ok(llm_provider)
}
