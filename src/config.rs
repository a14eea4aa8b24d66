//! Configuration types for document field extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs, serialise them for logging, and diff two runs
//! to understand why their outputs differ.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrEngine;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for one document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2fields::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .ocr_language("eng")
///     .model("gemini-1.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum rendered page dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap on PDF rasterisation. Without it an A0 poster page could
    /// produce a 13 000 × 18 000 px image and exhaust memory; pdfium scales
    /// the other dimension proportionally.
    pub max_rendered_pixels: u32,

    /// Tesseract language code(s), e.g. "eng" or "eng+hin". Default: "eng".
    pub ocr_language: String,

    /// Pre-constructed OCR engine. If None, a Tesseract engine is created
    /// with `ocr_language`. Mainly useful for tests.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// LLM model identifier, e.g. "gemini-1.5-flash", "gpt-4.1-nano".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected from
    /// environment API keys.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the OCR text; creativity
    /// only hurts field extraction.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 2048.
    ///
    /// Marksheets with long subject tables are the largest responses in
    /// practice; 2048 covers them with room to spare.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            ocr_language: "eng".to_string(),
            ocr_engine: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            password: None,
            system_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|e| e.name()))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.ocr_language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = ExtractionConfig::default();
        assert_eq!(c.ocr_language, "eng");
        assert_eq!(c.max_rendered_pixels, 2000);
        assert_eq!(c.max_retries, 3);
        assert!(c.provider.is_none());
    }

    #[test]
    fn builder_clamps_pixels_and_temperature() {
        let c = ExtractionConfig::builder()
            .max_rendered_pixels(10)
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.max_rendered_pixels, 100);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_empty_language() {
        let err = ExtractionConfig::builder()
            .ocr_language("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        let err = ExtractionConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }
}
