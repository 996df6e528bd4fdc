/// Path segment of the chat endpoint.
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Default base URL for OpenAI-compatible APIs.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Default model used when none is provided.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for inline completions. Deterministic output keeps
/// repeated queries for the same prefix stable.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl PredictorConfig {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        let model = model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            api_key,
            base_url: sanitize_base_url(base_url),
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Build the configuration from an environment-like lookup.
    pub fn from_getter(mut getter: impl FnMut(&str) -> Option<String>) -> Self {
        let api_key = getter("GHOSTLINE_API_KEY").or_else(|| getter("OPENAI_API_KEY"));
        let base_url = getter("GHOSTLINE_BASE_URL").or_else(|| getter("OPENAI_BASE_URL"));
        let model = getter("GHOSTLINE_MODEL").or_else(|| getter("OPENAI_MODEL"));

        PredictorConfig::new(api_key, base_url, model)
    }

    pub fn from_env() -> Self {
        Self::from_getter(|key| std::env::var(key).ok())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn chat_endpoint(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
            trimmed.to_string()
        } else {
            format!("{trimmed}/{CHAT_COMPLETIONS_PATH}")
        }
    }
}

fn sanitize_base_url(base_url: Option<String>) -> String {
    base_url
        .and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.trim_end_matches('/').to_string())
            }
        })
        .unwrap_or_else(|| DEFAULT_BASE_URL.trim_end_matches('/').to_string())
}
