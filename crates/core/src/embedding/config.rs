use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Endpoint settings for `OpenAiEmbedder`.
pub struct EmbeddingClientConfig {
    base_url: String,
    api_key: SecretString,
    model: String,
}

pub struct EmbeddingClientConfigBuilder {
    config: EmbeddingClientConfig,
}

impl EmbeddingClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EmbeddingClientConfig::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn build(self) -> EmbeddingClientConfig {
        self.config
    }
}

impl Default for EmbeddingClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingClientConfig {
    // Defaults carry no key; the host supplies one explicitly.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(String::new()),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn builder() -> EmbeddingClientConfigBuilder {
        EmbeddingClientConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn builder_overrides_defaults() {
        let config = EmbeddingClientConfig::builder()
            .with_base_url("http://localhost:8080/v1/")
            .with_api_key("sk-test")
            .with_model("text-embedding-3-large")
            .build();

        assert_eq!(config.embeddings_url(), "http://localhost:8080/v1/embeddings");
        assert_eq!(config.api_key().expose_secret(), "sk-test");
        assert_eq!(config.model(), "text-embedding-3-large");
    }

    #[test]
    fn defaults_point_at_openai() {
        let config = EmbeddingClientConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), DEFAULT_EMBEDDING_MODEL);
        assert!(config.api_key().expose_secret().is_empty());
    }
}
