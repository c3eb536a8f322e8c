//! Azure OpenAI adapter configuration.
//!
//! Azure's wire format matches OpenAI's chat completion shape exactly; only
//! the URL construction and the auth header differ.

#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub api_key: String,
    /// e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_version: String,
}

impl AzureConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
        }
    }

    pub fn chat_completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            deployment,
            self.api_version,
        )
    }
}
