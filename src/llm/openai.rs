//! OpenAI-compatible embedding and chat-completion client.
//!
//! Supports both the standard OpenAI API and Azure OpenAI deployments;
//! the two differ only in URL shape and auth header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{EmbeddingProvider, GenerationProvider, ProviderError};
use super::types::ChatMessage;

#[derive(Debug, Clone)]
enum Flavor {
    OpenAi {
        base_url: String,
        chat_model: String,
        embedding_model: String,
    },
    Azure {
        endpoint: String,
        chat_deployment: Option<String>,
        embedding_deployment: Option<String>,
        api_version: String,
    },
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    flavor: Flavor,
    embedding_dimensions: usize,
}

impl OpenAiProvider {
    pub fn openai(
        api_key: String,
        base_url: String,
        chat_model: String,
        embedding_model: String,
        embedding_dimensions: usize,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: build_client(timeout_secs),
            api_key,
            flavor: Flavor::OpenAi {
                base_url: base_url.trim_end_matches('/').to_string(),
                chat_model,
                embedding_model,
            },
            embedding_dimensions,
        }
    }

    pub fn azure(
        api_key: String,
        endpoint: String,
        chat_deployment: Option<String>,
        embedding_deployment: Option<String>,
        api_version: String,
        embedding_dimensions: usize,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: build_client(timeout_secs),
            api_key,
            flavor: Flavor::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                chat_deployment,
                embedding_deployment,
                api_version,
            },
            embedding_dimensions,
        }
    }

    pub fn supports_embeddings(&self) -> bool {
        match &self.flavor {
            Flavor::OpenAi { .. } => true,
            Flavor::Azure {
                embedding_deployment,
                ..
            } => embedding_deployment.is_some(),
        }
    }

    pub fn supports_generation(&self) -> bool {
        match &self.flavor {
            Flavor::OpenAi { .. } => true,
            Flavor::Azure {
                chat_deployment, ..
            } => chat_deployment.is_some(),
        }
    }

    fn embeddings_url(&self) -> Result<String, ProviderError> {
        match &self.flavor {
            Flavor::OpenAi { base_url, .. } => Ok(format!("{base_url}/v1/embeddings")),
            Flavor::Azure {
                endpoint,
                embedding_deployment,
                api_version,
                ..
            } => {
                let deployment = embedding_deployment
                    .as_ref()
                    .ok_or_else(|| ProviderError::NotConfigured("embeddings".to_string()))?;
                Ok(format!(
                    "{endpoint}/openai/deployments/{deployment}/embeddings?api-version={api_version}"
                ))
            }
        }
    }

    fn chat_url(&self) -> Result<String, ProviderError> {
        match &self.flavor {
            Flavor::OpenAi { base_url, .. } => Ok(format!("{base_url}/v1/chat/completions")),
            Flavor::Azure {
                endpoint,
                chat_deployment,
                api_version,
                ..
            } => {
                let deployment = chat_deployment
                    .as_ref()
                    .ok_or_else(|| ProviderError::NotConfigured("chat".to_string()))?;
                Ok(format!(
                    "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
                ))
            }
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.flavor {
            Flavor::OpenAi { .. } => request.bearer_auth(&self.api_key),
            Flavor::Azure { .. } => request.header("api-key", &self.api_key),
        }
    }

    async fn post_json(&self, url: &str, body: Value) -> Result<Value, ProviderError> {
        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http(format!("{status}: {text}")));
        }

        Ok(response.json::<Value>().await?)
    }
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match &self.flavor {
            Flavor::OpenAi { .. } => "openai",
            Flavor::Azure { .. } => "azure-openai",
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.embeddings_url()?;

        let mut body = json!({ "input": text });
        if let Flavor::OpenAi {
            embedding_model, ..
        } = &self.flavor
        {
            body["model"] = json!(embedding_model);
        }
        if self.embedding_dimensions > 0 {
            body["dimensions"] = json!(self.embedding_dimensions);
        }

        let payload = self.post_json(&url, body).await?;
        let values = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("missing embedding data".to_string()))?;

        Ok(values
            .iter()
            .filter_map(|value| value.as_f64().map(|f| f as f32))
            .collect())
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match &self.flavor {
            Flavor::OpenAi { .. } => "openai",
            Flavor::Azure { .. } => "azure-openai",
        }
    }

    async fn generate(
        &self,
        system_context: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let url = self.chat_url()?;

        let mut payload_messages = vec![json!({ "role": "system", "content": system_context })];
        for message in messages {
            payload_messages.push(json!({ "role": message.role, "content": message.content }));
        }

        let mut body = json!({
            "messages": payload_messages,
            "temperature": 0.7,
        });
        if let Flavor::OpenAi { chat_model, .. } = &self.flavor {
            body["model"] = json!(chat_model);
        }

        let payload = self.post_json(&url, body).await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ProviderError::Malformed("missing completion content".to_string()))?;

        Ok(content.to_string())
    }
}
