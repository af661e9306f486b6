use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingResponse, MAX_EMBED_CHARS,
};

#[derive(Serialize)]
pub struct EmbeddingsRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    pub embedding: Vector,
    pub model: Option<String>,
    pub token_count: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub dimension: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl Default for EmbeddingsClientConfig {
    fn default() -> Self {
        let service_url = env::var("EMBEDDINGS_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8001/embeddings".to_string());
        let model_name =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "default".to_string());
        let dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1536);

        Self {
            service_url,
            model_name,
            dimension,
            max_retries: 3,
            timeout_secs: 30,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug)]
pub enum EmbeddingsError {
    RequestError(String),
    ParseError(String),
    RateLimited,
    MaxRetriesExceeded(String),
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(EmbeddingsClientConfig::default())
    }

    pub fn config(&self) -> &EmbeddingsClientConfig {
        &self.config
    }

    pub async fn get_embedding(&self, text: &str) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            text: text.to_string(),
        };

        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                // Rate limits are surfaced immediately so the caller can
                // apply its own pacing instead of burning retries here.
                Err(EmbeddingsError::RateLimited) => return Err(EmbeddingsError::RateLimited),
                Err(e) => {
                    last_error = Some(e);

                    if attempts > self.config.max_retries {
                        break;
                    }

                    let backoff_time = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 1000.0) as u64,
                    );

                    tokio::time::sleep(backoff_time).await;
                }
            }
        }

        Err(last_error.unwrap_or(EmbeddingsError::MaxRetriesExceeded(
            "Max retries exceeded".to_string(),
        )))
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(e.without_url().to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingsError::RateLimited);
        }

        if !response.status().is_success() {
            return Err(EmbeddingsError::RequestError(format!(
                "Embeddings service returned {}",
                response.status()
            )));
        }

        response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))
    }
}

// Adapter to implement the EmbeddingProvider trait
pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        let client = InferenceClient::from_env()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embedding(
        &self,
        text: &str,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        if text.trim().is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }
        if text.chars().count() > MAX_EMBED_CHARS {
            return Err(EmbeddingProviderError::InvalidInput(format!(
                "Input exceeds {} character limit",
                MAX_EMBED_CHARS
            )));
        }

        let response = self.client.get_embedding(text).await.map_err(|e| match e {
            EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            EmbeddingsError::ParseError(msg) => EmbeddingProviderError::ApiError(msg),
            EmbeddingsError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
            EmbeddingsError::MaxRetriesExceeded(_) => EmbeddingProviderError::ServiceUnavailable,
        })?;

        if response.embedding.as_slice().len() != self.client.config().dimension {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {}-dimensional embedding, got {}",
                self.client.config().dimension,
                response.embedding.as_slice().len()
            )));
        }

        let model_name = response
            .model
            .unwrap_or_else(|| self.client.config().model_name.clone());

        Ok(EmbeddingResponse {
            embedding: response.embedding,
            model_name,
            token_count: response.token_count,
        })
    }

    fn model_info(&self) -> (String, Option<String>) {
        (self.client.config().model_name.clone(), None)
    }

    fn embedding_dimension(&self) -> usize {
        self.client.config().dimension
    }
}
