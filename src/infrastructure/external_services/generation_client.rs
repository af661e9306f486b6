use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::application::ports::generation_provider::{
    GenerationProvider, GenerationProviderError, GenerationRequest, GenerationResponse,
};

#[derive(Serialize)]
pub struct GenerateWireRequest {
    pub system: String,
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct GenerateWireResponse {
    pub text: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl Default for GenerationClientConfig {
    fn default() -> Self {
        let service_url = env::var("GENERATION_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8002/generate".to_string());
        let model_name = env::var("GENERATION_MODEL").unwrap_or_else(|_| "default".to_string());

        Self {
            service_url,
            model_name,
            max_retries: 2,
            timeout_secs: 60,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    config: GenerationClientConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(GenerationClientConfig::default())
    }

    pub fn config(&self) -> &GenerationClientConfig {
        &self.config
    }

    pub async fn generate_text(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<GenerateWireResponse, GenerationProviderError> {
        let request = GenerateWireRequest {
            system: system.to_string(),
            prompt: prompt.to_string(),
        };

        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                Err(GenerationProviderError::RateLimitExceeded) => {
                    return Err(GenerationProviderError::RateLimitExceeded);
                }
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

        Err(last_error.unwrap_or(GenerationProviderError::NetworkError(
            "Max retries exceeded".to_string(),
        )))
    }

    async fn execute_request(
        &self,
        request: &GenerateWireRequest,
    ) -> Result<GenerateWireResponse, GenerationProviderError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationProviderError::NetworkError(e.without_url().to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(GenerationProviderError::ApiError(format!(
                "Generation service returned {}",
                response.status()
            )));
        }

        response
            .json::<GenerateWireResponse>()
            .await
            .map_err(|e| GenerationProviderError::InvalidResponse(e.to_string()))
    }
}

// Adapter to implement the GenerationProvider trait
pub struct RemoteGenerationProvider {
    client: GenerationClient,
}

impl RemoteGenerationProvider {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        let client = GenerationClient::from_env()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl GenerationProvider for RemoteGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError> {
        let response = self
            .client
            .generate_text(&request.system_prompt, &request.user_prompt)
            .await?;

        if response.text.trim().is_empty() {
            return Err(GenerationProviderError::InvalidResponse(
                "Empty generation".to_string(),
            ));
        }

        let model_name = response
            .model
            .unwrap_or_else(|| self.client.config().model_name.clone());

        Ok(GenerationResponse {
            text: response.text,
            model_name,
        })
    }

    fn model_info(&self) -> String {
        self.client.config().model_name.clone()
    }
}
