use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::Serialize;
use std::env;
use std::time::Duration;

use crate::application::ports::vision_provider::{
    VisionExtraction, VisionProvider, VisionProviderError,
};

#[derive(Serialize)]
pub struct AnalyzeWireRequest {
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct VisionClientConfig {
    pub service_url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl Default for VisionClientConfig {
    fn default() -> Self {
        let service_url = env::var("VISION_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8003/analyze".to_string());

        Self {
            service_url,
            max_retries: 2,
            timeout_secs: 90,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    config: VisionClientConfig,
}

impl VisionClient {
    pub fn new(config: VisionClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(VisionClientConfig::default())
    }

    pub async fn analyze(
        &self,
        image_url: &str,
    ) -> Result<VisionExtraction, VisionProviderError> {
        let request = AnalyzeWireRequest {
            image_url: image_url.to_string(),
        };

        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(extraction) => return Ok(extraction),
                Err(VisionProviderError::RateLimitExceeded) => {
                    return Err(VisionProviderError::RateLimitExceeded);
                }
                // A contract break won't heal on retry.
                Err(VisionProviderError::InvalidResponse(msg)) => {
                    return Err(VisionProviderError::InvalidResponse(msg));
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

        Err(last_error.unwrap_or(VisionProviderError::NetworkError(
            "Max retries exceeded".to_string(),
        )))
    }

    async fn execute_request(
        &self,
        request: &AnalyzeWireRequest,
    ) -> Result<VisionExtraction, VisionProviderError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| VisionProviderError::NetworkError(e.without_url().to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(VisionProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(VisionProviderError::ApiError(format!(
                "Vision service returned {}",
                response.status()
            )));
        }

        // Parse in two steps so a schema mismatch is distinguishable from a
        // malformed body.
        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| VisionProviderError::ApiError(e.to_string()))?;

        serde_json::from_value::<VisionExtraction>(payload)
            .map_err(|e| VisionProviderError::InvalidResponse(e.to_string()))
    }
}

// Adapter to implement the VisionProvider trait
pub struct RemoteVisionProvider {
    client: VisionClient,
}

impl RemoteVisionProvider {
    pub fn new(client: VisionClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        let client = VisionClient::from_env()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VisionProvider for RemoteVisionProvider {
    async fn analyze_figure(
        &self,
        image_url: &str,
    ) -> Result<VisionExtraction, VisionProviderError> {
        self.client.analyze(image_url).await
    }
}
