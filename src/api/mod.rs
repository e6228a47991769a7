use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    AllocationConfig, CalculationRequest, CalculationResult, ConfigSnapshot, ConfigUpdate,
    PortfolioAnalysisResult, PortfolioHoldings,
};
use crate::settings::Settings;

pub const CALCULATE_PATH: &str = "/api/calculate";
pub const ANALYZE_PORTFOLIO_PATH: &str = "/api/analyze-portfolio";
pub const CONFIG_PATH: &str = "/api/config";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unreadable reply (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("backend rejected the request: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),
    #[error("backend reported success without data")]
    MissingData,
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Decode { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(self.error));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

#[derive(Debug, Serialize)]
struct AnalyzePortfolioBody<'a> {
    holdings: &'a PortfolioHoldings,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResult, ApiError>;
    async fn analyze_portfolio(
        &self,
        holdings: &PortfolioHoldings,
    ) -> Result<PortfolioAnalysisResult, ApiError>;
    async fn fetch_config(&self) -> Result<ConfigSnapshot, ApiError>;
    async fn update_config(&self, config: &AllocationConfig) -> Result<ConfigUpdate, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    settings: Settings,
}

impl HttpBackend {
    pub fn new(settings: Settings) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    async fn exchange<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let url = self.settings.endpoint(path);
        tracing::debug!(%method, url = %url, "sending backend request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Error replies carry the same envelope, so the status code is informational only.
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
                status: status.as_u16(),
                source,
            })?;
        tracing::debug!(status = status.as_u16(), success = envelope.success, "backend replied");
        envelope.into_result()
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResult, ApiError> {
        self.exchange(Method::POST, CALCULATE_PATH, Some(request)).await
    }

    async fn analyze_portfolio(
        &self,
        holdings: &PortfolioHoldings,
    ) -> Result<PortfolioAnalysisResult, ApiError> {
        let body = AnalyzePortfolioBody { holdings };
        self.exchange(Method::POST, ANALYZE_PORTFOLIO_PATH, Some(&body)).await
    }

    async fn fetch_config(&self) -> Result<ConfigSnapshot, ApiError> {
        self.exchange::<(), _>(Method::GET, CONFIG_PATH, None).await
    }

    async fn update_config(&self, config: &AllocationConfig) -> Result<ConfigUpdate, ApiError> {
        self.exchange(Method::PUT, CONFIG_PATH, Some(config)).await
    }
}
