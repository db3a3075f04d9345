use async_trait::async_trait;
use chrono::SecondsFormat;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::{redact_query, CoreError};
use crate::models::asset::Asset;
use crate::models::history::{HistoryRequest, RateSample};
use crate::models::settings::Settings;
use super::traits::MarketDataSource;

const PROVIDER: &str = "CoinAPI";
const API_KEY_HEADER: &str = "X-CoinAPI-Key";

/// CoinAPI market-data provider.
///
/// - **Endpoints**: `/v1/assets`, `/v1/exchangerate/{base}/{quote}/history`
/// - **Auth**: `X-CoinAPI-Key` header (a key is required for most plans).
/// - **Data**: prices are USD; volumes are USD over the last hour / day.
pub struct CoinApiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinApiProvider {
    pub fn new(settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    pub fn assets_url(&self) -> String {
        format!("{}/v1/assets", self.base_url)
    }

    /// History endpoint for `request`. Ids are percent-encoded as path
    /// segments, so an id cannot redirect the request to another endpoint.
    pub fn history_url(&self, request: &HistoryRequest) -> Result<String, CoreError> {
        let invalid = |reason: String| {
            CoreError::InvalidConfig(format!("api_url '{}' {reason}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(format!("is not a URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be used as a base URL".into()))?
            .pop_if_empty()
            .extend([
                "v1",
                "exchangerate",
                request.asset_id.as_str(),
                request.quote_id.as_str(),
                "history",
            ]);
        url.set_query(Some(&format!(
            "period_id={}&time_start={}&time_end={}",
            request.period,
            request.from.to_rfc3339_opts(SecondsFormat::Secs, true),
            request.to.to_rfc3339_opts(SecondsFormat::Secs, true),
        )));
        Ok(url.into())
    }

    /// GET `url` and return the body of a successful response.
    ///
    /// Rate limiting (429) and server errors (5xx) are reported as network
    /// errors so callers may retry them; other failures are API errors.
    async fn get_body(&self, url: &str) -> Result<String, CoreError> {
        debug!("GET {}", redact_query(url));
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        let message = format!("HTTP {status}: {}", error_message(&body));
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(CoreError::Network(format!("{PROVIDER} {message}")))
        } else {
            Err(CoreError::Api {
                provider: PROVIDER.into(),
                message,
            })
        }
    }
}

// ── CoinAPI response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

/// Decode a `/v1/assets` response body.
pub fn parse_assets(body: &str) -> Result<Vec<Asset>, CoreError> {
    serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse asset list: {e}"),
    })
}

/// Decode an exchange-rate history response body.
pub fn parse_history(body: &str) -> Result<Vec<RateSample>, CoreError> {
    serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse rate history: {e}"),
    })
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataSource for CoinApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_assets(&self) -> Result<Vec<Asset>, CoreError> {
        let body = self.get_body(&self.assets_url()).await?;
        parse_assets(&body)
    }

    async fn get_rate_history(&self, request: &HistoryRequest) -> Result<Vec<RateSample>, CoreError> {
        let url = self.history_url(request)?;
        let body = self.get_body(&url).await?;
        parse_history(&body)
    }
}
