use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use xpg_common::MicroUsdc;

use crate::{
    config::OffRampConfig,
    data_objects::{ApiEnvelope, ExchangeRate, NewOfframpOrder, OfframpOrder},
    error::OffRampApiError,
    traits::OffRamp,
};

#[derive(Clone)]
pub struct OffRampApi {
    config: OffRampConfig,
    client: Arc<Client>,
}

impl OffRampApi {
    pub fn new(config: OffRampConfig) -> Result<Self, OffRampApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| OffRampApiError::Initialization(e.to_string()))?;
        headers.insert("API-Key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| OffRampApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, OffRampApiError> {
        let url = self.url(path);
        trace!("🏦️ Sending off-ramp query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| OffRampApiError::NetworkError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🏦️ Off-ramp query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| OffRampApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| OffRampApiError::NetworkError(e.to_string()))?;
            Err(OffRampApiError::QueryError { status, message })
        }
    }
}

impl OffRamp for OffRampApi {
    /// Fetches the current token → fiat rate. The provider quotes rates per whole token for a
    /// given notional amount, as a decimal string.
    async fn fetch_rate(&self, token: &str, amount: MicroUsdc, fiat: &str) -> Result<ExchangeRate, OffRampApiError> {
        let path = format!("/rates/{token}/{}/{fiat}", amount.to_decimal_string());
        let envelope = self.rest_query::<ApiEnvelope<String>, ()>(Method::GET, &path, None).await?;
        let raw = envelope
            .data
            .ok_or_else(|| OffRampApiError::InvalidResponse(format!("No rate in response: {}", envelope.message)))?;
        let rate = raw
            .parse::<f64>()
            .map_err(|_| OffRampApiError::InvalidResponse(format!("Unparseable rate: {raw}")))?;
        debug!("🏦️ Current {token}/{fiat} rate: {rate}");
        Ok(ExchangeRate { token: token.to_string(), fiat: fiat.to_string(), rate })
    }

    /// Creates a fiat payout order. The returned order carries the address the crypto leg must
    /// be paid to.
    async fn create_order(&self, order: NewOfframpOrder) -> Result<OfframpOrder, OffRampApiError> {
        let reference = order.reference.clone();
        let envelope = self.rest_query::<ApiEnvelope<OfframpOrder>, _>(Method::POST, "/sender/orders", Some(order)).await?;
        let order = envelope
            .data
            .ok_or_else(|| OffRampApiError::InvalidResponse(format!("No order in response: {}", envelope.message)))?;
        info!("🏦️ Off-ramp order {} created for reference {reference}.", order.id);
        Ok(order)
    }
}
