use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use xpg_common::MicroUsdc;

use crate::{
    config::WalletConfig,
    data_objects::{AddressBalance, DepositAddress, NewWithdrawal, WalletEnvelope, WalletTransaction},
    error::WalletApiError,
    traits::CustodialWallet,
};

#[derive(Clone)]
pub struct WalletApi {
    config: WalletConfig,
    client: Arc<Client>,
}

impl WalletApi {
    pub fn new(config: WalletConfig) -> Result<Self, WalletApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| WalletApiError::Initialization(e.to_string()))?;
        headers.insert("x-api-key", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| WalletApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/wallets/{}{path}", self.config.base_url.trim_end_matches('/'), self.config.wallet_id)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, WalletApiError> {
        let url = self.url(path);
        trace!("🔮️ Sending wallet query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| WalletApiError::NetworkError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🔮️ Wallet query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| WalletApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| WalletApiError::NetworkError(e.to_string()))?;
            Err(WalletApiError::QueryError { status, message })
        }
    }
}

impl CustodialWallet for WalletApi {
    async fn create_address(&self, label: &str) -> Result<DepositAddress, WalletApiError> {
        let body = json!({ "name": label, "disableAutoSweep": true });
        let envelope =
            self.rest_query::<WalletEnvelope<DepositAddress>, _>(Method::POST, "/addresses", Some(body)).await?;
        let address = envelope
            .data
            .ok_or_else(|| WalletApiError::InvalidResponse(format!("No address in response: {}", envelope.message)))?;
        info!("🔮️ Allocated deposit address {} ({}) for {label}.", address.address, address.id);
        Ok(address)
    }

    async fn fetch_balance(&self, address_id: &str) -> Result<MicroUsdc, WalletApiError> {
        let path = format!("/addresses/{address_id}/balance?assetId={}", self.config.asset_id);
        let envelope = self.rest_query::<WalletEnvelope<AddressBalance>, ()>(Method::GET, &path, None).await?;
        let balance = envelope
            .data
            .ok_or_else(|| WalletApiError::InvalidResponse(format!("No balance in response: {}", envelope.message)))?;
        balance
            .as_micro_usdc()
            .ok_or_else(|| WalletApiError::InvalidResponse(format!("Unparseable balance: {}", balance.balance)))
    }

    async fn withdraw(
        &self,
        address_id: &str,
        to: &str,
        amount: MicroUsdc,
        reference: &str,
    ) -> Result<WalletTransaction, WalletApiError> {
        let withdrawal = NewWithdrawal {
            address: to.to_string(),
            amount: amount.to_decimal_string(),
            asset_id: self.config.asset_id.clone(),
            reference: reference.to_string(),
        };
        let path = format!("/addresses/{address_id}/withdraw");
        let envelope =
            self.rest_query::<WalletEnvelope<WalletTransaction>, _>(Method::POST, &path, Some(withdrawal)).await?;
        let tx = envelope
            .data
            .ok_or_else(|| WalletApiError::InvalidResponse(format!("No transaction in response: {}", envelope.message)))?;
        info!("🔮️ Withdrawal {} of {amount} to {to} submitted (status {}).", tx.id, tx.status);
        Ok(tx)
    }
}
