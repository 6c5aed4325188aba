//! # XanPay server
//! This module hosts the HTTP surface of the payment gateway. It is responsible for:
//! Onboarding merchants and issuing bearer tokens.
//! Exposing the product catalog and invoice endpoints.
//! Listening for signed deposit webhooks from the wallet provider and routing them to settlement.
//! Composing fiat and crypto withdrawals across the off-ramp and wallet providers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` plus the merchant, invoice, webhook and withdrawal routes defined in [routes].

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod withdrawal;

#[cfg(test)]
mod endpoint_tests;
