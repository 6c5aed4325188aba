pub mod merchant_api;
pub mod settlement_api;
