//! Client for the wallet-infrastructure provider.
//!
//! Every merchant gets a dedicated deposit address under one master custodial wallet. The
//! provider pushes deposit webhooks to the server and executes on-chain withdrawals on request.

mod api;
mod config;
mod data_objects;
mod error;
mod traits;

pub use api::WalletApi;
pub use config::{WalletConfig, DEFAULT_WALLET_TIMEOUT_SECS};
pub use data_objects::{AddressBalance, DepositAddress, NewWithdrawal, WalletEnvelope, WalletTransaction};
pub use error::WalletApiError;
pub use traits::CustodialWallet;
