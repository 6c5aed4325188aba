//! Client for the fiat off-ramp partner.
//!
//! The partner converts USDC into local-currency bank payouts. A withdrawal fetches a rate
//! quote, creates a payout order, and then pays the order's receive address on-chain; this crate
//! covers the first two legs.

mod api;
mod config;
mod data_objects;
mod error;
mod traits;

pub use api::OffRampApi;
pub use config::{OffRampConfig, DEFAULT_OFFRAMP_TIMEOUT_SECS};
pub use data_objects::{ApiEnvelope, ExchangeRate, NewOfframpOrder, OfframpOrder, OrderRecipient};
pub use error::OffRampApiError;
pub use traits::OffRamp;
