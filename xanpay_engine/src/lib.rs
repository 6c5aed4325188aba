//! XanPay Payment Engine
//!
//! The XanPay Payment Engine lets merchants accept USDC deposits against invoices and withdraw
//! their balance as crypto or fiat. This library contains the core logic for the engine and is
//! provider-agnostic: the custodial wallet and the fiat off-ramp are consumed through traits
//! defined by the server crate.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the only supported backend at
//!    present. You should never need to access the database directly; use the public API instead.
//!    The exception is the data types used in the database, which live in [`mod@db_types`] and
//!    are public.
//! 2. The engine public API ([`mod@xpe_api`]). This provides the invoice settlement flow, the
//!    deposit router and the merchant account queries. Backends implement the traits in
//!    [`mod@traits`] to drive it.

pub mod db_types;
pub mod sqlite;
pub mod traits;
mod xpe_api;

pub use sqlite::SqliteDatabase;
pub use xpe_api::{
    merchant_api::MerchantApi,
    settlement_api::{DepositOutcome, IncomingDeposit, SettlementApi},
};
