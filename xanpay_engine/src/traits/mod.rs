//! # Storage backend contracts.
//!
//! This module defines the interface contracts that payment engine database *backends* must
//! implement.
//!
//! * [`PaymentsDatabase`] defines the mutating flows: merchant onboarding, catalog edits, invoice
//!   generation, settlement, and ledger appends. Settlement is the one operation with hard
//!   atomicity requirements, and backends must run it as a single transaction (see
//!   [`PaymentsDatabase::settle_invoice`]).
//! * [`MerchantManagement`] provides the read side: merchant lookups (including the reverse
//!   lookup from a raw deposit address used by the webhook router), catalog queries, invoice
//!   queries, and ledger listings.

mod merchant_management;
mod payments_database;

pub use merchant_management::{MerchantApiError, MerchantManagement};
pub use payments_database::{PaymentsDatabase, PaymentsDatabaseError, SettlementError};
