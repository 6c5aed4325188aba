//! The withdrawal flows.
//!
//! A fiat withdrawal composes three provider calls into one logical operation: a rate quote, an
//! off-ramp payout order, and the on-chain payment of that order from the merchant's custodial
//! address. The ledger entry is only written once the on-chain leg has been accepted; an attempt
//! that dies earlier leaves no ledger trace, except for the off-ramp order audit row, which is
//! persisted before any funds move.

use custodial_tools::{CustodialWallet, WalletApiError};
use log::*;
use offramp_tools::{NewOfframpOrder, OffRamp, OffRampApiError, OrderRecipient};
use thiserror::Error;
use xanpay_engine::{
    db_types::{BankDetails, Merchant, NewLedgerEntry},
    traits::PaymentsDatabase,
};
use xpg_common::{new_transaction_code, MicroUsdc, USDC_CURRENCY_CODE};

use crate::{
    data_objects::{WithdrawCryptoResponse, WithdrawFiatResponse},
    errors::ServerError,
};

#[derive(Debug, Error)]
pub enum WithdrawalError {
    #[error("The requested merchant does not exist")]
    MerchantNotFound,
    #[error("Bank details must be registered before withdrawing fiat")]
    BankDetailsMissing,
    #[error("The merchant has no provider-side wallet address")]
    AddressMissing,
    #[error("Withdrawal amount must be positive")]
    InvalidAmount,
    #[error("Could not fetch a conversion rate: {0}")]
    RateUnavailable(OffRampApiError),
    #[error("Could not create the off-ramp order: {0}")]
    OrderFailed(OffRampApiError),
    #[error("The off-ramp order is missing a receive address")]
    ProviderResponseInvalid,
    #[error("The on-chain withdrawal was rejected: {0}")]
    WalletFailed(WalletApiError),
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<WithdrawalError> for ServerError {
    fn from(e: WithdrawalError) -> Self {
        match e {
            WithdrawalError::MerchantNotFound => ServerError::NoRecordFound(e.to_string()),
            WithdrawalError::BankDetailsMissing | WithdrawalError::AddressMissing => {
                ServerError::PreconditionFailed(e.to_string())
            },
            WithdrawalError::InvalidAmount => ServerError::ValidationError(e.to_string()),
            // Upstream detail is logged at the failure site; clients get a generic 503.
            WithdrawalError::RateUnavailable(_) |
            WithdrawalError::OrderFailed(_) |
            WithdrawalError::ProviderResponseInvalid |
            WithdrawalError::WalletFailed(_) => ServerError::ProviderError,
            WithdrawalError::DatabaseError(e) => ServerError::BackendError(e),
        }
    }
}

#[derive(Clone)]
pub struct WithdrawalApi<B, O, W> {
    db: B,
    offramp: O,
    wallet: W,
    fiat_currency: String,
    network: String,
}

impl<B, O, W> WithdrawalApi<B, O, W>
where
    B: PaymentsDatabase,
    O: OffRamp,
    W: CustodialWallet,
{
    pub fn new(db: B, offramp: O, wallet: W, fiat_currency: String, network: String) -> Self {
        Self { db, offramp, wallet, fiat_currency, network }
    }

    /// Converts `amount` USDC of the merchant's custodial balance into a fiat payout to their
    /// registered bank account.
    pub async fn withdraw_fiat(&self, subject_id: &str, amount: MicroUsdc) -> Result<WithdrawFiatResponse, WithdrawalError> {
        let (merchant, bank) = self.fiat_preconditions(subject_id, amount).await?;
        // The reference is generated up front and threaded through the off-ramp order, the
        // on-chain withdrawal and the ledger entry, so a caller can correlate all three.
        let reference = new_transaction_code();
        info!("🏦️ Fiat withdrawal [{reference}] of {amount} requested by merchant #{}.", merchant.id);

        let rate = self.offramp.fetch_rate(USDC_CURRENCY_CODE, amount, &self.fiat_currency).await.map_err(|e| {
            warn!("🏦️ [{reference}] Rate fetch failed. {e}");
            WithdrawalError::RateUnavailable(e)
        })?;
        let order = NewOfframpOrder {
            amount: amount.to_decimal_string(),
            token: USDC_CURRENCY_CODE.to_string(),
            network: self.network.clone(),
            rate: rate.rate,
            recipient: OrderRecipient {
                institution: bank.institution,
                account_identifier: bank.account_number,
                account_name: bank.account_name,
                memo: format!("Payout to {}", merchant.business_name),
            },
            reference: reference.clone(),
            return_address: merchant.deposit_address.clone(),
        };
        let order = self.offramp.create_order(order).await.map_err(|e| {
            warn!("🏦️ [{reference}] Off-ramp order creation failed. {e}");
            WithdrawalError::OrderFailed(e)
        })?;
        let receive_address = order.receive_address.clone().ok_or_else(|| {
            warn!("🏦️ [{reference}] Off-ramp order {} carries no receive address.", order.id);
            WithdrawalError::ProviderResponseInvalid
        })?;
        // Persist the order before any funds move. If the on-chain leg fails, this row is the
        // audit trail for reconciling with the provider.
        let body = serde_json::to_string(&order).unwrap_or_default();
        self.db
            .record_offramp_order(merchant.id, &reference, &order.id, &body)
            .await
            .map_err(|e| WithdrawalError::DatabaseError(e.to_string()))?;

        self.wallet.withdraw(&merchant.provider_address_id, &receive_address, amount, &reference).await.map_err(
            |e| {
                warn!("🏦️ [{reference}] On-chain leg failed after order {} was created. {e}", order.id);
                WithdrawalError::WalletFailed(e)
            },
        )?;

        let entry = NewLedgerEntry::fiat_initiated(
            merchant.id,
            reference.clone(),
            amount,
            self.fiat_currency.clone(),
            order.id.clone(),
        );
        self.db.insert_ledger_entry(entry).await.map_err(|e| WithdrawalError::DatabaseError(e.to_string()))?;
        info!("🏦️ Fiat withdrawal [{reference}] initiated: order {}, rate {}.", order.id, rate.rate);
        Ok(WithdrawFiatResponse {
            transaction_id: reference,
            order_id: order.id,
            amount: amount.to_units_f64(),
            currency: self.fiat_currency.clone(),
            rate: rate.rate,
        })
    }

    /// Direct on-chain withdrawal to an arbitrary address.
    pub async fn withdraw_crypto(
        &self,
        subject_id: &str,
        to: &str,
        amount: MicroUsdc,
    ) -> Result<WithdrawCryptoResponse, WithdrawalError> {
        let merchant = self.fetch_merchant(subject_id).await?;
        if merchant.provider_address_id.trim().is_empty() {
            return Err(WithdrawalError::AddressMissing);
        }
        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount);
        }
        let reference = new_transaction_code();
        info!("🏦️ Crypto withdrawal [{reference}] of {amount} to {to} requested by merchant #{}.", merchant.id);
        let tx = self.wallet.withdraw(&merchant.provider_address_id, to, amount, &reference).await.map_err(|e| {
            warn!("🏦️ [{reference}] On-chain withdrawal failed. {e}");
            WithdrawalError::WalletFailed(e)
        })?;
        let entry =
            NewLedgerEntry::send(merchant.id, reference.clone(), amount, USDC_CURRENCY_CODE.to_string(), tx.hash.clone());
        self.db.insert_ledger_entry(entry).await.map_err(|e| WithdrawalError::DatabaseError(e.to_string()))?;
        info!("🏦️ Crypto withdrawal [{reference}] submitted (provider tx {}).", tx.id);
        Ok(WithdrawCryptoResponse { transaction_id: reference, hash: tx.hash })
    }

    // Ordered checks: account, bank details, provider address, then the amount itself.
    async fn fiat_preconditions(
        &self,
        subject_id: &str,
        amount: MicroUsdc,
    ) -> Result<(Merchant, BankDetails), WithdrawalError> {
        let merchant = self.fetch_merchant(subject_id).await?;
        let bank = merchant.bank_details().ok_or(WithdrawalError::BankDetailsMissing)?;
        if merchant.provider_address_id.trim().is_empty() {
            return Err(WithdrawalError::AddressMissing);
        }
        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount);
        }
        Ok((merchant, bank))
    }

    async fn fetch_merchant(&self, subject_id: &str) -> Result<Merchant, WithdrawalError> {
        self.db
            .fetch_merchant_by_subject(subject_id)
            .await
            .map_err(|e| WithdrawalError::DatabaseError(e.to_string()))?
            .ok_or(WithdrawalError::MerchantNotFound)
    }
}
