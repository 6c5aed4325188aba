//! The payment flow API: invoice creation, deposit attribution and settlement.
//!
//! The [`SettlementApi`] is the only place in the engine that decides how an inbound deposit is
//! applied. The backend carries the transactional machinery; this layer carries the attribution
//! logic and the audit logging around it.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Invoice, LedgerEntry, NewInvoice, NewLedgerEntry, SettlementRequest, SettlementResult},
    traits::{PaymentsDatabase, PaymentsDatabaseError, SettlementError},
};

/// What became of an inbound deposit after the router had a look at it.
#[derive(Debug, Clone)]
pub enum DepositOutcome {
    /// The deposit named a live invoice and settled it.
    Settled(SettlementResult),
    /// The deposit could not be matched to an invoice and was credited as a plain top-up.
    Credited(LedgerEntry),
    /// The deposit named an invoice that exists but could not be settled. Nothing was recorded.
    /// The webhook is still acknowledged; redelivery would fail the same checks.
    SettlementFailed(SettlementError),
    /// The deposit address did not belong to any merchant. Nothing was recorded.
    Unattributable,
}

/// A deposit notification as the webhook router hands it over, already reduced to the fields the
/// settlement flow cares about.
#[derive(Debug, Clone)]
pub struct IncomingDeposit {
    pub deposit_address: String,
    pub amount: xpg_common::MicroUsdc,
    pub currency: String,
    /// The sender-supplied memo. When it holds an invoice code, the deposit is a payment.
    pub note: Option<String>,
    pub tx_hash: Option<String>,
}

pub struct SettlementApi<B> {
    db: B,
}

impl<B: Debug> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.db)
    }
}

impl<B> SettlementApi<B>
where B: PaymentsDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new invoice for the merchant. The backend generates the code and verifies that
    /// the product has enough stock to honour the invoice at creation time.
    pub async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, PaymentsDatabaseError> {
        let merchant_id = invoice.merchant_id;
        let invoice = self.db.insert_invoice(invoice).await?;
        info!(
            "🧾️ Invoice [{}] created for merchant #{merchant_id}: {} x product #{}, valid until {}.",
            invoice.code, invoice.quantity, invoice.product_id, invoice.valid_until
        );
        Ok(invoice)
    }

    /// Settles a single invoice against a received amount. All checks and writes happen inside
    /// one backend transaction; any failure leaves the store untouched.
    pub async fn settle_invoice(&self, request: SettlementRequest) -> Result<SettlementResult, SettlementError> {
        let code = request.invoice_code.clone();
        match self.db.settle_invoice(request).await {
            Ok(result) => {
                info!(
                    "🧾️ Invoice [{code}] settled. Received {}, required {}. Ledger entry {}.",
                    result.amount_paid, result.total_amount, result.transaction_id
                );
                Ok(result)
            },
            Err(e) => {
                warn!("🧾️ Settlement of invoice [{code}] failed: {e}");
                Err(e)
            },
        }
    }

    /// Routes an inbound deposit. A non-blank note that matches one of the merchant's invoices
    /// makes the deposit a payment and it is handed to the settlement flow; any other deposit is
    /// credited to the merchant as a plain Deposit entry.
    ///
    /// A deposit that matches an invoice but fails settlement (already paid, expired, underpaid)
    /// is NOT re-credited as a plain deposit. The funds sit on the custodial address without a
    /// ledger entry until reconciled by hand. See the warning log that branch emits.
    pub async fn apply_deposit(&self, deposit: IncomingDeposit) -> Result<DepositOutcome, PaymentsDatabaseError> {
        let Some(merchant) = self.db.fetch_merchant_by_deposit_address(&deposit.deposit_address).await? else {
            warn!(
                "🧾️ Deposit of {} to unknown address {} could not be attributed to any merchant.",
                deposit.amount, deposit.deposit_address
            );
            return Ok(DepositOutcome::Unattributable);
        };
        let invoice = match deposit.note.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => self.db.fetch_invoice(merchant.id, note).await?,
            _ => None,
        };
        if let Some(invoice) = invoice {
            let request = SettlementRequest {
                merchant_id: merchant.id,
                invoice_code: invoice.code.clone(),
                amount_paid: deposit.amount,
                currency: deposit.currency.clone(),
            };
            return match self.settle_invoice(request).await {
                Ok(result) => Ok(DepositOutcome::Settled(result)),
                Err(e) => {
                    warn!(
                        "🧾️ Deposit of {} references invoice [{}] but settlement failed ({e}). The funds remain on \
                         the custodial address and were NOT added to the ledger.",
                        deposit.amount, invoice.code
                    );
                    Ok(DepositOutcome::SettlementFailed(e))
                },
            };
        }
        let entry = self.credit_deposit(merchant.id, &deposit).await?;
        Ok(DepositOutcome::Credited(entry))
    }

    async fn credit_deposit(&self, merchant_id: i64, deposit: &IncomingDeposit) -> Result<LedgerEntry, PaymentsDatabaseError> {
        let entry = NewLedgerEntry::deposit(
            merchant_id,
            deposit.amount,
            deposit.currency.clone(),
            deposit.note.clone(),
            deposit.tx_hash.clone(),
        );
        let entry = self.db.insert_ledger_entry(entry).await?;
        info!("🧾️ Deposit of {} credited to merchant #{merchant_id} as entry {:?}.", deposit.amount, entry.code);
        Ok(entry)
    }
}
