use xpg_common::MicroUsdc;

use crate::{
    data_objects::{DepositAddress, WalletTransaction},
    error::WalletApiError,
};

/// The surface the server needs from the wallet-infrastructure provider.
#[allow(async_fn_in_trait)]
pub trait CustodialWallet: Clone {
    /// Allocates a fresh deposit address under the master wallet, labelled with the merchant's
    /// subject id so it can be traced in the provider dashboard.
    async fn create_address(&self, label: &str) -> Result<DepositAddress, WalletApiError>;

    /// Live on-chain balance of a managed address. The provider is the source of truth for
    /// spendable balance; the local ledger is only a record.
    async fn fetch_balance(&self, address_id: &str) -> Result<MicroUsdc, WalletApiError>;

    /// Executes an on-chain withdrawal of `amount` USDC from the managed address to `to`.
    async fn withdraw(
        &self,
        address_id: &str,
        to: &str,
        amount: MicroUsdc,
        reference: &str,
    ) -> Result<WalletTransaction, WalletApiError>;
}
