mod codes;
mod micro_usdc;

pub mod op;
mod secret;

pub use codes::{new_invoice_code, new_transaction_code, INVOICE_CODE_LEN, TRANSACTION_CODE_LEN};
pub use micro_usdc::{MicroUsdc, MicroUsdcConversionError, USDC_CURRENCY_CODE};
pub use secret::Secret;
