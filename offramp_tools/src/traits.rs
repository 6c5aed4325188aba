use xpg_common::MicroUsdc;

use crate::{
    data_objects::{ExchangeRate, NewOfframpOrder, OfframpOrder},
    error::OffRampApiError,
};

/// The surface the withdrawal flow needs from a fiat off-ramp partner.
#[allow(async_fn_in_trait)]
pub trait OffRamp: Clone {
    async fn fetch_rate(&self, token: &str, amount: MicroUsdc, fiat: &str) -> Result<ExchangeRate, OffRampApiError>;

    async fn create_order(&self, order: NewOfframpOrder) -> Result<OfframpOrder, OffRampApiError>;
}
