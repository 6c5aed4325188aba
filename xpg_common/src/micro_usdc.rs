use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const USDC_CURRENCY_CODE: &str = "USDC";

const MICRO_PER_UNIT: i64 = 1_000_000;

//--------------------------------------     MicroUsdc       ---------------------------------------------------------
/// An amount of money in millionths of a unit.
///
/// USDC carries six decimal places on-chain, so one `MicroUsdc` is exactly one base unit of the
/// token. Fiat amounts (product prices, ledger entries) use the same denomination so that amounts
/// can be compared and summed without floating point anywhere in the money path.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MicroUsdc(i64);

op!(binary MicroUsdc, Add, add);
op!(binary MicroUsdc, Sub, sub);
op!(inplace MicroUsdc, SubAssign, sub_assign);
op!(unary MicroUsdc, Neg, neg);

impl Mul<i64> for MicroUsdc {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MicroUsdc {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in micro USDC: {0}")]
pub struct MicroUsdcConversionError(String);

impl From<i64> for MicroUsdc {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MicroUsdc {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MicroUsdc {}

impl TryFrom<u64> for MicroUsdc {
    type Error = MicroUsdcConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MicroUsdcConversionError(format!("Value {} is too large to convert to MicroUsdc", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MicroUsdc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 as f64 / MICRO_PER_UNIT as f64;
        write!(f, "{units:0.2}")
    }
}

impl FromStr for MicroUsdc {
    type Err = MicroUsdcConversionError;

    /// Parses a decimal amount such as `"10"`, `"10.5"` or `"0.000001"`. At most six decimal
    /// places are accepted; anything finer cannot be represented on-chain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(MicroUsdcConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 6 {
            return Err(MicroUsdcConversionError(format!("'{s}' has more than 6 decimal places")));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|e| MicroUsdcConversionError(format!("'{s}' is not a decimal amount. {e}")))?
        };
        let mut frac_micro: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|e| MicroUsdcConversionError(format!("'{s}' is not a decimal amount. {e}")))?
        };
        frac_micro *= 10i64.pow(6 - frac.len() as u32);
        whole
            .checked_mul(MICRO_PER_UNIT)
            .and_then(|w| w.checked_add(frac_micro))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(|| MicroUsdcConversionError(format!("'{s}' overflows the micro USDC range")))
    }
}

impl MicroUsdc {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * MICRO_PER_UNIT)
    }

    /// Converts a floating point amount (as received in JSON payloads) to micro units, rounding
    /// to the nearest micro unit.
    pub fn from_units_f64(units: f64) -> Self {
        Self((units * MICRO_PER_UNIT as f64).round() as i64)
    }

    pub fn to_units_f64(&self) -> f64 {
        self.0 as f64 / MICRO_PER_UNIT as f64
    }

    /// Renders the amount as a plain decimal string, e.g. `12500000` -> `"12.5"`. This is the
    /// format the off-ramp and wallet provider APIs expect.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MICRO_PER_UNIT as u64;
        let frac = abs % MICRO_PER_UNIT as u64;
        if frac == 0 {
            format!("{sign}{whole}")
        } else {
            let frac = format!("{frac:06}");
            format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
        }
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Overflow-checked scaling. Totals derived from stored values (a price times an invoice
    /// quantity) must go through this rather than `*`.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}
