use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const DEFAULT_CURRENCY_CODE: &str = "CLP";

const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A monetary amount, held in minor units (hundredths of the currency unit).
///
/// The currency itself travels alongside the amount (see `PaymentIntent::currency`); `Amount` never converts between
/// currencies.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountConversionError;

    /// Converts a price quoted in major units (as the processor does, e.g. `150.5`) into minor units.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(AmountConversionError(format!("{value} is not a finite number")));
        }
        let minor = (value * MINOR_UNITS_PER_MAJOR as f64).round();
        if minor.abs() > i64::MAX as f64 {
            return Err(AmountConversionError(format!("{value} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(minor as i64))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / MINOR_UNITS_PER_MAJOR as u64;
        let minor = abs % MINOR_UNITS_PER_MAJOR as u64;
        write!(f, "{sign}{major}.{minor:02}")
    }
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * MINOR_UNITS_PER_MAJOR)
    }

    /// The amount expressed in major units, for APIs that quote prices as decimals.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}
