//! Monetary amounts as integer minor units.
//!
//! Amounts arrive from tenants as decimal strings ("19.99") and leave for
//! PayPal formatted with exactly two decimal digits. Holding minor units in
//! between keeps arithmetic and storage exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A currency amount in minor units (cents for two-decimal currencies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' is not a valid decimal number")]
    Malformed(String),
    #[error("amount '{0}' has more than two decimal digits")]
    TooPrecise(String),
    #[error("amount must be positive, got '{0}'")]
    NotPositive(String),
}

impl Amount {
    pub fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Parse a decimal string such as "19.99", "20", or "7.5".
    ///
    /// At most two fractional digits are accepted; the amount must be
    /// strictly positive.
    pub fn parse(input: &str) -> Result<Self, AmountParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if frac.len() > 2 {
            return Err(AmountParseError::TooPrecise(input.to_string()));
        }
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Malformed(input.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Malformed(input.to_string()));
        }

        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountParseError::Malformed(input.to_string()))?
        };
        let frac_units: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| AmountParseError::Malformed(input.to_string()))? * 10,
            _ => frac.parse().map_err(|_| AmountParseError::Malformed(input.to_string()))?,
        };

        let minor = whole_units
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac_units))
            .ok_or_else(|| AmountParseError::Malformed(input.to_string()))?;

        if minor <= 0 {
            return Err(AmountParseError::NotPositive(input.to_string()));
        }

        Ok(Self(minor))
    }

    /// Format with exactly two decimal digits, as the gateway requires.
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}
