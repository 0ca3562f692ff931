// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-point money type.
//!
//! Balances and transaction amounts are integer counts of the currency's
//! minor unit (kobo). Major-unit decimals exist only at system boundaries:
//! API requests/responses and provider calls. Arithmetic never touches
//! floating point.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An amount of money in minor units (kobo).
///
/// Serializes as the raw minor-unit integer; use [`Money::to_major_string`]
/// when a client-facing decimal representation is needed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

/// Minor units per major unit (kobo per naira).
const MINOR_PER_MAJOR: i64 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be a valid positive number")]
    Invalid,

    #[error("amount must have at most 2 decimal places")]
    TooManyDecimals,

    #[error("amount is too large")]
    Overflow,
}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Wrap a raw minor-unit count. Negative values are allowed here so the
    /// ledger can reject them with its own invariant checks.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Convert a client-supplied major-unit number to minor units, rounding
    /// half away from zero. Rejects negative, zero-handling left to callers.
    pub fn from_major_f64(major: f64) -> Result<Self, MoneyError> {
        if !major.is_finite() || major < 0.0 {
            return Err(MoneyError::Invalid);
        }
        let minor = (major * MINOR_PER_MAJOR as f64).round();
        if minor > i64::MAX as f64 {
            return Err(MoneyError::Overflow);
        }
        Ok(Self(minor as i64))
    }

    /// Parse a major-unit decimal string (`"25.50"`, `"7"`, `"0.5"`) into
    /// minor units. At most 2 fraction digits, no sign, digits only.
    pub fn parse_major(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Invalid);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 2 {
            return Err(MoneyError::Invalid);
        }

        let whole_part = parts[0];
        if whole_part.is_empty() || !whole_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::Invalid);
        }
        let whole = whole_part.parse::<i64>().map_err(|_| MoneyError::Overflow)?;

        let fraction_part = if parts.len() == 2 { parts[1] } else { "" };
        if !fraction_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::Invalid);
        }
        if fraction_part.len() > 2 {
            return Err(MoneyError::TooManyDecimals);
        }

        let fraction = match fraction_part.len() {
            0 => 0,
            1 => fraction_part.parse::<i64>().map_err(|_| MoneyError::Invalid)? * 10,
            _ => fraction_part.parse::<i64>().map_err(|_| MoneyError::Invalid)?,
        };

        whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|base| base.checked_add(fraction))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Major-unit decimal string with exactly 2 fraction digits.
    pub fn to_major_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_major_converts_to_minor_units() {
        assert_eq!(Money::parse_major("25.5").unwrap(), Money::from_minor(2550));
        assert_eq!(Money::parse_major("25.50").unwrap(), Money::from_minor(2550));
        assert_eq!(Money::parse_major("7").unwrap(), Money::from_minor(700));
        assert_eq!(Money::parse_major("0.05").unwrap(), Money::from_minor(5));
        assert_eq!(Money::parse_major("0").unwrap(), Money::ZERO);
    }

    #[test]
    fn parse_major_rejects_garbage() {
        assert_eq!(Money::parse_major(""), Err(MoneyError::Invalid));
        assert_eq!(Money::parse_major("abc"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse_major("1.2.3"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse_major("-5"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse_major(".5"), Err(MoneyError::Invalid));
        assert_eq!(Money::parse_major("1.234"), Err(MoneyError::TooManyDecimals));
    }

    #[test]
    fn parse_major_rejects_overflow() {
        assert_eq!(
            Money::parse_major("99999999999999999999"),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn from_major_f64_rounds_to_nearest_minor_unit() {
        assert_eq!(Money::from_major_f64(50.0).unwrap(), Money::from_minor(5000));
        assert_eq!(Money::from_major_f64(0.025).unwrap(), Money::from_minor(3));
        assert_eq!(Money::from_major_f64(10.004).unwrap(), Money::from_minor(1000));
    }

    #[test]
    fn from_major_f64_rejects_negative_and_non_finite() {
        assert_eq!(Money::from_major_f64(-1.0), Err(MoneyError::Invalid));
        assert_eq!(Money::from_major_f64(f64::NAN), Err(MoneyError::Invalid));
        assert_eq!(Money::from_major_f64(f64::INFINITY), Err(MoneyError::Invalid));
    }

    #[test]
    fn major_string_always_has_two_fraction_digits() {
        assert_eq!(Money::from_minor(5000).to_major_string(), "50.00");
        assert_eq!(Money::from_minor(2).to_major_string(), "0.02");
        assert_eq!(Money::from_minor(12345).to_major_string(), "123.45");
        assert_eq!(Money::from_minor(-150).to_major_string(), "-1.50");
    }

    #[test]
    fn major_round_trip_preserves_amount() {
        let original = Money::parse_major("5000.00").unwrap();
        assert_eq!(original.minor_units(), 500_000);
        assert_eq!(Money::parse_major(&original.to_major_string()).unwrap(), original);
    }

    #[test]
    fn checked_arithmetic_catches_overflow() {
        let max = Money::from_minor(i64::MAX);
        assert!(max.checked_add(Money::from_minor(1)).is_none());
        assert_eq!(
            Money::from_minor(1000).checked_sub(Money::from_minor(400)),
            Some(Money::from_minor(600))
        );
    }
}
