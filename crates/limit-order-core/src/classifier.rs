//! Order lifecycle classification
//!
//! Derives fill and expiry status from a decoded [`OrderRecord`] and a
//! reference clock. Classification never fails: a zero original amount and a
//! missing expiry are defined policies, and a current amount above the
//! original is reported as a [`Diagnostic`] instead of an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::amount::DisplayAmount;
use crate::constants::PERCENT_SCALE;
use crate::order::OrderRecord;
use crate::registry::TokenRegistry;

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No fills yet, regardless of expiry
    Active,
    /// Partially filled and not yet expired
    ActivePartial,
    /// Partially filled and past its expiry
    ExpiredPartial,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Active,
        OrderStatus::ActivePartial,
        OrderStatus::ExpiredPartial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::ActivePartial => "active_partial",
            OrderStatus::ExpiredPartial => "expired_partial",
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, OrderStatus::ActivePartial | OrderStatus::ExpiredPartial)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory finding raised during classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// `current_making_amount` exceeds `original_making_amount`; the order
    /// was classified as unfilled
    InvariantViolation { current: u64, original: u64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvariantViolation { current, original } => write!(
                f,
                "current making amount {} exceeds original {}",
                current, original
            ),
        }
    }
}

/// A decoded order with its derived fill and expiry state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedOrder {
    #[serde(flatten)]
    pub record: OrderRecord,
    pub status: OrderStatus,
    pub is_partially_filled: bool,
    /// Share of the original making amount already filled, 0..=100
    pub percent_filled: Decimal,
    /// Raw units of the input token still available
    pub remaining_amount: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassifiedOrder {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Whether the order's expiry lies before `now`, independent of fills
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.record.expiry, Some(expiry) if expiry < now)
    }

    /// Remaining amount normalized with the input mint's decimals
    pub fn remaining_display(&self, registry: &dyn TokenRegistry) -> DisplayAmount {
        DisplayAmount::resolve(self.remaining_amount, &self.record.input_mint, registry)
    }
}

/// Filled share of `original` in percent, with [`PERCENT_SCALE`] digits.
///
/// Computed in `u128` so large amounts cannot overflow; truncates toward zero.
fn percent_filled(original: u64, current: u64) -> Decimal {
    if original == 0 || current >= original {
        return Decimal::ZERO;
    }

    let filled = (original - current) as u128;
    let scale = 10u128.pow(PERCENT_SCALE);
    let scaled = filled * 100 * scale / original as u128;

    // scaled <= 100 * 10^PERCENT_SCALE, always fits
    Decimal::from_i128_with_scale(scaled as i128, PERCENT_SCALE)
}

/// Classify `record` against the Unix timestamp `now`
pub fn classify(record: OrderRecord, now: i64) -> ClassifiedOrder {
    let original = record.original_making_amount;
    let current = record.current_making_amount;
    let mut diagnostics = Vec::new();

    if current > original {
        warn!(
            order = %record.order_address,
            current,
            original,
            "Current making amount exceeds original, treating order as unfilled"
        );
        diagnostics.push(Diagnostic::InvariantViolation { current, original });
    }

    let is_partially_filled = current < original;

    let status = match (is_partially_filled, record.expiry) {
        (false, _) => OrderStatus::Active,
        (true, Some(expiry)) if expiry < now => OrderStatus::ExpiredPartial,
        (true, _) => OrderStatus::ActivePartial,
    };

    ClassifiedOrder {
        status,
        is_partially_filled,
        percent_filled: percent_filled(original, current),
        remaining_amount: current,
        diagnostics,
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_filled_precision() {
        assert_eq!(percent_filled(1_000, 400), Decimal::from(60));
        assert_eq!(percent_filled(3, 2), Decimal::new(3333, 2));
        assert_eq!(percent_filled(0, 0), Decimal::ZERO);
        assert_eq!(percent_filled(0, 5), Decimal::ZERO);
        assert_eq!(percent_filled(10, 10), Decimal::ZERO);
        assert_eq!(percent_filled(u64::MAX, 0), Decimal::from(100));
        assert_eq!(percent_filled(u64::MAX, u64::MAX / 2), Decimal::new(5000, 2));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::ActivePartial.to_string(), "active_partial");
        assert_eq!(
            serde_json::to_string(&OrderStatus::ExpiredPartial).unwrap(),
            "\"expired_partial\""
        );
        assert!(!OrderStatus::Active.is_partial());
    }
}
