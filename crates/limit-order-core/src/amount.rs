//! Display normalization of raw token amounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::fmt;

use crate::constants::MAX_DECIMALS;
use crate::registry::{TokenDecimals, TokenRegistry};

/// Exact `raw / 10^decimals`, or `None` when `decimals` exceeds what a
/// `Decimal` can carry
pub fn normalize(raw: u64, decimals: u8) -> Option<Decimal> {
    if decimals > MAX_DECIMALS {
        return None;
    }
    Some(Decimal::from_i128_with_scale(raw as i128, decimals as u32))
}

/// A raw amount together with the decimals used to display it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAmount {
    pub raw: u64,
    pub decimals: u8,
    pub value: Option<Decimal>,
    /// False when `decimals` is the fallback for an unresolved mint
    pub decimals_known: bool,
}

impl DisplayAmount {
    pub fn new(raw: u64, token: TokenDecimals) -> Self {
        Self {
            raw,
            decimals: token.decimals,
            value: normalize(raw, token.decimals),
            decimals_known: token.is_known,
        }
    }

    /// Normalize `raw` with the decimals `registry` reports for `mint`
    pub fn resolve(raw: u64, mint: &Pubkey, registry: &dyn TokenRegistry) -> Self {
        Self::new(raw, registry.resolve_decimals(mint))
    }
}

impl fmt::Display for DisplayAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            // Decimal keeps its scale, so this prints exactly `decimals` digits
            Some(value) => write!(f, "{}", value)?,
            None => write!(f, "{} raw", self.raw)?,
        }
        if !self.decimals_known {
            write!(f, " (decimals unknown)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_exact() {
        assert_eq!(normalize(3_800_000_000, 6), Some(Decimal::new(3_800, 0)));
        assert_eq!(normalize(1, 9).unwrap().to_string(), "0.000000001");
        assert_eq!(normalize(1_000_000_000_000, 6).unwrap().to_string(), "1000000.000000");
        assert_eq!(normalize(u64::MAX, 0).unwrap().to_string(), u64::MAX.to_string());
        assert_eq!(normalize(5, 29), None);
    }

    #[test]
    fn test_display_flags_unknown_decimals() {
        let known = DisplayAmount::new(1_500_000, TokenDecimals::known(6));
        assert_eq!(known.to_string(), "1.500000");

        let unknown = DisplayAmount::new(1_500_000, TokenDecimals::unknown());
        assert_eq!(unknown.to_string(), "1.500000 (decimals unknown)");

        let oversized = DisplayAmount::new(42, TokenDecimals::known(30));
        assert_eq!(oversized.to_string(), "42 raw");
    }
}
