/// Decoded limit order record

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::fmt;

/// One decoded order account.
///
/// `order_address` is where the record is stored and is supplied by the
/// caller; every other field comes from the account bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(with = "pubkey_serde")]
    pub order_address: Pubkey,

    /// Owner who created the order
    #[serde(with = "pubkey_serde")]
    pub maker: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub input_mint: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub output_mint: Pubkey,

    /// Passed through unchanged
    #[serde(with = "pubkey_serde")]
    pub input_token_program: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub output_token_program: Pubkey,
    #[serde(with = "pubkey_serde")]
    pub input_mint_reserve: Pubkey,

    pub unique_id: u64,

    /// Amounts committed when the order was created
    pub original_making_amount: u64,
    pub original_taking_amount: u64,

    /// Amounts remaining after partial fills
    pub current_making_amount: u64,
    pub current_taking_amount: u64,

    pub borrow_making_amount: u64,

    /// Unix timestamp after which the order expires, `None` for no expiry
    pub expiry: Option<i64>,

    pub fee_bps: u16,
    #[serde(with = "pubkey_serde")]
    pub fee_account: Pubkey,
    pub created_at: i64,
    pub updated_at: i64,
    pub bump: u8,
}

/// Side of an order relative to a tracked token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    /// The tracked token is being sold (it is the input mint)
    Sell,
    /// The tracked token is being bought (it is the output mint)
    Buy,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Sell => write!(f, "Sell"),
            OrderSide::Buy => write!(f, "Buy"),
        }
    }
}

impl OrderRecord {
    /// Side of this order from the point of view of `mint`
    pub fn side_for(&self, mint: &Pubkey) -> Option<OrderSide> {
        if self.input_mint == *mint {
            Some(OrderSide::Sell)
        } else if self.output_mint == *mint {
            Some(OrderSide::Buy)
        } else {
            None
        }
    }

    pub fn involves(&self, mint: &Pubkey) -> bool {
        self.side_for(mint).is_some()
    }

    /// Amount of the input token already consumed by fills.
    ///
    /// Saturates at zero when the current amount exceeds the original.
    pub fn filled_making_amount(&self) -> u64 {
        self.original_making_amount
            .saturating_sub(self.current_making_amount)
    }
}

/// Addresses serialize as base58 strings
pub mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_program::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
