//! Token registry boundary
//!
//! Decimals are only needed to display amounts. The registry is passed in
//! explicitly; decoding and classification never consult it.

use serde::{Deserialize, Serialize};
use solana_program::{pubkey, pubkey::Pubkey};
use std::collections::HashMap;

use crate::constants::DEFAULT_DECIMALS;

/// Decimals resolved for a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDecimals {
    pub decimals: u8,
    pub is_known: bool,
}

impl TokenDecimals {
    pub fn known(decimals: u8) -> Self {
        Self {
            decimals,
            is_known: true,
        }
    }

    /// Fallback for mints that could not be resolved
    pub fn unknown() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
            is_known: false,
        }
    }
}

/// Source of token metadata for display
pub trait TokenRegistry: Send + Sync {
    /// Decimals for `mint`, falling back to [`TokenDecimals::unknown`]
    fn resolve_decimals(&self, mint: &Pubkey) -> TokenDecimals;

    /// Human readable symbol, if any
    fn symbol(&self, mint: &Pubkey) -> Option<String> {
        let _ = mint;
        None
    }
}

/// Static token entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    #[serde(with = "crate::order::pubkey_serde")]
    pub mint: Pubkey,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, mint: Pubkey, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            mint,
            decimals,
        }
    }
}

pub const CHAOS_MINT: Pubkey = pubkey!("8SgNwESovnbG1oNEaPVhg6CR9mTMSK7jPvcYRe3wpump");
pub const LOGOS_MINT: Pubkey = pubkey!("HJUfqXoYjC653f2p33i84zdCC3jc4EuVnbruSe5kpump");
pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Registry backed by a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenRegistry {
    tokens: HashMap<Pubkey, TokenInfo>,
}

impl StaticTokenRegistry {
    pub fn new(tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
        Self {
            tokens: tokens.into_iter().map(|t| (t.mint, t)).collect(),
        }
    }

    /// CHAOS, LOGOS, USDC and SOL
    pub fn well_known() -> Self {
        Self::new([
            TokenInfo::new("CHAOS", CHAOS_MINT, 6),
            TokenInfo::new("LOGOS", LOGOS_MINT, 6),
            TokenInfo::new("USDC", USDC_MINT, 6),
            TokenInfo::new("SOL", WSOL_MINT, 9),
        ])
    }

    pub fn get(&self, mint: &Pubkey) -> Option<&TokenInfo> {
        self.tokens.get(mint)
    }

    pub fn insert(&mut self, token: TokenInfo) {
        self.tokens.insert(token.mint, token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn resolve_decimals(&self, mint: &Pubkey) -> TokenDecimals {
        self.get(mint)
            .map(|t| TokenDecimals::known(t.decimals))
            .unwrap_or_else(TokenDecimals::unknown)
    }

    fn symbol(&self, mint: &Pubkey) -> Option<String> {
        self.get(mint).map(|t| t.symbol.clone())
    }
}
