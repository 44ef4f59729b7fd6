//! Decoder and classifier for on-chain limit order accounts
//!
//! Raw account bytes flow one way through this crate:
//! `&[u8]` -> [`decode`] -> [`OrderRecord`] -> [`classify`] -> [`ClassifiedOrder`].
//! Everything here is pure and synchronous. Token metadata is only consulted
//! for display through an explicit [`TokenRegistry`] collaborator.

pub mod amount;
pub mod classifier;
pub mod constants;
pub mod decoder;
pub mod errors;
pub mod layout;
pub mod order;
pub mod registry;

// Re-export commonly used items
pub use amount::{normalize, DisplayAmount};
pub use classifier::{classify, ClassifiedOrder, Diagnostic, OrderStatus};
pub use constants::*;
pub use decoder::{decode, decode_expiry, ByteReader};
pub use errors::{DecodeError, DecodeResult, MalformedReason};
pub use layout::{field_spans, FieldKind, FieldLayout, FieldSpan};
pub use order::{OrderRecord, OrderSide};
pub use registry::{
    StaticTokenRegistry, TokenDecimals, TokenInfo, TokenRegistry, CHAOS_MINT, LOGOS_MINT, USDC_MINT,
    WSOL_MINT,
};

pub use solana_program::pubkey::Pubkey;
