/// Constants shared by the decoder, classifier and scanner

use solana_program::{pubkey, pubkey::Pubkey};

// ============================================================================
// Program
// ============================================================================

/// Limit order program that owns the decoded accounts
pub const LIMIT_ORDER_PROGRAM_ID: Pubkey = pubkey!("j1o2qRpjcyUwEvwtcfhEQefh773ZgjxcVRry7LDqg5X");

// ============================================================================
// Account Layout
// ============================================================================

/// Declared size of every order account
pub const ORDER_ACCOUNT_SIZE: usize = 372;

/// Opaque record-type tag at the start of the account
pub const DISCRIMINATOR_LEN: usize = 8;

/// Width of an address field
pub const ADDRESS_LEN: usize = 32;

/// Offset of the `expired_at` option tag
pub const EXPIRY_TAG_OFFSET: usize = 248;

/// Offset of the input mint, used for sell-side account filters
pub const INPUT_MINT_OFFSET: usize = 40;

/// Offset of the output mint, used for buy-side account filters
pub const OUTPUT_MINT_OFFSET: usize = 72;

/// Option tag for an absent value
pub const OPTION_NONE_TAG: u8 = 0;

/// Option tag for a present value
pub const OPTION_SOME_TAG: u8 = 1;

// ============================================================================
// Display
// ============================================================================

/// Fractional digits kept in `percent_filled`
pub const PERCENT_SCALE: u32 = 2;

/// Decimals assumed for mints the registry cannot resolve
pub const DEFAULT_DECIMALS: u8 = 6;

/// Largest scale a `Decimal` can carry
pub const MAX_DECIMALS: u8 = 28;
