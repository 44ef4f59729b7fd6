//! Field layout of a limit order account
//!
//! The account is a fixed 372-byte buffer, but one field in the middle
//! (`expired_at`, an `Option<i64>`) is encoded as 1 or 9 bytes depending on
//! its tag. Every field before it sits at a constant offset; every field after
//! it is located relative to the end of the option. All offsets here are
//! derived from field widths rather than listed by hand.

use crate::constants::*;
use crate::errors::{DecodeError, DecodeResult};

/// Encoded kind of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Address,
    U64,
    U16,
    I64,
    U8,
    OptionI64,
}

impl FieldKind {
    /// Width of the field when it does not depend on the data
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldKind::Address => Some(ADDRESS_LEN),
            FieldKind::U64 | FieldKind::I64 => Some(8),
            FieldKind::U16 => Some(2),
            FieldKind::U8 => Some(1),
            FieldKind::OptionI64 => None,
        }
    }

    /// Widest possible encoding of the field
    pub const fn max_width(self) -> usize {
        match self.fixed_width() {
            Some(width) => width,
            None => 1 + 8,
        }
    }

    /// Width of the field given the tag byte found at its start.
    ///
    /// The tag is ignored for fixed-width kinds. For `OptionI64` a tag of 0
    /// gives 1 byte, a tag of 1 gives 9 bytes and anything else is invalid.
    pub const fn encoded_width(self, tag: u8) -> Option<usize> {
        match self {
            FieldKind::OptionI64 => match tag {
                OPTION_NONE_TAG => Some(1),
                OPTION_SOME_TAG => Some(1 + 8),
                _ => None,
            },
            _ => self.fixed_width(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Address => "Pubkey",
            FieldKind::U64 => "u64",
            FieldKind::U16 => "u16",
            FieldKind::I64 => "i64",
            FieldKind::U8 => "u8",
            FieldKind::OptionI64 => "Option<i64>",
        }
    }
}

/// Named field descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldLayout {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

// ============================================================================
// Field Table
// ============================================================================

pub const MAKER: FieldLayout = FieldLayout::new("maker", FieldKind::Address);
pub const INPUT_MINT: FieldLayout = FieldLayout::new("input_mint", FieldKind::Address);
pub const OUTPUT_MINT: FieldLayout = FieldLayout::new("output_mint", FieldKind::Address);
pub const INPUT_TOKEN_PROGRAM: FieldLayout = FieldLayout::new("input_token_program", FieldKind::Address);
pub const OUTPUT_TOKEN_PROGRAM: FieldLayout = FieldLayout::new("output_token_program", FieldKind::Address);
pub const INPUT_MINT_RESERVE: FieldLayout = FieldLayout::new("input_mint_reserve", FieldKind::Address);
pub const UNIQUE_ID: FieldLayout = FieldLayout::new("unique_id", FieldKind::U64);
pub const ORIGINAL_MAKING_AMOUNT: FieldLayout = FieldLayout::new("original_making_amount", FieldKind::U64);
pub const ORIGINAL_TAKING_AMOUNT: FieldLayout = FieldLayout::new("original_taking_amount", FieldKind::U64);
pub const CURRENT_MAKING_AMOUNT: FieldLayout = FieldLayout::new("current_making_amount", FieldKind::U64);
pub const CURRENT_TAKING_AMOUNT: FieldLayout = FieldLayout::new("current_taking_amount", FieldKind::U64);
pub const BORROW_MAKING_AMOUNT: FieldLayout = FieldLayout::new("borrow_making_amount", FieldKind::U64);
pub const EXPIRED_AT: FieldLayout = FieldLayout::new("expired_at", FieldKind::OptionI64);
pub const FEE_BPS: FieldLayout = FieldLayout::new("fee_bps", FieldKind::U16);
pub const FEE_ACCOUNT: FieldLayout = FieldLayout::new("fee_account", FieldKind::Address);
pub const CREATED_AT: FieldLayout = FieldLayout::new("created_at", FieldKind::I64);
pub const UPDATED_AT: FieldLayout = FieldLayout::new("updated_at", FieldKind::I64);
pub const BUMP: FieldLayout = FieldLayout::new("bump", FieldKind::U8);

/// Fields before the option, all at constant offsets
pub const PREFIX_FIELDS: [FieldLayout; 12] = [
    MAKER,
    INPUT_MINT,
    OUTPUT_MINT,
    INPUT_TOKEN_PROGRAM,
    OUTPUT_TOKEN_PROGRAM,
    INPUT_MINT_RESERVE,
    UNIQUE_ID,
    ORIGINAL_MAKING_AMOUNT,
    ORIGINAL_TAKING_AMOUNT,
    CURRENT_MAKING_AMOUNT,
    CURRENT_TAKING_AMOUNT,
    BORROW_MAKING_AMOUNT,
];

/// Fields after the option, located relative to the tail start
pub const SUFFIX_FIELDS: [FieldLayout; 5] = [FEE_BPS, FEE_ACCOUNT, CREATED_AT, UPDATED_AT, BUMP];

/// Every field in encoding order
pub const ORDER_FIELDS: [FieldLayout; 18] = [
    MAKER,
    INPUT_MINT,
    OUTPUT_MINT,
    INPUT_TOKEN_PROGRAM,
    OUTPUT_TOKEN_PROGRAM,
    INPUT_MINT_RESERVE,
    UNIQUE_ID,
    ORIGINAL_MAKING_AMOUNT,
    ORIGINAL_TAKING_AMOUNT,
    CURRENT_MAKING_AMOUNT,
    CURRENT_TAKING_AMOUNT,
    BORROW_MAKING_AMOUNT,
    EXPIRED_AT,
    FEE_BPS,
    FEE_ACCOUNT,
    CREATED_AT,
    UPDATED_AT,
    BUMP,
];

/// Sum of the widest encodings of `fields`
pub const fn fields_width(fields: &[FieldLayout]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].kind.max_width();
        i += 1;
    }
    total
}

/// End of the fixed prefix, where the option tag lives
pub const PREFIX_END: usize = DISCRIMINATOR_LEN + fields_width(&PREFIX_FIELDS);

/// Width of everything after the option
pub const SUFFIX_WIDTH: usize = fields_width(&SUFFIX_FIELDS);

/// Bytes consumed by the widest encoding; the rest of the account is padding
pub const MAX_CONSUMED_LEN: usize = PREFIX_END + EXPIRED_AT.kind.max_width() + SUFFIX_WIDTH;

const _: () = assert!(PREFIX_END == EXPIRY_TAG_OFFSET);
const _: () = assert!(MAX_CONSUMED_LEN <= ORDER_ACCOUNT_SIZE);

fn offset_in(fields: &[FieldLayout], start: usize, name: &str) -> Option<usize> {
    let mut offset = start;
    for field in fields {
        if field.name == name {
            return Some(offset);
        }
        offset += field.kind.max_width();
    }
    None
}

/// Constant offset of a prefix field
pub fn prefix_offset(name: &str) -> Option<usize> {
    offset_in(&PREFIX_FIELDS, DISCRIMINATOR_LEN, name)
}

/// Offset of a suffix field once the tail start is known
pub fn suffix_offset(tail_start: usize, name: &str) -> Option<usize> {
    offset_in(&SUFFIX_FIELDS, tail_start, name)
}

/// Start of the suffix for a given option tag
pub fn tail_start(expiry_tag: u8) -> DecodeResult<usize> {
    EXPIRED_AT
        .kind
        .encoded_width(expiry_tag)
        .map(|width| EXPIRY_TAG_OFFSET + width)
        .ok_or_else(|| DecodeError::invalid_option_tag(EXPIRY_TAG_OFFSET, expiry_tag))
}

// ============================================================================
// Field Spans
// ============================================================================

/// Location of one field inside a concrete buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub field: FieldLayout,
    pub offset: usize,
    pub width: usize,
}

impl FieldSpan {
    pub fn end(&self) -> usize {
        self.offset + self.width
    }

    /// Bytes of this field, or `None` when the buffer is too short
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        buffer.get(self.offset..self.end())
    }
}

/// Locate every field for a record whose option tag is `expiry_tag`
pub fn field_spans(expiry_tag: u8) -> DecodeResult<Vec<FieldSpan>> {
    let mut spans = Vec::with_capacity(ORDER_FIELDS.len());
    let mut offset = DISCRIMINATOR_LEN;

    for field in ORDER_FIELDS {
        let width = field
            .kind
            .encoded_width(expiry_tag)
            .ok_or_else(|| DecodeError::invalid_option_tag(offset, expiry_tag))?;
        spans.push(FieldSpan { field, offset, width });
        offset += width;
    }

    Ok(spans)
}
