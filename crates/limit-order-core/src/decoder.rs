//! Layout decoder for limit order accounts
//!
//! Decoding is a two-stage read. The fixed prefix is read at constant
//! offsets, then the `expired_at` tag decides where the tail starts and the
//! suffix is read relative to that point. Bytes after `bump` are padding and
//! are never inspected.

use solana_program::pubkey::Pubkey;
use tracing::debug;

use crate::constants::*;
use crate::errors::{DecodeError, DecodeResult, MalformedReason};
use crate::layout::{self, FieldKind, FieldLayout};
use crate::order::OrderRecord;

/// Bounds-checked little-endian cursor over a byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Start reading at `offset`
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn take_slice(&mut self, len: usize, field: &'static str) -> DecodeResult<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(MalformedReason::Truncated {
                field,
                offset: self.offset,
                needed: len,
                available,
            }
            .into());
        }

        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> DecodeResult<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.take_slice(N, field)?);
        Ok(bytes)
    }

    pub fn read_address(&mut self, field: &FieldLayout) -> DecodeResult<Pubkey> {
        debug_assert_eq!(field.kind, FieldKind::Address);
        Ok(Pubkey::new_from_array(self.take::<ADDRESS_LEN>(field.name)?))
    }

    pub fn read_u64(&mut self, field: &FieldLayout) -> DecodeResult<u64> {
        debug_assert_eq!(field.kind, FieldKind::U64);
        Ok(u64::from_le_bytes(self.take(field.name)?))
    }

    pub fn read_i64(&mut self, field: &FieldLayout) -> DecodeResult<i64> {
        debug_assert_eq!(field.kind, FieldKind::I64);
        Ok(i64::from_le_bytes(self.take(field.name)?))
    }

    pub fn read_u16(&mut self, field: &FieldLayout) -> DecodeResult<u16> {
        debug_assert_eq!(field.kind, FieldKind::U16);
        Ok(u16::from_le_bytes(self.take(field.name)?))
    }

    pub fn read_u8(&mut self, field: &FieldLayout) -> DecodeResult<u8> {
        debug_assert_eq!(field.kind, FieldKind::U8);
        let [byte] = self.take::<1>(field.name)?;
        Ok(byte)
    }

    /// Read a tagged `Option<i64>`, returning the value and its encoded width
    pub fn read_option_i64(&mut self, field: &FieldLayout) -> DecodeResult<(Option<i64>, usize)> {
        debug_assert_eq!(field.kind, FieldKind::OptionI64);
        let tag_offset = self.offset;
        let [tag] = self.take::<1>(field.name)?;

        let width = field
            .kind
            .encoded_width(tag)
            .ok_or_else(|| DecodeError::invalid_option_tag(tag_offset, tag))?;

        let value = match tag {
            OPTION_SOME_TAG => Some(i64::from_le_bytes(self.take(field.name)?)),
            _ => None,
        };

        Ok((value, width))
    }
}

/// Read the `expired_at` option and return it with the offset where the
/// suffix fields begin (249 when absent, 257 when present)
pub fn decode_expiry(buffer: &[u8]) -> DecodeResult<(Option<i64>, usize)> {
    let mut reader = ByteReader::at(buffer, EXPIRY_TAG_OFFSET);
    let (expiry, width) = reader.read_option_i64(&layout::EXPIRED_AT)?;
    Ok((expiry, EXPIRY_TAG_OFFSET + width))
}

/// Decode a raw order account stored at `address`.
///
/// Fails with [`DecodeError::MalformedRecord`] when the buffer is not exactly
/// [`ORDER_ACCOUNT_SIZE`] bytes or the option tag is neither 0 nor 1.
pub fn decode(buffer: &[u8], address: Pubkey) -> DecodeResult<OrderRecord> {
    if buffer.len() != ORDER_ACCOUNT_SIZE {
        return Err(DecodeError::length_mismatch(ORDER_ACCOUNT_SIZE, buffer.len()));
    }

    // Stage 1: fixed prefix, skipping the opaque discriminator
    let mut prefix = ByteReader::at(buffer, DISCRIMINATOR_LEN);
    let maker = prefix.read_address(&layout::MAKER)?;
    let input_mint = prefix.read_address(&layout::INPUT_MINT)?;
    let output_mint = prefix.read_address(&layout::OUTPUT_MINT)?;
    let input_token_program = prefix.read_address(&layout::INPUT_TOKEN_PROGRAM)?;
    let output_token_program = prefix.read_address(&layout::OUTPUT_TOKEN_PROGRAM)?;
    let input_mint_reserve = prefix.read_address(&layout::INPUT_MINT_RESERVE)?;
    let unique_id = prefix.read_u64(&layout::UNIQUE_ID)?;
    let original_making_amount = prefix.read_u64(&layout::ORIGINAL_MAKING_AMOUNT)?;
    let original_taking_amount = prefix.read_u64(&layout::ORIGINAL_TAKING_AMOUNT)?;
    let current_making_amount = prefix.read_u64(&layout::CURRENT_MAKING_AMOUNT)?;
    let current_taking_amount = prefix.read_u64(&layout::CURRENT_TAKING_AMOUNT)?;
    let borrow_making_amount = prefix.read_u64(&layout::BORROW_MAKING_AMOUNT)?;
    debug_assert_eq!(prefix.offset(), layout::PREFIX_END);

    // Stage 2: the option tag fixes where the tail starts
    let (expiry, tail_start) = decode_expiry(buffer)?;

    // Stage 3: suffix relative to the tail start
    let mut suffix = ByteReader::at(buffer, tail_start);
    let fee_bps = suffix.read_u16(&layout::FEE_BPS)?;
    let fee_account = suffix.read_address(&layout::FEE_ACCOUNT)?;
    let created_at = suffix.read_i64(&layout::CREATED_AT)?;
    let updated_at = suffix.read_i64(&layout::UPDATED_AT)?;
    let bump = suffix.read_u8(&layout::BUMP)?;

    debug!(
        order = %address,
        has_expiry = expiry.is_some(),
        tail_start,
        consumed = suffix.offset(),
        "Decoded order account"
    );

    Ok(OrderRecord {
        order_address: address,
        maker,
        input_mint,
        output_mint,
        input_token_program,
        output_token_program,
        input_mint_reserve,
        unique_id,
        original_making_amount,
        original_taking_amount,
        current_making_amount,
        current_taking_amount,
        borrow_making_amount,
        expiry,
        fee_bps,
        fee_account,
        created_at,
        updated_at,
        bump,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Vec<u8> {
        vec![0u8; ORDER_ACCOUNT_SIZE]
    }

    #[test]
    fn test_reader_little_endian() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u64(&layout::UNIQUE_ID).unwrap(), 1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let bytes = [0u8; 5];
        let mut reader = ByteReader::at(&bytes, 1);
        let err = reader.read_u64(&layout::UNIQUE_ID).unwrap_err();
        assert_eq!(
            err.reason(),
            &MalformedReason::Truncated {
                field: "unique_id",
                offset: 1,
                needed: 8,
                available: 4,
            }
        );
    }

    #[test]
    fn test_decode_expiry_tail_start() {
        let mut buffer = blank();
        assert_eq!(decode_expiry(&buffer).unwrap(), (None, 249));

        buffer[EXPIRY_TAG_OFFSET] = OPTION_SOME_TAG;
        buffer[249..257].copy_from_slice(&(-5i64).to_le_bytes());
        assert_eq!(decode_expiry(&buffer).unwrap(), (Some(-5), 257));
    }

    #[test]
    fn test_decode_expiry_rejects_unknown_tag() {
        let mut buffer = blank();
        buffer[EXPIRY_TAG_OFFSET] = 2;
        let err = decode_expiry(&buffer).unwrap_err();
        assert_eq!(err, DecodeError::invalid_option_tag(EXPIRY_TAG_OFFSET, 2));
    }

    #[test]
    fn test_u64_max_survives() {
        let mut buffer = blank();
        buffer[208..216].copy_from_slice(&u64::MAX.to_le_bytes());
        let record = decode(&buffer, Pubkey::default()).unwrap();
        assert_eq!(record.original_making_amount, u64::MAX);
    }
}
