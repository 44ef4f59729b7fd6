//! Decoder integration tests

mod common;

use anyhow::Result;
use common::*;
use limit_order_core::{
    decode, layout, DecodeError, MalformedReason, Pubkey, EXPIRY_TAG_OFFSET, ORDER_ACCOUNT_SIZE,
};
use std::str::FromStr;

#[test]
fn test_decode_mainnet_order() -> Result<()> {
    let data = from_hex(MAINNET_ORDER_HEX);
    let address = Pubkey::new_unique();
    let order = decode(&data, address)?;

    assert_eq!(order.order_address, address);
    assert_eq!(order.maker, Pubkey::from_str("G7Ph7THeHYNs6kfDgPoQmkyrRu33CDd5fEEk7jndSLAP")?);
    assert_eq!(order.input_mint, Pubkey::from_str("8SgNwESovnbG1oNEaPVhg6CR9mTMSK7jPvcYRe3wpump")?);
    assert_eq!(order.output_mint, Pubkey::from_str("So11111111111111111111111111111111111111112")?);
    assert_eq!(
        order.input_token_program,
        Pubkey::from_str("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")?
    );
    assert_eq!(order.output_token_program, order.input_token_program);
    assert_eq!(
        order.input_mint_reserve,
        Pubkey::from_str("CxuPYTUT5i6TK2uzuDzyGMfMbUxK4sAChiXRRXXhmrkn")?
    );
    assert_eq!(order.unique_id, 330_151);
    assert_eq!(order.original_making_amount, 103_328_605);
    assert_eq!(order.original_taking_amount, 202_656_326);
    assert_eq!(order.current_making_amount, 103_328_605);
    assert_eq!(order.current_taking_amount, 202_656_326);
    assert_eq!(order.borrow_making_amount, 0);
    assert_eq!(order.expiry, None);
    assert_eq!(order.fee_bps, 10);
    assert_eq!(
        order.fee_account,
        Pubkey::from_str("GNSHYrJmjwYXnWLy3esF5VjWa1AKMhzAru1pTeQDY8w3")?
    );
    assert_eq!(order.created_at, 1_732_313_000);
    assert_eq!(order.updated_at, 1_732_313_000);
    assert_eq!(order.bump, 255);

    Ok(())
}

#[test]
fn test_decode_matches_borsh_encoding() -> Result<()> {
    for expired_at in [None, Some(1_800_000_000), Some(-1)] {
        let mirror = LimitOrderMirror::sample(expired_at);
        let order = decode(&mirror.to_account(0), Pubkey::default())?;

        assert_eq!(order.maker, Pubkey::new_from_array(mirror.maker));
        assert_eq!(order.input_mint_reserve, Pubkey::new_from_array(mirror.input_mint_reserve));
        assert_eq!(order.unique_id, mirror.unique_id);
        assert_eq!(order.current_making_amount, mirror.making_amount);
        assert_eq!(order.borrow_making_amount, mirror.borrow_making_amount);
        assert_eq!(order.expiry, expired_at);
        assert_eq!(order.fee_bps, 0x0a0b);
        assert_eq!(order.fee_account, Pubkey::new_from_array(mirror.fee_account));
        assert_eq!(order.created_at, mirror.created_at);
        assert_eq!(order.updated_at, mirror.updated_at);
        assert_eq!(order.bump, 0xfe);
    }
    Ok(())
}

#[test]
fn test_fee_bps_offset_follows_tag() -> Result<()> {
    // tag 0: fee_bps starts at 249
    let mut absent = vec![0u8; ORDER_ACCOUNT_SIZE];
    absent[249..251].copy_from_slice(&513u16.to_le_bytes());
    absent[299] = 17;
    let order = decode(&absent, Pubkey::default())?;
    assert_eq!(order.expiry, None);
    assert_eq!(order.fee_bps, 513);
    assert_eq!(order.bump, 17);

    // tag 1: fee_bps starts at 257
    let mut present = vec![0u8; ORDER_ACCOUNT_SIZE];
    present[EXPIRY_TAG_OFFSET] = 1;
    present[249..257].copy_from_slice(&1_700_000_000i64.to_le_bytes());
    present[257..259].copy_from_slice(&513u16.to_le_bytes());
    present[307] = 17;
    let order = decode(&present, Pubkey::default())?;
    assert_eq!(order.expiry, Some(1_700_000_000));
    assert_eq!(order.fee_bps, 513);
    assert_eq!(order.bump, 17);

    Ok(())
}

#[test]
fn test_every_invalid_tag_is_rejected() {
    let mut data = LimitOrderMirror::sample(None).to_account(0);
    for tag in 2..=u8::MAX {
        data[EXPIRY_TAG_OFFSET] = tag;
        let err = decode(&data, Pubkey::default()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedRecord(MalformedReason::InvalidOptionTag {
                offset: EXPIRY_TAG_OFFSET,
                tag,
            })
        );
    }
}

#[test]
fn test_length_must_be_exact() {
    for len in [0, 8, 371, 373, 1024] {
        let err = decode(&vec![0u8; len], Pubkey::default()).unwrap_err();
        assert_eq!(
            err.reason(),
            &MalformedReason::LengthMismatch {
                expected: ORDER_ACCOUNT_SIZE,
                actual: len,
            }
        );
    }
}

#[test]
fn test_all_zero_buffer_decodes() -> Result<()> {
    let order = decode(&[0u8; ORDER_ACCOUNT_SIZE], Pubkey::default())?;
    assert_eq!(order.maker, Pubkey::default());
    assert_eq!(order.fee_account, Pubkey::default());
    assert_eq!(order.original_making_amount, 0);
    assert_eq!(order.current_taking_amount, 0);
    assert_eq!(order.expiry, None);
    assert_eq!(order.created_at, 0);
    Ok(())
}

#[test]
fn test_padding_is_ignored() -> Result<()> {
    let mirror = LimitOrderMirror::sample(Some(42));
    let clean = decode(&mirror.to_account(0), Pubkey::default())?;
    let noisy = decode(&mirror.to_account(0xff), Pubkey::default())?;
    assert_eq!(clean, noisy);
    Ok(())
}

#[test]
fn test_little_endian_u64() -> Result<()> {
    let mut data = vec![0u8; ORDER_ACCOUNT_SIZE];
    let offset = layout::prefix_offset("unique_id").unwrap();
    data[offset..offset + 8].copy_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0]);
    let order = decode(&data, Pubkey::default())?;
    assert_eq!(order.unique_id, 1);
    Ok(())
}

#[test]
fn test_decode_is_deterministic() -> Result<()> {
    let data = from_hex(MAINNET_ORDER_HEX);
    let address = Pubkey::new_unique();
    assert_eq!(decode(&data, address)?, decode(&data, address)?);
    Ok(())
}

#[test]
fn test_spans_agree_with_decoder() -> Result<()> {
    let data = LimitOrderMirror::sample(Some(99)).to_account(0);
    let spans = layout::field_spans(data[EXPIRY_TAG_OFFSET])?;
    let order = decode(&data, Pubkey::default())?;

    let fee = spans.iter().find(|s| s.field.name == "fee_bps").unwrap();
    let bytes = fee.slice(&data).unwrap();
    assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), order.fee_bps);

    let bump = spans.last().unwrap();
    assert_eq!(bump.slice(&data).unwrap(), &[order.bump]);
    Ok(())
}
