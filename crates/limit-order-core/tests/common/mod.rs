//! Shared fixtures for decoder and classifier tests

#![allow(dead_code)]

use borsh::BorshSerialize;
use limit_order_core::{OrderRecord, Pubkey, ORDER_ACCOUNT_SIZE};

/// Mainnet CHAOS -> SOL order without expiry
pub const MAINNET_ORDER_HEX: &str = "86addfb94d561c33e0827239bfbc127b7eafc21603dd33802c66b129be1059bd38dda128c82c33946e95da90dd11b7d7b9a59627513fd064b5facc54b56aebfd9679548aaa7f03af069b8857feab8184fb687f634618c035dac439dc1aeb3b5598a0f0000000000106ddf6e1d765a193d9cbe146ceeb79ac1cb485ed5f5b37913a8cf5857eff00a906ddf6e1d765a193d9cbe146ceeb79ac1cb485ed5f5b37913a8cf5857eff00a9b1c2bc9acdda18e5f9db094ececb111b726639df018c5e717bf4e692c1128f6fa7090500000000005dab280600000000464a140c000000005dab280600000000464a140c000000000000000000000000000a00e45d17524e46de4a31338360568984b0523871d55e0ce4e739b0e62b02673072a8ff406700000000a8ff406700000000ff000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000";

pub const ORDER_DISCRIMINATOR: [u8; 8] = [134, 173, 223, 185, 77, 86, 28, 51];

pub fn from_hex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

/// Independent borsh encoding of the on-chain order struct
#[derive(BorshSerialize, Clone)]
pub struct LimitOrderMirror {
    pub discriminator: [u8; 8],
    pub maker: [u8; 32],
    pub input_mint: [u8; 32],
    pub output_mint: [u8; 32],
    pub input_token_program: [u8; 32],
    pub output_token_program: [u8; 32],
    pub input_mint_reserve: [u8; 32],
    pub unique_id: u64,
    pub ori_making_amount: u64,
    pub ori_taking_amount: u64,
    pub making_amount: u64,
    pub taking_amount: u64,
    pub borrow_making_amount: u64,
    pub expired_at: Option<i64>,
    pub fee_bps: u16,
    pub fee_account: [u8; 32],
    pub created_at: i64,
    pub updated_at: i64,
    pub bump: u8,
}

impl LimitOrderMirror {
    pub fn sample(expired_at: Option<i64>) -> Self {
        Self {
            discriminator: ORDER_DISCRIMINATOR,
            maker: [1; 32],
            input_mint: [2; 32],
            output_mint: [3; 32],
            input_token_program: [4; 32],
            output_token_program: [5; 32],
            input_mint_reserve: [6; 32],
            unique_id: 77,
            ori_making_amount: 1_000,
            ori_taking_amount: 2_000,
            making_amount: 400,
            taking_amount: 800,
            borrow_making_amount: 9,
            expired_at,
            fee_bps: 0x0a0b,
            fee_account: [7; 32],
            created_at: 1_732_313_000,
            updated_at: 1_732_313_600,
            bump: 0xfe,
        }
    }

    /// Encode and pad to the account size with `padding`
    pub fn to_account(&self, padding: u8) -> Vec<u8> {
        let mut data = self.try_to_vec().unwrap();
        assert!(data.len() <= ORDER_ACCOUNT_SIZE);
        data.resize(ORDER_ACCOUNT_SIZE, padding);
        data
    }
}

pub fn record(original: u64, current: u64, expiry: Option<i64>) -> OrderRecord {
    OrderRecord {
        order_address: Pubkey::new_unique(),
        maker: Pubkey::new_unique(),
        input_mint: Pubkey::new_unique(),
        output_mint: Pubkey::new_unique(),
        input_token_program: Pubkey::default(),
        output_token_program: Pubkey::default(),
        input_mint_reserve: Pubkey::default(),
        unique_id: 1,
        original_making_amount: original,
        original_taking_amount: original,
        current_making_amount: current,
        current_taking_amount: current,
        borrow_making_amount: 0,
        expiry,
        fee_bps: 10,
        fee_account: Pubkey::default(),
        created_at: 0,
        updated_at: 0,
        bump: 255,
    }
}
