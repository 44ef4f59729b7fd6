//! Lightweight Solana RPC client
//!
//! Implements only the JSON-RPC methods the scanner needs, on top of `ureq`,
//! instead of pulling in the full `solana-client` networking stack.

use base64::Engine;
use limit_order_core::{Pubkey, ORDER_ACCOUNT_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::{
    account::Account,
    commitment_config::{CommitmentConfig, CommitmentLevel},
};
use std::time::Duration;
use tracing::debug;

use crate::error::{ScannerError, ScannerResult};

/// Lightweight RPC client for Solana
pub struct LightRpcClient {
    url: String,
    agent: ureq::Agent,
    commitment: CommitmentConfig,
}

/// RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Account data as returned with base64 encoding
#[derive(Debug, Clone, Deserialize)]
pub struct RpcAccount {
    pub lamports: u64,
    pub data: (String, String), // (data, encoding)
    pub owner: String,
    #[serde(default)]
    pub executable: bool,
    #[serde(rename = "rentEpoch", default)]
    pub rent_epoch: u64,
}

/// One entry of a `getProgramAccounts` response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcKeyedAccount {
    pub pubkey: String,
    pub account: RpcAccount,
}

/// Server-side account filter for `getProgramAccounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountFilter {
    DataSize(u64),
    Memcmp { offset: usize, bytes: String },
}

impl AccountFilter {
    /// Match `mint` at `offset` in order accounts
    pub fn mint_at(offset: usize, mint: &Pubkey) -> Self {
        AccountFilter::Memcmp {
            offset,
            bytes: mint.to_string(),
        }
    }

    /// Evaluate the filter locally, as the RPC node would
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::DataSize(size) => data.len() as u64 == *size,
            AccountFilter::Memcmp { offset, bytes } => {
                // Filters built by the scanner always carry base58 addresses
                let Ok(expected) = bytes.parse::<Pubkey>() else {
                    return false;
                };
                let expected = expected.to_bytes();
                data.get(*offset..*offset + expected.len()) == Some(&expected[..])
            }
        }
    }
}

/// Filters selecting order accounts whose mint at `offset` is `mint`
pub fn order_filters(mint: &Pubkey, offset: usize) -> Vec<AccountFilter> {
    vec![
        AccountFilter::DataSize(ORDER_ACCOUNT_SIZE as u64),
        AccountFilter::mint_at(offset, mint),
    ]
}

impl RpcAccount {
    /// Decode into an SDK account
    pub fn into_account(self, address: &str) -> ScannerResult<Account> {
        let data = if self.data.1 == "base64" {
            base64::engine::general_purpose::STANDARD
                .decode(&self.data.0)
                .map_err(|e| ScannerError::InvalidAccountData {
                    address: address.to_string(),
                    reason: format!("Failed to decode account data: {}", e),
                })?
        } else {
            return Err(ScannerError::InvalidAccountData {
                address: address.to_string(),
                reason: format!("Unsupported data encoding: {}", self.data.1),
            });
        };

        let owner = self
            .owner
            .parse()
            .map_err(|e| ScannerError::InvalidAccountData {
                address: address.to_string(),
                reason: format!("Failed to parse owner: {}", e),
            })?;

        Ok(Account {
            lamports: self.lamports,
            data,
            owner,
            executable: self.executable,
            rent_epoch: self.rent_epoch,
        })
    }
}

impl RpcKeyedAccount {
    pub fn into_keyed(self) -> ScannerResult<(Pubkey, Account)> {
        let pubkey = self
            .pubkey
            .parse()
            .map_err(|e| ScannerError::InvalidAccountData {
                address: self.pubkey.clone(),
                reason: format!("Failed to parse pubkey: {}", e),
            })?;
        let account = self.account.into_account(&self.pubkey)?;
        Ok((pubkey, account))
    }
}

impl LightRpcClient {
    /// Create a new lightweight RPC client
    pub fn new(url: String, commitment: CommitmentLevel, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(timeout)
            .build();

        Self {
            url,
            agent,
            commitment: CommitmentConfig { commitment },
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call
    async fn call<T>(&self, method: &str, params: Value) -> ScannerResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!("RPC call: {} with params: {:?}", method, params);

        // ureq is blocking, keep it off the async workers
        let response_body = tokio::task::spawn_blocking({
            let agent = self.agent.clone();
            let url = self.url.clone();
            let body = request_body.to_string();

            move || {
                let response = agent
                    .post(&url)
                    .set("Content-Type", "application/json")
                    .send_string(&body)?;

                let text = response.into_string()?;
                Ok::<String, ScannerError>(text)
            }
        })
        .await??;

        let rpc_response: RpcResponse<T> = serde_json::from_str(&response_body)?;

        if let Some(error) = rpc_response.error {
            return Err(ScannerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| ScannerError::Rpc {
            code: 0,
            message: format!("No result in {} response", method),
        })
    }

    /// Fetch every account owned by `program_id` that passes `filters`
    pub async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> ScannerResult<Vec<(Pubkey, Account)>> {
        let params = json!([
            program_id.to_string(),
            {
                "encoding": "base64",
                "commitment": self.commitment.commitment.to_string(),
                "filters": filters,
            }
        ]);

        let response: Vec<RpcKeyedAccount> = self.call("getProgramAccounts", params).await?;
        response.into_iter().map(RpcKeyedAccount::into_keyed).collect()
    }

    /// Get account information
    pub async fn get_account(&self, pubkey: &Pubkey) -> ScannerResult<Option<Account>> {
        let params = json!([
            pubkey.to_string(),
            {
                "encoding": "base64",
                "commitment": self.commitment.commitment.to_string(),
            }
        ]);

        let response: Value = self.call("getAccountInfo", params).await?;

        if response["value"].is_null() {
            return Ok(None);
        }

        let account: RpcAccount = serde_json::from_value(response["value"].clone())?;
        account.into_account(&pubkey.to_string()).map(Some)
    }

    /// Decimals of an SPL mint, `None` when the account is missing or not a mint
    pub async fn get_mint_decimals(&self, mint: &Pubkey) -> ScannerResult<Option<u8>> {
        let params = json!([
            mint.to_string(),
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment.commitment.to_string(),
            }
        ]);

        let response: Value = self.call("getAccountInfo", params).await?;
        Ok(parse_mint_decimals(&response))
    }
}

fn parse_mint_decimals(response: &Value) -> Option<u8> {
    let parsed = &response["value"]["data"]["parsed"];
    if parsed["type"].as_str() != Some("mint") {
        return None;
    }
    parsed["info"]["decimals"]
        .as_u64()
        .and_then(|d| u8::try_from(d).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rpc_client_creation() {
        let client = LightRpcClient::new(
            "http://localhost:8899".to_string(),
            CommitmentLevel::Confirmed,
            Duration::from_secs(5),
        );
        assert_eq!(client.url(), "http://localhost:8899");
    }

    #[test]
    fn test_filter_serialization() {
        let mint = Pubkey::new_unique();
        let filters = order_filters(&mint, 40);
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json[0], json!({ "dataSize": 372 }));
        assert_eq!(json[1], json!({ "memcmp": { "offset": 40, "bytes": mint.to_string() } }));
    }

    #[test]
    fn test_filter_matching() {
        let mint = Pubkey::new_unique();
        let mut data = vec![0u8; ORDER_ACCOUNT_SIZE];
        data[72..104].copy_from_slice(mint.as_ref());

        assert!(order_filters(&mint, 72).iter().all(|f| f.matches(&data)));
        assert!(!AccountFilter::mint_at(40, &mint).matches(&data));
        assert!(!AccountFilter::DataSize(372).matches(&data[..371]));
        // memcmp past the end never matches
        assert!(!AccountFilter::mint_at(360, &mint).matches(&data));
    }

    #[test]
    fn test_parse_mint_decimals() {
        let response = json!({
            "value": {
                "data": {
                    "parsed": { "type": "mint", "info": { "decimals": 9 } },
                    "program": "spl-token"
                }
            }
        });
        assert_eq!(parse_mint_decimals(&response), Some(9));

        let token_account = json!({
            "value": { "data": { "parsed": { "type": "account", "info": {} } } }
        });
        assert_eq!(parse_mint_decimals(&token_account), None);
        assert_eq!(parse_mint_decimals(&json!({ "value": null })), None);
    }

    #[test]
    fn test_keyed_account_decoding() {
        let keyed: RpcKeyedAccount = serde_json::from_value(json!({
            "pubkey": "11111111111111111111111111111111",
            "account": {
                "lamports": 10,
                "data": ["AQID", "base64"],
                "owner": "j1o2qRpjcyUwEvwtcfhEQefh773ZgjxcVRry7LDqg5X",
                "executable": false,
                "rentEpoch": 0
            }
        }))
        .unwrap();
        let (pubkey, account) = keyed.into_keyed().unwrap();
        assert_eq!(pubkey, Pubkey::default());
        assert_eq!(account.data, vec![1, 2, 3]);

        let bad: RpcKeyedAccount = serde_json::from_value(json!({
            "pubkey": "11111111111111111111111111111111",
            "account": { "lamports": 0, "data": ["", "base58"], "owner": "x" }
        }))
        .unwrap();
        assert!(matches!(
            bad.into_keyed(),
            Err(ScannerError::InvalidAccountData { .. })
        ));
    }
}
