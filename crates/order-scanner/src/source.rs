//! Account sources
//!
//! An [`AccountSource`] yields the raw order accounts touching a tracked mint,
//! from either side of the book. Sources only move bytes around; decoding
//! happens in the processor.

use async_trait::async_trait;
use limit_order_core::{Pubkey, INPUT_MINT_OFFSET, OUTPUT_MINT_OFFSET};
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::error::{ScannerError, ScannerResult};
use crate::rpc_client::{order_filters, LightRpcClient, RpcKeyedAccount};

/// Undecoded account bytes and the address they were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub address: Pubkey,
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn new(address: Pubkey, data: Vec<u8>) -> Self {
        Self { address, data }
    }
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Order accounts selling or buying `mint`, without duplicates
    async fn fetch_orders(&self, mint: &Pubkey) -> ScannerResult<Vec<RawAccount>>;

    /// A single account by address
    async fn fetch_account(&self, address: &Pubkey) -> ScannerResult<Option<RawAccount>>;
}

/// Merge sell-side and buy-side results, keeping the first copy of each address
pub fn dedupe(accounts: impl IntoIterator<Item = RawAccount>) -> Vec<RawAccount> {
    let mut seen = HashSet::new();
    accounts
        .into_iter()
        .filter(|account| {
            let fresh = seen.insert(account.address);
            if !fresh {
                debug!(address = %account.address, "Skipping duplicate order account");
            }
            fresh
        })
        .collect()
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts
pub async fn with_retry<T, F, Fut>(retry: &RetryConfig, what: &str, mut operation: F) -> ScannerResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScannerResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {}ms",
                    what,
                    attempt + 1,
                    retry.max_retries + 1,
                    e,
                    delay
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Live accounts through `getProgramAccounts`
pub struct RpcAccountSource {
    client: Arc<LightRpcClient>,
    program_id: Pubkey,
    retry: RetryConfig,
}

impl RpcAccountSource {
    pub fn new(client: Arc<LightRpcClient>, program_id: Pubkey, retry: RetryConfig) -> Self {
        Self {
            client,
            program_id,
            retry,
        }
    }

    async fn fetch_side(&self, mint: &Pubkey, offset: usize) -> ScannerResult<Vec<RawAccount>> {
        let filters = order_filters(mint, offset);
        let what = format!("getProgramAccounts for {} at offset {}", mint, offset);
        let accounts = with_retry(&self.retry, &what, || {
            self.client.get_program_accounts(&self.program_id, &filters)
        })
        .await?;

        Ok(accounts
            .into_iter()
            .map(|(address, account)| RawAccount::new(address, account.data))
            .collect())
    }
}

#[async_trait]
impl AccountSource for RpcAccountSource {
    async fn fetch_orders(&self, mint: &Pubkey) -> ScannerResult<Vec<RawAccount>> {
        let (sells, buys) = tokio::try_join!(
            self.fetch_side(mint, INPUT_MINT_OFFSET),
            self.fetch_side(mint, OUTPUT_MINT_OFFSET),
        )?;

        info!(
            mint = %mint,
            sells = sells.len(),
            buys = buys.len(),
            "Fetched order accounts"
        );

        Ok(dedupe(sells.into_iter().chain(buys)))
    }

    async fn fetch_account(&self, address: &Pubkey) -> ScannerResult<Option<RawAccount>> {
        let what = format!("getAccountInfo for {}", address);
        let account = with_retry(&self.retry, &what, || self.client.get_account(address)).await?;
        Ok(account.map(|account| RawAccount::new(*address, account.data)))
    }
}

/// Saved `getProgramAccounts` output, either the full JSON-RPC response or
/// just its `result` array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountDump {
    Response { result: Vec<RpcKeyedAccount> },
    Accounts(Vec<RpcKeyedAccount>),
}

/// Accounts replayed from a JSON file, filtered the way the RPC node would
pub struct FileAccountSource {
    program_id: Pubkey,
    accounts: Vec<(RawAccount, Pubkey)>,
}

impl FileAccountSource {
    pub fn from_json(program_id: Pubkey, json: &str) -> ScannerResult<Self> {
        let dump: AccountDump = serde_json::from_str(json)?;
        let keyed = match dump {
            AccountDump::Response { result } => result,
            AccountDump::Accounts(accounts) => accounts,
        };

        let accounts = keyed
            .into_iter()
            .map(|keyed| -> ScannerResult<(RawAccount, Pubkey)> {
                let (address, account) = keyed.into_keyed()?;
                Ok((RawAccount::new(address, account.data), account.owner))
            })
            .collect::<ScannerResult<Vec<_>>>()?;

        Ok(Self {
            program_id,
            accounts,
        })
    }

    pub fn from_file(program_id: Pubkey, path: impl AsRef<Path>) -> ScannerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScannerError::Configuration(format!(
                "Failed to read fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        let source = Self::from_json(program_id, &json)?;
        info!(
            "Loaded {} accounts from {}",
            source.accounts.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn matching(&self, mint: &Pubkey, offset: usize) -> impl Iterator<Item = RawAccount> + '_ {
        let filters = order_filters(mint, offset);
        self.accounts
            .iter()
            .filter(move |(account, owner)| {
                *owner == self.program_id && filters.iter().all(|f| f.matches(&account.data))
            })
            .map(|(account, _)| account.clone())
    }
}

#[async_trait]
impl AccountSource for FileAccountSource {
    async fn fetch_orders(&self, mint: &Pubkey) -> ScannerResult<Vec<RawAccount>> {
        let sells = self.matching(mint, INPUT_MINT_OFFSET);
        let buys = self.matching(mint, OUTPUT_MINT_OFFSET);
        Ok(dedupe(sells.chain(buys)))
    }

    async fn fetch_account(&self, address: &Pubkey) -> ScannerResult<Option<RawAccount>> {
        Ok(self
            .accounts
            .iter()
            .find(|(account, _)| account.address == *address)
            .map(|(account, _)| account.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let accounts = vec![
            RawAccount::new(a, vec![1]),
            RawAccount::new(b, vec![2]),
            RawAccount::new(a, vec![3]),
        ];
        let unique = dedupe(accounts);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].data, vec![1]);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_network_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_retry(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ScannerError::Network("timeout".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: ScannerResult<()> = with_retry(&fast_retry(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ScannerError::Network("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bad_data_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: ScannerResult<()> = with_retry(&fast_retry(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ScannerError::InvalidAccountData {
                address: "x".into(),
                reason: "bad base64".into(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bare_array_dump() {
        let json = r#"[{
            "pubkey": "11111111111111111111111111111111",
            "account": {"lamports": 1, "data": ["AAA=", "base64"], "owner": "11111111111111111111111111111111"}
        }]"#;
        let source = FileAccountSource::from_json(Pubkey::default(), json).unwrap();
        assert_eq!(source.len(), 1);
    }
}
