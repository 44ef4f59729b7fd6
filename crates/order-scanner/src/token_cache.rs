//! Token registry backed by static entries and cached RPC lookups

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use limit_order_core::{Pubkey, StaticTokenRegistry, TokenDecimals, TokenRegistry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::ScannerResult;
use crate::rpc_client::LightRpcClient;
use crate::source::with_retry;

/// Upper bound on mint lookups in flight at once
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Where decimals for mints outside the static table come from
#[async_trait]
pub trait MintLookup: Send + Sync {
    /// `None` when the account exists but is not an SPL mint
    async fn mint_decimals(&self, mint: &Pubkey) -> ScannerResult<Option<u8>>;
}

#[async_trait]
impl MintLookup for LightRpcClient {
    async fn mint_decimals(&self, mint: &Pubkey) -> ScannerResult<Option<u8>> {
        self.get_mint_decimals(mint).await
    }
}

/// Resolves decimals from the static table first, then from mints fetched
/// by [`CachedTokenRegistry::prefetch`].
///
/// Lookups never block on the network; a mint missing from both tables
/// resolves to [`TokenDecimals::unknown`].
pub struct CachedTokenRegistry {
    known: StaticTokenRegistry,
    fetched: RwLock<HashMap<Pubkey, u8>>,
    lookup: Option<Arc<dyn MintLookup>>,
    retry: RetryConfig,
}

impl CachedTokenRegistry {
    pub fn new(known: StaticTokenRegistry, retry: RetryConfig) -> Self {
        Self {
            known,
            fetched: RwLock::new(HashMap::new()),
            lookup: None,
            retry,
        }
    }

    /// Static entries only
    pub fn offline(known: StaticTokenRegistry) -> Self {
        Self::new(known, RetryConfig::default())
    }

    /// Resolve mints outside the static table through `lookup`
    pub fn with_lookup(mut self, lookup: Arc<dyn MintLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Record decimals for `mint` as if they had been fetched
    pub fn insert(&self, mint: Pubkey, decimals: u8) {
        match self.fetched.write() {
            Ok(mut fetched) => {
                fetched.insert(mint, decimals);
            }
            Err(e) => warn!("Token cache lock poisoned: {}", e),
        }
    }

    fn cached(&self, mint: &Pubkey) -> Option<u8> {
        self.fetched.read().ok()?.get(mint).copied()
    }

    /// Fetch decimals for every mint not already resolvable.
    ///
    /// Lookups are retried per the registry's [`RetryConfig`] and at most
    /// [`MAX_CONCURRENT_LOOKUPS`] run at once. Returns how many mints were
    /// newly resolved. Failed lookups are logged and leave the mint unresolved.
    pub async fn prefetch(&self, mints: impl IntoIterator<Item = Pubkey>) -> usize {
        let Some(lookup) = &self.lookup else {
            return 0;
        };

        let mut missing: Vec<Pubkey> = mints
            .into_iter()
            .filter(|mint| self.known.get(mint).is_none() && self.cached(mint).is_none())
            .collect();
        missing.sort();
        missing.dedup();

        if missing.is_empty() {
            return 0;
        }
        debug!("Fetching decimals for {} mints", missing.len());

        let results: Vec<_> = stream::iter(missing)
            .map(|mint| async move {
                let result = with_retry(&self.retry, "getAccountInfo (mint)", || {
                    lookup.mint_decimals(&mint)
                })
                .await;
                (mint, result)
            })
            .buffer_unordered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        let mut resolved = 0;
        for (mint, result) in results {
            match result {
                Ok(Some(decimals)) => {
                    self.insert(mint, decimals);
                    resolved += 1;
                }
                Ok(None) => warn!(mint = %mint, "Account is not an SPL mint"),
                Err(e) => warn!(mint = %mint, "Failed to fetch mint decimals: {}", e),
            }
        }
        resolved
    }
}

impl TokenRegistry for CachedTokenRegistry {
    fn resolve_decimals(&self, mint: &Pubkey) -> TokenDecimals {
        if let Some(token) = self.known.get(mint) {
            return TokenDecimals::known(token.decimals);
        }
        self.cached(mint)
            .map(TokenDecimals::known)
            .unwrap_or_else(TokenDecimals::unknown)
    }

    fn symbol(&self, mint: &Pubkey) -> Option<String> {
        self.known.symbol(mint)
    }
}
