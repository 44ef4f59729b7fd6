//! Scan orchestration: fetch, decode, classify, report

use futures::future::try_join_all;
use limit_order_core::{classify, decode, ClassifiedOrder, Pubkey};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::TrackedToken;
use crate::error::{ScannerError, ScannerResult};
use crate::processor::OrderProcessor;
use crate::report::{field_dump, DumpedField, ScanReport, TokenReport};
use crate::source::{AccountSource, RawAccount};
use crate::token_cache::CachedTokenRegistry;

/// Scans a set of tracked tokens through one account source
pub struct OrderScanner {
    source: Arc<dyn AccountSource>,
    registry: Arc<CachedTokenRegistry>,
    program_id: Pubkey,
    tokens: Vec<TrackedToken>,
    detailed: bool,
}

/// A single order account looked up by address
#[derive(Debug, Clone)]
pub struct InspectedOrder {
    pub order: ClassifiedOrder,
    pub fields: Vec<DumpedField>,
}

impl OrderScanner {
    pub fn new(
        source: Arc<dyn AccountSource>,
        registry: Arc<CachedTokenRegistry>,
        program_id: Pubkey,
        tokens: Vec<TrackedToken>,
    ) -> Self {
        Self {
            source,
            registry,
            program_id,
            tokens,
            detailed: false,
        }
    }

    /// Attach per-field dumps to every reported order
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    /// Fetch every tracked token's orders and classify them against `now`
    #[instrument(skip(self), fields(tokens = self.tokens.len()))]
    pub async fn scan(&self, now: i64) -> ScannerResult<ScanReport> {
        let fetches = self.tokens.iter().map(|token| async move {
            info!("Fetching {} orders...", token.symbol);
            let accounts = self.source.fetch_orders(&token.mint).await?;
            info!("Found {} unique orders for {}", accounts.len(), token.symbol);
            Ok::<_, ScannerError>((token, accounts))
        });
        let fetched = try_join_all(fetches).await?;

        let processor = OrderProcessor::new(now);
        let outcomes: Vec<_> = fetched
            .into_iter()
            .map(|(token, accounts)| {
                let outcome = processor.process_batch(&accounts);
                (token, accounts, outcome)
            })
            .collect();

        // Both sides of every order need decimals for display
        let mints = outcomes.iter().flat_map(|(_, _, outcome)| {
            outcome
                .orders
                .iter()
                .flat_map(|o| [o.record.input_mint, o.record.output_mint])
        });
        let resolved = self.registry.prefetch(mints.collect::<Vec<_>>()).await;
        if resolved > 0 {
            info!("Resolved decimals for {} additional mints", resolved);
        }

        let tokens = outcomes
            .into_iter()
            .map(|(token, accounts, outcome)| {
                TokenReport::build(
                    token,
                    outcome,
                    &accounts,
                    self.registry.as_ref(),
                    self.detailed,
                )
            })
            .collect();

        let report = ScanReport::new(self.program_id, now, tokens);
        info!(
            orders = report.total_orders(),
            rejected = report.total_rejected(),
            "Scan complete"
        );
        Ok(report)
    }

    /// Decode and classify one account by address
    pub async fn inspect(&self, address: &Pubkey, now: i64) -> ScannerResult<InspectedOrder> {
        let RawAccount { address, data } = self
            .source
            .fetch_account(address)
            .await?
            .ok_or_else(|| ScannerError::InvalidAccountData {
                address: address.to_string(),
                reason: "Account not found".to_string(),
            })?;

        let record = decode(&data, address).map_err(|source| ScannerError::Decode {
            address: address.to_string(),
            source,
        })?;
        self.registry
            .prefetch([record.input_mint, record.output_mint])
            .await;
        let fields = field_dump(&address, &data, &*self.registry)?;

        Ok(InspectedOrder {
            order: classify(record, now),
            fields,
        })
    }
}
