//! Limit order scanner
//!
//! Fetches order accounts for tracked tokens from a Solana RPC node (or a
//! saved `getProgramAccounts` dump), decodes and classifies them with
//! `limit_order_core`, and renders per-token reports.

pub mod config;
pub mod error;
pub mod processor;
pub mod report;
pub mod rpc_client;
pub mod scanner;
pub mod source;
pub mod token_cache;

pub use config::{OutputFormat, RetryConfig, ScannerConfig, TrackedToken};
pub use error::{ScannerError, ScannerResult};
pub use processor::{BatchOutcome, OrderProcessor, ProcessedAccount, RejectedAccount};
pub use report::{field_dump, DumpedField, ReportedOrder, ScanReport, TokenReport, TokenSummary};
pub use rpc_client::{AccountFilter, LightRpcClient};
pub use scanner::{InspectedOrder, OrderScanner};
pub use source::{AccountSource, FileAccountSource, RawAccount, RpcAccountSource};
pub use token_cache::{CachedTokenRegistry, MintLookup};
