//! Decode and classify batches of raw order accounts

use limit_order_core::{classify, decode, ClassifiedOrder, DecodeError, OrderStatus, Pubkey};
use serde::Serialize;
use tracing::{debug, warn};

use crate::source::RawAccount;

/// Account that failed to decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedAccount {
    #[serde(with = "limit_order_core::order::pubkey_serde")]
    pub address: Pubkey,
    #[serde(serialize_with = "serialize_error")]
    pub error: DecodeError,
}

fn serialize_error<S>(error: &DecodeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

/// Outcome for a single account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedAccount {
    Order(Box<ClassifiedOrder>),
    Rejected(RejectedAccount),
}

/// Outcome for a batch; one bad account never hides the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub orders: Vec<ClassifiedOrder>,
    pub rejected: Vec<RejectedAccount>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.orders.len() + self.rejected.len()
    }

    pub fn count_status(&self, status: OrderStatus) -> usize {
        self.orders.iter().filter(|o| o.status == status).count()
    }
}

/// Stateless decode-then-classify pipeline against a fixed clock
#[derive(Debug, Clone, Copy)]
pub struct OrderProcessor {
    now: i64,
}

impl OrderProcessor {
    pub fn new(now: i64) -> Self {
        Self { now }
    }

    /// Processor using the wall clock
    pub fn at_current_time() -> Self {
        Self::new(chrono::Utc::now().timestamp())
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn process_account(&self, account: &RawAccount) -> ProcessedAccount {
        match decode(&account.data, account.address) {
            Ok(record) => ProcessedAccount::Order(Box::new(classify(record, self.now))),
            Err(error) => {
                warn!(address = %account.address, "Rejected order account: {}", error);
                ProcessedAccount::Rejected(RejectedAccount {
                    address: account.address,
                    error,
                })
            }
        }
    }

    pub fn process_batch<'a>(
        &self,
        accounts: impl IntoIterator<Item = &'a RawAccount>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for account in accounts {
            match self.process_account(account) {
                ProcessedAccount::Order(order) => outcome.orders.push(*order),
                ProcessedAccount::Rejected(rejected) => outcome.rejected.push(rejected),
            }
        }

        debug!(
            orders = outcome.orders.len(),
            rejected = outcome.rejected.len(),
            "Processed batch"
        );
        outcome
    }
}
