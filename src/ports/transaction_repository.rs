//! Payment transaction repository port.
//!
//! The ledger is append-only: entries are created exactly once per processed
//! billing event and never updated or deleted. Closing a subscription never
//! touches its ledger.

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::PaymentTransaction;
use async_trait::async_trait;

/// A page of ledger entries.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<PaymentTransaction>,
    pub total: u64,
}

/// Repository port for the append-only payment ledger.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Append a ledger entry.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn append(&self, transaction: &PaymentTransaction) -> Result<(), DomainError>;

    /// List ledger entries across the given subscriptions, newest first,
    /// paginated. Callers pass all of a user's subscription ids to page
    /// through that user's payment history.
    async fn list_by_subscriptions(
        &self,
        subscription_ids: &[SubscriptionId],
        limit: u32,
        offset: u64,
    ) -> Result<TransactionPage, DomainError>;
}
