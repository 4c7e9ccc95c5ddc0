//! In-memory TransactionRepository.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::PaymentTransaction;
use crate::ports::{TransactionPage, TransactionRepository};

/// Vec-backed append-only ledger.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    rows: Arc<RwLock<Vec<PaymentTransaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All ledger entries, for test assertions.
    pub async fn all(&self) -> Vec<PaymentTransaction> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn append(&self, transaction: &PaymentTransaction) -> Result<(), DomainError> {
        self.rows.write().await.push(transaction.clone());
        Ok(())
    }

    async fn list_by_subscriptions(
        &self,
        subscription_ids: &[SubscriptionId],
        limit: u32,
        offset: u64,
    ) -> Result<TransactionPage, DomainError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<_> = rows
            .iter()
            .filter(|t| subscription_ids.contains(&t.subscription_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date_of_payment.cmp(&a.date_of_payment));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(TransactionPage { items, total })
    }
}
