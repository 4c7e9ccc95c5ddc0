//! GetPaymentsHandler - paginated payment history for a user.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::PaymentTransaction;
use crate::ports::{SubscriptionRepository, TransactionRepository};

/// Query for a user's payment history.
#[derive(Debug, Clone)]
pub struct GetPaymentsQuery {
    pub user_id: UserId,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

/// A page of the user's payment ledger.
#[derive(Debug, Clone)]
pub struct PaymentsPage {
    pub items: Vec<PaymentTransaction>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Reads the append-only ledger across all of a user's subscriptions.
pub struct GetPaymentsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    transactions: Arc<dyn TransactionRepository>,
}

impl GetPaymentsHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        transactions: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            subscriptions,
            transactions,
        }
    }

    pub async fn handle(&self, query: GetPaymentsQuery) -> Result<PaymentsPage, DomainError> {
        let page = query.page.max(1);
        let per_page = query.per_page.clamp(1, 100);

        let subscription_ids: Vec<_> = self
            .subscriptions
            .find_by_user(&query.user_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if subscription_ids.is_empty() {
            return Ok(PaymentsPage {
                items: Vec::new(),
                total: 0,
                page,
                per_page,
            });
        }

        let offset = u64::from(page - 1) * u64::from(per_page);
        let ledger = self
            .transactions
            .list_by_subscriptions(&subscription_ids, per_page, offset)
            .await?;

        Ok(PaymentsPage {
            items: ledger.items,
            total: ledger.total,
            page,
            per_page,
        })
    }
}
