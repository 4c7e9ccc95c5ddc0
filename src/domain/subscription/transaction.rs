//! Payment transaction ledger entry.
//!
//! One row per processed billing event, successful or not. Rows are
//! immutable once created; corrections are new rows, never updates.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, TransactionId};

use super::{PlanKind, ProviderKind, Subscription};

/// Outcome of a single billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Succeeded,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Succeeded => "succeeded",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Append-only ledger entry for one billing event of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Unique identifier for this ledger entry.
    pub id: TransactionId,

    /// Subscription this charge belongs to.
    pub subscription_id: SubscriptionId,

    /// Charged amount in minor currency units.
    pub price_minor: i64,

    /// Provider the charge went through.
    pub provider: ProviderKind,

    /// Plan the charge was billed under.
    pub plan: PlanKind,

    /// Whether the charge succeeded or failed.
    pub status: TransactionStatus,

    /// When the provider processed the charge.
    pub date_of_payment: Timestamp,

    /// End of the billing period this charge pays for.
    pub end_date: Timestamp,

    /// When this row was recorded locally.
    pub created_at: Timestamp,
}

impl PaymentTransaction {
    /// Records a billing event against a subscription.
    ///
    /// Price and plan are taken from the subscription at recording time.
    pub fn record(
        subscription: &Subscription,
        status: TransactionStatus,
        date_of_payment: Timestamp,
        end_date: Timestamp,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            subscription_id: subscription.id,
            price_minor: subscription.plan.price_minor(),
            provider: subscription.provider,
            plan: subscription.plan,
            status,
            date_of_payment,
            end_date,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn subscription() -> Subscription {
        Subscription::create(
            UserId::new(),
            "carol".to_string(),
            ProviderKind::Paypal,
            PlanKind::Monthly,
        )
    }

    #[test]
    fn record_captures_subscription_pricing() {
        let sub = subscription();
        let paid_at = Timestamp::from_unix_secs(1_700_000_000);
        let end = paid_at.add_days(30);

        let tx = PaymentTransaction::record(&sub, TransactionStatus::Succeeded, paid_at, end);

        assert_eq!(tx.subscription_id, sub.id);
        assert_eq!(tx.price_minor, PlanKind::Monthly.price_minor());
        assert_eq!(tx.provider, ProviderKind::Paypal);
        assert_eq!(tx.plan, PlanKind::Monthly);
        assert_eq!(tx.status, TransactionStatus::Succeeded);
        assert_eq!(tx.date_of_payment, paid_at);
        assert_eq!(tx.end_date, end);
    }

    #[test]
    fn failed_charges_are_recorded_with_failed_status() {
        let sub = subscription();
        let paid_at = Timestamp::from_unix_secs(1_700_000_000);

        let tx = PaymentTransaction::record(
            &sub,
            TransactionStatus::Failed,
            paid_at,
            paid_at.add_days(30),
        );

        assert_eq!(tx.status, TransactionStatus::Failed);
    }

    #[test]
    fn each_record_gets_a_distinct_id() {
        let sub = subscription();
        let paid_at = Timestamp::now();
        let a = PaymentTransaction::record(&sub, TransactionStatus::Succeeded, paid_at, paid_at);
        let b = PaymentTransaction::record(&sub, TransactionStatus::Succeeded, paid_at, paid_at);
        assert_ne!(a.id, b.id);
    }
}
