//! PostgreSQL implementation of SubscriptionRepository.

use crate::domain::foundation::{
    DomainError, ErrorCode, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{
    PlanKind, ProviderKind, Subscription, SubscriptionStatus,
};
use crate::ports::SubscriptionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the SubscriptionRepository port.
///
/// Updates are compare-and-swap on the `version` column: the row only
/// changes when the caller's loaded version still matches, which makes
/// concurrent webhook deliveries and the expiration sweep safe against
/// each other.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    username: String,
    provider: String,
    provider_subscription_id: Option<String>,
    provider_customer_id: Option<String>,
    plan: String,
    status: String,
    auto_renewal: bool,
    date_of_payment: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i32,
}

const SELECT_COLUMNS: &str = "id, user_id, username, provider, provider_subscription_id, \
     provider_customer_id, plan, status, auto_renewal, date_of_payment, end_date, \
     is_active, created_at, updated_at, version";

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            username: row.username,
            provider: parse_provider(&row.provider)?,
            provider_subscription_id: row.provider_subscription_id,
            provider_customer_id: row.provider_customer_id,
            plan: parse_plan(&row.plan)?,
            status: parse_status(&row.status)?,
            auto_renewal: row.auto_renewal,
            date_of_payment: row.date_of_payment.map(Timestamp::from_datetime),
            end_date: row.end_date.map(Timestamp::from_datetime),
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

fn parse_provider(s: &str) -> Result<ProviderKind, DomainError> {
    ProviderKind::parse(s)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
}

fn parse_plan(s: &str) -> Result<PlanKind, DomainError> {
    PlanKind::parse(s).map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(SubscriptionStatus::Pending),
        "active" => Ok(SubscriptionStatus::Active),
        "suspended" => Ok(SubscriptionStatus::Suspended),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

fn status_to_string(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Pending => "pending",
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Suspended => "suspended",
        SubscriptionStatus::Canceled => "canceled",
    }
}

fn provider_to_string(provider: &ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Stripe => "stripe",
        ProviderKind::Paypal => "paypal",
    }
}

fn plan_to_string(plan: &PlanKind) -> &'static str {
    match plan {
        PlanKind::Day => "day",
        PlanKind::Weekly => "weekly",
        PlanKind::Monthly => "monthly",
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, username, provider, provider_subscription_id,
                provider_customer_id, plan, status, auto_renewal, date_of_payment,
                end_date, is_active, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(&subscription.username)
        .bind(provider_to_string(&subscription.provider))
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(plan_to_string(&subscription.plan))
        .bind(status_to_string(&subscription.status))
        .bind(subscription.auto_renewal)
        .bind(subscription.date_of_payment.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.end_date.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.is_active)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to save subscription: {}", e),
            )
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                username = $3,
                provider_subscription_id = $4,
                provider_customer_id = $5,
                status = $6,
                auto_renewal = $7,
                date_of_payment = $8,
                end_date = $9,
                is_active = $10,
                updated_at = $11,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.version)
        .bind(&subscription.username)
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(status_to_string(&subscription.status))
        .bind(subscription.auto_renewal)
        .bind(subscription.date_of_payment.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.end_date.as_ref().map(Timestamp::as_datetime))
        .bind(subscription.is_active)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            // Distinguish a stale version from a missing row.
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM subscriptions WHERE id = $1")
                    .bind(subscription.id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| {
                        DomainError::new(ErrorCode::DatabaseError, e.to_string())
                    })?;

            return Err(if exists.is_some() {
                DomainError::version_conflict(subscription.id)
            } else {
                DomainError::subscription_not_found(subscription.id)
            });
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE provider_subscription_id = $1",
            SELECT_COLUMNS
        ))
        .bind(provider_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 AND is_active = TRUE",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list subscriptions: {}", e),
            )
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_lapsed(&self, horizon: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE status IN ('active', 'suspended')
              AND end_date IS NOT NULL
              AND end_date <= $1
            ORDER BY end_date ASC
            "#,
            SELECT_COLUMNS
        ))
        .bind(horizon.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find lapsed subscriptions: {}", e),
            )
        })?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn update_username(
        &self,
        user_id: &UserId,
        username: &str,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET username = $2, updated_at = NOW(), version = version + 1
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update username: {}", e),
            )
        })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("pending").unwrap(), SubscriptionStatus::Pending);
        assert_eq!(parse_status("active").unwrap(), SubscriptionStatus::Active);
        assert_eq!(
            parse_status("suspended").unwrap(),
            SubscriptionStatus::Suspended
        );
        assert_eq!(
            parse_status("canceled").unwrap(),
            SubscriptionStatus::Canceled
        );
        assert_eq!(parse_status("ACTIVE").unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("paused").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Suspended,
            SubscriptionStatus::Canceled,
        ] {
            let s = status_to_string(&status);
            assert_eq!(parse_status(s).unwrap(), status);
        }
    }

    #[test]
    fn roundtrip_provider_conversion() {
        for provider in [ProviderKind::Stripe, ProviderKind::Paypal] {
            let s = provider_to_string(&provider);
            assert_eq!(parse_provider(s).unwrap(), provider);
        }
    }

    #[test]
    fn roundtrip_plan_conversion() {
        for plan in [PlanKind::Day, PlanKind::Weekly, PlanKind::Monthly] {
            let s = plan_to_string(&plan);
            assert_eq!(parse_plan(s).unwrap(), plan);
        }
    }
}
