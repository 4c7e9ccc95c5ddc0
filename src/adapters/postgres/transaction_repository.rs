//! PostgreSQL implementation of TransactionRepository.

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, TransactionId};
use crate::domain::subscription::{PaymentTransaction, TransactionStatus};
use crate::ports::{TransactionPage, TransactionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the append-only payment ledger.
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    subscription_id: Uuid,
    price_minor: i64,
    provider: String,
    plan: String,
    status: String,
    date_of_payment: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for PaymentTransaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(PaymentTransaction {
            id: TransactionId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            price_minor: row.price_minor,
            provider: crate::domain::subscription::ProviderKind::parse(&row.provider)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            plan: crate::domain::subscription::PlanKind::parse(&row.plan)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            status: parse_status(&row.status)?,
            date_of_payment: Timestamp::from_datetime(row.date_of_payment),
            end_date: Timestamp::from_datetime(row.end_date),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_status(s: &str) -> Result<TransactionStatus, DomainError> {
    match s {
        "succeeded" => Ok(TransactionStatus::Succeeded),
        "failed" => Ok(TransactionStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid transaction status: {}", s),
        )),
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn append(&self, transaction: &PaymentTransaction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, subscription_id, price_minor, provider, plan, status,
                date_of_payment, end_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.subscription_id.as_uuid())
        .bind(transaction.price_minor)
        .bind(transaction.provider.as_str().to_lowercase())
        .bind(transaction.plan.as_str().to_lowercase())
        .bind(transaction.status.as_str())
        .bind(transaction.date_of_payment.as_datetime())
        .bind(transaction.end_date.as_datetime())
        .bind(transaction.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to append transaction: {}", e),
            )
        })?;

        Ok(())
    }

    async fn list_by_subscriptions(
        &self,
        subscription_ids: &[SubscriptionId],
        limit: u32,
        offset: u64,
    ) -> Result<TransactionPage, DomainError> {
        let ids: Vec<Uuid> = subscription_ids.iter().map(|id| *id.as_uuid()).collect();

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payment_transactions WHERE subscription_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to count transactions: {}", e),
            )
        })?;

        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_id, price_minor, provider, plan, status,
                   date_of_payment, end_date, created_at
            FROM payment_transactions
            WHERE subscription_id = ANY($1)
            ORDER BY date_of_payment DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&ids)
        .bind(i64::from(limit))
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list transactions: {}", e),
            )
        })?;

        Ok(TransactionPage {
            items: rows
                .into_iter()
                .map(PaymentTransaction::try_from)
                .collect::<Result<_, _>>()?,
            total: total as u64,
        })
    }
}
