//! Request/response DTOs for the internal RPC surface.

use serde::{Deserialize, Serialize};

use crate::application::commands::{CreateSubscriptionResult, PaymentsPage};
use crate::domain::foundation::UserId;
use crate::domain::subscription::{PaymentTransaction, PlanKind, ProviderKind};

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequestDto {
    pub user_id: UserId,
    pub username: String,
    pub provider: ProviderKind,
    pub plan: PlanKind,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponseDto {
    pub subscription_id: String,
    pub approval_url: Option<String>,
}

impl From<CreateSubscriptionResult> for CreateSubscriptionResponseDto {
    fn from(result: CreateSubscriptionResult) -> Self {
        Self {
            subscription_id: result.subscription_id.to_string(),
            approval_url: result.approval_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserActionRequestDto {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequestDto {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateUsernameResponseDto {
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct PaymentsQueryDto {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[derive(Debug, Serialize)]
pub struct PaymentsPageDto {
    pub items: Vec<PaymentTransaction>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl From<PaymentsPage> for PaymentsPageDto {
    fn from(page: PaymentsPage) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_deserializes() {
        let json = r#"{
            "user_id": "550e8400-e29b-41d4-a716-446655440000",
            "username": "peggy",
            "provider": "PAYPAL",
            "plan": "MONTHLY"
        }"#;

        let dto: CreateSubscriptionRequestDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.provider, ProviderKind::Paypal);
        assert_eq!(dto.plan, PlanKind::Monthly);
    }

    #[test]
    fn payments_query_defaults_apply() {
        let dto: PaymentsQueryDto = serde_json::from_str("{}").unwrap();
        assert_eq!(dto.page, 1);
        assert_eq!(dto.per_page, 20);
    }
}
