//! Handlers for the internal RPC surface.
//!
//! Thin translation between DTOs and the application command handlers;
//! all policy lives below this layer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::application::commands::{
    CreateSubscriptionCommand, GetPaymentsQuery, SubscriptionInfo,
};
use crate::domain::foundation::UserId;

use super::dto::{
    CreateSubscriptionRequestDto, CreateSubscriptionResponseDto, PaymentsPageDto,
    PaymentsQueryDto, UpdateUsernameRequestDto, UpdateUsernameResponseDto, UserActionRequestDto,
};
use super::error::ApiError;
use super::state::AppState;

/// POST /internal/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequestDto>,
) -> Result<(StatusCode, Json<CreateSubscriptionResponseDto>), ApiError> {
    let result = state
        .create_subscription
        .handle(CreateSubscriptionCommand {
            user_id: request.user_id,
            username: request.username,
            provider: request.provider,
            plan: request.plan,
            success_url: state.checkout_success_url.clone(),
            cancel_url: state.checkout_cancel_url.clone(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /internal/subscriptions/renewal/disable
pub async fn disable_auto_renewal(
    State(state): State<AppState>,
    Json(request): Json<UserActionRequestDto>,
) -> Result<StatusCode, ApiError> {
    state.disable_auto_renewal.handle(request.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /internal/subscriptions/renewal/enable
pub async fn enable_auto_renewal(
    State(state): State<AppState>,
    Json(request): Json<UserActionRequestDto>,
) -> Result<StatusCode, ApiError> {
    state.enable_auto_renewal.handle(request.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /internal/subscriptions/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(request): Json<UserActionRequestDto>,
) -> Result<StatusCode, ApiError> {
    state.cancel_subscription.handle(request.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /internal/users/:user_id/subscription
pub async fn get_subscription_info(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SubscriptionInfo>, ApiError> {
    let info = state
        .get_subscription_info
        .handle(UserId::from_uuid(user_id))
        .await?;
    Ok(Json(info))
}

/// GET /internal/users/:user_id/payments
pub async fn get_payments(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PaymentsQueryDto>,
) -> Result<Json<PaymentsPageDto>, ApiError> {
    let page = state
        .get_payments
        .handle(GetPaymentsQuery {
            user_id: UserId::from_uuid(user_id),
            page: query.page,
            per_page: query.per_page,
        })
        .await?;
    Ok(Json(page.into()))
}

/// PUT /internal/users/:user_id/username
pub async fn update_username(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUsernameRequestDto>,
) -> Result<Json<UpdateUsernameResponseDto>, ApiError> {
    let updated = state
        .update_username
        .handle(UserId::from_uuid(user_id), &request.username)
        .await?;
    Ok(Json(UpdateUsernameResponseDto { updated }))
}
