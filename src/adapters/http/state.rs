//! Shared HTTP state.
//!
//! Everything here is constructed once at process start and shared by
//! reference; request handling holds no other mutable in-process state.

use std::sync::Arc;

use crate::adapters::paypal::PaypalWebhookVerifier;
use crate::adapters::stripe::StripeWebhookVerifier;
use crate::application::commands::{
    CancelSubscriptionHandler, CreateSubscriptionHandler, DisableAutoRenewalHandler,
    EnableAutoRenewalHandler, GetPaymentsHandler, GetSubscriptionInfoHandler,
    UpdateUsernameHandler,
};
use crate::application::webhooks::WebhookRouter;

/// State injected into every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub webhooks: Arc<WebhookRouter>,
    pub stripe_verifier: Arc<StripeWebhookVerifier>,
    pub paypal_verifier: Arc<PaypalWebhookVerifier>,

    pub create_subscription: Arc<CreateSubscriptionHandler>,
    pub enable_auto_renewal: Arc<EnableAutoRenewalHandler>,
    pub disable_auto_renewal: Arc<DisableAutoRenewalHandler>,
    pub cancel_subscription: Arc<CancelSubscriptionHandler>,
    pub get_payments: Arc<GetPaymentsHandler>,
    pub get_subscription_info: Arc<GetSubscriptionInfoHandler>,
    pub update_username: Arc<UpdateUsernameHandler>,

    /// Redirect targets handed to providers at checkout creation.
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}
