//! Internal RPC command handlers, one use case per file.

mod cancel_subscription;
mod create_subscription;
mod disable_auto_renewal;
mod enable_auto_renewal;
mod get_payments;
mod get_subscription_info;
mod update_username;

pub use cancel_subscription::CancelSubscriptionHandler;
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use disable_auto_renewal::DisableAutoRenewalHandler;
pub use enable_auto_renewal::EnableAutoRenewalHandler;
pub use get_payments::{GetPaymentsHandler, GetPaymentsQuery, PaymentsPage};
pub use get_subscription_info::{GetSubscriptionInfoHandler, SubscriptionInfo};
pub use update_username::UpdateUsernameHandler;
