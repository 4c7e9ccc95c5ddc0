//! Stub ProviderGateway and recording NotificationGateway for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::ProviderKind;
use crate::ports::{
    CreateSubscriptionRequest, NotificationGateway, PaymentError, ProviderCheckout,
    ProviderGateway, ProviderSubscription,
};

/// Configurable in-process stand-in for a payment provider.
pub struct StubProviderGateway {
    kind: ProviderKind,
    state: Mutex<StubState>,
}

#[derive(Default)]
struct StubState {
    created_subscription_id: Option<String>,
    approval_url: Option<String>,
    customer_id: Option<String>,
    next_billing_time: Option<Timestamp>,
    fail_next: bool,
    canceled: Vec<String>,
    renewal_toggles: Vec<(String, bool)>,
}

impl StubProviderGateway {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn set_created_subscription_id(&self, id: &str) {
        self.state.lock().unwrap().created_subscription_id = Some(id.to_string());
    }

    pub fn set_approval_url(&self, url: &str) {
        self.state.lock().unwrap().approval_url = Some(url.to_string());
    }

    pub fn set_customer_id(&self, id: &str) {
        self.state.lock().unwrap().customer_id = Some(id.to_string());
    }

    pub fn set_next_billing_time(&self, ts: Timestamp) {
        self.state.lock().unwrap().next_billing_time = Some(ts);
    }

    /// The next gateway call fails with a provider error.
    pub fn fail_next_call(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Provider subscription ids canceled through this gateway.
    pub fn canceled(&self) -> Vec<String> {
        self.state.lock().unwrap().canceled.clone()
    }

    /// (id, enabled) pairs from renewal toggles, in call order.
    pub fn renewal_toggles(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().renewal_toggles.clone()
    }

    fn check_failure(&self) -> Result<(), PaymentError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(PaymentError::provider("stubbed provider failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderGateway for StubProviderGateway {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    async fn create_subscription(
        &self,
        _request: CreateSubscriptionRequest,
    ) -> Result<ProviderCheckout, PaymentError> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        Ok(ProviderCheckout {
            provider_subscription_id: state.created_subscription_id.clone(),
            approval_url: state.approval_url.clone(),
        })
    }

    async fn cancel_subscription(
        &self,
        provider_subscription_id: &str,
        _reason: &str,
    ) -> Result<(), PaymentError> {
        self.check_failure()?;
        self.state
            .lock()
            .unwrap()
            .canceled
            .push(provider_subscription_id.to_string());
        Ok(())
    }

    async fn disable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.check_failure()?;
        self.state
            .lock()
            .unwrap()
            .renewal_toggles
            .push((provider_subscription_id.to_string(), false));
        Ok(())
    }

    async fn enable_auto_renewal(
        &self,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.check_failure()?;
        self.state
            .lock()
            .unwrap()
            .renewal_toggles
            .push((provider_subscription_id.to_string(), true));
        Ok(())
    }

    async fn fetch_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        Ok(ProviderSubscription {
            id: provider_subscription_id.to_string(),
            customer_id: state.customer_id.clone(),
            status: "ACTIVE".to_string(),
            next_billing_time: state.next_billing_time,
        })
    }
}

/// NotificationGateway that records pushes instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    pushes: Mutex<Vec<(UserId, Option<Timestamp>)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushes(&self) -> Vec<(UserId, Option<Timestamp>)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn push_end_date(&self, user_id: UserId, end_date: Option<Timestamp>) {
        self.pushes.lock().unwrap().push((user_id, end_date));
    }
}
