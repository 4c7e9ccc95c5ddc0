//! Payment manager - provider-agnostic command dispatch.
//!
//! Holds exactly one gateway per known provider and dispatches on the
//! provider tag. Adding a provider means a new `ProviderKind` case and a
//! new field here; no string matching, and no provider wire type crosses
//! this boundary.

use std::sync::Arc;

use crate::domain::subscription::ProviderKind;
use crate::ports::{
    CreateSubscriptionRequest, PaymentError, ProviderCheckout, ProviderGateway,
    ProviderSubscription,
};

/// Dispatches provider-agnostic payment commands to the right gateway.
pub struct PaymentManager {
    stripe: Arc<dyn ProviderGateway>,
    paypal: Arc<dyn ProviderGateway>,
}

impl PaymentManager {
    pub fn new(stripe: Arc<dyn ProviderGateway>, paypal: Arc<dyn ProviderGateway>) -> Self {
        Self { stripe, paypal }
    }

    fn gateway(&self, provider: ProviderKind) -> &Arc<dyn ProviderGateway> {
        match provider {
            ProviderKind::Stripe => &self.stripe,
            ProviderKind::Paypal => &self.paypal,
        }
    }

    /// Creates a recurring subscription at the provider; returns the
    /// approval URL the user must visit, when the provider issues one.
    pub async fn create_auto_payment(
        &self,
        provider: ProviderKind,
        request: CreateSubscriptionRequest,
    ) -> Result<ProviderCheckout, PaymentError> {
        self.gateway(provider).create_subscription(request).await
    }

    /// Stops automatic billing at the next period boundary.
    pub async fn disable_auto_renewal(
        &self,
        provider: ProviderKind,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.gateway(provider)
            .disable_auto_renewal(provider_subscription_id)
            .await
    }

    /// Resumes automatic billing.
    pub async fn enable_auto_renewal(
        &self,
        provider: ProviderKind,
        provider_subscription_id: &str,
    ) -> Result<(), PaymentError> {
        self.gateway(provider)
            .enable_auto_renewal(provider_subscription_id)
            .await
    }

    /// Cancels the subscription at the provider.
    pub async fn cancel_subscription(
        &self,
        provider: ProviderKind,
        provider_subscription_id: &str,
        reason: &str,
    ) -> Result<(), PaymentError> {
        self.gateway(provider)
            .cancel_subscription(provider_subscription_id, reason)
            .await
    }

    /// Fetches extended subscription details from the provider.
    pub async fn fetch_subscription(
        &self,
        provider: ProviderKind,
        provider_subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError> {
        self.gateway(provider)
            .fetch_subscription(provider_subscription_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingGateway {
        kind: ProviderKind,
        calls: AtomicU32,
    }

    impl CountingGateway {
        fn new(kind: ProviderKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderGateway for CountingGateway {
        fn provider(&self) -> ProviderKind {
            self.kind
        }

        async fn create_subscription(
            &self,
            _request: CreateSubscriptionRequest,
        ) -> Result<ProviderCheckout, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderCheckout {
                provider_subscription_id: Some("sub-1".to_string()),
                approval_url: None,
            })
        }

        async fn cancel_subscription(
            &self,
            _id: &str,
            _reason: &str,
        ) -> Result<(), PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn disable_auto_renewal(&self, _id: &str) -> Result<(), PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn enable_auto_renewal(&self, _id: &str) -> Result<(), PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_subscription(
            &self,
            id: &str,
        ) -> Result<ProviderSubscription, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderSubscription {
                id: id.to_string(),
                customer_id: None,
                status: "ACTIVE".to_string(),
                next_billing_time: None,
            })
        }
    }

    #[tokio::test]
    async fn dispatches_to_the_tagged_gateway() {
        let stripe = CountingGateway::new(ProviderKind::Stripe);
        let paypal = CountingGateway::new(ProviderKind::Paypal);
        let manager = PaymentManager::new(stripe.clone(), paypal.clone());

        manager
            .cancel_subscription(ProviderKind::Paypal, "I-1", "expired")
            .await
            .unwrap();
        manager
            .disable_auto_renewal(ProviderKind::Paypal, "I-1")
            .await
            .unwrap();
        manager
            .enable_auto_renewal(ProviderKind::Stripe, "sub_1")
            .await
            .unwrap();

        assert_eq!(paypal.calls(), 2);
        assert_eq!(stripe.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_goes_through_the_right_gateway() {
        let stripe = CountingGateway::new(ProviderKind::Stripe);
        let paypal = CountingGateway::new(ProviderKind::Paypal);
        let manager = PaymentManager::new(stripe.clone(), paypal.clone());

        let details = manager
            .fetch_subscription(ProviderKind::Stripe, "sub_9")
            .await
            .unwrap();

        assert_eq!(details.id, "sub_9");
        assert_eq!(stripe.calls(), 1);
        assert_eq!(paypal.calls(), 0);
    }
}
