//! Subscription aggregate entity.
//!
//! The Subscription aggregate tracks one user's recurring billing agreement
//! with a payment provider. Transitions here are pure: handlers load the
//! aggregate, call an intent method, then persist through the repository.
//!
//! # Invariants
//!
//! - At most one subscription per user carries `is_active = true`. The
//!   activation path deactivates the prior active row before a new one is
//!   activated.
//! - `end_date`, once set, only moves forward, except through the
//!   failed-payment path where the provider's own period data is taken
//!   verbatim.
//! - `Canceled` is terminal for a row; users start a new subscription
//!   instead of reviving a canceled one.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, StateMachine, SubscriptionId, Timestamp, UserId,
};

use super::{PlanKind, ProviderKind, SubscriptionStatus};

/// Subscription aggregate - one user's billing agreement with a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// User who owns this subscription.
    pub user_id: UserId,

    /// Display username, denormalized for provider dashboards.
    pub username: String,

    /// Provider this subscription is billed through.
    pub provider: ProviderKind,

    /// Provider's subscription id, set once the provider confirms.
    pub provider_subscription_id: Option<String>,

    /// Provider's customer id, set once the provider confirms.
    pub provider_customer_id: Option<String>,

    /// Billing cadence and price bucket.
    pub plan: PlanKind,

    /// Provider-facing lifecycle status.
    pub status: SubscriptionStatus,

    /// Whether the provider should bill again at the period boundary.
    pub auto_renewal: bool,

    /// Last successful charge time.
    pub date_of_payment: Option<Timestamp>,

    /// Current paid-through time.
    pub end_date: Option<Timestamp>,

    /// Marks the one subscription currently in effect for this user.
    /// Distinct from `status`: a Suspended subscription is still the
    /// user's operative one.
    pub is_active: bool,

    /// When the subscription was created.
    pub created_at: Timestamp,

    /// When the subscription was last updated.
    pub updated_at: Timestamp,

    /// Optimistic-lock token, bumped by the repository on every write.
    pub version: i32,
}

impl Subscription {
    /// Creates a new subscription awaiting first provider confirmation.
    pub fn create(
        user_id: UserId,
        username: String,
        provider: ProviderKind,
        plan: PlanKind,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            username,
            provider,
            provider_subscription_id: None,
            provider_customer_id: None,
            plan,
            status: SubscriptionStatus::Pending,
            auto_renewal: true,
            date_of_payment: None,
            end_date: None,
            is_active: false,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Records the provider-side identifiers once the provider confirms
    /// the subscription exists on its end.
    pub fn link_provider(
        &mut self,
        provider_subscription_id: impl Into<String>,
        customer_id: Option<String>,
    ) {
        self.provider_subscription_id = Some(provider_subscription_id.into());
        if customer_id.is_some() {
            self.provider_customer_id = customer_id;
        }
        self.touch();
    }

    /// Activates this subscription as the user's operative one.
    ///
    /// Callers must have deactivated any prior active subscription for the
    /// same user first.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow activation.
    pub fn activate(
        &mut self,
        paid_at: Option<Timestamp>,
        end_date: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        if paid_at.is_some() {
            self.date_of_payment = paid_at;
        }
        self.advance_end_date(end_date);
        self.is_active = true;
        self.touch();
        Ok(())
    }

    /// Applies a successful charge: moves the paid-through window forward
    /// and (re)activates the subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow activation.
    pub fn record_payment(
        &mut self,
        paid_at: Timestamp,
        period_end: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        self.date_of_payment = Some(paid_at);
        self.advance_end_date(period_end);
        self.is_active = true;
        self.touch();
        Ok(())
    }

    /// Applies a failed charge.
    ///
    /// The paid-through window is still moved to the provider's period data
    /// that accompanied the failure, and may move backward: this is a
    /// provider-driven correction path, not the monotonic success path.
    /// Status is left untouched; cancellation only comes from deliberate
    /// user action or the expiration sweep.
    pub fn record_payment_failure(&mut self, paid_at: Timestamp, period_end: Timestamp) {
        self.date_of_payment = Some(paid_at);
        self.end_date = Some(period_end);
        self.touch();
    }

    /// Marks the subscription as temporarily paused by the provider.
    ///
    /// Auto-renewal is forced off; `is_active` stays true because a
    /// suspended subscription is still the user's operative one.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow suspension.
    pub fn suspend(&mut self) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Suspended)?;
        self.auto_renewal = false;
        self.touch();
        Ok(())
    }

    /// Applies a provider activation confirmation: refreshes the billing
    /// period end and customer id, and turns auto-renewal back on.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow activation.
    pub fn refresh_billing(
        &mut self,
        end_date: Option<Timestamp>,
        customer_id: Option<String>,
    ) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Active)?;
        if let Some(end) = end_date {
            self.advance_end_date(end);
        }
        if customer_id.is_some() {
            self.provider_customer_id = customer_id;
        }
        self.auto_renewal = true;
        self.is_active = true;
        self.touch();
        Ok(())
    }

    /// Applies a provider-side cancellation.
    ///
    /// `is_active` drops immediately so the user can start a new
    /// subscription, but the row only becomes `Canceled` once the window
    /// the user already paid for has elapsed. Idempotent on already
    /// canceled rows.
    pub fn cancel_at_provider(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status == SubscriptionStatus::Canceled {
            return Ok(());
        }
        self.is_active = false;
        self.auto_renewal = false;
        if self.has_lapsed(now) {
            self.transition_to(SubscriptionStatus::Canceled)?;
        }
        self.touch();
        Ok(())
    }

    /// Forces expiration of a lapsed subscription (the sweep transition).
    ///
    /// Returns `false` without touching the row when it is already
    /// canceled, making repeated sweeps no-ops.
    pub fn expire_lapsed(&mut self) -> Result<bool, DomainError> {
        if self.status == SubscriptionStatus::Canceled {
            return Ok(false);
        }
        self.transition_to(SubscriptionStatus::Canceled)?;
        self.is_active = false;
        self.auto_renewal = false;
        self.touch();
        Ok(true)
    }

    /// Clears the operative flag, used on the prior row when a new
    /// subscription for the same user activates.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Sets the auto-renewal flag after a user command succeeded at the
    /// provider.
    pub fn set_auto_renewal(&mut self, enabled: bool) {
        self.auto_renewal = enabled;
        self.touch();
    }

    /// Updates the denormalized display username.
    pub fn rename(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.touch();
    }

    /// True when the paid-through window has elapsed (or never started).
    pub fn has_lapsed(&self, now: Timestamp) -> bool {
        match self.end_date {
            Some(end) => !end.is_after(&now),
            None => true,
        }
    }

    /// Moves the paid-through window forward, never backward.
    fn advance_end_date(&mut self, candidate: Timestamp) {
        match self.end_date {
            Some(current) if !candidate.is_after(&current) => {}
            _ => self.end_date = Some(candidate),
        }
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_subscription() -> Subscription {
        Subscription::create(
            UserId::new(),
            "alice".to_string(),
            ProviderKind::Paypal,
            PlanKind::Monthly,
        )
    }

    fn active_subscription(end: Timestamp) -> Subscription {
        let mut sub = pending_subscription();
        sub.activate(Some(Timestamp::now()), end).unwrap();
        sub
    }

    // Construction

    #[test]
    fn create_starts_pending_and_inactive() {
        let sub = pending_subscription();

        assert_eq!(sub.status, SubscriptionStatus::Pending);
        assert!(!sub.is_active);
        assert!(sub.auto_renewal);
        assert!(sub.provider_subscription_id.is_none());
        assert!(sub.end_date.is_none());
        assert_eq!(sub.version, 0);
    }

    #[test]
    fn link_provider_records_ids() {
        let mut sub = pending_subscription();
        sub.link_provider("I-8XF2931GB", Some("payer-77".to_string()));

        assert_eq!(sub.provider_subscription_id.as_deref(), Some("I-8XF2931GB"));
        assert_eq!(sub.provider_customer_id.as_deref(), Some("payer-77"));
        assert_eq!(sub.status, SubscriptionStatus::Pending);
    }

    // Activation

    #[test]
    fn pending_can_activate() {
        let mut sub = pending_subscription();
        let end = Timestamp::now().add_days(30);

        sub.activate(Some(Timestamp::now()), end).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.is_active);
        assert_eq!(sub.end_date, Some(end));
    }

    #[test]
    fn canceled_cannot_activate() {
        let mut sub = active_subscription(Timestamp::now().minus_secs(60));
        sub.expire_lapsed().unwrap();

        let result = sub.activate(None, Timestamp::now().add_days(30));

        assert!(result.is_err());
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
    }

    // Payments

    #[test]
    fn record_payment_moves_window_forward() {
        let first_end = Timestamp::now().add_days(30);
        let mut sub = active_subscription(first_end);

        let next_end = first_end.add_days(30);
        sub.record_payment(Timestamp::now(), next_end).unwrap();

        assert_eq!(sub.end_date, Some(next_end));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn record_payment_never_moves_window_backward() {
        let end = Timestamp::now().add_days(30);
        let mut sub = active_subscription(end);

        sub.record_payment(Timestamp::now(), end.add_days(-7)).unwrap();

        assert_eq!(sub.end_date, Some(end));
    }

    #[test]
    fn record_payment_recovers_suspended_subscription() {
        let mut sub = active_subscription(Timestamp::now().add_days(30));
        sub.suspend().unwrap();

        let next_end = Timestamp::now().add_days(60);
        sub.record_payment(Timestamp::now(), next_end).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.end_date, Some(next_end));
    }

    #[test]
    fn record_payment_failure_takes_provider_window_verbatim() {
        let end = Timestamp::now().add_days(30);
        let mut sub = active_subscription(end);

        let rolled_back = end.add_days(-30);
        sub.record_payment_failure(Timestamp::now(), rolled_back);

        // Provider-driven correction path: window may move backward.
        assert_eq!(sub.end_date, Some(rolled_back));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    // Suspension

    #[test]
    fn suspend_forces_auto_renewal_off_and_keeps_operative_flag() {
        let mut sub = active_subscription(Timestamp::now().add_days(30));

        sub.suspend().unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Suspended);
        assert!(!sub.auto_renewal);
        assert!(sub.is_active);
    }

    #[test]
    fn refresh_billing_reactivates_and_restores_auto_renewal() {
        let mut sub = active_subscription(Timestamp::now().add_days(10));
        sub.suspend().unwrap();

        let new_end = Timestamp::now().add_days(40);
        sub.refresh_billing(Some(new_end), Some("payer-9".to_string()))
            .unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.auto_renewal);
        assert_eq!(sub.end_date, Some(new_end));
        assert_eq!(sub.provider_customer_id.as_deref(), Some("payer-9"));
    }

    // Cancellation

    #[test]
    fn cancel_with_remaining_window_keeps_access_until_it_elapses() {
        let end = Timestamp::now().add_days(12);
        let mut sub = active_subscription(end);

        sub.cancel_at_provider(Timestamp::now()).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(!sub.is_active);
        assert!(!sub.auto_renewal);
        assert_eq!(sub.end_date, Some(end));
    }

    #[test]
    fn cancel_after_window_elapsed_cancels_immediately() {
        let mut sub = active_subscription(Timestamp::now().minus_secs(3600));

        sub.cancel_at_provider(Timestamp::now()).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert!(!sub.is_active);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sub = active_subscription(Timestamp::now().minus_secs(3600));
        sub.cancel_at_provider(Timestamp::now()).unwrap();

        let again = sub.cancel_at_provider(Timestamp::now());

        assert!(again.is_ok());
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
    }

    // Sweeper transition

    #[test]
    fn expire_lapsed_cancels_active_subscription() {
        let mut sub = active_subscription(Timestamp::now().minus_secs(60));

        let changed = sub.expire_lapsed().unwrap();

        assert!(changed);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert!(!sub.is_active);
        assert!(!sub.auto_renewal);
    }

    #[test]
    fn expire_lapsed_is_a_noop_on_canceled_rows() {
        let mut sub = active_subscription(Timestamp::now().minus_secs(60));
        sub.expire_lapsed().unwrap();
        let before = sub.clone();

        let changed = sub.expire_lapsed().unwrap();

        assert!(!changed);
        assert_eq!(sub, before);
    }

    // Misc

    #[test]
    fn deactivate_only_clears_operative_flag() {
        let mut sub = active_subscription(Timestamp::now().add_days(30));

        sub.deactivate();

        assert!(!sub.is_active);
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn has_lapsed_without_end_date() {
        let sub = pending_subscription();
        assert!(sub.has_lapsed(Timestamp::now()));
    }

    #[test]
    fn rename_updates_username() {
        let mut sub = pending_subscription();
        sub.rename("alice_v2");
        assert_eq!(sub.username, "alice_v2");
    }
}
