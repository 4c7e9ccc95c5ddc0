//! Subscription status state machine.
//!
//! Defines the provider-facing lifecycle states and valid transitions.
//! Note that `status` is distinct from the aggregate's `is_active` flag:
//! `status` tracks the provider lifecycle, `is_active` marks the one
//! subscription currently in effect for a user.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Provider-facing subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created locally, awaiting first provider confirmation.
    Pending,

    /// Confirmed by the provider, paid through the subscription end date.
    Active,

    /// Temporarily paused by the provider (e.g. failed payment while the
    /// provider keeps retrying the charge).
    Suspended,

    /// Terminal for this row. The user may create a new subscription later.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true for states that count as "in effect" for sweeping and
    /// active-subscription lookups.
    pub fn is_active_like(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Suspended
        )
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Active)
                | (Pending, Canceled)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, Suspended)
                | (Active, Canceled)
            // From SUSPENDED
                | (Suspended, Active)
                | (Suspended, Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active, Canceled],
            Active => vec![Active, Suspended, Canceled],
            Suspended => vec![Active, Canceled],
            Canceled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_transition_to_active() {
        let result = SubscriptionStatus::Pending.transition_to(SubscriptionStatus::Active);
        assert_eq!(result, Ok(SubscriptionStatus::Active));
    }

    #[test]
    fn pending_cannot_transition_to_suspended() {
        let result = SubscriptionStatus::Pending.transition_to(SubscriptionStatus::Suspended);
        assert!(result.is_err());
    }

    #[test]
    fn active_can_renew_to_active() {
        let result = SubscriptionStatus::Active.transition_to(SubscriptionStatus::Active);
        assert_eq!(result, Ok(SubscriptionStatus::Active));
    }

    #[test]
    fn active_can_suspend() {
        let result = SubscriptionStatus::Active.transition_to(SubscriptionStatus::Suspended);
        assert_eq!(result, Ok(SubscriptionStatus::Suspended));
    }

    #[test]
    fn suspended_can_recover_to_active() {
        let result = SubscriptionStatus::Suspended.transition_to(SubscriptionStatus::Active);
        assert_eq!(result, Ok(SubscriptionStatus::Active));
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::Canceled
            .transition_to(SubscriptionStatus::Active)
            .is_err());
    }

    #[test]
    fn active_like_covers_active_and_suspended() {
        assert!(SubscriptionStatus::Active.is_active_like());
        assert!(SubscriptionStatus::Suspended.is_active_like());
        assert!(!SubscriptionStatus::Pending.is_active_like());
        assert!(!SubscriptionStatus::Canceled.is_active_like());
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
            SubscriptionStatus::Suspended,
            SubscriptionStatus::Canceled,
        ] {
            for valid_target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&valid_target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    valid_target
                );
            }
        }
    }
}
