//! Expiration sweeper.
//!
//! Scheduled job that forces the cancellation transition on subscriptions
//! whose paid window has lapsed. This is the only self-healing mechanism
//! against missed or duplicated cancellation webhooks, so it must stay
//! idempotent: sweeping an already-canceled row is a no-op.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::{ProviderKind, Subscription};
use crate::ports::SubscriptionRepository;

/// UTC hour after which a same-day end date counts as lapsed for the
/// wallet-based provider, tolerating clock and timezone skew around
/// midnight on its side.
pub const PAYPAL_EXPIRY_CUTOFF_HOUR: u32 = 21;

/// Periodically expires subscriptions whose billing period has lapsed.
pub struct ExpirationSweeper {
    subscriptions: Arc<dyn SubscriptionRepository>,
    interval: Duration,
}

impl ExpirationSweeper {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, interval: Duration) -> Self {
        Self {
            subscriptions,
            interval,
        }
    }

    /// Whether a subscription's paid window counts as lapsed at `now`.
    ///
    /// Strict less-than for one provider; the other also lapses on the
    /// same UTC day once past the cutoff hour.
    pub fn is_due(subscription: &Subscription, now: Timestamp) -> bool {
        let Some(end) = subscription.end_date else {
            return false;
        };
        match subscription.provider {
            ProviderKind::Stripe => end.is_before(&now),
            ProviderKind::Paypal => {
                end.is_before(&now)
                    || (end.same_day_as(&now) && now.hour() >= PAYPAL_EXPIRY_CUTOFF_HOUR)
            }
        }
    }

    /// One sweep pass. Returns how many subscriptions were expired.
    pub async fn run_once(&self, now: Timestamp) -> Result<u64, DomainError> {
        // The horizon includes same-day-future end dates so the cutoff-hour
        // rule gets a chance to apply; `is_due` makes the final call.
        let candidates = self.subscriptions.find_lapsed(now.add_days(1)).await?;

        let mut expired = 0;
        for mut subscription in candidates {
            if !Self::is_due(&subscription, now) {
                continue;
            }

            match subscription.expire_lapsed() {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(
                        subscription = %subscription.id,
                        error = %e,
                        "skipping unexpirable subscription"
                    );
                    continue;
                }
            }

            match self.subscriptions.update(&subscription).await {
                Ok(()) => expired += 1,
                // A concurrent webhook delivery won the write; its view of
                // the subscription is fresher than ours.
                Err(e) if e.code == ErrorCode::VersionConflict => {
                    tracing::debug!(
                        subscription = %subscription.id,
                        "sweep lost write race, leaving row to the webhook path"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        if expired > 0 {
            tracing::info!(expired, "expired lapsed subscriptions");
        }
        Ok(expired)
    }

    /// Runs the sweep on a fixed schedule until the task is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once(Timestamp::now()).await {
                tracing::error!(error = %e, "expiration sweep failed");
            }
        }
    }
}
