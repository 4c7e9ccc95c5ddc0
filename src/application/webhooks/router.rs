//! Webhook event router.
//!
//! Maps a verified provider event to its handler through an immutable
//! registry built once at startup. Event kinds without a registered handler
//! are acknowledged as no-ops: providers push many event kinds the engine
//! does not care about, and those must not error.
//!
//! # Idempotency
//!
//! Providers deliver at-least-once. Before dispatch the router consults the
//! processed-event store; re-deliveries short-circuit. Concurrent deliveries
//! of the same event race on the store's insert, and the loser acknowledges
//! without re-applying.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::webhook::{ProviderEvent, WebhookError};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

/// Handler for one or more webhook event kinds.
///
/// Implementations are stateless beyond their injected collaborators and
/// perform the full lookup / pure transition / persist cycle for an event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The exact event-type strings this handler processes.
    fn event_types(&self) -> &'static [&'static str];

    /// Handles the event.
    ///
    /// Returns `Err(WebhookError::Ignored(_))` when the event should be
    /// acknowledged without action; other errors are real failures.
    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError>;
}

/// How the router concluded an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A handler applied the event.
    Processed,
    /// No handler registered, or the handler chose to ignore it.
    Ignored,
    /// The event id was seen before; nothing was re-applied.
    AlreadyProcessed,
}

/// Builds the immutable handler registry.
#[derive(Default)]
pub struct WebhookRouterBuilder {
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
}

impl WebhookRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under every event type it declares.
    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Self {
        for event_type in handler.event_types() {
            self.handlers.insert(event_type, handler.clone());
        }
        self
    }

    pub fn build(self, events: Arc<dyn WebhookEventRepository>) -> WebhookRouter {
        WebhookRouter {
            handlers: self.handlers,
            events,
        }
    }
}

/// Routes verified provider events to their handlers.
///
/// The registry is immutable after construction; the router is shared by
/// reference across concurrent webhook deliveries.
pub struct WebhookRouter {
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
    events: Arc<dyn WebhookEventRepository>,
}

impl WebhookRouter {
    /// Dispatches one verified event.
    ///
    /// Total over its input: every event either short-circuits as already
    /// processed, acknowledges as an ignored no-op, dispatches to a handler,
    /// or surfaces a `WebhookError` for the transport layer to map.
    pub async fn dispatch(&self, event: &ProviderEvent) -> Result<WebhookOutcome, WebhookError> {
        if self.events.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "duplicate webhook delivery, skipping"
            );
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let Some(handler) = self.handlers.get(event.event_type.as_str()) else {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "no handler registered, acknowledging"
            );
            let record =
                WebhookEventRecord::ignored(&event.id, &event.event_type, event.provider);
            self.events.save(record).await?;
            return Ok(WebhookOutcome::Ignored);
        };

        match handler.handle(event).await {
            Ok(()) => {
                let record =
                    WebhookEventRecord::processed(&event.id, &event.event_type, event.provider);
                match self.events.save(record).await? {
                    SaveResult::Inserted => {
                        tracing::info!(
                            event_id = %event.id,
                            event_type = %event.event_type,
                            "webhook event processed"
                        );
                        Ok(WebhookOutcome::Processed)
                    }
                    // A concurrent delivery recorded it first.
                    SaveResult::AlreadyExists => Ok(WebhookOutcome::AlreadyProcessed),
                }
            }
            Err(WebhookError::Ignored(reason)) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    reason = %reason,
                    "webhook event ignored"
                );
                let record =
                    WebhookEventRecord::ignored(&event.id, &event.event_type, event.provider);
                self.events.save(record).await?;
                Ok(WebhookOutcome::Ignored)
            }
            Err(err) => {
                // Not recorded: the provider's redelivery gets a fresh run.
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %err,
                    "webhook event failed"
                );
                Err(err)
            }
        }
    }
}
