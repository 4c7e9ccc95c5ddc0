//! Billing engine entry point.
//!
//! Composition root: loads configuration, wires adapters into the
//! application handlers, spawns the expiration sweep, and serves HTTP.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use billing_engine::adapters::gateway::GatewayNotifier;
use billing_engine::adapters::http::{self, AppState};
use billing_engine::adapters::paypal::{PaypalGateway, PaypalWebhookVerifier};
use billing_engine::adapters::postgres::{
    PostgresSubscriptionRepository, PostgresTransactionRepository,
    PostgresWebhookEventRepository,
};
use billing_engine::adapters::stripe::{StripeGateway, StripeWebhookVerifier};
use billing_engine::application::commands::{
    CancelSubscriptionHandler, CreateSubscriptionHandler, DisableAutoRenewalHandler,
    EnableAutoRenewalHandler, GetPaymentsHandler, GetSubscriptionInfoHandler,
    UpdateUsernameHandler,
};
use billing_engine::application::payments::PaymentManager;
use billing_engine::application::webhooks::handlers::{
    PaymentFailedHandler, PaymentSucceededHandler, SubscriptionActivatedHandler,
    SubscriptionCancelledHandler, SubscriptionCreatedHandler, SubscriptionSuspendedHandler,
};
use billing_engine::application::webhooks::WebhookRouterBuilder;
use billing_engine::application::ExpirationSweeper;
use billing_engine::config::AppConfig;
use billing_engine::ports::{
    NotificationGateway, SubscriptionRepository, TransactionRepository, WebhookEventRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let transactions: Arc<dyn TransactionRepository> =
        Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let webhook_events: Arc<dyn WebhookEventRepository> =
        Arc::new(PostgresWebhookEventRepository::new(pool));

    let stripe_gateway = Arc::new(StripeGateway::new(&config.stripe));
    let paypal_gateway = Arc::new(PaypalGateway::new(&config.paypal));
    let payments = Arc::new(PaymentManager::new(stripe_gateway, paypal_gateway));
    let notifier: Arc<dyn NotificationGateway> = Arc::new(GatewayNotifier::new(&config.gateway));

    let webhooks = Arc::new(
        WebhookRouterBuilder::new()
            .register(Arc::new(SubscriptionCreatedHandler::new(
                subscriptions.clone(),
                payments.clone(),
            )))
            .register(Arc::new(PaymentSucceededHandler::new(
                subscriptions.clone(),
                transactions.clone(),
                payments.clone(),
                notifier.clone(),
            )))
            .register(Arc::new(PaymentFailedHandler::new(
                subscriptions.clone(),
                transactions.clone(),
                payments.clone(),
                notifier.clone(),
            )))
            .register(Arc::new(SubscriptionSuspendedHandler::new(
                subscriptions.clone(),
            )))
            .register(Arc::new(SubscriptionActivatedHandler::new(
                subscriptions.clone(),
                payments.clone(),
                notifier.clone(),
            )))
            .register(Arc::new(SubscriptionCancelledHandler::new(
                subscriptions.clone(),
                notifier.clone(),
            )))
            .build(webhook_events),
    );

    let sweeper = Arc::new(ExpirationSweeper::new(
        subscriptions.clone(),
        Duration::from_secs(config.sweeper.interval_secs),
    ));
    tokio::spawn(sweeper.run());

    let state = AppState {
        webhooks,
        stripe_verifier: Arc::new(StripeWebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
        )),
        paypal_verifier: Arc::new(PaypalWebhookVerifier::new(
            config.paypal.webhook_id.clone(),
            config.paypal.cert_cache_dir.clone(),
        )),
        create_subscription: Arc::new(CreateSubscriptionHandler::new(
            subscriptions.clone(),
            payments.clone(),
        )),
        enable_auto_renewal: Arc::new(EnableAutoRenewalHandler::new(
            subscriptions.clone(),
            payments.clone(),
        )),
        disable_auto_renewal: Arc::new(DisableAutoRenewalHandler::new(
            subscriptions.clone(),
            payments.clone(),
        )),
        cancel_subscription: Arc::new(CancelSubscriptionHandler::new(
            subscriptions.clone(),
            payments.clone(),
            notifier.clone(),
        )),
        get_payments: Arc::new(GetPaymentsHandler::new(
            subscriptions.clone(),
            transactions.clone(),
        )),
        get_subscription_info: Arc::new(GetSubscriptionInfoHandler::new(subscriptions.clone())),
        update_username: Arc::new(UpdateUsernameHandler::new(subscriptions)),
        checkout_success_url: config.gateway.checkout_success_url.clone(),
        checkout_cancel_url: config.gateway.checkout_cancel_url.clone(),
    };

    let app = http::router(state);
    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "billing engine listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
