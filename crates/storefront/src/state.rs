//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::payments::{PayPalClient, PaymentError, StripeClient};
use crate::services::{ActivationService, DownloadLinkSigner, EventBus};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    stripe: StripeClient,
    paypal: PayPalClient,
    activation: ActivationService,
    signer: DownloadLinkSigner,
    events: EventBus,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `events` - Publishing handle of the purchase event consumer
    ///
    /// # Errors
    ///
    /// Returns an error if a payment client fails to build.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        events: EventBus,
    ) -> Result<Self, PaymentError> {
        let stripe = StripeClient::new(&config.stripe)?;
        let paypal = PayPalClient::new(&config.paypal)?;
        let activation = ActivationService::new(pool.clone(), events.clone());
        let signer = DownloadLinkSigner::new(&config.cdn);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                stripe,
                paypal,
                activation,
                signer,
                events,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Stripe API client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the PayPal API client.
    #[must_use]
    pub fn paypal(&self) -> &PayPalClient {
        &self.inner.paypal
    }

    /// Get a reference to the activation service.
    #[must_use]
    pub fn activation(&self) -> &ActivationService {
        &self.inner.activation
    }

    /// Get a reference to the download link signer.
    #[must_use]
    pub fn signer(&self) -> &DownloadLinkSigner {
        &self.inner.signer
    }

    /// Get a reference to the purchase event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}
