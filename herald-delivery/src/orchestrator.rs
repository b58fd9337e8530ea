//! Delivery orchestration
//!
//! [`DeliveryOrchestrator::start`] resolves a destination to its candidate
//! providers and runs the attempt loop:
//!
//! 1. Once the current provider's attempts exceed the per-provider maximum,
//!    it is dropped and the next candidate becomes current
//! 2. With no candidates left the delivery has finally failed
//! 3. Otherwise the current provider is sent to. A failed send backs off
//!    exponentially and loops; an accepted send ends the loop, tracking the
//!    returned id when the provider sends receipts
//!
//! The loop is re-entered by the [`ReceiptHandler`] when a provider reports
//! a tracked delivery as failed.

use std::{sync::Arc, time::Duration};

use herald_common::{Address, DeliveryStatus, internal, tracing};
use tokio::task::JoinHandle;

use crate::{
    AddressNormalizer, Callbacks, ConfigurationError, Delivery, DeliveryError, DeliveryTracker,
    DispatchConfig, MetricsObserver, Observation, Outcome, PrefixNormalizer, Provider,
    ProviderRegistry, ProviderType, ReceiptHandler, RetryPolicy, SendRequest, StatusEvent,
    StatusObserver,
};

#[derive(Debug)]
struct Shared {
    registry: ProviderRegistry,
    tracker: DeliveryTracker,
    normalizer: Arc<dyn AddressNormalizer>,
    observer: Arc<dyn StatusObserver>,
    retry: RetryPolicy,
    receipt_timeout: Duration,
}

/// Entry point for sending messages
///
/// Cloning is cheap; clones share the registry and the tracker.
#[derive(Debug, Clone)]
pub struct DeliveryOrchestrator {
    inner: Arc<Shared>,
}

/// Builder for [`DeliveryOrchestrator`]
#[derive(Debug)]
pub struct OrchestratorBuilder {
    registry: ProviderRegistry,
    tracker: Option<DeliveryTracker>,
    normalizer: Option<Arc<dyn AddressNormalizer>>,
    observer: Option<Arc<dyn StatusObserver>>,
    retry: RetryPolicy,
    receipt_timeout: Duration,
}

impl OrchestratorBuilder {
    #[must_use]
    pub fn tracker(mut self, tracker: DeliveryTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    #[must_use]
    pub fn normalizer(mut self, normalizer: Arc<dyn AddressNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> DeliveryOrchestrator {
        DeliveryOrchestrator {
            inner: Arc::new(Shared {
                registry: self.registry,
                tracker: self.tracker.unwrap_or_default(),
                normalizer: self
                    .normalizer
                    .unwrap_or_else(|| Arc::new(PrefixNormalizer::default())),
                observer: self.observer.unwrap_or_else(|| Arc::new(MetricsObserver)),
                retry: self.retry,
                receipt_timeout: self.receipt_timeout,
            }),
        }
    }
}

impl DeliveryOrchestrator {
    #[must_use]
    pub fn builder(registry: ProviderRegistry) -> OrchestratorBuilder {
        let defaults = DispatchConfig::with_providers(Vec::new());
        let receipt_timeout = defaults.receipt_timeout();

        OrchestratorBuilder {
            registry,
            tracker: None,
            normalizer: None,
            observer: None,
            retry: defaults.retry,
            receipt_timeout,
        }
    }

    /// Build an orchestrator from configuration and the provider instances
    /// available to it
    ///
    /// # Errors
    ///
    /// Any [`ConfigurationError`] from validating `config` or building the
    /// registry.
    pub fn from_config(
        config: &DispatchConfig,
        providers: impl IntoIterator<Item = Arc<dyn Provider>>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let registry = ProviderRegistry::from_config(config, providers)?;

        internal!(
            level = INFO,
            "Configured providers: {:?}",
            registry.configured_types()
        );

        Ok(Self::builder(registry)
            .normalizer(Arc::new(PrefixNormalizer::from_config(&config.normalizer)))
            .retry(config.retry.clone())
            .receipt_timeout(config.receipt_timeout())
            .build())
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn tracker(&self) -> &DeliveryTracker {
        &self.inner.tracker
    }

    /// Handler for receipts of deliveries started by this orchestrator
    #[must_use]
    pub fn receipts(&self) -> ReceiptHandler {
        ReceiptHandler::new(self.clone())
    }

    pub(crate) fn observer(&self) -> &Arc<dyn StatusObserver> {
        &self.inner.observer
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Send `message` to `address`
    ///
    /// Returns once a provider accepted the message, with that provider's
    /// type. Send failures are retried with backoff and fail over to the
    /// next candidate provider before this returns.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::AddressParse`] if `address` has no known region
    /// - [`DeliveryError::NoProviderAvailable`] if no provider serves it
    /// - [`DeliveryError::AllProvidersExhausted`] if every candidate failed,
    ///   after `callbacks`' final failure has been run
    pub async fn start(
        &self,
        address: impl Into<Address>,
        message: impl Into<Arc<str>>,
        callbacks: Callbacks,
    ) -> Result<ProviderType, DeliveryError> {
        let address = address.into();

        let Some(region) = self.inner.normalizer.region_for(&address) else {
            tracing::warn!(%address, "Unable to determine region for address");
            return Err(DeliveryError::AddressParse(address.obfuscated()));
        };

        let candidates = self.inner.registry.candidates_for(&region, &address);
        if candidates.is_empty() {
            tracing::warn!(%address, %region, "No provider available");
            return Err(DeliveryError::NoProviderAvailable(region));
        }

        let delivery = Arc::new(Delivery::new(
            SendRequest {
                region,
                address,
                message: message.into(),
            },
            candidates,
            callbacks,
        ));

        self.attempt(&delivery).await
    }

    /// Run the attempt loop for `delivery` until a provider accepts it or
    /// every candidate is exhausted
    pub(crate) async fn attempt(
        &self,
        delivery: &Arc<Delivery>,
    ) -> Result<ProviderType, DeliveryError> {
        let region = delivery.region();
        let address = delivery.address();

        loop {
            let mut state = delivery.lock_state().await;

            // Receipts and expiry untrack a delivery before it is resent
            debug_assert!(state.tracked_id.is_none());

            if self
                .inner
                .retry
                .should_abandon_provider(state.attempts_with_current_provider)
                && let Some(dropped) = state.abandon_current_provider()
            {
                tracing::debug!(
                    provider = %dropped.provider_type(),
                    %address,
                    %region,
                    "Provider exhausted, failing over"
                );
            }

            let Some(provider) = state.current_provider().map(Arc::clone) else {
                tracing::error!(%address, %region, "Final failure to send");
                self.inner.observer.final_failure(region);
                state.callbacks.finish(Outcome::FinalFailure);
                return Err(DeliveryError::AllProvidersExhausted(region.clone()));
            };

            let provider_type = provider.provider_type();
            state.attempts_with_current_provider += 1;
            let attempt = state.attempts_with_current_provider;

            tracing::info!(
                provider = %provider_type,
                %address,
                %region,
                attempt,
                "Attempting to send"
            );

            let result = provider.send(delivery.request()).await;
            self.inner
                .observer
                .attempt_made(provider_type, region, result.as_ref().err());

            match result {
                Ok(id) => {
                    tracing::info!(
                        provider = %provider_type,
                        %address,
                        %region,
                        delivery_id = %id,
                        "Created delivery"
                    );

                    state.status = DeliveryStatus::Created;
                    self.inner.observer.status_changed(&StatusEvent {
                        provider: provider_type,
                        region,
                        observation: Observation::Status(DeliveryStatus::Created),
                    });
                    state.callbacks.created(provider_type);

                    if provider.supports_delivery_status() {
                        let generation = state.track(id.clone());
                        self.inner.tracker.register(id.clone(), Arc::clone(delivery));
                        self.inner.tracker.arm_expiry(
                            id,
                            generation,
                            Arc::clone(delivery),
                            self.inner.receipt_timeout,
                            Arc::clone(&self.inner.observer),
                        );
                    } else {
                        state.callbacks.finish(Outcome::Accepted);
                    }

                    return Ok(provider_type);
                }
                Err(error) => {
                    let delay = self.inner.retry.send_backoff(attempt);

                    tracing::warn!(
                        provider = %provider_type,
                        %address,
                        %region,
                        attempt,
                        %error,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Send failed"
                    );

                    // Receipts and timers for this delivery may run while we back off
                    drop(state);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Re-enter the attempt loop for `delivery` after `delay`, on its own task
    pub(crate) fn schedule_resend(&self, delivery: Arc<Delivery>, delay: Duration) -> JoinHandle<()> {
        let orchestrator = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            match orchestrator.attempt(&delivery).await {
                Ok(provider) => tracing::debug!(
                    %provider,
                    address = %delivery.address(),
                    "Resent after failure receipt"
                ),
                Err(error) => tracing::warn!(
                    address = %delivery.address(),
                    %error,
                    "Resend after failure receipt did not succeed"
                ),
            }
        })
    }
}
