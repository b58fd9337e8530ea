//! Deliveries awaiting a provider receipt
//!
//! Maps the id a provider issued for an accepted send to the delivery it
//! belongs to. Entries leave the map when a terminal receipt arrives or when
//! the expiry timer armed at registration fires, whichever comes first.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use herald_common::tracing;
use tokio::task::JoinHandle;

use crate::{Confirmation, Delivery, DeliveryId, Outcome, StatusObserver};

/// Concurrent id to delivery map
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    entries: Arc<DashMap<DeliveryId, Arc<Delivery>>>,
}

impl DeliveryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: DeliveryId, delivery: Arc<Delivery>) {
        self.entries.insert(id, delivery);
    }

    #[must_use]
    pub fn lookup(&self, id: &DeliveryId) -> Option<Arc<Delivery>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removing an id that is not tracked is a no-op
    pub fn unregister(&self, id: &DeliveryId) -> Option<Arc<Delivery>> {
        self.entries.remove(id).map(|(_, delivery)| delivery)
    }

    /// Remove `id` only while it still maps to `delivery`
    pub(crate) fn unregister_if(&self, id: &DeliveryId, delivery: &Arc<Delivery>) -> bool {
        self.entries
            .remove_if(id, |_, tracked| Arc::ptr_eq(tracked, delivery))
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &DeliveryId) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// After `timeout`, treat the delivery as delivered if it is still
    /// tracked under `id` at `generation`
    ///
    /// A receipt or a resend moves the delivery off `id` or onto a later
    /// generation, which turns the timer into a no-op when it fires.
    pub(crate) fn arm_expiry(
        &self,
        id: DeliveryId,
        generation: u64,
        delivery: Arc<Delivery>,
        timeout: Duration,
        observer: Arc<dyn StatusObserver>,
    ) -> JoinHandle<()> {
        let tracker = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let mut state = delivery.lock_state().await;
            if state.generation != generation || state.tracked_id.as_ref() != Some(&id) {
                tracing::trace!(delivery_id = %id, "Expiry timer is stale");
                return;
            }

            tracker.unregister_if(&id, &delivery);
            state.tracked_id = None;

            let provider = state
                .current_provider()
                .map(|provider| provider.provider_type());

            tracing::info!(
                delivery_id = %id,
                address = %delivery.address(),
                region = %delivery.region(),
                timeout_secs = timeout.as_secs(),
                "No receipt received before timeout"
            );

            if let Some(provider) = provider {
                observer.believed_delivered(provider, delivery.region(), Confirmation::Timeout);
            }
            state.callbacks.finish(Outcome::BelievedDelivered);
        })
    }
}
