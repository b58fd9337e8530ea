//! A single outbound message and its attempt history
//!
//! All mutable state of a [`Delivery`] lives behind one async mutex. The
//! attempt loop, the expiry timer and the receipt handler each take it for a
//! whole transition, so transitions on one delivery never interleave.

use std::{collections::VecDeque, fmt, sync::Arc};

use herald_common::{Address, DeliveryStatus, RegionCode};
use tokio::sync::{Mutex, MutexGuard, oneshot};

use crate::{DeliveryId, Provider, ProviderType, SendRequest};

/// How a delivery ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A `Delivered` receipt arrived, or no receipt arrived before the
    /// tracking timeout
    BelievedDelivered,
    /// Every candidate provider was exhausted
    FinalFailure,
    /// Accepted by a provider that never sends receipts; nothing more will
    /// be learned about this delivery
    Accepted,
}

type OnceCallback = Box<dyn FnOnce() + Send>;
type CreatedCallback = Box<dyn Fn(ProviderType) + Send + Sync>;

/// Caller hooks for a delivery's progress
///
/// `on_final_failure` and `on_believed_delivered` are terminal and mutually
/// exclusive: at most one of them runs, at most once.
#[derive(Default)]
pub struct Callbacks {
    on_final_failure: Option<OnceCallback>,
    on_believed_delivered: Option<OnceCallback>,
    on_created: Option<CreatedCallback>,
    outcome: Option<oneshot::Sender<Outcome>>,
    finished: bool,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks that resolve the returned receiver with the outcome
    #[must_use]
    pub fn with_outcome() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let callbacks = Self {
            outcome: Some(tx),
            ..Self::default()
        };

        (callbacks, rx)
    }

    #[must_use]
    pub fn on_final_failure(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_final_failure = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_believed_delivered(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_believed_delivered = Some(Box::new(callback));
        self
    }

    /// Called every time a provider accepts a send for this delivery
    #[must_use]
    pub fn on_created(mut self, callback: impl Fn(ProviderType) + Send + Sync + 'static) -> Self {
        self.on_created = Some(Box::new(callback));
        self
    }

    pub(crate) fn created(&self, provider: ProviderType) {
        if let Some(on_created) = &self.on_created {
            on_created(provider);
        }
    }

    /// Resolve the delivery's outcome. Returns `false` if it was already
    /// resolved, in which case nothing is called.
    pub(crate) fn finish(&mut self, outcome: Outcome) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;

        let on_final_failure = self.on_final_failure.take();
        let on_believed_delivered = self.on_believed_delivered.take();
        self.on_created = None;

        match outcome {
            Outcome::FinalFailure => {
                if let Some(callback) = on_final_failure {
                    callback();
                }
            }
            Outcome::BelievedDelivered => {
                if let Some(callback) = on_believed_delivered {
                    callback();
                }
            }
            Outcome::Accepted => {}
        }

        if let Some(tx) = self.outcome.take() {
            // The receiver may have been dropped
            let _ = tx.send(outcome);
        }

        true
    }

    pub(crate) const fn is_finished(&self) -> bool {
        self.finished
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_final_failure", &self.on_final_failure.is_some())
            .field("on_believed_delivered", &self.on_believed_delivered.is_some())
            .field("on_created", &self.on_created.is_some())
            .field("outcome", &self.outcome.is_some())
            .field("finished", &self.finished)
            .finish()
    }
}

/// Mutable part of a delivery, only reachable through [`Delivery::lock_state`]
#[derive(Debug)]
pub(crate) struct DeliveryState {
    /// Remaining providers, head is the current one
    pub(crate) candidates: VecDeque<Arc<dyn Provider>>,
    pub(crate) attempts_with_current_provider: u32,
    /// Id the delivery is tracked under while awaiting a receipt
    pub(crate) tracked_id: Option<DeliveryId>,
    /// Bumped every time the delivery is tracked under an id, so a timer
    /// armed for an earlier send can tell itself apart from a later one
    /// that reused the same id
    pub(crate) generation: u64,
    pub(crate) status: DeliveryStatus,
    pub(crate) callbacks: Callbacks,
}

impl DeliveryState {
    pub(crate) fn current_provider(&self) -> Option<&Arc<dyn Provider>> {
        self.candidates.front()
    }

    /// Track the delivery under `id`, returning the new generation
    pub(crate) fn track(&mut self, id: DeliveryId) -> u64 {
        self.generation += 1;
        self.tracked_id = Some(id);
        self.generation
    }

    /// Drop the current provider, it is never tried again
    pub(crate) fn abandon_current_provider(&mut self) -> Option<Arc<dyn Provider>> {
        self.attempts_with_current_provider = 0;
        self.candidates.pop_front()
    }
}

/// One logical outbound message
#[derive(Debug)]
pub struct Delivery {
    request: SendRequest,
    state: Mutex<DeliveryState>,
}

/// Point-in-time view of a delivery's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub remaining_providers: Vec<ProviderType>,
    pub attempts_with_current_provider: u32,
    pub tracked_id: Option<DeliveryId>,
    pub status: DeliveryStatus,
    pub finished: bool,
}

impl Delivery {
    pub(crate) fn new(
        request: SendRequest,
        candidates: Vec<Arc<dyn Provider>>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            request,
            state: Mutex::new(DeliveryState {
                candidates: candidates.into(),
                attempts_with_current_provider: 0,
                tracked_id: None,
                generation: 0,
                status: DeliveryStatus::NotCreated,
                callbacks,
            }),
        }
    }

    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, DeliveryState> {
        self.state.lock().await
    }

    #[must_use]
    pub const fn request(&self) -> &SendRequest {
        &self.request
    }

    #[must_use]
    pub const fn region(&self) -> &RegionCode {
        &self.request.region
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.request.address
    }

    /// Waits for any transition in progress to complete
    pub async fn snapshot(&self) -> DeliverySnapshot {
        let state = self.state.lock().await;

        DeliverySnapshot {
            remaining_providers: state
                .candidates
                .iter()
                .map(|provider| provider.provider_type())
                .collect(),
            attempts_with_current_provider: state.attempts_with_current_provider,
            tracked_id: state.tracked_id.clone(),
            status: state.status,
            finished: state.callbacks.is_finished(),
        }
    }
}
