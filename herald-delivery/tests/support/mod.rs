#![allow(dead_code)] // Test utility module - not all helpers used in every test

pub mod mock_provider;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use herald_delivery::{
    Callbacks, Confirmation, Outcome, ProviderType, RegionCode, SendError, StatusEvent,
    StatusObserver,
};
use tokio::sync::oneshot;

/// Observer that keeps every report as a short string
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Only the `provider/region/status` observations
    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| event.strip_prefix("status ").map(str::to_string))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl StatusObserver for RecordingObserver {
    fn status_changed(&self, event: &StatusEvent<'_>) {
        self.push(format!(
            "status {}/{}/{}",
            event.provider,
            event.region,
            event.observation.as_str()
        ));
    }

    fn attempt_made(&self, provider: ProviderType, _region: &RegionCode, error: Option<&SendError>) {
        let result = if error.is_some() { "failed" } else { "accepted" };
        self.push(format!("attempt {provider} {result}"));
    }

    fn final_failure(&self, region: &RegionCode) {
        self.push(format!("final_failure {region}"));
    }

    fn believed_delivered(
        &self,
        provider: ProviderType,
        _region: &RegionCode,
        confirmation: Confirmation,
    ) {
        self.push(format!("believed_delivered {provider} {}", confirmation.as_str()));
    }
}

/// Counters for each caller callback
#[derive(Debug, Clone, Default)]
pub struct CallbackCounts {
    pub final_failures: Arc<AtomicUsize>,
    pub believed_delivered: Arc<AtomicUsize>,
    pub created: Arc<AtomicUsize>,
}

impl CallbackCounts {
    pub fn callbacks(&self) -> Callbacks {
        self.attach(Callbacks::new())
    }

    /// Counting callbacks plus a receiver for the outcome
    pub fn with_outcome(&self) -> (Callbacks, oneshot::Receiver<Outcome>) {
        let (callbacks, rx) = Callbacks::with_outcome();
        (self.attach(callbacks), rx)
    }

    fn attach(&self, callbacks: Callbacks) -> Callbacks {
        let final_failures = Arc::clone(&self.final_failures);
        let believed_delivered = Arc::clone(&self.believed_delivered);
        let created = Arc::clone(&self.created);

        callbacks
            .on_final_failure(move || {
                final_failures.fetch_add(1, Ordering::SeqCst);
            })
            .on_believed_delivered(move || {
                believed_delivered.fetch_add(1, Ordering::SeqCst);
            })
            .on_created(move |_| {
                created.fetch_add(1, Ordering::SeqCst);
            })
    }

    pub fn final_failures(&self) -> usize {
        self.final_failures.load(Ordering::SeqCst)
    }

    pub fn believed_delivered(&self) -> usize {
        self.believed_delivered.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}
