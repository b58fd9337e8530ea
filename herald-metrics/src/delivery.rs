//! Delivery metrics
//!
//! Tracks outbound deliveries:
//! - Status observations per provider and region (created, delivered, failed,
//!   provider error codes)
//! - Send attempts per provider and result
//! - Final outcomes (believed delivered, finally failed)

use std::sync::atomic::{AtomicU64, Ordering};

use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter},
};

use crate::MetricsError;

/// Delivery metrics collector
#[derive(Debug)]
pub struct DeliveryMetrics {
    /// Status observations by provider, region and status
    provider_status_total: Counter<u64>,

    /// Send attempts by provider and result
    attempts_total: Counter<u64>,

    /// Deliveries that exhausted every provider
    final_failures_total: Counter<u64>,

    /// Deliveries believed delivered, by how that was concluded
    believed_delivered_total: Counter<u64>,

    // Local mirrors of the counters, readable without an exporter
    status_count: AtomicU64,
    attempt_count: AtomicU64,
    final_failure_count: AtomicU64,
    believed_delivered_count: AtomicU64,
}

impl DeliveryMetrics {
    /// Create a new delivery metrics collector
    ///
    /// # Errors
    ///
    /// Returns an error if metric instruments cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let meter = meter();

        let provider_status_total = meter
            .u64_counter("herald.delivery.provider.status.total")
            .with_description("Delivery status observations by provider, region and status")
            .build();

        let attempts_total = meter
            .u64_counter("herald.delivery.attempts.total")
            .with_description("Send attempts by provider and result")
            .build();

        let final_failures_total = meter
            .u64_counter("herald.delivery.final_failures.total")
            .with_description("Deliveries that could not be sent via any provider")
            .build();

        let believed_delivered_total = meter
            .u64_counter("herald.delivery.believed_delivered.total")
            .with_description("Deliveries believed delivered, by receipt or by timeout")
            .build();

        Ok(Self {
            provider_status_total,
            attempts_total,
            final_failures_total,
            believed_delivered_total,
            status_count: AtomicU64::new(0),
            attempt_count: AtomicU64::new(0),
            final_failure_count: AtomicU64::new(0),
            believed_delivered_count: AtomicU64::new(0),
        })
    }

    /// Record a status observation; `status` is either a delivery status or
    /// a provider error code
    pub fn record_status(&self, provider: &str, region: &str, status: &str) {
        let attributes = [
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("region", region.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.provider_status_total.add(1, &attributes);
        self.status_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a send attempt and whether the provider accepted it
    pub fn record_attempt(&self, provider: &str, accepted: bool) {
        let attributes = [
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("result", if accepted { "accepted" } else { "failed" }),
        ];
        self.attempts_total.add(1, &attributes);
        self.attempt_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivery that exhausted every candidate provider
    pub fn record_final_failure(&self, region: &str) {
        self.final_failures_total
            .add(1, &[KeyValue::new("region", region.to_string())]);
        self.final_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivery believed delivered; `via` is `"receipt"` or `"timeout"`
    pub fn record_believed_delivered(&self, provider: &str, via: &'static str) {
        let attributes = [
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("via", via),
        ];
        self.believed_delivered_total.add(1, &attributes);
        self.believed_delivered_count
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn status_count(&self) -> u64 {
        self.status_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn attempt_count(&self) -> u64 {
        self.attempt_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn final_failure_count(&self) -> u64 {
        self.final_failure_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn believed_delivered_count(&self) -> u64 {
        self.believed_delivered_count.load(Ordering::Relaxed)
    }
}

/// Get the OpenTelemetry meter for delivery metrics
fn meter() -> Meter {
    opentelemetry::global::meter("herald.delivery")
}
