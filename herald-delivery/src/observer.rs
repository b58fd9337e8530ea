//! Hooks for observing delivery progress
//!
//! The orchestrator reports every status change, send attempt and final
//! outcome to a [`StatusObserver`]. [`MetricsObserver`] forwards them to the
//! herald metrics pipeline when it is enabled.

use std::fmt;

use herald_common::{DeliveryStatus, RegionCode, tracing};

use crate::{ProviderType, SendError};

/// What was observed for a provider-side delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation<'a> {
    /// The delivery moved to a new status
    Status(DeliveryStatus),
    /// The provider attached an error code to a receipt
    ErrorCode(&'a str),
}

impl Observation<'_> {
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Status(status) => status.as_str(),
            Self::ErrorCode(code) => *code,
        }
    }
}

/// A status observation for one provider and region
#[derive(Debug, Clone, Copy)]
pub struct StatusEvent<'a> {
    pub provider: ProviderType,
    pub region: &'a RegionCode,
    pub observation: Observation<'a>,
}

/// How a delivery came to be believed delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The provider sent a `Delivered` receipt
    Receipt,
    /// No receipt arrived before the tracking timeout
    Timeout,
}

impl Confirmation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Timeout => "timeout",
        }
    }
}

/// Receives delivery progress reports
///
/// Implementations are called while a delivery's state is locked and must
/// not block.
pub trait StatusObserver: Send + Sync + fmt::Debug {
    /// A delivery was created by a provider or its status changed
    fn status_changed(&self, event: &StatusEvent<'_>);

    /// A provider's send call returned; `error` is set when it failed
    fn attempt_made(
        &self,
        _provider: ProviderType,
        _region: &RegionCode,
        _error: Option<&SendError>,
    ) {
    }

    /// A delivery exhausted every candidate provider
    fn final_failure(&self, _region: &RegionCode) {}

    /// A delivery is believed delivered
    fn believed_delivered(
        &self,
        _provider: ProviderType,
        _region: &RegionCode,
        _confirmation: Confirmation,
    ) {
    }
}

/// Records observations into the global delivery metrics
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl StatusObserver for MetricsObserver {
    fn status_changed(&self, event: &StatusEvent<'_>) {
        tracing::trace!(
            provider = %event.provider,
            region = %event.region,
            status = event.observation.as_str(),
            "Status observed"
        );

        if let Some(metrics) = herald_metrics::metrics() {
            metrics.delivery.record_status(
                event.provider.as_str(),
                event.region.as_str(),
                event.observation.as_str(),
            );
        }
    }

    fn attempt_made(&self, provider: ProviderType, _region: &RegionCode, error: Option<&SendError>) {
        if let Some(metrics) = herald_metrics::metrics() {
            metrics
                .delivery
                .record_attempt(provider.as_str(), error.is_none());
        }
    }

    fn final_failure(&self, region: &RegionCode) {
        if let Some(metrics) = herald_metrics::metrics() {
            metrics.delivery.record_final_failure(region.as_str());
        }
    }

    fn believed_delivered(
        &self,
        provider: ProviderType,
        _region: &RegionCode,
        confirmation: Confirmation,
    ) {
        if let Some(metrics) = herald_metrics::metrics() {
            metrics
                .delivery
                .record_believed_delivered(provider.as_str(), confirmation.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_labels() {
        assert_eq!(Observation::Status(DeliveryStatus::Created).as_str(), "created");
        assert_eq!(Observation::ErrorCode("30003").as_str(), "30003");
        assert_eq!(Confirmation::Timeout.as_str(), "timeout");
    }

    #[test]
    fn test_metrics_observer_without_metrics() {
        let region = RegionCode::new("US");
        let observer = MetricsObserver;

        // Metrics are never initialised in unit tests; reports are dropped
        observer.status_changed(&StatusEvent {
            provider: ProviderType::Twilio,
            region: &region,
            observation: Observation::Status(DeliveryStatus::Delivered),
        });
        observer.attempt_made(ProviderType::Twilio, &region, None);
        observer.final_failure(&region);
        observer.believed_delivered(ProviderType::Twilio, &region, Confirmation::Receipt);

        assert!(!herald_metrics::is_enabled());
    }
}
