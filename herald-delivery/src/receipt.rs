//! Handling of asynchronous provider receipts
//!
//! A transport (typically a webhook) authenticates and parses a provider's
//! status callback and hands the result to [`ReceiptHandler::report`].

use std::time::Duration;

use herald_common::{DeliveryStatus, tracing};

use crate::{
    Confirmation, DeliveryId, DeliveryOrchestrator, Observation, Outcome, StatusEvent,
};

/// What a receipt did to the delivery it referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// The id is not tracked (late, duplicate or expired); nothing changed
    Ignored,
    /// Informational status, the delivery keeps waiting for a receipt
    Updated,
    /// The delivery is believed delivered
    Delivered,
    /// The delivery failed and will be resent after the given delay
    ResendScheduled(Duration),
}

/// Applies receipts to tracked deliveries
#[derive(Debug, Clone)]
pub struct ReceiptHandler {
    orchestrator: DeliveryOrchestrator,
}

impl ReceiptHandler {
    pub(crate) const fn new(orchestrator: DeliveryOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Apply a provider's status report for the delivery tracked under `id`
    pub async fn report(
        &self,
        id: &DeliveryId,
        status: DeliveryStatus,
        error_code: Option<&str>,
    ) -> ReceiptOutcome {
        let tracker = self.orchestrator.tracker();

        let Some(delivery) = tracker.lookup(id) else {
            tracing::debug!(delivery_id = %id, %status, "Receipt for untracked delivery");
            return ReceiptOutcome::Ignored;
        };

        let mut state = delivery.lock_state().await;

        // Expired or superseded while this receipt waited for the lock
        if state.tracked_id.as_ref() != Some(id) {
            tracing::debug!(delivery_id = %id, %status, "Receipt for superseded delivery");
            return ReceiptOutcome::Ignored;
        }

        let Some(provider) = state.current_provider().map(|p| p.provider_type()) else {
            return ReceiptOutcome::Ignored;
        };
        let region = delivery.region();

        tracing::info!(
            provider = %provider,
            address = %delivery.address(),
            %region,
            delivery_id = %id,
            %status,
            error_code,
            "Received delivery status"
        );

        let observer = self.orchestrator.observer();
        if state.status != status {
            state.status = status;
            observer.status_changed(&StatusEvent {
                provider,
                region,
                observation: Observation::Status(status),
            });

            if let Some(code) = error_code {
                observer.status_changed(&StatusEvent {
                    provider,
                    region,
                    observation: Observation::ErrorCode(code),
                });
            }
        }

        match status {
            DeliveryStatus::Delivered => {
                tracker.unregister_if(id, &delivery);
                state.tracked_id = None;

                observer.believed_delivered(provider, region, Confirmation::Receipt);
                state.callbacks.finish(Outcome::BelievedDelivered);

                ReceiptOutcome::Delivered
            }
            DeliveryStatus::Failed => {
                tracker.unregister_if(id, &delivery);
                state.tracked_id = None;

                let delay = self
                    .orchestrator
                    .retry_policy()
                    .receipt_backoff(state.attempts_with_current_provider);

                tracing::info!(
                    provider = %provider,
                    address = %delivery.address(),
                    delivery_id = %id,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Delivery failed, scheduling resend"
                );

                drop(state);
                self.orchestrator.schedule_resend(delivery, delay);

                ReceiptOutcome::ResendScheduled(delay)
            }
            _ => ReceiptOutcome::Updated,
        }
    }
}
