//! Delivery status reported for a message accepted by a provider

use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Lifecycle of a single provider-side delivery
///
/// `Created` is set when a provider accepts a send. Receipts move a delivery
/// to any other value; only `Delivered` and `Failed` cause transitions, the
/// rest are informational.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    NotCreated,
    Created,
    Queued,
    Upstream,
    Other,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    /// Whether a receipt carrying this status ends tracking for the delivery
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotCreated => "not_created",
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Upstream => "upstream",
            Self::Other => "other",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::DeliveryStatus;

    #[test]
    fn status() {
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
        assert!(!DeliveryStatus::Queued.is_terminal());
        assert!(!DeliveryStatus::Created.is_terminal());

        assert_eq!(DeliveryStatus::default(), DeliveryStatus::NotCreated);
        assert_eq!(DeliveryStatus::Upstream.to_string(), "upstream");
    }
}
