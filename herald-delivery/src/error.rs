//! Typed error handling for delivery operations.
//!
//! Errors fall in three groups:
//! - Configuration errors, fatal at startup
//! - Per-request errors surfaced synchronously from `start`
//! - Per-attempt send errors, absorbed by the retry loop and never surfaced

use herald_common::RegionCode;
use thiserror::Error;

use crate::ProviderType;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The destination could not be mapped to a region, no attempt was made.
    #[error("Could not parse address: {0}")]
    AddressParse(String),

    /// No configured provider can serve the destination region.
    #[error("No provider available for region {0}")]
    NoProviderAvailable(RegionCode),

    /// Every candidate provider's retry budget was exhausted.
    #[error("Could not deliver to region {0} via any provider")]
    AllProvidersExhausted(RegionCode),
}

/// Errors raised while building the provider registry or the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No provider was configured.
    #[error("At least one provider must be configured")]
    EmptyProviderList,

    /// The same provider type was configured twice.
    #[error("Providers must be unique, duplicate: {0}")]
    DuplicateProvider(ProviderType),

    /// A provider name in the configuration is not a known provider type.
    #[error("Unknown provider type: {0}")]
    UnknownProvider(String),

    /// A provider type was configured but no instance was supplied for it.
    #[error("No provider instance supplied for configured type: {0}")]
    MissingProvider(ProviderType),

    /// A configuration value is out of range.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A provider's synchronous send call failed.
///
/// Always recoverable: the orchestrator backs off and retries, then fails
/// over to the next provider.
#[derive(Debug, Error)]
pub enum SendError {
    /// The provider API refused the request.
    #[error("Provider rejected message: {0}")]
    Rejected(String),

    /// The request never reached the provider or the response was lost.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The provider did not answer in time.
    #[error("Provider timed out: {0}")]
    Timeout(String),
}

impl DeliveryError {
    /// Returns `true` if this is a startup configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` if the request was rejected before any send attempt.
    #[must_use]
    pub const fn is_rejected_before_send(&self) -> bool {
        matches!(self, Self::AddressParse(_) | Self::NoProviderAvailable(_))
    }
}
