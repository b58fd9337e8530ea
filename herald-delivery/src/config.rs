//! Dispatch configuration
//!
//! Deserialized from the `dispatch` section of the herald configuration
//! file. Every field except `providers` has a default.

use std::{collections::HashMap, time::Duration};

use herald_common::RegionCode;
use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, ProviderType, RetryPolicy};

/// Provider ordering, retry policy and receipt tracking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Providers in preference order
    pub providers: Vec<ProviderType>,

    /// Per-region provider order, replacing `providers` for that region
    #[serde(default)]
    pub region_providers: HashMap<RegionCode, Vec<ProviderType>>,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// How long a delivery awaits its receipt before it is believed
    /// delivered (in seconds).
    ///
    /// Default: 600 seconds (10 minutes)
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

const fn default_receipt_timeout_secs() -> u64 {
    600
}

impl DispatchConfig {
    /// A configuration using `providers` and defaults for everything else
    #[must_use]
    pub fn with_providers(providers: Vec<ProviderType>) -> Self {
        Self {
            providers,
            region_providers: HashMap::new(),
            retry: RetryPolicy::default(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            normalizer: NormalizerConfig::default(),
        }
    }

    #[must_use]
    pub const fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    /// Check the values a registry cannot check itself
    ///
    /// # Errors
    ///
    /// Fails on an empty provider list or a zero receipt timeout.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.providers.is_empty() {
            return Err(ConfigurationError::EmptyProviderList);
        }

        if self.receipt_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "receipt_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.retry.backoff_unit_ms == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "retry.backoff_unit_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Calling-code table used to derive a destination's region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// International calling code (digits, no `+`) to region
    #[serde(default = "default_calling_codes")]
    pub calling_codes: HashMap<String, RegionCode>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            calling_codes: default_calling_codes(),
        }
    }
}

fn default_calling_codes() -> HashMap<String, RegionCode> {
    [
        ("1", "US"),
        ("33", "FR"),
        ("44", "GB"),
        ("49", "DE"),
        ("52", "MX"),
        ("54", "AR"),
        ("55", "BR"),
        ("61", "AU"),
        ("63", "PH"),
        ("81", "JP"),
        ("86", "CN"),
        ("91", "IN"),
        ("234", "NG"),
        ("254", "KE"),
    ]
    .into_iter()
    .map(|(code, region)| (code.to_string(), RegionCode::new(region)))
    .collect()
}
