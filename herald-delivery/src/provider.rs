//! The provider abstraction every concrete delivery channel implements
//!
//! The core never talks to a provider API itself. A [`Provider`] receives a
//! [`SendRequest`], performs whatever wire call its vendor needs, and hands
//! back an opaque [`DeliveryId`] (or a [`SendError`]).

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
};

use ahash::AHashSet;
use async_trait::async_trait;
use herald_common::{Address, RegionCode};
use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, SendError};

/// The closed set of provider vendors herald can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderType {
    Nexmo,
    Twilio,
    MessageBird,
}

impl ProviderType {
    /// Every known provider type
    pub const ALL: [Self; 3] = [Self::Nexmo, Self::Twilio, Self::MessageBird];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nexmo => "nexmo",
            Self::Twilio => "twilio",
            Self::MessageBird => "messagebird",
        }
    }
}

impl Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigurationError::UnknownProvider(name.to_string()))
    }
}

impl From<ProviderType> for String {
    fn from(ty: ProviderType) -> Self {
        ty.as_str().to_string()
    }
}

impl TryFrom<String> for ProviderType {
    type Error = ConfigurationError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Identifier a provider issued for an accepted send
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(Arc<str>);

impl DeliveryId {
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeliveryId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for DeliveryId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// The immutable payload of a delivery, as handed to a provider
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub region: RegionCode,
    pub address: Address,
    pub message: Arc<str>,
}

/// A concrete delivery channel
///
/// Implementations are expected to be initialized (authenticated, webhook
/// registered, ...) before they are handed to the
/// [`ProviderRegistry`](crate::ProviderRegistry).
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// The vendor this instance talks to; unique within a registry
    fn provider_type(&self) -> ProviderType;

    /// Regions this provider is barred from serving
    fn unsupported_regions(&self) -> &AHashSet<RegionCode>;

    /// Whether this provider can serve the destination.
    ///
    /// The registry never offers a provider for a region in its
    /// [`unsupported_regions`](Self::unsupported_regions), whatever this
    /// returns. Override to add address-level checks.
    fn can_serve(&self, region: &RegionCode, _address: &Address) -> bool {
        !self.unsupported_regions().contains(region)
    }

    /// Whether sends through this provider are later confirmed by a receipt
    fn supports_delivery_status(&self) -> bool;

    /// Send the message
    ///
    /// # Errors
    ///
    /// Any failure to have the provider accept the message.
    async fn send(&self, request: &SendRequest) -> Result<DeliveryId, SendError>;
}
