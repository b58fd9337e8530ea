//! Multi-provider delivery orchestration
//!
//! This crate provides functionality to:
//! - Hold the configured providers and resolve, per region, the ordered
//!   candidates for a destination
//! - Send through each candidate with bounded retries and exponential
//!   backoff, failing over to the next provider when one is exhausted
//! - Track deliveries awaiting an asynchronous receipt, expiring them when no
//!   receipt arrives
//! - React to receipts by finalizing the delivery or scheduling a resend

mod config;
mod delivery;
mod error;
mod normalizer;
mod observer;
mod orchestrator;
pub mod policy;
mod provider;
mod receipt;
mod registry;
mod tracker;

pub use config::{DispatchConfig, NormalizerConfig};
pub use delivery::{Callbacks, Delivery, DeliverySnapshot, Outcome};
pub use error::{ConfigurationError, DeliveryError, SendError};
pub use herald_common::{Address, DeliveryStatus, RegionCode};
pub use normalizer::{AddressNormalizer, PrefixNormalizer};
pub use observer::{Confirmation, MetricsObserver, Observation, StatusEvent, StatusObserver};
pub use orchestrator::{DeliveryOrchestrator, OrchestratorBuilder};
pub use policy::RetryPolicy;
pub use provider::{DeliveryId, Provider, ProviderType, SendRequest};
pub use receipt::{ReceiptHandler, ReceiptOutcome};
pub use registry::ProviderRegistry;
pub use tracker::DeliveryTracker;
