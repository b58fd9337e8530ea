//! Multi-provider message delivery
//!
//! Loads the herald configuration, installs logging and metrics, and builds a
//! [`DeliveryOrchestrator`](herald_delivery::DeliveryOrchestrator) over the
//! providers the embedding application supplies.

pub mod controller;

pub use controller::{Herald, find_config_file};
pub use herald_common::tracing;
pub use herald_delivery as delivery;
