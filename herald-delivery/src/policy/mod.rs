//! Policy abstractions for delivery operations.
//!
//! - [`RetryPolicy`]: per-provider attempt ceiling and backoff timing

pub mod retry;

pub use retry::RetryPolicy;
