//! Types shared by every herald crate: region codes, destination addresses,
//! delivery statuses and the logging setup.

pub mod address;
pub mod logging;
pub mod region;
pub mod status;

pub use address::Address;
pub use region::RegionCode;
pub use status::DeliveryStatus;
pub use tracing;
