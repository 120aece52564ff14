// boxwatch-api: Async Rust client for the openSenseMap box API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::OsemClient;
pub use error::Error;
pub use models::{BoxFilters, BoxSummary, RawBox, RawLastMeasurement, RawSensor};
pub use transport::HttpConfig;
