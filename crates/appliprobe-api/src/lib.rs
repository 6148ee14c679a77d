// appliprobe-api: Async Rust client for the cloud appliance control API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{Credentials, TokenPair};
pub use client::{ApplianceClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
