// nbsync-api: Async Rust client for the NetBox REST API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::NetboxClient;
pub use error::Error;
pub use models::{Object, Page, object_id};
pub use transport::{TlsMode, TransportConfig};
