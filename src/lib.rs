// radius-failover-client: a RADIUS (RFC 2865) PAP authentication client
// with ordered multi-host failover.
//
// The protocol engine (one Access-Request/Response transaction) and the
// failover controller (active-host selection across a pool) are the two
// load-bearing subsystems; everything else here is the ambient stack
// around them.

pub mod client;
pub mod config;
pub mod decode;
pub mod dictionary;
pub mod error;
pub mod failover;
pub mod health;
pub mod protocol;

pub use client::Client;
pub use config::ClientConfig;
pub use decode::{AttributeValue, DecodedAttribute, VendorSubAttribute};
pub use error::{AuthError, ClientError};
pub use health::HostRecord;
pub use protocol::AuthOutcome;

/// Library version, exposed for the demo binary's `status` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
