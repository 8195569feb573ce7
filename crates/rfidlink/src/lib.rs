//! # rfidlink
//!
//! Asynchronous UDP client for RFID reader/writer devices.
//!
//! A [`ReaderClient`] queues typed commands, frames them for the device,
//! and delivers decoded replies, status reports, errors and discovery
//! broadcasts to registered callbacks. The wire format, the message
//! catalogue and the registry live in the sub-crates and are re-exported
//! here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rfidlink::prelude::*;
//!
//! # async fn run() -> Result<(), RfidlinkError> {
//! let client = ReaderClient::builder()
//!     .server("192.168.1.100", 1969)
//!     .build()?;
//!
//! client.on_command(|reply| {
//!     if let Some(version) = reply.downcast_ref::<GetVersionNumberReply>() {
//!         println!("firmware {}", version.version_info);
//!     }
//! });
//! client.on_error(|err| eprintln!("reader error {err}"));
//!
//! client.start().await?;
//! client.send(GetVersionNumber::default());
//! # client.stop().await;
//! # Ok(())
//! # }
//! ```

mod callbacks;
mod client;
mod config;
mod error;
pub mod logging;
mod loops;

pub use callbacks::{
    CallbackRouter, DiscoveryEvent, DiscoveryHandler, DiscoveryPayload, ErrorHandler,
    ErrorReport, MessageHandler,
};
pub use client::{ReaderClient, ReaderClientBuilder};
pub use config::{ClientConfig, DiscoveryFormat};
pub use error::RfidlinkError;
pub use loops::{CHECKSUM_MISMATCH, OVERSIZED_DATAGRAM};

pub use rfidlink_protocol as protocol;
pub use rfidlink_queue as queue;
pub use rfidlink_registry as registry;
pub use rfidlink_transport as transport;

/// Common imports for applications.
pub mod prelude {
    pub use crate::{
        ClientConfig, DiscoveryEvent, DiscoveryFormat, DiscoveryPayload, ErrorReport,
        ReaderClient, RfidlinkError,
    };
    pub use rfidlink_protocol::*;
    pub use rfidlink_registry::MessageRegistry;
}
