//! # QR-10-P2P: Framed Transport
//!
//! Length-prefixed frames over TCP with a two-byte version handshake and
//! PING/PONG keep-alive. Delivery is best-effort per message: higher
//! layers tolerate loss, duplication and reordering.
//!
//! A single read task per connection demuxes inbound frames into typed
//! events on one bounded channel; application logic consumes that channel
//! sequentially.

pub mod errors;
pub mod frame;
pub mod message;
pub mod transport;

pub use errors::NetError;
pub use frame::{MAX_FRAME_PAYLOAD, PROTOCOL_VERSION};
pub use message::{NetEvent, NetMessage};
pub use transport::{P2pConfig, P2pTransport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
