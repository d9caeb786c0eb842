//! Client connection transport
//!
//! This module carries lobby and gameplay events between clients and the
//! lobby over WebSocket connections framed as JSON envelopes.

pub mod connection;
pub mod protocol;
pub mod publisher;
pub mod socket;

pub use connection::ConnectionHandler;
pub use protocol::{decode_client_event, encode_server_event, Envelope};
pub use publisher::{ChannelEventSink, ClientHandle, EventSink, MockEventSink};
pub use socket::serve_socket;
