//! exmon-link: connection supervision for the monitor.
//! Keeps exactly one WebSocket connection to the server alive, reconnects
//! after every termination, and forwards connectivity changes and raw
//! frames to a [`ConnectionObserver`].

pub mod endpoint;
pub mod error;
pub mod manager;
pub mod observer;
pub mod retry;
pub mod transport;

pub use endpoint::Endpoint;
pub use error::{EndpointError, TransportError};
pub use manager::{ConnectionHandle, ConnectionManager, ConnectionStatus};
pub use observer::{Callbacks, ConnectionObserver};
pub use retry::RetryPolicy;
pub use transport::{CloseInfo, Connector, Frame, FrameStream, WsConnector};
