//! Transport seam between the supervisor and the wire.
//!
//! A [`Connector`] opens one connection and hands back a stream of inbound
//! [`Frame`]s. The stream ending (or yielding an error) means the connection
//! is gone; the supervisor never reuses it.

use std::future::Future;

use futures_util::stream::BoxStream;
use futures_util::{StreamExt, future};
use tokio_tungstenite::tungstenite::Message;

use crate::endpoint::Endpoint;
use crate::error::TransportError;

/// Inbound frames of one connection.
pub type FrameStream = BoxStream<'static, Result<Frame, TransportError>>;

/// An inbound frame, reduced to what the monitor cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload, passed through unparsed.
    Text(String),
    /// The peer started the closing handshake.
    Close(Option<CloseInfo>),
}

/// Close code and reason sent by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// Opens connections to an endpoint.
pub trait Connector: Send + Sync + 'static {
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<FrameStream, TransportError>> + Send;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<FrameStream, TransportError>> + Send {
        let url = endpoint.as_str().to_owned();
        async move {
            let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(TransportError::Handshake)?;
            tracing::debug!(url = %url, "link: websocket handshake complete");

            let frames = ws_stream.filter_map(|msg| future::ready(translate_message(msg)));
            Ok(frames.boxed())
        }
    }
}

/// Map a raw tungstenite message into a [`Frame`]. Control frames are
/// dropped; tungstenite answers pings on its own.
fn translate_message(
    msg: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<Frame, TransportError>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text))),
        Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
            Ok(text) => {
                tracing::debug!(len = text.len(), "link: treating utf-8 binary frame as text");
                Some(Ok(Frame::Text(text)))
            }
            Err(e) => {
                tracing::debug!("link: ignoring non utf-8 binary frame: {e}");
                None
            }
        },
        Ok(Message::Close(frame)) => Some(Ok(Frame::Close(frame.map(|f| CloseInfo {
            code: f.code.into(),
            reason: f.reason.into_owned(),
        })))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Err(e) => Some(Err(TransportError::Stream(e))),
    }
}
