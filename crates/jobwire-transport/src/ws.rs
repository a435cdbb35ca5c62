use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::target::Target;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a worker session.
pub struct FrameSink {
    inner: SplitSink<WsStream, Message>,
    closed: bool,
}

/// Read half of a worker session.
pub struct FrameSource {
    inner: SplitStream<WsStream>,
}

/// Open a session to `target`, presenting `token` as a bearer credential.
///
/// The credential travels as `Authorization: Bearer <token>` on the upgrade
/// request and is never logged.
pub async fn connect(target: &Target, token: &str) -> Result<(FrameSink, FrameSource)> {
    let mut request = target
        .uri()
        .clone()
        .into_client_request()
        .map_err(|err| TransportError::InvalidTarget {
            target: target.to_string(),
            reason: err.to_string(),
        })?;

    let header = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        TransportError::InvalidCredential(format!(
            "token is not a valid header value (<redacted:{} bytes>)",
            token.len()
        ))
    })?;
    request.headers_mut().insert(AUTHORIZATION, header);

    debug!(%target, "opening worker session");
    let (stream, response) =
        connect_async(request)
            .await
            .map_err(|err| TransportError::Connect {
                target: target.to_string(),
                source: Box::new(err),
            })?;
    info!(%target, status = %response.status(), "worker session established");

    let (sink, source) = stream.split();
    Ok((
        FrameSink {
            inner: sink,
            closed: false,
        },
        FrameSource { inner: source },
    ))
}

impl FrameSink {
    /// Send one opaque frame as a single binary message.
    pub async fn send_frame(&mut self, payload: Bytes) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        trace!(size = payload.len(), "sending frame");
        self.inner
            .send(Message::Binary(payload))
            .await
            .map_err(map_ws_error)
    }

    /// Send a close frame carrying `code` and `reason`.
    pub async fn send_close(&mut self, code: u16, reason: &str) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };
        self.inner
            .send(Message::Close(Some(frame)))
            .await
            .map_err(map_ws_error)
    }

    /// Flush and close the write half. Later sends fail with [`TransportError::Closed`].
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close().await.map_err(map_ws_error)
    }

    /// Whether [`FrameSink::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameSource {
    /// Receive the next data frame.
    ///
    /// Returns `Ok(None)` when the peer sends a close frame or the stream ends.
    /// Control traffic (ping/pong) is consumed here; text messages are passed
    /// through as their UTF-8 bytes.
    pub async fn recv_frame(&mut self) -> Result<Option<Bytes>> {
        while let Some(message) = self.inner.next().await {
            match message {
                Ok(Message::Binary(data)) => return Ok(Some(data)),
                Ok(Message::Text(text)) => {
                    return Ok(Some(Bytes::copy_from_slice(text.as_bytes())))
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "peer closed session");
                    return Ok(None);
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => return Ok(None),
                Err(err) => return Err(TransportError::WebSocket(Box::new(err))),
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSink")
            .field("closed", &self.closed)
            .finish()
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource").finish_non_exhaustive()
    }
}

fn map_ws_error(err: WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::SendAfterClosing) => TransportError::Closed,
        other => TransportError::WebSocket(Box::new(other)),
    }
}
