//! WebSocket transport for client streams.
//!
//! Thin wrapper around `tokio-tungstenite` providing split reader/writer
//! halves that only expose what a [`super::ResilientStream`] needs: text
//! frames out, text frames and close notifications in.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};

/// Concrete WebSocket stream type.
type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A frame the stream cares about.
#[derive(Debug)]
pub enum Incoming {
    /// UTF-8 text frame.
    Text(String),
    /// Close frame with status code and reason.
    Close {
        /// WebSocket close code (1000 = normal, 1005 = no code).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Write half of a transport.
#[derive(Debug)]
pub struct TransportWriter {
    sink: SplitSink<WsStream, Message>,
}

impl TransportWriter {
    /// Sends a UTF-8 text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    pub async fn send_text(&mut self, text: String) -> Result<(), tungstenite::Error> {
        self.sink.send(Message::text(text)).await
    }

    /// Sends a normal (1000) close frame and closes the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be written.
    pub async fn close(&mut self) -> Result<(), tungstenite::Error> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static(""),
        };
        self.sink.send(Message::Close(Some(frame))).await?;
        self.sink.close().await
    }
}

/// Read half of a transport.
#[derive(Debug)]
pub struct TransportReader {
    stream: SplitStream<WsStream>,
}

impl TransportReader {
    /// Receives the next text or close frame, returning `None` when the
    /// stream ends. Binary, ping, pong and raw frames are skipped.
    pub async fn recv(&mut self) -> Option<Result<Incoming, tungstenite::Error>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Incoming::Text(text.to_string()))),
                Ok(Message::Close(close_frame)) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    return Some(Ok(Incoming::Close { code, reason }));
                }
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Opens a WebSocket to `url` and splits it.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the handshake fails.
pub async fn open(url: &str) -> Result<(TransportWriter, TransportReader), tungstenite::Error> {
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
    let (sink, stream) = ws_stream.split();
    Ok((TransportWriter { sink }, TransportReader { stream }))
}
