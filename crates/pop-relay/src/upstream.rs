// SPDX-License-Identifier: GPL-3.0

//! The WebSocket side of the relay.

use crate::errors::RelayError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// How long the closing handshake with a node may take.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens connections to nodes.
#[async_trait]
pub trait Upstream: Send + Sync {
	/// The connection produced.
	type Connection: UpstreamConnection;

	/// Connects to `endpoint`.
	async fn connect(&self, endpoint: &str) -> Result<Self::Connection, RelayError>;
}

/// A connection to a node exchanging text messages.
#[async_trait]
pub trait UpstreamConnection: Send {
	/// Sends a text message.
	async fn send(&mut self, text: String) -> Result<(), RelayError>;

	/// Waits for the next text message. Binary messages are refused, as JSON-RPC responses are
	/// text.
	async fn receive(&mut self) -> Result<String, RelayError>;

	/// Closes the connection, giving up after [`CLOSE_TIMEOUT`].
	async fn close(&mut self);
}

/// Connects over WebSocket, with TLS for `wss://` endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketUpstream;

#[async_trait]
impl Upstream for WebSocketUpstream {
	type Connection = WebSocketConnection;

	async fn connect(&self, endpoint: &str) -> Result<Self::Connection, RelayError> {
		let (stream, _) =
			connect_async(endpoint).await.map_err(|e| RelayError::Connect(e.to_string()))?;
		log::debug!("Opened upstream connection to {endpoint}");
		Ok(WebSocketConnection { stream })
	}
}

/// An open WebSocket connection.
pub struct WebSocketConnection {
	stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl UpstreamConnection for WebSocketConnection {
	async fn send(&mut self, text: String) -> Result<(), RelayError> {
		self.stream
			.send(Message::Text(text.into()))
			.await
			.map_err(|e| RelayError::Upstream(e.to_string()))
	}

	async fn receive(&mut self) -> Result<String, RelayError> {
		while let Some(message) = self.stream.next().await {
			match message.map_err(|e| RelayError::Upstream(e.to_string()))? {
				Message::Text(text) => return Ok(text.to_string()),
				Message::Binary(_) =>
					return Err(RelayError::Upstream("unexpected binary response".into())),
				Message::Close(_) => break,
				// Pings are answered by the stream itself.
				_ => continue,
			}
		}
		Err(RelayError::Upstream("connection closed before a response arrived".into()))
	}

	async fn close(&mut self) {
		match tokio::time::timeout(CLOSE_TIMEOUT, self.stream.close(None)).await {
			Ok(Ok(())) => {},
			Ok(Err(e)) => log::debug!("Failed to close upstream connection: {e}"),
			Err(_) => log::debug!("Gave up closing upstream connection after {CLOSE_TIMEOUT:?}"),
		}
	}
}
