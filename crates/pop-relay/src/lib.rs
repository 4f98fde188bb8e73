// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

use axum::{Router, routing::post};
use pop_portal::endpoints::{allowed_endpoints, normalize};
use serde::Deserialize;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod errors;
/// Connections to nodes.
pub mod upstream;

pub use errors::RelayError;
pub use upstream::{CLOSE_TIMEOUT, Upstream, UpstreamConnection, WebSocketUpstream};

/// How long opening the upstream connection may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to wait for the upstream response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);
/// The address the relay listens on by default.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
	std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
	3000,
);

/// Settings of the relay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayConfig {
	/// Endpoints requests may be forwarded to.
	pub allowed_endpoints: Vec<String>,
	/// Upper bound for opening the upstream connection.
	pub connect_timeout: Duration,
	/// Upper bound for waiting on the upstream response.
	pub response_timeout: Duration,
	/// The address to listen on.
	pub bind: SocketAddr,
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			allowed_endpoints: allowed_endpoints(),
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			response_timeout: DEFAULT_RESPONSE_TIMEOUT,
			bind: DEFAULT_BIND,
		}
	}
}

/// The body of a relay request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RelayRequest {
	/// The WebSocket endpoint to forward to.
	pub endpoint: Option<String>,
	/// The JSON-RPC payload, sent as a single text message.
	pub payload: Option<serde_json::Value>,
}

/// Forwards single requests to allow-listed nodes.
pub struct Relay<U: Upstream> {
	config: RelayConfig,
	upstream: U,
}

impl<U: Upstream> Relay<U> {
	/// - config: The allow-list and timeouts.
	/// - upstream: Opens the connections to nodes.
	pub fn new(config: RelayConfig, upstream: U) -> Self {
		Self { config, upstream }
	}

	/// The relay settings.
	pub fn config(&self) -> &RelayConfig {
		&self.config
	}

	/// Whether requests may be forwarded to `endpoint`.
	pub fn is_allowed(&self, endpoint: &str) -> bool {
		let endpoint = normalize(endpoint);
		self.config.allowed_endpoints.iter().any(|allowed| normalize(allowed) == endpoint)
	}

	/// Sends the payload of `request` to its endpoint and returns the first message received.
	///
	/// Endpoints off the allow-list are refused before any connection is opened. The upstream
	/// connection is always closed before returning.
	pub async fn forward(&self, request: RelayRequest) -> Result<String, RelayError> {
		let endpoint = request
			.endpoint
			.as_deref()
			.map(normalize)
			.filter(|endpoint| !endpoint.is_empty())
			.ok_or(RelayError::MissingEndpoint)?;
		if !self.is_allowed(endpoint) {
			log::warn!("Refused to relay to {endpoint}");
			return Err(RelayError::NotAllowed);
		}

		let mut connection =
			tokio::time::timeout(self.config.connect_timeout, self.upstream.connect(endpoint))
				.await
				.map_err(|_| RelayError::ConnectTimeout)??;
		let response = self.exchange(&mut connection, request.payload).await;
		connection.close().await;
		if let Err(e) = &response {
			log::warn!("Relaying to {endpoint} failed: {e}");
		}
		response
	}

	async fn exchange(
		&self,
		connection: &mut U::Connection,
		payload: Option<serde_json::Value>,
	) -> Result<String, RelayError> {
		if let Some(payload) = payload {
			let text = serde_json::to_string(&payload)
				.map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
			connection.send(text).await?;
		}
		tokio::time::timeout(self.config.response_timeout, connection.receive())
			.await
			.map_err(|_| RelayError::ResponseTimeout)?
	}
}

/// Builds the relay API: a single `POST /` route. Other methods are answered with 405.
pub fn router<U: Upstream + 'static>(relay: Arc<Relay<U>>) -> Router {
	Router::new()
		.route("/", post(routes::relay::<U>))
		.layer(CorsLayer::permissive())
		.with_state(relay)
}

/// Serves the relay on `listener` until `shutdown` completes.
///
/// # Arguments
/// * `listener` - The bound listener.
/// * `relay` - The relay serving requests.
/// * `shutdown` - Completes when the server should stop.
pub async fn serve<U: Upstream + 'static>(
	listener: TcpListener,
	relay: Relay<U>,
	shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RelayError> {
	log::info!("Relay listening on {}", listener.local_addr()?);
	axum::serve(listener, router(Arc::new(relay)))
		.with_graceful_shutdown(shutdown)
		.await?;
	Ok(())
}

mod routes {
	use super::{Arc, Relay, RelayError, RelayRequest, Upstream};
	use axum::{body::Bytes, extract::State};

	/// Forwards the request in the body. An empty body is a request without an endpoint.
	pub(super) async fn relay<U: Upstream + 'static>(
		State(relay): State<Arc<Relay<U>>>,
		body: Bytes,
	) -> Result<String, RelayError> {
		let request = if body.iter().all(u8::is_ascii_whitespace) {
			RelayRequest::default()
		} else {
			serde_json::from_slice(&body).map_err(|e| RelayError::InvalidRequest(e.to_string()))?
		};
		relay.forward(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use serde_json::json;
	use std::sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	};

	#[derive(Clone, Default)]
	struct Recorded {
		opened: Arc<AtomicUsize>,
		closed: Arc<AtomicUsize>,
		sent: Arc<Mutex<Vec<String>>>,
	}

	// Answers with a fixed message after an optional delay.
	struct MockUpstream {
		recorded: Recorded,
		connect_delay: Duration,
		response_delay: Duration,
		refuse: bool,
	}

	impl MockUpstream {
		fn new(recorded: &Recorded) -> Self {
			Self {
				recorded: recorded.clone(),
				connect_delay: Duration::ZERO,
				response_delay: Duration::ZERO,
				refuse: false,
			}
		}
	}

	struct MockConnection {
		recorded: Recorded,
		response_delay: Duration,
	}

	#[async_trait]
	impl Upstream for MockUpstream {
		type Connection = MockConnection;

		async fn connect(&self, endpoint: &str) -> Result<MockConnection, RelayError> {
			tokio::time::sleep(self.connect_delay).await;
			if self.refuse {
				return Err(RelayError::Connect(format!("{endpoint} refused")));
			}
			self.recorded.opened.fetch_add(1, Ordering::SeqCst);
			Ok(MockConnection {
				recorded: self.recorded.clone(),
				response_delay: self.response_delay,
			})
		}
	}

	#[async_trait]
	impl UpstreamConnection for MockConnection {
		async fn send(&mut self, text: String) -> Result<(), RelayError> {
			self.recorded.sent.lock().unwrap().push(text);
			Ok(())
		}

		async fn receive(&mut self) -> Result<String, RelayError> {
			tokio::time::sleep(self.response_delay).await;
			Ok(r#"{"jsonrpc":"2.0","id":1,"result":"Polkadot"}"#.into())
		}

		async fn close(&mut self) {
			self.recorded.closed.fetch_add(1, Ordering::SeqCst);
		}
	}

	fn request(endpoint: &str) -> RelayRequest {
		RelayRequest {
			endpoint: Some(endpoint.into()),
			payload: Some(json!({ "jsonrpc": "2.0", "id": 1, "method": "system_chain" })),
		}
	}

	#[test]
	fn default_config_allows_public_networks() {
		let relay = Relay::new(RelayConfig::default(), WebSocketUpstream);
		assert!(relay.is_allowed("wss://rpc.polkadot.io"));
		assert!(relay.is_allowed("wss://kusama-rpc.polkadot.io/"));
		assert!(relay.is_allowed("wss://westend-rpc.polkadot.io"));
		assert!(!relay.is_allowed("ws://127.0.0.1:9944"));
		assert!(!relay.is_allowed("wss://evil.example"));
		assert_eq!(relay.config().connect_timeout, Duration::from_secs(5));
		assert_eq!(relay.config().response_timeout, Duration::from_secs(5));
	}

	#[tokio::test]
	async fn forward_works() -> anyhow::Result<()> {
		let recorded = Recorded::default();
		let relay = Relay::new(RelayConfig::default(), MockUpstream::new(&recorded));
		let response = relay.forward(request("wss://rpc.polkadot.io")).await?;
		assert_eq!(response, r#"{"jsonrpc":"2.0","id":1,"result":"Polkadot"}"#);
		assert_eq!(
			recorded.sent.lock().unwrap().as_slice(),
			[r#"{"jsonrpc":"2.0","id":1,"method":"system_chain"}"#.to_string()]
		);
		assert_eq!(recorded.opened.load(Ordering::SeqCst), 1);
		assert_eq!(recorded.closed.load(Ordering::SeqCst), 1);
		Ok(())
	}

	#[tokio::test]
	async fn disallowed_endpoint_opens_no_connection() {
		let recorded = Recorded::default();
		let relay = Relay::new(RelayConfig::default(), MockUpstream::new(&recorded));
		assert!(matches!(
			relay.forward(request("wss://evil.example")).await,
			Err(RelayError::NotAllowed)
		));
		assert!(matches!(
			relay.forward(RelayRequest::default()).await,
			Err(RelayError::MissingEndpoint)
		));
		assert_eq!(recorded.opened.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn timeouts_are_reported() {
		let recorded = Recorded::default();
		let config = RelayConfig {
			connect_timeout: Duration::from_millis(20),
			response_timeout: Duration::from_millis(20),
			..Default::default()
		};
		let mut upstream = MockUpstream::new(&recorded);
		upstream.connect_delay = Duration::from_secs(5);
		let relay = Relay::new(config.clone(), upstream);
		assert!(matches!(
			relay.forward(request("wss://rpc.polkadot.io")).await,
			Err(RelayError::ConnectTimeout)
		));

		let mut upstream = MockUpstream::new(&recorded);
		upstream.response_delay = Duration::from_secs(5);
		let relay = Relay::new(config, upstream);
		assert!(matches!(
			relay.forward(request("wss://rpc.polkadot.io")).await,
			Err(RelayError::ResponseTimeout)
		));
		// The connection is closed even though no response arrived.
		assert_eq!(recorded.opened.load(Ordering::SeqCst), 1);
		assert_eq!(recorded.closed.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn refused_connection_is_reported() {
		let recorded = Recorded::default();
		let mut upstream = MockUpstream::new(&recorded);
		upstream.refuse = true;
		let relay = Relay::new(RelayConfig::default(), upstream);
		let error = relay.forward(request("wss://rpc.polkadot.io")).await.unwrap_err();
		assert_eq!(error.status(), axum::http::StatusCode::BAD_GATEWAY);
	}
}
