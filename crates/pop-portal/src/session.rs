// SPDX-License-Identifier: GPL-3.0

//! Ownership of the single active node connection.
//!
//! A [`Session`] moves through Disconnected → Connecting → Ready, or Error when a connection
//! attempt fails. A ready session falls back to Disconnected when the node closes the connection.
//! Changing the target always tears the previous handle down before a new one is created, and
//! transitions queue behind each other instead of running concurrently.

use crate::{
	catalog::{self, Operation, OperationCategory, StorageCategory, StorageItem},
	client::{ChainClient, Connector, SystemInfo, TokenInfo},
	config::PortalConfig,
	endpoints,
	errors::Error,
	store::Preferences,
	submission::{self, Submission, coerce::to_values},
	wallet::Wallet,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::{Mutex, watch};
use url::Url;

/// The state of a connection.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ConnectionState {
	/// No connection.
	Disconnected,
	/// A connection attempt is in progress.
	Connecting,
	/// The connection is usable.
	Ready,
	/// The last connection attempt failed.
	Error,
}

/// A snapshot of the session's connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Connection {
	/// The address the session targets, empty when none.
	pub target_address: String,
	/// The state of the connection.
	pub state: ConnectionState,
	/// Why the last attempt failed, when in [`ConnectionState::Error`].
	pub error_message: Option<String>,
}

impl Connection {
	fn new(target_address: &str, state: ConnectionState) -> Self {
		Self { target_address: target_address.to_string(), state, error_message: None }
	}

	fn failed(target_address: &str, error: &Error) -> Self {
		Self {
			target_address: target_address.to_string(),
			state: ConnectionState::Error,
			error_message: Some(error.to_string()),
		}
	}

	/// Whether the connection is usable.
	pub fn is_ready(&self) -> bool {
		self.state == ConnectionState::Ready
	}
}

struct Inner<T> {
	client: Option<Arc<T>>,
	// Identifies the current client, bumped on every connection.
	generation: u64,
	preferences: Preferences,
}

impl<T: ChainClient> Inner<T> {
	async fn release(&mut self) {
		if let Some(client) = self.client.take() {
			log::debug!("Disconnecting from {}", client.endpoint());
			client.disconnect().await;
		}
	}
}

// State shared with the tasks watching the transport of each connection.
struct Shared<T> {
	inner: Mutex<Inner<T>>,
	state: watch::Sender<Connection>,
}

impl<T: ChainClient> Shared<T> {
	fn connection(&self) -> Connection {
		self.state.borrow().clone()
	}

	fn publish(&self, connection: Connection) {
		self.state.send_replace(connection);
	}

	// Moves a ready session to Disconnected once the transport of its client closed.
	async fn lost(&self, generation: u64) {
		let mut inner = self.inner.lock().await;
		if inner.generation != generation || inner.client.is_none() {
			return;
		}
		let connection = self.connection();
		if !connection.is_ready() {
			return;
		}
		log::warn!("Lost the connection to {}", connection.target_address);
		inner.release().await;
		self.publish(Connection::new(&connection.target_address, ConnectionState::Disconnected));
	}
}

/// Owns the connection to a node and the preferences it is persisted in.
pub struct Session<C: Connector> {
	connector: C,
	config: PortalConfig,
	shared: Arc<Shared<C::Client>>,
}

impl<C: Connector> Session<C> {
	/// Creates a disconnected session.
	///
	/// # Arguments
	/// * `connector` - Establishes connections to nodes.
	/// * `config` - Session settings.
	/// * `preferences` - Where the last targeted endpoint is persisted.
	pub fn new(connector: C, config: PortalConfig, preferences: Preferences) -> Self {
		let (state, _) = watch::channel(Connection::new("", ConnectionState::Disconnected));
		let inner = Mutex::new(Inner { client: None, generation: 0, preferences });
		Self { connector, config, shared: Arc::new(Shared { inner, state }) }
	}

	/// The session settings.
	pub fn config(&self) -> &PortalConfig {
		&self.config
	}

	/// A snapshot of the current connection.
	pub fn connection(&self) -> Connection {
		self.shared.connection()
	}

	/// Subscribes to connection changes.
	pub fn subscribe(&self) -> watch::Receiver<Connection> {
		self.shared.state.subscribe()
	}

	/// The last successfully targeted endpoint, as persisted.
	pub async fn current_endpoint(&self) -> Option<String> {
		self.shared.inner.lock().await.preferences.endpoint().map(str::to_string)
	}

	/// Connects to `address`, reusing the live connection when it already targets it.
	///
	/// Any other connection is released first, closing its transport for every holder of the
	/// handle. The attempt is bounded by the configured timeout and, once successful, `address`
	/// is persisted as the current endpoint.
	///
	/// # Arguments
	/// * `address` - WebSocket URL of the node.
	pub async fn connect(&self, address: &str) -> Result<Arc<C::Client>, Error> {
		let address = endpoints::normalize(address);
		let url = Url::parse(address)?;
		let mut inner = self.shared.inner.lock().await;
		if let Some(client) = &inner.client {
			let current = self.connection();
			if current.is_ready() &&
				current.target_address == address &&
				client.transport().is_open()
			{
				log::debug!("Reusing the connection to {address}");
				return Ok(client.clone());
			}
		}
		inner.release().await;

		self.publish(Connection::new(address, ConnectionState::Connecting));
		let attempt =
			tokio::time::timeout(self.config.connect_timeout, self.connector.connect(&url));
		let client = match attempt.await {
			Ok(Ok(client)) => Arc::new(client),
			Ok(Err(e)) => return Err(self.fail(address, e)),
			Err(_) => {
				let e = Error::Timeout {
					after: self.config.connect_timeout,
					operation: "connecting to the node",
				};
				return Err(self.fail(address, e));
			},
		};
		inner.generation += 1;
		self.watch(client.transport().closed(), inner.generation);
		inner.client = Some(client.clone());
		if let Err(e) = inner.preferences.set_endpoint(address) {
			log::warn!("Failed to persist the endpoint {address}: {e}");
		}
		log::info!("Connected to {address}");
		self.publish(Connection::new(address, ConnectionState::Ready));
		Ok(client)
	}

	/// The endpoint a fresh start targets: the persisted one, otherwise the one supplied by the
	/// environment.
	pub async fn initial_endpoint(&self) -> Option<String> {
		crate::config::initial_endpoint(&self.shared.inner.lock().await.preferences)
	}

	/// Connects to the [`Session::initial_endpoint`].
	pub async fn reconnect(&self) -> Result<Arc<C::Client>, Error> {
		let endpoint = self.initial_endpoint().await.ok_or(Error::NoEndpoint)?;
		self.connect(&endpoint).await
	}

	/// Releases the connection.
	pub async fn disconnect(&self) {
		let mut inner = self.shared.inner.lock().await;
		inner.release().await;
		let target = self.connection().target_address;
		self.publish(Connection::new(&target, ConnectionState::Disconnected));
	}

	/// The ready connection.
	pub async fn client(&self) -> Result<Arc<C::Client>, Error> {
		let inner = self.shared.inner.lock().await;
		match &inner.client {
			Some(client) if self.connection().is_ready() && client.transport().is_open() =>
				Ok(client.clone()),
			_ => Err(Error::NotReady),
		}
	}

	/// Queries chain, node name and node version of the ready connection.
	pub async fn probe(&self) -> Result<SystemInfo, Error> {
		self.client().await?.system_info().await
	}

	/// The token of the ready connection.
	pub async fn token(&self) -> Result<TokenInfo, Error> {
		Ok(self.client().await?.token().clone())
	}

	/// The operations offered by the ready connection.
	pub async fn list_categories(&self) -> Result<Vec<OperationCategory>, Error> {
		Ok(catalog::categories(self.client().await?.pallets()))
	}

	/// The storage entries of the ready connection.
	pub async fn list_storage_categories(&self) -> Result<Vec<StorageCategory>, Error> {
		Ok(catalog::storage_categories(self.client().await?.pallets()))
	}

	/// Queries a storage entry, rendering the value as text. `None` means nothing is stored.
	///
	/// # Arguments
	/// * `item` - The storage entry.
	/// * `keys` - One value per key parameter of the entry.
	pub async fn query_storage(
		&self,
		item: &StorageItem,
		keys: Vec<String>,
	) -> Result<Option<String>, Error> {
		let client = self.client().await?;
		let keys = to_values(&item.category, &item.parameters, keys, client.token().decimals)?;
		client.query_storage(&item.pallet, &item.entry, keys).await
	}

	/// The free balance of `address` on the ready connection.
	pub async fn free_balance(&self, address: &str) -> Result<u128, Error> {
		self.client().await?.free_balance(address).await
	}

	/// Submits `operation` over the ready connection, signed by `signer_address`.
	///
	/// See [`submission::submit`].
	pub async fn submit<W: Wallet + ?Sized>(
		&self,
		wallet: &W,
		operation: &Operation,
		parameter_values: Vec<String>,
		signer_address: &str,
	) -> Result<Submission, Error> {
		let client = self.client().await?;
		submission::submit(client.as_ref(), wallet, operation, parameter_values, signer_address)
			.await
	}

	// Waits for the transport of the client `generation` to close. The task does not keep the
	// session alive.
	fn watch(&self, closed: BoxFuture<'static, ()>, generation: u64) {
		let shared = Arc::downgrade(&self.shared);
		tokio::spawn(async move {
			closed.await;
			if let Some(shared) = shared.upgrade() {
				shared.lost(generation).await;
			}
		});
	}

	fn fail(&self, address: &str, error: Error) -> Error {
		log::warn!("Failed to connect to {address}: {error}");
		self.publish(Connection::failed(address, &error));
		error
	}

	fn publish(&self, connection: Connection) {
		self.shared.state.send_replace(connection);
	}
}
