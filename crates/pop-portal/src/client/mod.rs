// SPDX-License-Identifier: GPL-3.0

//! Abstractions over a node connection.
//!
//! [`Connector`] establishes connections and [`ChainClient`] is everything the rest of the crate
//! needs from a live one. The production implementation, backed by `subxt`, lives in [`online`]
//! and the in-memory one used by tests in `testing`.

use crate::{errors::Error, wallet::SigningKey};
use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture, stream::BoxStream};
use std::{
	fmt::{Display, Formatter},
	sync::Arc,
};
use subxt::dynamic::Value;
use tokio::sync::watch;
use url::Url;

pub mod metadata;
pub mod online;

pub use metadata::{CallMetadata, FieldMetadata, PalletMetadata, StorageMetadata, find_storage};

/// Token decimals assumed when the node does not report any.
pub const DEFAULT_DECIMALS: u8 = 12;
/// Token symbol assumed when the node does not report any.
pub const DEFAULT_SYMBOL: &str = "UNIT";

/// Identity of the node and chain behind a connection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SystemInfo {
	/// The chain name, e.g. `Polkadot`.
	pub chain: String,
	/// The node implementation name.
	pub node_name: String,
	/// The node implementation version.
	pub node_version: String,
}

impl Display for SystemInfo {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let Self { chain, node_name, node_version } = self;
		write!(f, "Connected to chain {chain} using {node_name} v{node_version}")
	}
}

/// The native token of a chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenInfo {
	/// The token symbol.
	pub symbol: String,
	/// The number of decimals of the token.
	pub decimals: u8,
}

impl Default for TokenInfo {
	fn default() -> Self {
		Self { symbol: DEFAULT_SYMBOL.to_string(), decimals: DEFAULT_DECIMALS }
	}
}

impl TokenInfo {
	/// Reads the token from the `system_properties` reported by a node. Properties may hold a
	/// single value or, on multi-token chains, an array whose first entry is the native token.
	pub fn from_properties(properties: &serde_json::Map<String, serde_json::Value>) -> Self {
		fn first(value: Option<&serde_json::Value>) -> Option<&serde_json::Value> {
			match value? {
				serde_json::Value::Array(values) => values.first(),
				value => Some(value),
			}
		}
		let decimals = first(properties.get("tokenDecimals"))
			.and_then(|v| v.as_u64())
			.and_then(|v| u8::try_from(v).ok())
			.unwrap_or(DEFAULT_DECIMALS);
		let symbol = first(properties.get("tokenSymbol"))
			.and_then(|v| v.as_str())
			.unwrap_or(DEFAULT_SYMBOL)
			.to_string();
		Self { symbol, decimals }
	}
}

/// A call ready to be encoded against the chain metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRequest {
	/// The raw pallet name, e.g. `Balances`.
	pub pallet: String,
	/// The raw call name, e.g. `transfer_keep_alive`.
	pub call: String,
	/// The call arguments, in declaration order.
	pub args: Vec<Value>,
}

/// An event emitted while applying a transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventRecord {
	/// The category (lower camel case pallet name) emitting the event.
	pub category: String,
	/// The event name.
	pub name: String,
	/// The event fields, rendered as text.
	pub data: String,
}

impl EventRecord {
	/// Whether this is the routine `System.ExtrinsicSuccess` event, which carries no information
	/// for the user.
	pub fn is_extrinsic_success(&self) -> bool {
		self.category.eq_ignore_ascii_case("system") && self.name == "ExtrinsicSuccess"
	}
}

impl Display for EventRecord {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.category, self.name)?;
		if !self.data.is_empty() {
			write!(f, " {}", self.data)?;
		}
		Ok(())
	}
}

/// A runtime error reported when dispatching a transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchFailure {
	/// A module error decoded from metadata.
	Module {
		/// The category (lower camel case pallet name) reporting the error.
		category: String,
		/// The error name.
		name: String,
	},
	/// Any other error, as reported by the node.
	Other(String),
}

impl Display for DispatchFailure {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			DispatchFailure::Module { category, name } => write!(f, "{category}.{name}"),
			DispatchFailure::Other(message) => write!(f, "{message}"),
		}
	}
}

impl From<DispatchFailure> for Error {
	fn from(failure: DispatchFailure) -> Self {
		match failure {
			DispatchFailure::Module { category, name } => Error::Dispatch { category, name },
			DispatchFailure::Other(message) => Error::DispatchRaw(message),
		}
	}
}

/// Progress of a submitted transaction as reported by the node.
#[derive(Clone, Debug, PartialEq)]
pub enum TxUpdate {
	/// The transaction was accepted into the pool.
	Submitted {
		/// Hash of the transaction.
		tx_hash: String,
	},
	/// The transaction was included in a block.
	InBlock {
		/// Hash of the including block.
		block_hash: String,
		/// Events emitted by the transaction.
		events: Vec<EventRecord>,
	},
	/// The block including the transaction was finalized.
	Finalized {
		/// Hash of the finalized block.
		block_hash: String,
		/// Events emitted by the transaction.
		events: Vec<EventRecord>,
		/// The dispatch error, if the transaction failed.
		failure: Option<DispatchFailure>,
	},
	/// The node will not include the transaction.
	Dropped(String),
}

/// A stream of transaction updates. Dropping it unsubscribes.
pub type TxUpdates = BoxStream<'static, Result<TxUpdate, Error>>;

/// Whether the transport of a client is open. Shared by every handle to the client, it closes
/// when either side ends the connection.
#[derive(Clone, Debug)]
pub struct TransportStatus(Arc<watch::Sender<bool>>);

impl Default for TransportStatus {
	fn default() -> Self {
		Self(Arc::new(watch::channel(true).0))
	}
}

impl TransportStatus {
	/// Whether the transport is open.
	pub fn is_open(&self) -> bool {
		*self.0.borrow()
	}

	/// Marks the transport as closed. Returns whether it was open.
	pub fn close(&self) -> bool {
		self.0.send_replace(false)
	}

	/// Resolves once the transport is closed.
	pub fn closed(&self) -> BoxFuture<'static, ()> {
		let mut open = self.0.subscribe();
		async move {
			// The sender lives as long as this status, so an error only means it is gone.
			let _ = open.wait_for(|open| !*open).await;
		}
		.boxed()
	}
}

/// A live connection to a node.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
	/// The endpoint the client is connected to.
	fn endpoint(&self) -> &Url;

	/// The pallets exposed by the runtime metadata, in runtime order.
	fn pallets(&self) -> &[PalletMetadata];

	/// The chain's native token.
	fn token(&self) -> &TokenInfo;

	/// The state of the underlying transport.
	fn transport(&self) -> &TransportStatus;

	/// Encodes `call` against the runtime metadata.
	fn encode_call(&self, call: &CallRequest) -> Result<Vec<u8>, Error>;

	/// Queries the identity of the node.
	async fn system_info(&self) -> Result<SystemInfo, Error>;

	/// Signs `call_data` with `signer`, submits it and follows its progress.
	async fn submit(&self, call_data: Vec<u8>, signer: SigningKey) -> Result<TxUpdates, Error>;

	/// Fetches a storage value at the latest block, rendered as text. Entries declaring a default
	/// value report it when nothing is stored, others report `None`.
	async fn query_storage(
		&self,
		pallet: &str,
		entry: &str,
		keys: Vec<Value>,
	) -> Result<Option<String>, Error>;

	/// Fetches the free balance of `address`.
	async fn free_balance(&self, address: &str) -> Result<u128, Error>;

	/// Closes the underlying transport. Requests through any handle to the client fail from then
	/// on.
	async fn disconnect(&self);
}

/// Establishes connections to nodes.
#[async_trait]
pub trait Connector: Send + Sync {
	/// The client produced by this connector.
	type Client: ChainClient;

	/// Connects to the node at `endpoint`.
	async fn connect(&self, endpoint: &Url) -> Result<Self::Client, Error>;
}
