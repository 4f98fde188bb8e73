// SPDX-License-Identifier: GPL-3.0

//! In-memory stand-ins for a node, used by tests.

use crate::{
	client::{
		CallMetadata, CallRequest, ChainClient, Connector, EventRecord, FieldMetadata,
		PalletMetadata, StorageMetadata, SystemInfo, TokenInfo, TransportStatus, TxUpdate,
		TxUpdates, find_storage,
	},
	endpoints::normalize,
	errors::Error,
	wallet::SigningKey,
};
use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use std::{
	pin::Pin,
	str::FromStr,
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicBool, Ordering},
	},
	task::{Context, Poll},
	time::Duration,
};
use subxt::{dynamic::Value, utils::AccountId32};
use url::Url;

/// The Polkadot endpoint.
pub const POLKADOT: &str = "wss://rpc.polkadot.io";
/// The Westend endpoint.
pub const WESTEND: &str = "wss://westend-rpc.polkadot.io";
/// Address of `//Alice`.
pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
/// Address of `//Bob`.
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
/// Free balance reported for every account: 10 units at 12 decimals.
pub const FREE_BALANCE: u128 = 10_000_000_000_000;

#[derive(Default)]
struct State {
	log: Vec<String>,
	transports: Vec<TransportStatus>,
	max_live: usize,
	calls: Vec<CallRequest>,
	submitted_by: Vec<String>,
}

/// A connector handing out [`MockClient`]s and recording what happens to them.
#[derive(Clone)]
pub struct MockConnector {
	state: Arc<Mutex<State>>,
	delay: Duration,
	failing: Vec<String>,
	updates: Vec<Result<TxUpdate, String>>,
	ending: bool,
	unsubscribed: Arc<AtomicBool>,
}

impl Default for MockConnector {
	fn default() -> Self {
		Self {
			state: Arc::default(),
			delay: Duration::ZERO,
			failing: Vec::new(),
			updates: vec![
				Ok(TxUpdate::Submitted { tx_hash: "0x01".into() }),
				Ok(TxUpdate::InBlock { block_hash: "0xb1".into(), events: sample_events() }),
				Ok(TxUpdate::InBlock { block_hash: "0xb1".into(), events: sample_events() }),
				Ok(TxUpdate::Finalized {
					block_hash: "0xb1".into(),
					events: sample_events(),
					failure: None,
				}),
			],
			ending: false,
			unsubscribed: Arc::default(),
		}
	}
}

impl MockConnector {
	/// Delays every connection attempt.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	/// Makes connection attempts to `endpoint` fail.
	pub fn failing(mut self, endpoint: &str) -> Self {
		self.failing.push(normalize(endpoint).to_string());
		self
	}

	/// Sets the updates reported for submitted transactions. Errors are reported as transport
	/// failures.
	pub fn with_updates(mut self, updates: Vec<Result<TxUpdate, String>>) -> Self {
		self.updates = updates;
		self
	}

	/// Ends the update stream after the scripted updates instead of keeping it open.
	pub fn ending(mut self) -> Self {
		self.ending = true;
		self
	}

	/// Connection events, in order, as `connect <endpoint>` and `disconnect <endpoint>`.
	pub fn log(&self) -> Vec<String> {
		self.state().log.clone()
	}

	/// Number of clients whose transport is still open.
	pub fn live(&self) -> usize {
		self.state().transports.iter().filter(|t| t.is_open()).count()
	}

	/// Closes every open transport from the node side, without disconnecting the clients.
	pub fn drop_connections(&self) {
		for transport in &self.state().transports {
			transport.close();
		}
	}

	/// Highest number of clients alive at the same time.
	pub fn max_live(&self) -> usize {
		self.state().max_live
	}

	/// The calls encoded so far.
	pub fn calls(&self) -> Vec<CallRequest> {
		self.state().calls.clone()
	}

	/// The signers of the transactions submitted so far.
	pub fn submitted_by(&self) -> Vec<String> {
		self.state().submitted_by.clone()
	}

	/// Whether the last update stream was dropped.
	pub fn unsubscribed(&self) -> bool {
		self.unsubscribed.load(Ordering::SeqCst)
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[async_trait]
impl Connector for MockConnector {
	type Client = MockClient;

	async fn connect(&self, endpoint: &Url) -> Result<Self::Client, Error> {
		let endpoint_name = normalize(endpoint.as_str()).to_string();
		tokio::time::sleep(self.delay).await;
		if self.failing.contains(&endpoint_name) {
			return Err(Error::Connection {
				endpoint: endpoint_name,
				message: "connection refused".into(),
			});
		}
		let transport = TransportStatus::default();
		let mut state = self.state();
		state.log.push(format!("connect {endpoint_name}"));
		state.transports.push(transport.clone());
		let live = state.transports.iter().filter(|t| t.is_open()).count();
		state.max_live = state.max_live.max(live);
		Ok(MockClient {
			connector: self.clone(),
			endpoint: endpoint.clone(),
			pallets: sample_pallets(),
			token: TokenInfo::default(),
			transport,
		})
	}
}

/// A client backed by a fixed set of pallets. Requests fail once its transport is closed.
pub struct MockClient {
	connector: MockConnector,
	endpoint: Url,
	pallets: Vec<PalletMetadata>,
	token: TokenInfo,
	transport: TransportStatus,
}

impl MockClient {
	fn ensure_open(&self) -> Result<(), Error> {
		if self.transport.is_open() {
			return Ok(());
		}
		Err(Error::Connection {
			endpoint: normalize(self.endpoint.as_str()).to_string(),
			message: "connection closed".into(),
		})
	}
}

impl Drop for MockClient {
	fn drop(&mut self) {
		self.transport.close();
	}
}

#[async_trait]
impl ChainClient for MockClient {
	fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	fn pallets(&self) -> &[PalletMetadata] {
		&self.pallets
	}

	fn token(&self) -> &TokenInfo {
		&self.token
	}

	fn transport(&self) -> &TransportStatus {
		&self.transport
	}

	fn encode_call(&self, call: &CallRequest) -> Result<Vec<u8>, Error> {
		let (pallet, fields) = self
			.pallets
			.iter()
			.find(|p| p.name == call.pallet)
			.and_then(|p| {
				p.calls.iter().find(|c| c.name == call.call).map(|c| (p, c.fields.clone()))
			})
			.ok_or_else(|| {
				Error::Construction(format!("{}.{} does not exist", call.pallet, call.call))
			})?;
		let expected = fields.map(|f| f.len()).unwrap_or_default();
		if expected != call.args.len() {
			return Err(Error::Construction(format!(
				"expected {expected} arguments, got {}",
				call.args.len()
			)));
		}
		self.connector.state().calls.push(call.clone());
		Ok(vec![pallet.index, call.args.len() as u8])
	}

	async fn system_info(&self) -> Result<SystemInfo, Error> {
		self.ensure_open()?;
		Ok(SystemInfo {
			chain: "Development".into(),
			node_name: "Mock Node".into(),
			node_version: "1.0.0".into(),
		})
	}

	async fn submit(&self, _call_data: Vec<u8>, signer: SigningKey) -> Result<TxUpdates, Error> {
		self.ensure_open()?;
		self.connector.state().submitted_by.push(signer.address());
		let scripted = stream::iter(
			self.connector
				.updates
				.clone()
				.into_iter()
				.map(|update| update.map_err(Error::Submission))
				.collect::<Vec<_>>(),
		);
		let updates = if self.connector.ending {
			scripted.boxed()
		} else {
			scripted.chain(stream::pending()).boxed()
		};
		self.connector.unsubscribed.store(false, Ordering::SeqCst);
		Ok(TrackedStream { inner: updates, dropped: self.connector.unsubscribed.clone() }.boxed())
	}

	async fn query_storage(
		&self,
		pallet: &str,
		entry: &str,
		keys: Vec<Value>,
	) -> Result<Option<String>, Error> {
		self.ensure_open()?;
		let item = find_storage(&self.pallets, pallet, entry)
			.ok_or_else(|| Error::Storage(format!("{pallet}.{entry} does not exist")))?;
		if keys.len() != item.key_types.len() {
			return Err(Error::Storage(format!(
				"{pallet}.{entry} takes {} keys, got {}",
				item.key_types.len(),
				keys.len()
			)));
		}
		Ok(match (pallet, entry) {
			("System", "Account") => Some(format!("{{ data: {{ free: {FREE_BALANCE} }} }}")),
			("System", "Number") => Some("42".into()),
			// Nothing else is stored.
			_ if item.has_default => Some(default_value(&item.value_type).into()),
			_ => None,
		})
	}

	async fn free_balance(&self, address: &str) -> Result<u128, Error> {
		self.ensure_open()?;
		AccountId32::from_str(address).map_err(|e| Error::InvalidAddress(e.to_string()))?;
		Ok(FREE_BALANCE)
	}

	async fn disconnect(&self) {
		let mut state = self.connector.state();
		state.log.push(format!("disconnect {}", normalize(self.endpoint.as_str())));
		self.transport.close();
	}
}

// How an empty entry with a default value renders.
fn default_value(value_type: &str) -> &'static str {
	if value_type.starts_with("Vec<") { "()" } else { "0" }
}

// Flags when the subscription is dropped.
struct TrackedStream {
	inner: TxUpdates,
	dropped: Arc<AtomicBool>,
}

impl Stream for TrackedStream {
	type Item = Result<TxUpdate, Error>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.inner.poll_next_unpin(cx)
	}
}

impl Drop for TrackedStream {
	fn drop(&mut self) {
		self.dropped.store(true, Ordering::SeqCst);
	}
}

/// The events of a successful transfer.
pub fn sample_events() -> Vec<EventRecord> {
	let event = |category: &str, name: &str, data: &str| EventRecord {
		category: category.into(),
		name: name.into(),
		data: data.into(),
	};
	vec![
		event("balances", "Withdraw", "{ who: 5Grw.., amount: 1 }"),
		event("balances", "Transfer", "{ from: 5Grw.., to: 5FHn.., amount: 1500000000000 }"),
		event("system", "ExtrinsicSuccess", "{ dispatch_info: .. }"),
	]
}

/// Pallets resembling a development chain.
pub fn sample_pallets() -> Vec<PalletMetadata> {
	let field = |name: &str, type_name: &str| FieldMetadata {
		name: Some(name.into()),
		type_name: type_name.into(),
		is_optional: false,
	};
	let call = |name: &str, fields: Vec<FieldMetadata>| CallMetadata {
		name: name.into(),
		docs: String::new(),
		fields: Some(fields),
	};
	let transfer = || vec![field("dest", "MultiAddress"), field("value", "Compact<Balance>")];
	vec![
		PalletMetadata {
			name: "System".into(),
			index: 0,
			calls: vec![call("remark", vec![field("remark", "Bytes")])],
			storage: vec![
				StorageMetadata {
					name: "Account".into(),
					key_types: vec!["AccountId32".into()],
					value_type: "AccountInfo".into(),
					has_default: true,
					..Default::default()
				},
				StorageMetadata {
					name: "Number".into(),
					value_type: "u32".into(),
					has_default: true,
					..Default::default()
				},
			],
			..Default::default()
		},
		PalletMetadata {
			name: "Timestamp".into(),
			index: 3,
			calls: vec![call("set", vec![field("now", "Compact<u64>")])],
			..Default::default()
		},
		PalletMetadata {
			name: "Balances".into(),
			index: 5,
			calls: vec![
				call("transfer_allow_death", transfer()),
				call("transfer_keep_alive", transfer()),
				call(
					"transfer_all",
					vec![field("dest", "MultiAddress"), field("keep_alive", "bool")],
				),
			],
			..Default::default()
		},
		PalletMetadata {
			name: "Staking".into(),
			index: 7,
			calls: vec![call("chill", vec![])],
			storage: vec![
				StorageMetadata {
					name: "Bonded".into(),
					key_types: vec!["AccountId32".into()],
					value_type: "AccountId32".into(),
					..Default::default()
				},
				StorageMetadata {
					name: "ClaimedRewards".into(),
					key_types: vec!["u32".into(), "AccountId32".into()],
					value_type: "Vec<u32>".into(),
					has_default: true,
					..Default::default()
				},
				StorageMetadata {
					name: "ValidatorCount".into(),
					value_type: "u32".into(),
					has_default: true,
					..Default::default()
				},
			],
			..Default::default()
		},
		PalletMetadata {
			name: "Council".into(),
			index: 14,
			calls: vec![call("close", vec![field("proposal_hash", "H256")])],
			..Default::default()
		},
		PalletMetadata {
			name: "Sudo".into(),
			index: 20,
			calls: vec![call("sudo", vec![field("call", "Call")])],
			..Default::default()
		},
	]
}
