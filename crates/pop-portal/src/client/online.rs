// SPDX-License-Identifier: GPL-3.0

//! Node connections backed by `subxt`.

use super::{
	CallRequest, ChainClient, Connector, DispatchFailure, EventRecord, PalletMetadata, SystemInfo,
	TokenInfo, TransportStatus, TxUpdate, TxUpdates,
	metadata::{find_storage, parse_metadata},
};
use crate::{errors::Error, wallet::SigningKey};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use heck::ToLowerCamelCase;
use scale_value::{At, Composite, ValueDef};
use serde_json::value::RawValue;
use std::{
	io::{self, ErrorKind},
	str::FromStr,
	sync::{Arc, RwLock},
};
use subxt::{
	OnlineClient, SubstrateConfig,
	backend::legacy::LegacyRpcMethods,
	blocks::ExtrinsicEvents,
	dynamic::Value,
	error::DispatchError,
	ext::subxt_rpcs::{
		Error as RpcError,
		client::{RawRpcFuture, RawRpcSubscription, RpcClient, RpcClientT},
	},
	tx::{Payload, TxStatus},
	utils::AccountId32,
};
use url::Url;

/// Connects to nodes over their JSON-RPC WebSocket endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnlineConnector;

#[async_trait]
impl Connector for OnlineConnector {
	type Client = OnlineChainClient;

	async fn connect(&self, endpoint: &Url) -> Result<Self::Client, Error> {
		OnlineChainClient::connect(endpoint).await
	}
}

/// The RPC connection to a node.
///
/// Every `subxt` handle talks to the node through it, so [`Transport::close`] drops the
/// WebSocket client even while those handles are alive. Their requests fail from then on.
#[derive(Clone)]
struct Transport {
	rpc: Arc<RwLock<Option<RpcClient>>>,
	status: TransportStatus,
}

impl Transport {
	fn new(rpc: RpcClient) -> Self {
		Self { rpc: Arc::new(RwLock::new(Some(rpc))), status: TransportStatus::default() }
	}

	fn rpc(&self) -> Result<RpcClient, RpcError> {
		self.rpc
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
			.ok_or_else(|| RpcError::Client(Box::new(io::Error::from(ErrorKind::NotConnected))))
	}

	fn close(&self) {
		self.rpc.write().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
		self.status.close();
	}
}

impl RpcClientT for Transport {
	fn request_raw<'a>(
		&'a self,
		method: &'a str,
		params: Option<Box<RawValue>>,
	) -> RawRpcFuture<'a, Box<RawValue>> {
		Box::pin(async move {
			let rpc = self.rpc()?;
			rpc.request_raw(method, params).await
		})
	}

	fn subscribe_raw<'a>(
		&'a self,
		sub: &'a str,
		params: Option<Box<RawValue>>,
		unsub: &'a str,
	) -> RawRpcFuture<'a, RawRpcSubscription> {
		Box::pin(async move {
			let rpc = self.rpc()?;
			rpc.subscribe_raw(sub, params, unsub).await
		})
	}
}

// Closes the transport once the node stops reporting finalized blocks, which happens when the
// connection is lost.
async fn watch_transport(legacy: LegacyRpcMethods<SubstrateConfig>, transport: Transport) {
	let mut heads = match legacy.chain_subscribe_finalized_heads().await {
		Ok(heads) => heads,
		Err(e) => {
			log::debug!("Not watching the connection: {e}");
			return;
		},
	};
	while let Some(Ok(_)) = heads.next().await {}
	if transport.status.is_open() {
		log::warn!("The node closed the connection");
		transport.close();
	}
}

/// A live connection to a node.
///
/// The metadata is parsed once on connection. [`ChainClient::disconnect`], or dropping the
/// client, closes the transport shared by every `subxt` handle.
pub struct OnlineChainClient {
	client: OnlineClient<SubstrateConfig>,
	legacy: LegacyRpcMethods<SubstrateConfig>,
	transport: Transport,
	endpoint: Url,
	pallets: Vec<PalletMetadata>,
	token: TokenInfo,
}

impl OnlineChainClient {
	/// Connects to the node at `endpoint` and reads its metadata and token properties.
	///
	/// # Arguments
	/// * `endpoint` - WebSocket URL of the node (e.g., `wss://rpc.polkadot.io`).
	pub async fn connect(endpoint: &Url) -> Result<Self, Error> {
		let failure =
			|message: String| Error::Connection { endpoint: endpoint.to_string(), message };
		let rpc = RpcClient::from_url(endpoint.as_str())
			.await
			.map_err(|e| failure(e.to_string()))?;
		let transport = Transport::new(rpc);
		let rpc = RpcClient::new(transport.clone());
		let client = OnlineClient::<SubstrateConfig>::from_rpc_client(rpc.clone())
			.await
			.map_err(|e| failure(e.to_string()))?;
		let legacy = LegacyRpcMethods::<SubstrateConfig>::new(rpc.clone());
		tokio::spawn(watch_transport(LegacyRpcMethods::new(rpc), transport.clone()));
		let token = match legacy.system_properties().await {
			Ok(properties) => TokenInfo::from_properties(&properties),
			Err(e) => {
				log::warn!("Failed to read the token properties of {endpoint}: {e}");
				TokenInfo::default()
			},
		};
		let pallets = parse_metadata(&client.metadata());
		log::info!("Connected to {endpoint}: {} pallets, token {}", pallets.len(), token.symbol);
		Ok(Self { client, legacy, transport, endpoint: endpoint.clone(), pallets, token })
	}
}

impl Drop for OnlineChainClient {
	fn drop(&mut self) {
		self.transport.close();
	}
}

#[async_trait]
impl ChainClient for OnlineChainClient {
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
		&self.transport.status
	}

	fn encode_call(&self, call: &CallRequest) -> Result<Vec<u8>, Error> {
		let xt = subxt::dynamic::tx(call.pallet.clone(), call.call.clone(), call.args.clone());
		xt.encode_call_data(&self.client.metadata())
			.map_err(|e| Error::Construction(e.to_string()))
	}

	async fn system_info(&self) -> Result<SystemInfo, Error> {
		let (chain, node_name, node_version) = tokio::try_join!(
			self.legacy.system_chain(),
			self.legacy.system_name(),
			self.legacy.system_version()
		)
		.map_err(|e| Error::Connection {
			endpoint: self.endpoint.to_string(),
			message: e.to_string(),
		})?;
		Ok(SystemInfo { chain, node_name, node_version })
	}

	async fn submit(&self, call_data: Vec<u8>, signer: SigningKey) -> Result<TxUpdates, Error> {
		let progress = self
			.client
			.tx()
			.sign_and_submit_then_watch_default(&CallData::new(call_data), &signer)
			.await
			.map_err(|e| Error::Submission(e.to_string()))?;
		let tx_hash = format!("{:?}", progress.extrinsic_hash());
		log::info!("Submitted {tx_hash} signed by {}", signer.address());
		let updates = progress.filter_map(|status| async move {
			match status {
				Ok(TxStatus::InBestBlock(in_block)) => {
					let block_hash = format!("{:?}", in_block.block_hash());
					let events = match in_block.fetch_events().await {
						Ok(events) => to_records(&events),
						Err(e) => return Some(Err(Error::Submission(e.to_string()))),
					};
					Some(Ok(TxUpdate::InBlock { block_hash, events }))
				},
				Ok(TxStatus::InFinalizedBlock(in_block)) => {
					let block_hash = format!("{:?}", in_block.block_hash());
					Some(match in_block.wait_for_success().await {
						Ok(events) => Ok(TxUpdate::Finalized {
							block_hash,
							events: to_records(&events),
							failure: None,
						}),
						Err(subxt::Error::Runtime(error)) => Ok(TxUpdate::Finalized {
							block_hash,
							events: Vec::new(),
							failure: Some(to_failure(error)),
						}),
						Err(e) => Err(Error::Submission(e.to_string())),
					})
				},
				Ok(TxStatus::Error { message }) |
				Ok(TxStatus::Invalid { message }) |
				Ok(TxStatus::Dropped { message }) => Some(Ok(TxUpdate::Dropped(message))),
				Ok(_) => None,
				Err(e) => Some(Err(Error::Submission(e.to_string()))),
			}
		});
		Ok(stream::once(async move { Ok(TxUpdate::Submitted { tx_hash }) }).chain(updates).boxed())
	}

	async fn query_storage(
		&self,
		pallet: &str,
		entry: &str,
		keys: Vec<Value>,
	) -> Result<Option<String>, Error> {
		let has_default = find_storage(&self.pallets, pallet, entry)
			.ok_or_else(|| Error::Storage(format!("{pallet}.{entry} does not exist")))?
			.has_default;
		let address = subxt::dynamic::storage(pallet, entry, keys);
		let storage = self
			.client
			.storage()
			.at_latest()
			.await
			.map_err(|e| Error::Storage(e.to_string()))?;
		let value = if has_default {
			storage.fetch_or_default(&address).await.map(Some)
		} else {
			storage.fetch(&address).await
		}
		.map_err(|e| Error::Storage(e.to_string()))?;
		value
			.map(|thunk| thunk.to_value().map(|v| v.to_string()))
			.transpose()
			.map_err(|e| Error::Storage(e.to_string()))
	}

	async fn free_balance(&self, address: &str) -> Result<u128, Error> {
		let account =
			AccountId32::from_str(address).map_err(|e| Error::InvalidAddress(e.to_string()))?;
		let address =
			subxt::dynamic::storage("System", "Account", vec![Value::from_bytes(account.0)]);
		let Some(info) = self
			.client
			.storage()
			.at_latest()
			.await
			.map_err(|e| Error::Storage(e.to_string()))?
			.fetch(&address)
			.await
			.map_err(|e| Error::Storage(e.to_string()))?
		else {
			// Accounts without state have no balance.
			return Ok(0);
		};
		let info = info.to_value().map_err(|e| Error::Storage(e.to_string()))?;
		info.at("data")
			.at("free")
			.and_then(|free| free.as_u128())
			.ok_or_else(|| Error::Storage("unexpected account data layout".to_string()))
	}

	async fn disconnect(&self) {
		log::debug!("Closing the connection to {}", self.endpoint);
		self.transport.close();
	}
}

fn to_records(events: &ExtrinsicEvents<SubstrateConfig>) -> Vec<EventRecord> {
	events
		.iter()
		.filter_map(|event| {
			let event = event.ok()?;
			let data = event
				.field_values()
				.map(render_fields)
				.unwrap_or_default();
			Some(EventRecord {
				category: event.pallet_name().to_lower_camel_case(),
				name: event.variant_name().to_string(),
				data,
			})
		})
		.collect()
}

fn render_fields(fields: Composite<u32>) -> String {
	scale_value::Value { value: ValueDef::Composite(fields), context: 0u32 }.to_string()
}

fn to_failure(error: DispatchError) -> DispatchFailure {
	if let DispatchError::Module(module_error) = &error &&
		let Ok(details) = module_error.details()
	{
		return DispatchFailure::Module {
			category: details.pallet.name().to_lower_camel_case(),
			name: details.variant.name.clone(),
		};
	}
	DispatchFailure::Other(error.to_string())
}

/// This struct implements the [`Payload`] trait and is used to submit
/// pre-encoded SCALE call data directly, without the dynamic construction of transactions.
pub struct CallData(Vec<u8>);

impl CallData {
	/// Create a new instance of `CallData`.
	pub fn new(data: Vec<u8>) -> CallData {
		CallData(data)
	}
}

impl Payload for CallData {
	fn encode_call_data_to(
		&self,
		_: &subxt::Metadata,
		out: &mut Vec<u8>,
	) -> Result<(), subxt::ext::subxt_core::Error> {
		out.extend_from_slice(&self.0);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicBool, Ordering};
	use subxt::ext::subxt_rpcs::client::RpcParams;

	// Answers every request with the chain name and flags when it is dropped.
	struct Node(Arc<AtomicBool>);

	impl Drop for Node {
		fn drop(&mut self) {
			self.0.store(true, Ordering::SeqCst);
		}
	}

	impl RpcClientT for Node {
		fn request_raw<'a>(
			&'a self,
			_method: &'a str,
			_params: Option<Box<RawValue>>,
		) -> RawRpcFuture<'a, Box<RawValue>> {
			Box::pin(async { Ok(RawValue::from_string("\"Development\"".to_string()).unwrap()) })
		}

		fn subscribe_raw<'a>(
			&'a self,
			_sub: &'a str,
			_params: Option<Box<RawValue>>,
			_unsub: &'a str,
		) -> RawRpcFuture<'a, RawRpcSubscription> {
			Box::pin(async { Err(RpcError::Client(Box::new(io::Error::from(ErrorKind::NotConnected)))) })
		}
	}

	#[tokio::test]
	async fn closing_the_transport_drops_the_connection() -> anyhow::Result<()> {
		let dropped = Arc::new(AtomicBool::new(false));
		let transport = Transport::new(RpcClient::new(Node(dropped.clone())));
		let handle = RpcClient::new(transport.clone());
		let chain: String = handle.request("system_chain", RpcParams::new()).await?;
		assert_eq!(chain, "Development");

		transport.close();
		assert!(dropped.load(Ordering::SeqCst));
		assert!(!transport.status.is_open());
		assert!(handle.request::<String>("system_chain", RpcParams::new()).await.is_err());
		Ok(())
	}

	#[test]
	fn render_fields_works() {
		let fields = Composite::Named(vec![
			("from".to_string(), Value::u128(1).map_context(|_| 0u32)),
			("amount".to_string(), Value::u128(5).map_context(|_| 0u32)),
		]);
		let rendered = render_fields(fields);
		assert!(rendered.contains("from"));
		assert!(rendered.contains("amount"));
	}
}
