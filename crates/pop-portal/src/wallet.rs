// SPDX-License-Identifier: GPL-3.0

//! Wallet collaborator: account discovery and signature approval.
//!
//! Key custody lives behind the [`Wallet`] and [`Signer`] traits. [`KeyringWallet`] keeps keys
//! derived from secret URIs in memory and asks an approval callback before every signature.

use crate::errors::Error;
use async_trait::async_trait;
use std::{
	fmt::{Debug, Display, Formatter},
	str::FromStr,
	sync::Arc,
};
use subxt::{Config, SubstrateConfig, tx::Signer as TxSigner, utils::AccountId32};
use subxt_signer::{SecretUri, sr25519::Keypair};

/// Name of the source reported by [`KeyringWallet`] accounts.
pub const KEYRING_SOURCE: &str = "keyring";

/// The well-known development accounts.
pub const DEV_ACCOUNTS: [&str; 6] = ["Alice", "Bob", "Charlie", "Dave", "Eve", "Ferdie"];

/// A wallet extension which authorized the application.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extension {
	/// The name of the extension.
	pub name: String,
	/// The version of the extension.
	pub version: String,
}

/// An account exposed by a wallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
	/// The SS58 address of the account.
	pub address: String,
	/// A display name, if the wallet has one.
	pub display_name: Option<String>,
	/// The extension (source) that holds the key.
	pub source: String,
}

impl Display for Account {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.display_name {
			Some(name) => write!(f, "{name} ({})", self.address),
			None => write!(f, "{}", self.address),
		}
	}
}

/// What the user is asked to approve.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureRequest {
	/// The address expected to sign.
	pub address: String,
	/// The operation, as `category.operation`.
	pub operation: String,
	/// The encoded call data.
	pub call_data: Vec<u8>,
}

impl Display for SignatureRequest {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} signed by {}", self.operation, self.address)
	}
}

/// An approved key, able to sign transactions for a single account.
#[derive(Clone)]
pub struct SigningKey(Keypair);

impl SigningKey {
	/// The account the key signs for.
	pub fn account_id(&self) -> AccountId32 {
		<Keypair as TxSigner<SubstrateConfig>>::account_id(&self.0)
	}

	/// The SS58 address of the account.
	pub fn address(&self) -> String {
		self.account_id().to_string()
	}
}

impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("SigningKey").field(&self.address()).finish()
	}
}

impl TxSigner<SubstrateConfig> for SigningKey {
	fn account_id(&self) -> <SubstrateConfig as Config>::AccountId {
		<Keypair as TxSigner<SubstrateConfig>>::account_id(&self.0)
	}

	fn sign(&self, signer_payload: &[u8]) -> <SubstrateConfig as Config>::Signature {
		<Keypair as TxSigner<SubstrateConfig>>::sign(&self.0, signer_payload)
	}
}

/// Produces signing keys, subject to the user's approval.
#[async_trait]
pub trait Signer: Send + Sync {
	/// Requests approval to sign `request`.
	///
	/// Returns [`Error::SignatureRejected`] when the user or wallet declines.
	async fn sign(&self, request: &SignatureRequest) -> Result<SigningKey, Error>;
}

/// A source of accounts and signers.
#[async_trait]
pub trait Wallet: Send + Sync {
	/// Authorizes the application with every available extension.
	///
	/// Fails with [`Error::NoWallet`] when nothing authorized it.
	async fn enable(&mut self, app_name: &str) -> Result<Vec<Extension>, Error>;

	/// Lists the accounts of the authorized extensions.
	async fn accounts(&self) -> Result<Vec<Account>, Error>;

	/// Returns the signer of the extension `source`.
	fn signer(&self, source: &str) -> Result<Box<dyn Signer>, Error>;
}

/// Authorizes the application with `wallet` and lists its accounts.
///
/// # Arguments
/// * `wallet` - The wallet to connect.
/// * `app_name` - The name the application presents itself with.
pub async fn connect_wallet<W: Wallet + ?Sized>(
	wallet: &mut W,
	app_name: &str,
) -> Result<(Vec<Extension>, Vec<Account>), Error> {
	let extensions = wallet.enable(app_name).await?;
	if extensions.is_empty() {
		return Err(Error::NoWallet);
	}
	let accounts = wallet.accounts().await?;
	if accounts.is_empty() {
		return Err(Error::NoAccount);
	}
	log::debug!(
		"{app_name} authorized {}, {} account(s) available",
		extensions.len(),
		accounts.len()
	);
	Ok((extensions, accounts))
}

/// Finds the account with `address` among the wallet's accounts.
pub async fn find_account<W: Wallet + ?Sized>(wallet: &W, address: &str) -> Result<Account, Error> {
	wallet
		.accounts()
		.await?
		.into_iter()
		.find(|account| account.address == address)
		.ok_or_else(|| Error::UnknownSigner(address.to_string()))
}

/// Create a keypair from a secret URI.
///
/// # Arguments
/// `suri` - Secret URI string used to generate the `Keypair`.
pub fn create_keypair(suri: &str) -> Result<Keypair, Error> {
	let uri = SecretUri::from_str(suri).map_err(|e| Error::ParseSecretURI(format!("{}", e)))?;
	Keypair::from_uri(&uri).map_err(|e| Error::KeyPairCreation(format!("{}", e)))
}

type Approval = Arc<dyn Fn(&SignatureRequest) -> bool + Send + Sync>;

struct KeyringEntry {
	account: Account,
	keypair: Keypair,
}

/// An in-memory wallet of keys derived from secret URIs.
pub struct KeyringWallet {
	keys: Arc<Vec<KeyringEntry>>,
	approval: Approval,
	enabled: bool,
}

impl KeyringWallet {
	/// Creates a wallet holding the keys derived from `suris`. Every signature is approved
	/// until [`KeyringWallet::with_approval`] says otherwise.
	///
	/// # Arguments
	/// * `suris` - Pairs of display name and secret URI.
	pub fn new<'a>(suris: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, Error> {
		let keys = suris
			.into_iter()
			.map(|(name, suri)| {
				let keypair = create_keypair(suri)?;
				let address = SigningKey(keypair.clone()).address();
				Ok(KeyringEntry {
					account: Account {
						address,
						display_name: Some(name.to_string()),
						source: KEYRING_SOURCE.to_string(),
					},
					keypair,
				})
			})
			.collect::<Result<Vec<_>, Error>>()?;
		Ok(Self { keys: Arc::new(keys), approval: Arc::new(|_| true), enabled: false })
	}

	/// A wallet holding the development accounts (`//Alice`, `//Bob`, ...).
	pub fn dev() -> Result<Self, Error> {
		let suris: Vec<(String, String)> =
			DEV_ACCOUNTS.iter().map(|name| (name.to_string(), format!("//{name}"))).collect();
		Self::new(suris.iter().map(|(name, suri)| (name.as_str(), suri.as_str())))
	}

	/// Sets the callback deciding whether a signature request is approved.
	pub fn with_approval(
		mut self,
		approval: impl Fn(&SignatureRequest) -> bool + Send + Sync + 'static,
	) -> Self {
		self.approval = Arc::new(approval);
		self
	}
}

#[async_trait]
impl Wallet for KeyringWallet {
	async fn enable(&mut self, app_name: &str) -> Result<Vec<Extension>, Error> {
		if self.keys.is_empty() {
			return Err(Error::NoWallet);
		}
		log::info!("Keyring authorized {app_name}");
		self.enabled = true;
		Ok(vec![Extension {
			name: KEYRING_SOURCE.to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
		}])
	}

	async fn accounts(&self) -> Result<Vec<Account>, Error> {
		if !self.enabled {
			return Err(Error::NoWallet);
		}
		Ok(self.keys.iter().map(|entry| entry.account.clone()).collect())
	}

	fn signer(&self, source: &str) -> Result<Box<dyn Signer>, Error> {
		if !self.enabled || source != KEYRING_SOURCE {
			return Err(Error::NoWallet);
		}
		Ok(Box::new(KeyringSigner { keys: self.keys.clone(), approval: self.approval.clone() }))
	}
}

struct KeyringSigner {
	keys: Arc<Vec<KeyringEntry>>,
	approval: Approval,
}

#[async_trait]
impl Signer for KeyringSigner {
	async fn sign(&self, request: &SignatureRequest) -> Result<SigningKey, Error> {
		let entry = self
			.keys
			.iter()
			.find(|entry| entry.account.address == request.address)
			.ok_or_else(|| Error::UnknownSigner(request.address.clone()))?;
		if !(self.approval)(request) {
			log::info!("Signature request rejected: {request}");
			return Err(Error::SignatureRejected);
		}
		Ok(SigningKey(entry.keypair.clone()))
	}
}
