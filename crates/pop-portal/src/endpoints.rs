// SPDX-License-Identifier: GPL-3.0

use strum::{EnumMessage as _, EnumProperty as _, VariantArray as _};
use strum_macros::{AsRefStr, Display, EnumMessage, EnumProperty, EnumString, VariantArray};

/// Well-known networks offered for selection, together with their RPC endpoints.
#[derive(
	AsRefStr,
	Clone,
	Copy,
	Debug,
	Display,
	EnumMessage,
	EnumProperty,
	EnumString,
	Eq,
	Hash,
	PartialEq,
	VariantArray,
)]
#[strum(ascii_case_insensitive)]
pub enum Network {
	/// A node running on this machine.
	#[strum(
		serialize = "local",
		message = "Local Node",
		props(Url = "ws://127.0.0.1:9944", Public = "false")
	)]
	Local,
	/// Polkadot relay chain.
	#[strum(
		serialize = "polkadot",
		message = "Polkadot",
		props(Url = "wss://rpc.polkadot.io", Public = "true")
	)]
	Polkadot,
	/// Kusama relay chain.
	#[strum(
		serialize = "kusama",
		message = "Kusama",
		props(Url = "wss://kusama-rpc.polkadot.io", Public = "true")
	)]
	Kusama,
	/// Westend test network.
	#[strum(
		serialize = "westend",
		message = "Westend",
		props(Url = "wss://westend-rpc.polkadot.io", Public = "true")
	)]
	Westend,
}

impl Network {
	/// The human readable name of the network.
	pub fn label(&self) -> &'static str {
		self.get_message().unwrap_or_default()
	}

	/// The RPC endpoint of the network.
	pub fn url(&self) -> &'static str {
		self.get_str("Url").unwrap_or_default()
	}

	/// Whether the endpoint is publicly reachable, which makes it eligible for relaying.
	pub fn is_public(&self) -> bool {
		self.get_str("Public") == Some("true")
	}

	/// Looks up the network whose endpoint matches `url`.
	pub fn from_url(url: &str) -> Option<Network> {
		let url = normalize(url);
		Network::VARIANTS.iter().copied().find(|n| n.url() == url)
	}
}

/// Strips surrounding whitespace and a trailing slash so that `wss://host` and `wss://host/`
/// compare equal.
pub fn normalize(endpoint: &str) -> &str {
	let endpoint = endpoint.trim();
	endpoint.strip_suffix('/').unwrap_or(endpoint)
}

/// Endpoints a relay may forward to: the public entries of [`Network`].
pub fn allowed_endpoints() -> Vec<String> {
	Network::VARIANTS
		.iter()
		.filter(|n| n.is_public())
		.map(|n| n.url().to_string())
		.collect()
}

/// Whether `endpoint` is one of the [`allowed_endpoints`].
pub fn is_allowed(endpoint: &str) -> bool {
	let endpoint = normalize(endpoint);
	Network::VARIANTS.iter().any(|n| n.is_public() && n.url() == endpoint)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn network_table_works() {
		assert_eq!(Network::Local.url(), "ws://127.0.0.1:9944");
		assert_eq!(Network::Polkadot.url(), "wss://rpc.polkadot.io");
		assert_eq!(Network::Kusama.url(), "wss://kusama-rpc.polkadot.io");
		assert_eq!(Network::Westend.url(), "wss://westend-rpc.polkadot.io");
		assert_eq!(Network::Local.label(), "Local Node");
		assert_eq!(Network::from_str("Polkadot").ok(), Some(Network::Polkadot));
		assert!(!Network::Local.is_public());
	}

	#[test]
	fn from_url_ignores_trailing_slash() {
		assert_eq!(Network::from_url("wss://rpc.polkadot.io/"), Some(Network::Polkadot));
		assert_eq!(Network::from_url("wss://example.com"), None);
	}

	#[test]
	fn allow_list_contains_only_public_networks() {
		assert_eq!(
			allowed_endpoints(),
			vec![
				"wss://rpc.polkadot.io",
				"wss://kusama-rpc.polkadot.io",
				"wss://westend-rpc.polkadot.io"
			]
		);
		assert!(is_allowed("wss://kusama-rpc.polkadot.io/"));
		assert!(!is_allowed("ws://127.0.0.1:9944"));
		assert!(!is_allowed("wss://evil.example"));
		assert!(!is_allowed(""));
	}
}
