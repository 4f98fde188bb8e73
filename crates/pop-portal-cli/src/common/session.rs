// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::traits::*,
	style::{format_state, format_url},
};
use anyhow::Result;
use clap::Args;
use pop_portal::{Connector, Network, OnlineConnector, PortalConfig, Preferences, Session};
use std::{str::FromStr, time::Duration};
use strum::VariantArray;

pub(crate) const SELECT_ENDPOINT: &str = "Select the network to connect to (type to filter)";
pub(crate) const ENTER_ENDPOINT: &str = "Enter the WebSocket endpoint of the node:";

/// Options shared by every command talking to a node.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct SessionArgs {
	/// Websocket endpoint of a node, or one of the networks local, polkadot, kusama and westend.
	/// Defaults to the endpoint used last.
	#[arg(short, long)]
	pub(crate) url: Option<String>,
	/// Seconds to wait for the connection to be established.
	#[arg(long, value_name = "SECONDS")]
	pub(crate) timeout: Option<u64>,
}

impl SessionArgs {
	/// The endpoint to connect to, with network names resolved to their endpoints.
	pub(crate) fn endpoint(&self) -> Option<String> {
		self.url.as_deref().map(|url| match Network::from_str(url.trim()) {
			Ok(network) => network.url().to_string(),
			Err(_) => url.to_string(),
		})
	}

	pub(crate) fn config(&self) -> PortalConfig {
		let config = PortalConfig::default();
		match self.timeout {
			Some(seconds) => config.with_connect_timeout(Duration::from_secs(seconds)),
			None => config,
		}
	}

	/// Opens a session to live nodes, backed by the persisted preferences.
	pub(crate) fn open(&self) -> Result<Session<OnlineConnector>> {
		let config = self.config();
		let preferences = Preferences::load(&config.preferences_path)?;
		Ok(Session::new(OnlineConnector, config, preferences))
	}
}

/// Prompts for one of the well-known networks, or an endpoint typed by the user.
///
/// # Arguments
/// * `current` - The endpoint used last, preselected when it is a well-known network.
/// * `cli` - The command line interface.
pub(crate) fn prompt_for_endpoint(current: Option<&str>, cli: &mut impl Cli) -> Result<String> {
	let mut prompt = cli.select(SELECT_ENDPOINT);
	for network in Network::VARIANTS {
		prompt = prompt.item(Some(*network), network.label(), network.url());
	}
	prompt = prompt.item(None, "Custom", "Type the endpoint manually");
	if let Some(network) = current.and_then(Network::from_url) {
		prompt = prompt.initial_value(Some(network));
	}
	let selection = prompt.filter_mode().interact()?;
	match selection {
		Some(network) => Ok(network.url().to_string()),
		None => Ok(cli
			.input(ENTER_ENDPOINT)
			.default_input(current.unwrap_or(Network::Local.url()))
			.placeholder(Network::Local.url())
			.required(true)
			.interact()?),
	}
}

/// Connects `session` to `url`, otherwise to the endpoint used last. The user picks an endpoint
/// when there is neither.
pub(crate) async fn connect<C: Connector>(
	session: &Session<C>,
	url: Option<&str>,
	cli: &mut impl Cli,
) -> Result<()> {
	let address = match url {
		Some(url) => url.to_string(),
		None => match session.initial_endpoint().await {
			Some(endpoint) => endpoint,
			None => prompt_for_endpoint(None, cli)?,
		},
	};
	let spinner = cli.spinner();
	spinner.start(&format!("Connecting to {address}..."));
	if let Err(e) = session.connect(&address).await {
		spinner.error(&format_state(session.connection().state));
		return Err(e.into());
	}
	spinner.stop(&format!("{} {}", format_state(session.connection().state), format_url(&address)));
	Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::cli::MockCli;
	use pop_portal::{
		ConnectionState,
		testing::{MockConnector, POLKADOT, WESTEND},
	};

	pub(crate) fn networks() -> Vec<(String, String)> {
		let mut items: Vec<_> = Network::VARIANTS
			.iter()
			.map(|n| (n.label().to_string(), n.url().to_string()))
			.collect();
		items.push(("Custom".into(), "Type the endpoint manually".into()));
		items
	}

	fn session(connector: &MockConnector) -> Session<MockConnector> {
		Session::new(connector.clone(), PortalConfig::default(), Preferences::in_memory())
	}

	#[test]
	fn session_args_resolve_network_names() {
		let args = |url: &str| SessionArgs { url: Some(url.into()), ..Default::default() };
		assert_eq!(args("Polkadot").endpoint().as_deref(), Some(POLKADOT));
		assert_eq!(args("westend").endpoint().as_deref(), Some(WESTEND));
		assert_eq!(args("ws://10.0.0.1:9944").endpoint().as_deref(), Some("ws://10.0.0.1:9944"));
		assert_eq!(SessionArgs::default().endpoint(), None);
	}

	#[test]
	fn session_args_configure_the_timeout() {
		assert_eq!(SessionArgs::default().config(), PortalConfig::default());
		let args = SessionArgs { timeout: Some(3), ..Default::default() };
		assert_eq!(args.config().connect_timeout, Duration::from_secs(3));
	}

	#[test]
	fn prompt_for_endpoint_works() -> Result<()> {
		// Polkadot is the second network offered.
		let mut cli = MockCli::new().expect_select(SELECT_ENDPOINT, Some(networks()), 1);
		assert_eq!(prompt_for_endpoint(None, &mut cli)?, POLKADOT);
		cli.verify()?;

		let mut cli = MockCli::new()
			.expect_select(SELECT_ENDPOINT, Some(networks()), Network::VARIANTS.len())
			.expect_input(ENTER_ENDPOINT, "ws://10.0.0.1:9944");
		assert_eq!(prompt_for_endpoint(Some(WESTEND), &mut cli)?, "ws://10.0.0.1:9944");
		cli.verify()
	}

	#[tokio::test]
	async fn connect_prefers_the_given_url() -> Result<()> {
		let connector = MockConnector::default();
		let session = session(&connector);
		let mut cli = MockCli::new();
		connect(&session, Some(WESTEND), &mut cli).await?;
		assert_eq!(session.connection().target_address, WESTEND);
		assert_eq!(session.connection().state, ConnectionState::Ready);
		// The endpoint used last is reused.
		connect(&session, None, &mut cli).await?;
		assert_eq!(connector.log(), vec![format!("connect {WESTEND}")]);
		cli.verify()
	}

	#[tokio::test]
	async fn connect_reports_failures() -> Result<()> {
		let connector = MockConnector::default().failing(POLKADOT);
		let session = session(&connector);
		let mut cli = MockCli::new();
		assert!(connect(&session, Some(POLKADOT), &mut cli).await.is_err());
		assert_eq!(session.connection().state, ConnectionState::Error);
		cli.verify()
	}
}
