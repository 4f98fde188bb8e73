// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::{self, traits::*},
	style::format_url,
};
use anyhow::Result;
use clap::Args;
use pop_relay::{
	DEFAULT_BIND, DEFAULT_CONNECT_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, Relay, RelayConfig,
	WebSocketUpstream, serve,
};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;

/// Serves the relay: browsers post a JSON-RPC payload together with the endpoint of a
/// well-known network, and receive the first message the node answers with.
#[derive(Args, Clone, Debug)]
pub(crate) struct RelayCommand {
	/// The address to listen on.
	#[arg(short, long, default_value_t = DEFAULT_BIND)]
	bind: SocketAddr,
	/// Seconds to wait for the connection to the node.
	#[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
	connect_timeout: u64,
	/// Seconds to wait for the answer of the node.
	#[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_RESPONSE_TIMEOUT.as_secs())]
	response_timeout: u64,
}

impl RelayCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		let mut cli = cli::Cli;
		cli.intro("Relay")?;
		let config = self.config();
		let listener = match TcpListener::bind(config.bind).await {
			Ok(listener) => listener,
			Err(e) => {
				cli.outro_cancel(format!("Failed to listen on {}: {e}", config.bind))?;
				return Err(e.into());
			},
		};
		cli.info(format!("Relaying to {}", config.allowed_endpoints.join(", ")))?;
		let url = format!("http://{}", listener.local_addr()?);
		cli.success(format!("Listening on {}. Press Ctrl+C to stop.", format_url(&url)))?;
		let shutdown = async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				log::error!("Failed to listen for Ctrl+C: {e}");
			}
		};
		serve(listener, Relay::new(config, WebSocketUpstream), shutdown).await?;
		cli.outro("Relay stopped")?;
		Ok(())
	}

	fn config(&self) -> RelayConfig {
		RelayConfig {
			connect_timeout: Duration::from_secs(self.connect_timeout),
			response_timeout: Duration::from_secs(self.response_timeout),
			bind: self.bind,
			..Default::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;
	use pop_portal::testing::{POLKADOT, WESTEND};

	fn parse(args: &[&str]) -> Result<RelayCommand> {
		let args = ["pop-portal", "relay"].into_iter().chain(args.iter().copied());
		match crate::Cli::try_parse_from(args)?.command {
			crate::commands::Command::Relay(command) => Ok(command),
			_ => anyhow::bail!("not a relay command"),
		}
	}

	#[test]
	fn defaults_match_the_relay() -> Result<()> {
		assert_eq!(parse(&[])?.config(), RelayConfig::default());
		Ok(())
	}

	#[test]
	fn config_applies_the_arguments() -> Result<()> {
		let command =
			parse(&["--bind", "0.0.0.0:8080", "--connect-timeout", "2", "--response-timeout", "9"])?;
		let config = command.config();
		assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>()?);
		assert_eq!(config.connect_timeout, Duration::from_secs(2));
		assert_eq!(config.response_timeout, Duration::from_secs(9));
		// The allow-list is fixed.
		assert!(config.allowed_endpoints.iter().any(|e| e == POLKADOT));
		assert!(config.allowed_endpoints.iter().any(|e| e == WESTEND));
		Ok(())
	}
}
