// SPDX-License-Identifier: GPL-3.0

use crate::cli::traits::Cli;
use anyhow::Result;
use clap::Subcommand;

pub(crate) mod call;
pub(crate) mod endpoint;
pub(crate) mod query;
pub(crate) mod relay;
pub(crate) mod transfer;

/// The available commands.
#[derive(Subcommand)]
#[command(subcommand_required = true)]
pub(crate) enum Command {
	/// Select the node to connect to and show what it runs.
	#[clap(alias = "e")]
	Endpoint(endpoint::EndpointCommand),
	/// Query a storage entry of the chain.
	#[clap(alias = "q")]
	Query(query::QueryCommand),
	/// Sign and submit any operation the chain offers.
	#[clap(alias = "c")]
	Call(call::CallCommand),
	/// Transfer the native token to another account.
	#[clap(alias = "t")]
	Transfer(transfer::TransferCommand),
	/// Forward JSON-RPC requests from browsers to well-known nodes.
	#[clap(alias = "r")]
	Relay(relay::RelayCommand),
}

impl Command {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		match self {
			Self::Endpoint(cmd) => cmd.execute().await,
			Self::Query(cmd) => cmd.execute().await,
			Self::Call(cmd) => cmd.execute().await,
			Self::Transfer(cmd) => cmd.execute().await,
			Self::Relay(cmd) => cmd.execute().await,
		}
	}
}

// Closes the prompt sequence with the outcome of a command.
fn finish(result: Result<String>, cli: &mut impl Cli) -> Result<()> {
	match result {
		Ok(message) => {
			cli.outro(message)?;
			Ok(())
		},
		Err(e) => {
			cli.outro_cancel(format!("{e}"))?;
			Err(e)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cli::MockCli;
	use anyhow::anyhow;

	#[test]
	fn finish_reports_the_outcome() -> Result<()> {
		let mut cli = MockCli::new().expect_outro("Done");
		finish(Ok("Done".into()), &mut cli)?;
		cli.verify()?;

		let mut cli = MockCli::new().expect_outro_cancel("Not connected to a node");
		assert!(finish(Err(anyhow!("Not connected to a node")), &mut cli).is_err());
		cli.verify()
	}
}
