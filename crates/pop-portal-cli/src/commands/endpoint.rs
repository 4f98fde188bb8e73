// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::{self, traits::*},
	commands::finish,
	common::session::{SessionArgs, connect, prompt_for_endpoint},
};
use anyhow::Result;
use clap::Args;
use pop_portal::{Connector, Session, endpoints::is_allowed};

/// Selects the node to connect to. The endpoint is remembered for the other commands.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct EndpointCommand {
	#[command(flatten)]
	session: SessionArgs,
}

impl EndpointCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		let mut cli = cli::Cli;
		cli.intro("Select an endpoint")?;
		let session = self.session.open()?;
		let result = self.run(&session, &mut cli).await;
		session.disconnect().await;
		finish(result, &mut cli)
	}

	async fn run<C: Connector>(&self, session: &Session<C>, cli: &mut impl Cli) -> Result<String> {
		let address = match self.session.endpoint() {
			Some(address) => address,
			None => prompt_for_endpoint(session.initial_endpoint().await.as_deref(), cli)?,
		};
		connect(session, Some(&address), cli).await?;
		let token = session.token().await?;
		cli.info(format!("Native token: {} with {} decimals", token.symbol, token.decimals))?;
		if is_allowed(&address) {
			cli.info("Browsers can reach this endpoint through `pop-portal relay`.")?;
		}
		Ok(session.probe().await?.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		cli::MockCli,
		common::session::{SELECT_ENDPOINT, tests::networks},
	};
	use pop_portal::{
		PortalConfig, Preferences,
		testing::{MockConnector, WESTEND},
	};

	const CONNECTED: &str = "Connected to chain Development using Mock Node v1.0.0";

	fn session(connector: &MockConnector) -> Session<MockConnector> {
		Session::new(connector.clone(), PortalConfig::default(), Preferences::in_memory())
	}

	#[tokio::test]
	async fn endpoint_connects_to_the_given_network() -> Result<()> {
		let connector = MockConnector::default();
		let session = session(&connector);
		let command = EndpointCommand {
			session: SessionArgs { url: Some("westend".into()), ..Default::default() },
		};
		let mut cli = MockCli::new()
			.expect_info("Native token: UNIT with 12 decimals")
			.expect_info("Browsers can reach this endpoint through `pop-portal relay`.");
		assert_eq!(command.run(&session, &mut cli).await?, CONNECTED);
		assert_eq!(session.current_endpoint().await.as_deref(), Some(WESTEND));
		cli.verify()
	}

	#[tokio::test]
	async fn endpoint_prompts_for_the_network() -> Result<()> {
		let connector = MockConnector::default();
		let session = session(&connector);
		// Westend is the fourth network offered.
		let mut cli = MockCli::new().expect_select(SELECT_ENDPOINT, Some(networks()), 3);
		assert_eq!(EndpointCommand::default().run(&session, &mut cli).await?, CONNECTED);
		assert_eq!(connector.log(), vec![format!("connect {WESTEND}")]);
		cli.verify()
	}

	#[tokio::test]
	async fn endpoint_reports_unreachable_nodes() -> Result<()> {
		let connector = MockConnector::default().failing(WESTEND);
		let session = session(&connector);
		let command = EndpointCommand {
			session: SessionArgs { url: Some(WESTEND.into()), ..Default::default() },
		};
		let mut cli = MockCli::new().expect_outro_cancel(format!(
			"Failed to connect to {WESTEND}: connection refused"
		));
		let result = command.run(&session, &mut cli).await;
		assert!(finish(result, &mut cli).is_err());
		assert_eq!(session.current_endpoint().await, None);
		cli.verify()
	}
}
