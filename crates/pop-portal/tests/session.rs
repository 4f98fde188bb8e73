// SPDX-License-Identifier: GPL-3.0

//! End-to-end flows over the in-memory node.

#![cfg(feature = "test-utils")]

use anyhow::Result;
use pop_portal::{
	ConnectionState, KeyringWallet, Network, PortalConfig, Preferences, Session,
	SubmissionStatus, TRANSFER_OPERATIONS, WidgetKind,
	catalog::find_first_operation,
	choose_input_widget, connect_wallet,
	testing::{ALICE, BOB, FREE_BALANCE, MockConnector},
	units::{format_balance, percent_of},
};

#[tokio::test]
async fn transfer_from_a_fresh_start() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let config = PortalConfig::default().with_preferences_path(dir.path().join("portal.json"));
	let connector = MockConnector::default();
	let session =
		Session::new(connector.clone(), config.clone(), Preferences::load(&config.preferences_path)?);

	session.connect(Network::Westend.url()).await?;
	let categories = session.list_categories().await?;
	// The chain has no plain `transfer`.
	let operation = find_first_operation(&categories, "balances", &TRANSFER_OPERATIONS)?;
	assert_eq!(operation.name, "transferAllowDeath");
	let widgets: Vec<_> = operation
		.parameters
		.iter()
		.map(|parameter| choose_input_widget(&operation.category, parameter))
		.collect();
	assert_eq!(widgets, vec![WidgetKind::AddressText, WidgetKind::DecimalBalance]);

	let token = session.token().await?;
	let balance = session.free_balance(ALICE).await?;
	assert_eq!(format_balance(balance, &token), "10 UNIT");
	let half = percent_of(balance, 50)?;
	assert_eq!(format_balance(half, &token), "5 UNIT");

	let mut wallet = KeyringWallet::dev()?;
	let (_, accounts) = connect_wallet(&mut wallet, &config.app_name).await?;
	let signer = &accounts[0].address;
	let pending = session
		.submit(&wallet, operation, vec![BOB.into(), "5".into()], signer)
		.await?
		.wait_for_finalized()
		.await?;
	assert_eq!(pending.status, SubmissionStatus::Finalized);
	assert!(pending.events.iter().any(|e| e.name == "Transfer"));
	assert!(connector.unsubscribed());
	assert_eq!(FREE_BALANCE, balance);
	Ok(())
}

#[tokio::test]
async fn restart_restores_the_last_endpoint() -> Result<()> {
	let dir = tempfile::tempdir()?;
	let config = PortalConfig::default().with_preferences_path(dir.path().join("portal.json"));
	let connector = MockConnector::default().failing(Network::Kusama.url());
	{
		let session = Session::new(
			connector.clone(),
			config.clone(),
			Preferences::load(&config.preferences_path)?,
		);
		session.connect(Network::Polkadot.url()).await?;
		assert!(session.connect(Network::Kusama.url()).await.is_err());
		assert_eq!(session.connection().state, ConnectionState::Error);
	}
	let session =
		Session::new(connector.clone(), config.clone(), Preferences::load(&config.preferences_path)?);
	assert_eq!(session.current_endpoint().await.as_deref(), Some(Network::Polkadot.url()));
	session.reconnect().await?;
	assert!(session.connection().is_ready());
	assert_eq!(connector.max_live(), 1);
	Ok(())
}
