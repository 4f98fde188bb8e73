// SPDX-License-Identifier: GPL-3.0

use crate::cli::traits::*;
use anyhow::Result;
use clap::Args;
use pop_portal::{
	Account, Connector, Error, KeyringWallet, Operation, PendingSubmission, Session,
	SubmissionEvent, connect_wallet,
};

pub(crate) const SELECT_SIGNER: &str = "Select the signing account (type to filter)";

/// Options for signing transactions.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct SignerArgs {
	/// Secret key URI for the account signing the transaction.
	///
	/// e.g.
	/// - for a dev account "//Alice"
	/// - with a password "//Alice///SECRET_PASSWORD"
	///
	/// When omitted, one of the development accounts is selected.
	#[arg(short, long)]
	pub(crate) suri: Option<String>,
	/// Signs and submits the transaction without prompting for confirmation.
	#[arg(short = 'y', long)]
	pub(crate) skip_confirm: bool,
}

impl SignerArgs {
	/// Opens the keyring and picks the signing account, prompting when there is a choice.
	///
	/// # Arguments
	/// * `app_name` - The name the application presents itself with.
	/// * `cli` - The command line interface.
	pub(crate) async fn wallet(
		&self,
		app_name: &str,
		cli: &mut impl Cli,
	) -> Result<(KeyringWallet, Account)> {
		let mut wallet = match &self.suri {
			Some(suri) => KeyringWallet::new([("Account", suri.as_str())])?,
			None => KeyringWallet::dev()?,
		};
		let (_, accounts) = connect_wallet(&mut wallet, app_name).await?;
		let signer = match accounts.as_slice() {
			[account] => account.clone(),
			accounts => {
				let mut prompt = cli.select(SELECT_SIGNER);
				for account in accounts {
					let label = account.display_name.as_deref().unwrap_or(&account.address);
					prompt = prompt.item(account.clone(), label, &account.address);
				}
				prompt.filter_mode().interact()?
			},
		};
		Ok((wallet, signer))
	}
}

/// Asks the user to approve, then signs and submits `operation` and follows it until it is
/// finalized.
///
/// # Arguments
/// * `session` - The session holding the ready connection.
/// * `wallet` - The enabled wallet holding the signer.
/// * `signer` - The signing account.
/// * `operation` - The operation to submit.
/// * `values` - One value per parameter of `operation`.
/// * `skip_confirm` - Approves without asking.
/// * `cli` - The command line interface.
pub(crate) async fn sign_and_submit<C: Connector>(
	session: &Session<C>,
	wallet: KeyringWallet,
	signer: &Account,
	operation: &Operation,
	values: Vec<String>,
	skip_confirm: bool,
	cli: &mut impl Cli,
) -> Result<PendingSubmission> {
	let approved = skip_confirm ||
		cli.confirm(format!(
			"Do you want to sign and submit `{}` with {signer}?",
			operation.qualified_name()
		))
		.initial_value(true)
		.interact()?;
	let wallet = wallet.with_approval(move |request| {
		log::debug!("Signature request for {request}: approved={approved}");
		approved
	});

	let spinner = cli.spinner();
	spinner.start("Signing and submitting the transaction, please be patient...");
	let mut submission = match session.submit(&wallet, operation, values, &signer.address).await {
		Ok(submission) => submission,
		Err(e) => {
			spinner.error(&e.to_string());
			return Err(e.into());
		},
	};
	while let Some(event) = submission.next_event().await {
		match event {
			SubmissionEvent::Submitted { tx_hash } => spinner
				.set_message(&format!("Submitted {tx_hash}, waiting to be included in a block...")),
			SubmissionEvent::InBlock { block_hash, .. } => spinner
				.set_message(&format!("Included in block {block_hash}, waiting for finalization...")),
			SubmissionEvent::Finalized { block_hash, .. } =>
				spinner.stop(&format!("Finalized in block {block_hash}")),
			SubmissionEvent::Failed(reason) => {
				spinner.error(&reason.to_string());
				return Err(Error::from(reason).into());
			},
		}
	}
	let pending = submission.pending().clone();
	for event in &pending.events {
		cli.info(format!("Event: {event}"))?;
	}
	Ok(pending)
}
