// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::{self, traits::*},
	commands::finish,
	common::{
		session::{SessionArgs, connect},
		transaction::{SignerArgs, sign_and_submit},
	},
};
use anyhow::Result;
use clap::Args;
use pop_portal::{
	Connector, Session, TRANSFER_OPERATIONS, TokenInfo, WidgetKind,
	catalog::find_first_operation,
	units::{format_balance, format_units, percent_of},
};

pub(crate) const ENTER_RECIPIENT: &str = "Enter the address of the recipient:";
pub(crate) const SELECT_AMOUNT: &str = "How much do you want to transfer?";
// Shares of the free balance offered when no amount is given.
const SHARES: [u8; 4] = [25, 50, 75, 100];

/// Transfers the native token from the signing account.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct TransferCommand {
	#[command(flatten)]
	session: SessionArgs,
	#[command(flatten)]
	signer: SignerArgs,
	/// The address of the recipient.
	#[arg(short, long)]
	to: Option<String>,
	/// The amount to transfer, e.g. "1.5".
	#[arg(short, long, conflicts_with = "percent")]
	amount: Option<String>,
	/// The share of the free balance to transfer, e.g. "50" for half of it.
	#[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
	percent: Option<u8>,
}

impl TransferCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		let mut cli = cli::Cli;
		cli.intro("Transfer")?;
		let session = self.session.open()?;
		let result = self.run(&session, &mut cli).await;
		session.disconnect().await;
		finish(result, &mut cli)
	}

	async fn run<C: Connector>(&self, session: &Session<C>, cli: &mut impl Cli) -> Result<String> {
		connect(session, self.session.endpoint().as_deref(), cli).await?;
		let categories = session.list_categories().await?;
		let operation = find_first_operation(&categories, "balances", &TRANSFER_OPERATIONS)?;
		let (wallet, signer) = self.signer.wallet(&session.config().app_name, cli).await?;
		let token = session.token().await?;
		let balance = session.free_balance(&signer.address).await?;
		cli.info(format!("Free balance of {signer}: {}", format_balance(balance, &token)))?;

		let to = match &self.to {
			Some(to) => to.clone(),
			None => cli
				.input(ENTER_RECIPIENT)
				.placeholder(WidgetKind::AddressText.hint())
				.required(true)
				.interact()?,
		};
		let amount = self.amount(balance, &token, cli)?;
		let values = vec![to.clone(), amount.clone()];
		let pending = sign_and_submit(
			session,
			wallet,
			&signer,
			operation,
			values,
			self.signer.skip_confirm,
			cli,
		)
		.await?;
		Ok(format!(
			"Transferred {amount} {} to {to} in block {}",
			token.symbol,
			pending.block_hash.unwrap_or_default()
		))
	}

	// The decimal amount to transfer: as given, as a share of `balance`, or prompted for.
	fn amount(&self, balance: u128, token: &TokenInfo, cli: &mut impl Cli) -> Result<String> {
		let percent = match (&self.amount, self.percent) {
			(Some(amount), _) => return Ok(amount.clone()),
			(None, Some(percent)) => Some(percent),
			(None, None) => {
				let mut prompt = cli.select(SELECT_AMOUNT);
				for share in SHARES {
					let hint = format_balance(percent_of(balance, share)?, token);
					prompt = prompt.item(Some(share), format!("{share}%"), hint);
				}
				prompt.item(None, "Custom", "Enter the amount").interact()?
			},
		};
		match percent {
			Some(percent) => {
				if percent == 100 {
					cli.warning("Transferring the whole balance leaves nothing to pay the fees.")?;
				}
				Ok(format_units(percent_of(balance, percent)?, token.decimals))
			},
			None => Ok(cli
				.input(format!("Enter the amount in {}:", token.symbol))
				.placeholder("1.5")
				.required(true)
				.validate(|value| WidgetKind::DecimalBalance.validate(value))
				.interact()?),
		}
	}
}
