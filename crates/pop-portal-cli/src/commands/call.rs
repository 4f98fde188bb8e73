// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::{self, traits::*},
	commands::{finish, query::first_line},
	common::{
		prompt::resolve_values,
		session::{SessionArgs, connect},
		transaction::{SignerArgs, sign_and_submit},
	},
};
use anyhow::Result;
use clap::Args;
use pop_portal::{
	Connector, Operation, OperationCategory, ParameterSource, Session,
	catalog::{find_category, find_operation},
};

pub(crate) const SELECT_CATEGORY: &str = "Select the category of the operation (type to filter)";
pub(crate) const SELECT_OPERATION: &str = "Select the operation to submit (type to filter)";

/// Builds, signs and submits any operation the connected chain offers.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct CallCommand {
	#[command(flatten)]
	session: SessionArgs,
	#[command(flatten)]
	signer: SignerArgs,
	/// The category (pallet) of the operation, e.g. "balances".
	#[arg(short, long)]
	category: Option<String>,
	/// The operation, e.g. "transferKeepAlive".
	#[arg(short, long)]
	operation: Option<String>,
	/// The values of the operation's parameters, space separated and in order.
	#[arg(short, long, num_args = 0..)]
	args: Vec<String>,
}

impl CallCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		let mut cli = cli::Cli;
		cli.intro("Call an operation")?;
		let session = self.session.open()?;
		let result = self.run(&session, &mut cli).await;
		session.disconnect().await;
		finish(result, &mut cli)
	}

	async fn run<C: Connector>(&self, session: &Session<C>, cli: &mut impl Cli) -> Result<String> {
		connect(session, self.session.endpoint().as_deref(), cli).await?;
		let categories = session.list_categories().await?;
		let operation = self.select_operation(&categories, cli)?;
		warn_if_guessed(operation, cli)?;
		let token = session.token().await?;
		let values =
			resolve_values(&operation.category, &operation.parameters, &self.args, &token, cli)?;
		let (wallet, signer) = self.signer.wallet(&session.config().app_name, cli).await?;
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
			"`{}` finalized in block {}",
			operation.qualified_name(),
			pending.block_hash.unwrap_or_default()
		))
	}

	fn select_operation<'a>(
		&self,
		categories: &'a [OperationCategory],
		cli: &mut impl Cli,
	) -> Result<&'a Operation> {
		let category = match &self.category {
			Some(name) => find_category(categories, name)?,
			None => {
				let mut prompt = cli.select(SELECT_CATEGORY);
				for category in categories {
					prompt = prompt.item(category, &category.name, first_line(&category.docs));
				}
				prompt.filter_mode().interact()?
			},
		};
		if let Some(name) = &self.operation {
			return Ok(find_operation(categories, &category.name, name)?);
		}
		let mut prompt = cli.select(SELECT_OPERATION);
		for operation in &category.operations {
			prompt = prompt.item(operation, &operation.name, first_line(&operation.docs));
		}
		Ok(prompt.filter_mode().interact()?)
	}
}

// The shape of operations missing from the metadata is a guess the user should double check.
fn warn_if_guessed(operation: &Operation, cli: &mut impl Cli) -> Result<()> {
	if operation.source == ParameterSource::Guessed {
		cli.warning(format!(
			"The parameters of `{}` are unknown, a single value is assumed.",
			operation.qualified_name()
		))?;
	}
	Ok(())
}
