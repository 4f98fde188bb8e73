// SPDX-License-Identifier: GPL-3.0

use crate::{
	cli::{self, traits::*},
	commands::finish,
	common::{
		prompt::resolve_values,
		session::{SessionArgs, connect},
	},
};
use anyhow::Result;
use clap::Args;
use pop_portal::{Connector, Error, Session, StorageCategory, StorageItem};

pub(crate) const SELECT_CATEGORY: &str = "Select the category of the storage entry (type to filter)";
pub(crate) const SELECT_ITEM: &str = "Select the storage entry (type to filter)";

/// Queries a storage entry and shows the value stored under the given keys.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct QueryCommand {
	#[command(flatten)]
	session: SessionArgs,
	/// The category (pallet) of the entry, e.g. "system".
	#[arg(short, long)]
	category: Option<String>,
	/// The storage entry, e.g. "account".
	#[arg(short, long)]
	item: Option<String>,
	/// The keys of the entry, space separated.
	#[arg(short, long, num_args = 0..)]
	args: Vec<String>,
}

impl QueryCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> Result<()> {
		let mut cli = cli::Cli;
		cli.intro("Query storage")?;
		let session = self.session.open()?;
		let result = self.run(&session, &mut cli).await;
		session.disconnect().await;
		finish(result, &mut cli)
	}

	async fn run<C: Connector>(&self, session: &Session<C>, cli: &mut impl Cli) -> Result<String> {
		connect(session, self.session.endpoint().as_deref(), cli).await?;
		let categories = session.list_storage_categories().await?;
		let category = self.select_category(&categories, cli)?;
		let item = self.select_item(category, cli)?;
		let token = session.token().await?;
		let keys = resolve_values(&item.category, &item.parameters, &self.args, &token, cli)?;
		Ok(match session.query_storage(item, keys).await? {
			Some(value) => value,
			None => format!("Nothing is stored under {}.{}", item.category, item.name),
		})
	}

	fn select_category<'a>(
		&self,
		categories: &'a [StorageCategory],
		cli: &mut impl Cli,
	) -> Result<&'a StorageCategory> {
		if let Some(name) = &self.category {
			return Ok(categories
				.iter()
				.find(|c| c.name == *name)
				.ok_or_else(|| Error::CategoryNotFound(name.clone()))?);
		}
		let mut prompt = cli.select(SELECT_CATEGORY);
		for category in categories {
			let hint = format!("{} entries", category.items.len());
			prompt = prompt.item(category, &category.name, hint);
		}
		Ok(prompt.filter_mode().interact()?)
	}

	fn select_item<'a>(
		&self,
		category: &'a StorageCategory,
		cli: &mut impl Cli,
	) -> Result<&'a StorageItem> {
		if let Some(name) = &self.item {
			return Ok(category.items.iter().find(|i| i.name == *name).ok_or_else(|| {
				Error::Storage(format!("{}.{name} does not exist", category.name))
			})?);
		}
		let mut prompt = cli.select(SELECT_ITEM);
		for item in &category.items {
			prompt = prompt.item(item, &item.name, first_line(&item.docs));
		}
		Ok(prompt.filter_mode().interact()?)
	}
}

/// The summary line of documentation.
pub(crate) fn first_line(docs: &str) -> &str {
	docs.lines().next().unwrap_or_default().trim()
}
