// SPDX-License-Identifier: GPL-3.0

mod cli;
mod commands;
mod common;
mod style;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, styles=style::get_styles())]
pub struct Cli {
	#[command(subcommand)]
	command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::init();
	Cli::parse().command.execute().await
}

#[test]
fn verify_cli() {
	// https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_4/index.html
	use clap::CommandFactory;
	Cli::command().debug_assert()
}
