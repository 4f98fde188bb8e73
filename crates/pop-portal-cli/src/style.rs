// SPDX-License-Identifier: GPL-3.0

use cliclack::ThemeState;
use console::{Style, style};
use pop_portal::ConnectionState;

pub(crate) fn get_styles() -> clap::builder::Styles {
	use clap::builder::styling::{AnsiColor, Color, Style};
	clap::builder::Styles::styled()
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightMagenta))))
		.invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.valid(
			Style::new()
				.bold()
				.underline()
				.fg_color(Some(Color::Ansi(AnsiColor::BrightMagenta))),
		)
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

pub(crate) struct Theme;

impl cliclack::Theme for Theme {
	fn bar_color(&self, state: &ThemeState) -> Style {
		match state {
			ThemeState::Active => Style::new().bright().magenta(),
			ThemeState::Error(_) => Style::new().bright().red(),
			_ => Style::new().magenta().dim(),
		}
	}

	fn state_symbol_color(&self, _state: &ThemeState) -> Style {
		Style::new().bright().magenta()
	}

	fn info_symbol(&self) -> String {
		"⚙".into()
	}
}

/// Formats an endpoint with bold and underlined style.
pub(crate) fn format_url(url: &str) -> String {
	format!("{}", style(url).bold().underlined())
}

/// Formats a connection state, colored by health.
pub(crate) fn format_state(state: ConnectionState) -> String {
	let text = style(state.to_string());
	let text = match state {
		ConnectionState::Ready => text.green(),
		ConnectionState::Connecting => text.yellow(),
		ConnectionState::Error => text.red(),
		ConnectionState::Disconnected => text.dim(),
	};
	text.to_string()
}
