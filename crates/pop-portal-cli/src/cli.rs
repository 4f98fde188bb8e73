// SPDX-License-Identifier: GPL-3.0

use std::{fmt::Display, io::Result};
#[cfg(test)]
pub(crate) use tests::MockCli;

/// The prompts and messages commands interact through, so that tests can script them.
pub(crate) mod traits {
	use std::{fmt::Display, io::Result};

	/// The terminal a command talks to.
	pub trait Cli {
		/// Asks a yes/no question, e.g. whether to sign a transaction.
		fn confirm(&mut self, prompt: impl Display) -> impl Confirm;
		fn info(&mut self, text: impl Display) -> Result<()>;
		/// Asks for a line of text, e.g. a parameter value.
		fn input(&mut self, prompt: impl Display) -> impl Input;
		/// Opens a command's output with its title.
		fn intro(&mut self, title: impl Display) -> Result<()>;
		/// Closes a command's output after it succeeded.
		fn outro(&mut self, message: impl Display) -> Result<()>;
		/// Closes a command's output after it failed.
		fn outro_cancel(&mut self, message: impl Display) -> Result<()>;
		/// Asks to pick one of several options, e.g. a network or an operation.
		fn select<T: Clone + Eq>(&mut self, prompt: impl Display) -> impl Select<T>;
		fn success(&mut self, message: impl Display) -> Result<()>;
		fn warning(&mut self, message: impl Display) -> Result<()>;
		/// Shows progress while waiting on the node.
		fn spinner(&mut self) -> Box<dyn Spinner + Send>;
	}

	pub trait Spinner: Send {
		fn start(&self, message: &str);
		fn set_message(&self, message: &str);
		fn stop(&self, message: &str);
		/// Stops with a failure style.
		fn error(&self, message: &str);
	}

	pub trait Confirm {
		fn initial_value(self, initial_value: bool) -> Self;
		fn interact(&mut self) -> Result<bool>;
	}

	pub trait Input {
		/// The value submitted when nothing is typed.
		fn default_input(self, value: &str) -> Self;
		fn interact(&mut self) -> Result<String>;
		/// Greyed out example shown while nothing is typed.
		fn placeholder(self, value: &str) -> Self;
		fn required(self, required: bool) -> Self;
		/// Checks the value on submission, keeping the prompt open with the returned message
		/// until it passes.
		fn validate(
			self,
			validator: impl Fn(&String) -> std::result::Result<(), &'static str> + 'static,
		) -> Self;
	}

	pub trait Select<T> {
		fn initial_value(self, initial_value: T) -> Self;
		fn interact(&mut self) -> Result<T>;
		/// Adds an option, shown as `label` with a dimmed `hint`.
		fn item(self, value: T, label: impl Display, hint: impl Display) -> Self;
		/// Narrows the options down as the user types.
		fn filter_mode(self) -> Self;
	}
}

/// The interactive terminal, rendered with cliclack.
pub(crate) struct Cli;

impl traits::Cli for Cli {
	fn confirm(&mut self, prompt: impl Display) -> impl traits::Confirm {
		Confirm(cliclack::confirm(prompt))
	}

	fn info(&mut self, text: impl Display) -> Result<()> {
		cliclack::log::info(text)
	}

	fn input(&mut self, prompt: impl Display) -> impl traits::Input {
		Input(cliclack::input(prompt))
	}

	fn intro(&mut self, title: impl Display) -> Result<()> {
		cliclack::clear_screen()?;
		cliclack::set_theme(crate::style::Theme);
		cliclack::intro(format!("{}: {title}", console::style(" Pop Portal ").black().on_magenta()))
	}

	fn outro(&mut self, message: impl Display) -> Result<()> {
		cliclack::outro(message)
	}

	fn outro_cancel(&mut self, message: impl Display) -> Result<()> {
		cliclack::outro_cancel(message)
	}

	fn select<T: Clone + Eq>(&mut self, prompt: impl Display) -> impl traits::Select<T> {
		Select::<T>(cliclack::select(prompt))
	}

	fn success(&mut self, message: impl Display) -> Result<()> {
		cliclack::log::success(message)
	}

	fn warning(&mut self, message: impl Display) -> Result<()> {
		cliclack::log::warning(message)
	}

	fn spinner(&mut self) -> Box<dyn traits::Spinner + Send> {
		Box::new(Spinner(cliclack::spinner()))
	}
}

struct Spinner(cliclack::ProgressBar);

impl traits::Spinner for Spinner {
	fn start(&self, message: &str) {
		self.0.start(message);
	}

	fn set_message(&self, message: &str) {
		self.0.set_message(message);
	}

	fn stop(&self, message: &str) {
		self.0.stop(message);
	}

	fn error(&self, message: &str) {
		self.0.error(message);
	}
}

struct Confirm(cliclack::Confirm);

impl traits::Confirm for Confirm {
	fn initial_value(mut self, initial_value: bool) -> Self {
		self.0 = self.0.initial_value(initial_value);
		self
	}

	fn interact(&mut self) -> Result<bool> {
		self.0.interact()
	}
}

struct Input(cliclack::Input);

impl traits::Input for Input {
	fn default_input(mut self, value: &str) -> Self {
		self.0 = self.0.default_input(value);
		self
	}

	fn interact(&mut self) -> Result<String> {
		self.0.interact()
	}

	fn placeholder(mut self, placeholder: &str) -> Self {
		self.0 = self.0.placeholder(placeholder);
		self
	}

	fn required(mut self, required: bool) -> Self {
		self.0 = self.0.required(required);
		self
	}

	fn validate(
		mut self,
		validator: impl Fn(&String) -> std::result::Result<(), &'static str> + 'static,
	) -> Self {
		self.0 = self.0.validate(validator);
		self
	}
}

struct Select<T: Clone + Eq>(cliclack::Select<T>);

impl<T: Clone + Eq> traits::Select<T> for Select<T> {
	fn initial_value(mut self, initial_value: T) -> Self {
		self.0 = self.0.initial_value(initial_value);
		self
	}

	fn interact(&mut self) -> Result<T> {
		self.0.interact()
	}

	fn item(mut self, value: T, label: impl Display, hint: impl Display) -> Self {
		self.0 = self.0.item(value, label, hint);
		self
	}

	fn filter_mode(mut self) -> Self {
		self.0 = self.0.filter_mode();
		self
	}
}
