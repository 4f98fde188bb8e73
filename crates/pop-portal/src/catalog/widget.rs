// SPDX-License-Identifier: GPL-3.0

use super::ParameterSpec;
use strum_macros::{AsRefStr, Display};

/// The kind of input a parameter is collected with.
#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum WidgetKind {
	/// A yes/no choice.
	BooleanSelect,
	/// An SS58 address.
	AddressText,
	/// A decimal token amount, converted to base units on submission.
	DecimalBalance,
	/// An integer.
	IntegerNumber,
	/// Free text.
	PlainText,
	/// Comma separated values, submitted as a sequence.
	DelimitedList,
	/// A JSON (or SCALE value) literal.
	JsonBlob,
}

impl WidgetKind {
	/// Example input shown to the user.
	pub fn placeholder(&self, spec: &ParameterSpec) -> String {
		match self {
			WidgetKind::BooleanSelect => "true".to_string(),
			WidgetKind::AddressText => "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".to_string(),
			WidgetKind::DecimalBalance => "1.5".to_string(),
			WidgetKind::IntegerNumber => "0".to_string(),
			WidgetKind::DelimitedList => format!("{} (comma separated)", spec.declared_type),
			WidgetKind::JsonBlob => "{ }".to_string(),
			WidgetKind::PlainText => String::new(),
		}
	}

	/// A short hint describing the expected input.
	pub fn hint(&self) -> &'static str {
		match self {
			WidgetKind::BooleanSelect => "yes or no",
			WidgetKind::AddressText => "an SS58 address",
			WidgetKind::DecimalBalance =>
				"use decimal notation (e.g. 1.5), it is converted to the token's precision",
			WidgetKind::IntegerNumber => "a whole number",
			WidgetKind::DelimitedList => "values separated by commas",
			WidgetKind::JsonBlob => "a structured value, e.g. { field: value }",
			WidgetKind::PlainText => "text",
		}
	}

	/// Checks `input` against the kind, returning a message for the user when it does not fit.
	pub fn validate(&self, input: &str) -> Result<(), &'static str> {
		let input = input.trim();
		match self {
			WidgetKind::IntegerNumber => {
				let digits = input.strip_prefix('-').unwrap_or(input);
				if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
					return Err("Please enter a whole number.");
				}
			},
			WidgetKind::DecimalBalance => {
				let mut parts = input.splitn(2, '.');
				let whole = parts.next().unwrap_or_default();
				let fraction = parts.next().unwrap_or_default();
				if (whole.is_empty() && fraction.is_empty()) ||
					!whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
				{
					return Err("Please enter a positive decimal amount, e.g. 1.5");
				}
			},
			WidgetKind::BooleanSelect if !matches!(input, "true" | "false") =>
				return Err("Please choose true or false."),
			_ => {},
		}
		Ok(())
	}
}

// The lowercased view of a parameter that rules match against.
struct Subject<'a> {
	category: &'a str,
	name: String,
	declared_type: String,
}

impl Subject<'_> {
	fn type_has(&self, needles: &[&str]) -> bool {
		needles.iter().any(|n| self.declared_type.contains(n))
	}

	fn name_has(&self, needles: &[&str]) -> bool {
		needles.iter().any(|n| self.name.contains(n))
	}
}

// Evaluated in order, the first match wins.
const RULES: &[(fn(&Subject) -> bool, WidgetKind)] = &[
	(|s| s.type_has(&["bool"]), WidgetKind::BooleanSelect),
	(
		|s| s.type_has(&["account", "address"]) || s.name_has(&["dest", "target"]),
		WidgetKind::AddressText,
	),
	(
		|s| {
			(s.category.eq_ignore_ascii_case("balances") &&
				matches!(s.name.as_str(), "value" | "amount")) ||
				s.type_has(&["balance", "compact<u128>"])
		},
		WidgetKind::DecimalBalance,
	),
	(
		|s| {
			s.type_has(&[
				"u8", "u16", "u32", "u64", "u128", "i8", "i16", "i32", "i64", "i128", "compact<",
			])
		},
		WidgetKind::IntegerNumber,
	),
	(|s| s.type_has(&["string", "str"]), WidgetKind::PlainText),
	(|s| s.type_has(&["vec", "array"]), WidgetKind::DelimitedList),
	(|s| s.type_has(&["struct", "enum", "{"]), WidgetKind::JsonBlob),
];

/// Chooses the input widget for a parameter.
///
/// Matching is case-insensitive and by substring, in this order: boolean, address/account,
/// balance, other numbers, strings, collections, structured values, and plain text otherwise.
///
/// # Arguments
/// * `category` - The category of the operation, e.g. `balances`.
/// * `spec` - The parameter.
pub fn choose_input_widget(category: &str, spec: &ParameterSpec) -> WidgetKind {
	let subject = Subject {
		category,
		name: spec.name.to_lowercase(),
		declared_type: spec.declared_type.to_lowercase(),
	};
	RULES
		.iter()
		.find(|(matches, _)| matches(&subject))
		.map(|(_, kind)| *kind)
		.unwrap_or(WidgetKind::PlainText)
}
