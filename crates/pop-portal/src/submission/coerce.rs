// SPDX-License-Identifier: GPL-3.0

use crate::{
	catalog::{ParameterSpec, WidgetKind, choose_input_widget},
	errors::Error,
	units::{parse_base_units, to_base_units},
};
use scale_value::stringify::custom_parsers;
use std::str::FromStr;
use subxt::{
	dynamic::Value,
	utils::{AccountId32, to_hex},
};

/// A parameter value converted according to its input widget.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArgumentValue {
	/// A boolean.
	Bool(bool),
	/// An amount already shifted to base units.
	BaseUnits(String),
	/// An SS58 address.
	Address(String),
	/// The items of a comma separated list.
	List(Vec<String>),
	/// Anything else, as entered.
	Text(String),
}

/// Checks that `values` line up with `parameters` and that no required value is empty.
///
/// # Arguments
/// * `name` - The operation or storage entry the values are for.
/// * `parameters` - The declared parameters.
/// * `values` - The values entered by the user.
pub fn check_values(
	name: &str,
	parameters: &[ParameterSpec],
	values: &[String],
) -> Result<(), Error> {
	if parameters.len() != values.len() {
		return Err(Error::ParameterCount {
			operation: name.to_string(),
			expected: parameters.len(),
			received: values.len(),
		});
	}
	match parameters
		.iter()
		.zip(values)
		.find(|(spec, value)| !spec.is_optional && value.trim().is_empty())
	{
		Some((spec, _)) => Err(Error::MissingParameter(spec.name.clone())),
		None => Ok(()),
	}
}

/// Converts each value according to the widget chosen for its parameter.
///
/// Balances become base units using `decimals`, addresses are validated later on encoding,
/// lists are split on commas and anything else is kept as entered.
///
/// # Arguments
/// * `category` - The category of the operation, e.g. `balances`.
/// * `parameters` - The declared parameters.
/// * `values` - One value per parameter.
/// * `decimals` - The number of decimals of the chain's token.
pub fn coerce_arguments(
	category: &str,
	parameters: &[ParameterSpec],
	values: &[String],
	decimals: u8,
) -> Result<Vec<ArgumentValue>, Error> {
	parameters
		.iter()
		.zip(values)
		.map(|(spec, value)| {
			let value = value.trim();
			if spec.is_optional && value.is_empty() {
				return Ok(ArgumentValue::Text(String::new()));
			}
			Ok(match choose_input_widget(category, spec) {
				WidgetKind::BooleanSelect => {
					WidgetKind::BooleanSelect
						.validate(value)
						.map_err(|e| invalid_value(spec, e))?;
					ArgumentValue::Bool(value == "true")
				},
				WidgetKind::DecimalBalance =>
					ArgumentValue::BaseUnits(to_base_units(value, decimals)?),
				WidgetKind::AddressText if is_sequence(spec) => ArgumentValue::List(split(value)),
				WidgetKind::AddressText => ArgumentValue::Address(value.to_string()),
				WidgetKind::DelimitedList => ArgumentValue::List(split(value)),
				_ => ArgumentValue::Text(value.to_string()),
			})
		})
		.collect()
}

/// Converts a coerced argument into a value that can be encoded against the runtime metadata.
///
/// Text is parsed as a SCALE value literal, accepting hex and SS58 literals. Byte sequences given
/// as plain text are hex encoded first.
///
/// # Arguments
/// * `argument` - The coerced argument.
/// * `spec` - The parameter the argument is for.
pub fn to_value(argument: ArgumentValue, spec: &ParameterSpec) -> Result<Value, Error> {
	if spec.is_optional {
		return Ok(match argument {
			ArgumentValue::Text(text) if text.is_empty() =>
				Value::unnamed_variant("None", Vec::<Value>::new()),
			argument => Value::unnamed_variant("Some", [required_value(argument, spec)?]),
		});
	}
	required_value(argument, spec)
}

/// Coerces `values` and converts them into encodable values, after checking them against
/// `parameters`.
pub fn to_values(
	category: &str,
	parameters: &[ParameterSpec],
	values: Vec<String>,
	decimals: u8,
) -> Result<Vec<Value>, Error> {
	check_values(category, parameters, &values)?;
	coerce_arguments(category, parameters, &values, decimals)?
		.into_iter()
		.zip(parameters)
		.map(|(argument, spec)| to_value(argument, spec))
		.collect()
}

fn required_value(argument: ArgumentValue, spec: &ParameterSpec) -> Result<Value, Error> {
	Ok(match argument {
		ArgumentValue::Bool(value) => Value::bool(value),
		ArgumentValue::BaseUnits(units) => Value::u128(parse_base_units(&units)?),
		ArgumentValue::Address(address) => {
			let account = AccountId32::from_str(&address)
				.map_err(|_| Error::InvalidAddress(address.clone()))?;
			if spec.declared_type.to_lowercase().contains("multiaddress") {
				Value::unnamed_variant("Id", [Value::from_bytes(account.0)])
			} else {
				Value::from_bytes(account.0)
			}
		},
		ArgumentValue::List(items) => Value::unnamed_composite(
			items.iter().map(|item| parse(item, spec)).collect::<Result<Vec<_>, _>>()?,
		),
		ArgumentValue::Text(text) => {
			let declared_type = spec.declared_type.to_lowercase();
			if declared_type == "string" || declared_type == "str" {
				Value::string(text)
			} else if is_bytes(&declared_type) && !text.starts_with("0x") {
				parse(&to_hex(&text), spec)?
			} else {
				parse(&text, spec)?
			}
		},
	})
}

fn parse(input: &str, spec: &ParameterSpec) -> Result<Value, Error> {
	scale_value::stringify::from_str_custom()
		.add_custom_parser(custom_parsers::parse_hex)
		.add_custom_parser(custom_parsers::parse_ss58)
		.parse(input)
		.0
		.map_err(|_| invalid_value(spec, input))
}

fn invalid_value(spec: &ParameterSpec, detail: &str) -> Error {
	Error::Construction(format!("invalid value for `{}`: {detail}", spec.name))
}

fn is_bytes(declared_type: &str) -> bool {
	matches!(declared_type, "bytes" | "vec<u8>")
}

fn is_sequence(spec: &ParameterSpec) -> bool {
	spec.declared_type.to_lowercase().starts_with("vec<")
}

fn split(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}
