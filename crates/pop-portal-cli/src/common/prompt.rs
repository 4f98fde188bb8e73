// SPDX-License-Identifier: GPL-3.0

use crate::cli::traits::*;
use anyhow::Result;
use pop_portal::{ParameterSpec, TokenInfo, WidgetKind, choose_input_widget};

/// Collects one value per parameter: taken from `args` in order, prompted for otherwise.
///
/// Surplus `args` are kept so that the mismatch is reported when the values are checked.
///
/// # Arguments
/// * `category` - The category of the operation or storage entry, e.g. `balances`.
/// * `parameters` - The parameters to collect values for.
/// * `args` - Values supplied on the command line.
/// * `token` - The native token, named in amount prompts.
/// * `cli` - The command line interface.
pub(crate) fn resolve_values(
	category: &str,
	parameters: &[ParameterSpec],
	args: &[String],
	token: &TokenInfo,
	cli: &mut impl Cli,
) -> Result<Vec<String>> {
	let mut values = Vec::with_capacity(parameters.len().max(args.len()));
	for (index, parameter) in parameters.iter().enumerate() {
		let value = match args.get(index) {
			Some(value) => value.clone(),
			None => prompt_for_parameter(category, parameter, token, cli)?,
		};
		values.push(value);
	}
	values.extend(args.iter().skip(parameters.len()).cloned());
	Ok(values)
}

// Prompts for the value of a parameter with the widget chosen for it. Declining an optional
// parameter leaves it empty.
fn prompt_for_parameter(
	category: &str,
	parameter: &ParameterSpec,
	token: &TokenInfo,
	cli: &mut impl Cli,
) -> Result<String> {
	if parameter.is_optional &&
		!cli.confirm(format!(
			"Do you want to provide a value for the optional parameter: {}?",
			parameter.name
		))
		.interact()?
	{
		return Ok(String::new());
	}
	let widget = choose_input_widget(category, parameter);
	match widget {
		WidgetKind::BooleanSelect => {
			let value = cli
				.select(format!("Select the value for the parameter: {}", parameter.name))
				.item(true, "Yes", "true")
				.item(false, "No", "false")
				.interact()?;
			Ok(value.to_string())
		},
		WidgetKind::DecimalBalance => input(
			format!("Enter the amount in {} for the parameter: {}", token.symbol, parameter.name),
			parameter,
			widget,
			cli,
		),
		_ => input(
			format!("Enter the value for the parameter: {}", parameter.name),
			parameter,
			widget,
			cli,
		),
	}
}

fn input(
	prompt: String,
	parameter: &ParameterSpec,
	widget: WidgetKind,
	cli: &mut impl Cli,
) -> Result<String> {
	let example = match widget.placeholder(parameter) {
		example if example.is_empty() => parameter.declared_type.clone(),
		example => example,
	};
	Ok(cli
		.input(prompt)
		.placeholder(&format!("{example} ({})", widget.hint()))
		.required(true)
		.validate(move |value| widget.validate(value))
		.interact()?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cli::MockCli;
	use pop_portal::testing::BOB;

	fn transfer_parameters() -> Vec<ParameterSpec> {
		vec![
			ParameterSpec::required("dest", "MultiAddress"),
			ParameterSpec::required("value", "Compact<Balance>"),
		]
	}

	#[test]
	fn resolve_values_prompts_per_widget() -> Result<()> {
		let mut cli = MockCli::new()
			.expect_input("Enter the value for the parameter: dest", BOB)
			.expect_input("Enter the amount in UNIT for the parameter: value", "1.5");
		let values =
			resolve_values("balances", &transfer_parameters(), &[], &TokenInfo::default(), &mut cli)?;
		assert_eq!(values, vec![BOB.to_string(), "1.5".to_string()]);
		cli.verify()
	}

	#[test]
	fn resolve_values_preserves_cli_values() -> Result<()> {
		let mut cli = MockCli::new()
			.expect_input("Enter the amount in UNIT for the parameter: value", "2");
		let values = resolve_values(
			"balances",
			&transfer_parameters(),
			&[BOB.to_string()],
			&TokenInfo::default(),
			&mut cli,
		)?;
		assert_eq!(values, vec![BOB.to_string(), "2".to_string()]);
		cli.verify()?;

		// Surplus values are passed on untouched.
		let args = vec![BOB.to_string(), "1".to_string(), "3".to_string()];
		let values = resolve_values(
			"balances",
			&transfer_parameters(),
			&args,
			&TokenInfo::default(),
			&mut MockCli::new(),
		)?;
		assert_eq!(values, args);
		Ok(())
	}

	#[test]
	fn invalid_amount_is_rejected_by_the_prompt() {
		let mut cli = MockCli::new()
			.expect_input("Enter the amount in UNIT for the parameter: value", "1,5");
		let parameters = vec![ParameterSpec::required("value", "Compact<Balance>")];
		let token = TokenInfo::default();
		assert!(resolve_values("balances", &parameters, &[], &token, &mut cli).is_err());
	}

	#[test]
	fn boolean_and_optional_parameters_work() -> Result<()> {
		let parameters = vec![
			ParameterSpec::required("keepAlive", "bool"),
			ParameterSpec { is_optional: true, ..ParameterSpec::required("memo", "Option<String>") },
		];
		// "No" is the second option offered.
		let mut cli = MockCli::new()
			.expect_select(
				"Select the value for the parameter: keepAlive",
				Some(vec![
					("Yes".to_string(), "true".to_string()),
					("No".to_string(), "false".to_string()),
				]),
				1,
			)
			.expect_confirm("Do you want to provide a value for the optional parameter: memo?", false);
		let values = resolve_values("balances", &parameters, &[], &TokenInfo::default(), &mut cli)?;
		assert_eq!(values, vec!["false".to_string(), String::new()]);
		cli.verify()
	}
}
