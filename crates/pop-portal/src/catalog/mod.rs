// SPDX-License-Identifier: GPL-3.0

//! The operations a chain offers, read from its runtime metadata.
//!
//! Categories are pallets and operations are their dispatchable calls, both named in lower camel
//! case (`Balances::transfer_keep_alive` is `balances.transferKeepAlive`).

use crate::{
	client::{CallMetadata, PalletMetadata},
	errors::Error,
};
use heck::ToLowerCamelCase;
use std::fmt::{Display, Formatter};

mod overrides;
pub mod storage;
pub mod widget;

pub use storage::{StorageCategory, StorageItem, storage_categories};
pub use widget::{WidgetKind, choose_input_widget};

/// Name and type of the parameter used when nothing is known about an operation.
pub const GENERIC_PARAMETER: (&str, &str) = ("param", "any");

// Deprecated collective whose calls are not offered.
const DEPRECATED_CATEGORIES: [&str; 1] = ["council"];

/// Describes a parameter of an operation.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ParameterSpec {
	/// The name of the parameter.
	pub name: String,
	/// The declared type, e.g. `Compact<Balance>`.
	pub declared_type: String,
	/// Whether the parameter can be left empty.
	pub is_optional: bool,
}

impl ParameterSpec {
	/// A parameter that must be supplied.
	pub fn required(name: &str, declared_type: &str) -> Self {
		Self {
			name: name.to_string(),
			declared_type: declared_type.to_string(),
			is_optional: false,
		}
	}
}

impl Display for ParameterSpec {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.name, self.declared_type)
	}
}

/// Where the parameters of an operation were taken from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParameterSource {
	/// The table of well-known operations.
	Override,
	/// The runtime metadata.
	Metadata,
	/// Nothing was known, a single generic parameter is assumed.
	Guessed,
}

/// The inferred parameters of an operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterShape {
	/// Where the parameters come from.
	pub source: ParameterSource,
	/// The parameters, in order.
	pub parameters: Vec<ParameterSpec>,
}

/// An operation (dispatchable call) offered by a chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
	/// The category the operation belongs to, e.g. `balances`.
	pub category: String,
	/// The name of the operation, e.g. `transferKeepAlive`.
	pub name: String,
	/// The pallet name used for dispatch, e.g. `Balances`.
	pub pallet: String,
	/// The call name used for dispatch, e.g. `transfer_keep_alive`.
	pub call: String,
	/// The documentation of the call.
	pub docs: String,
	/// The parameters of the operation.
	pub parameters: Vec<ParameterSpec>,
	/// Where the parameters come from.
	pub source: ParameterSource,
}

impl Operation {
	/// The fully qualified name, e.g. `balances.transfer`.
	pub fn qualified_name(&self) -> String {
		format!("{}.{}", self.category, self.name)
	}
}

impl Display for Operation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}

/// A group of operations, one per pallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationCategory {
	/// The name of the category, e.g. `balances`.
	pub name: String,
	/// The pallet name, e.g. `Balances`.
	pub pallet: String,
	/// The documentation of the pallet.
	pub docs: String,
	/// The operations, sorted by name.
	pub operations: Vec<Operation>,
}

impl Display for OperationCategory {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}

/// Whether a category is hidden from users: internal names starting with `$` and deprecated
/// collectives.
pub fn is_reserved_category(name: &str) -> bool {
	name.starts_with('$') || DEPRECATED_CATEGORIES.contains(&name)
}

/// Builds the operation catalog from the pallets of a chain.
///
/// Reserved categories and categories without operations are skipped. Categories and their
/// operations are sorted by name.
///
/// # Arguments
/// * `pallets` - The pallets exposed by the runtime metadata.
pub fn categories(pallets: &[PalletMetadata]) -> Vec<OperationCategory> {
	let mut categories: Vec<_> = pallets
		.iter()
		.filter_map(|pallet| {
			let name = pallet.name.to_lower_camel_case();
			if is_reserved_category(&pallet.name) || is_reserved_category(&name) {
				return None;
			}
			let mut operations: Vec<_> = pallet
				.calls
				.iter()
				.filter(|call| !call.name.starts_with('$'))
				.map(|call| (call.name.to_lower_camel_case(), call))
				.map(|(operation, call)| {
					let shape = infer_parameters(&name, &operation, Some(call));
					Operation {
						category: name.clone(),
						name: operation,
						pallet: pallet.name.clone(),
						call: call.name.clone(),
						docs: call.docs.clone(),
						parameters: shape.parameters,
						source: shape.source,
					}
				})
				.collect();
			if operations.is_empty() {
				return None;
			}
			operations.sort_by(|a, b| a.name.cmp(&b.name));
			Some(OperationCategory {
				name,
				pallet: pallet.name.clone(),
				docs: pallet.docs.clone(),
				operations,
			})
		})
		.collect();
	categories.sort_by(|a, b| a.name.cmp(&b.name));
	categories
}

/// Infers the parameters of an operation.
///
/// The table of well-known operations always wins. Otherwise the names and types come from the
/// call metadata and, when that is unavailable, a single generic parameter is assumed.
///
/// # Arguments
/// * `category` - The category name, e.g. `balances`.
/// * `operation` - The operation name, e.g. `transfer`.
/// * `call` - The call metadata, if any.
pub fn infer_parameters(
	category: &str,
	operation: &str,
	call: Option<&CallMetadata>,
) -> ParameterShape {
	if let Some(parameters) = overrides::lookup(category, operation) {
		return ParameterShape { source: ParameterSource::Override, parameters };
	}
	if let Some(fields) = call.and_then(|call| call.fields.as_ref()) {
		let parameters = fields
			.iter()
			.enumerate()
			.map(|(index, field)| ParameterSpec {
				name: field
					.name
					.as_deref()
					.map(|name| name.to_lower_camel_case())
					.unwrap_or_else(|| format!("param{index}")),
				declared_type: field.type_name.clone(),
				is_optional: field.is_optional,
			})
			.collect();
		return ParameterShape { source: ParameterSource::Metadata, parameters };
	}
	ParameterShape {
		source: ParameterSource::Guessed,
		parameters: vec![ParameterSpec::required(GENERIC_PARAMETER.0, GENERIC_PARAMETER.1)],
	}
}

/// Finds a category by name.
///
/// # Arguments
/// * `categories` - The catalog.
/// * `name` - The category name, e.g. `balances`.
pub fn find_category<'a>(
	categories: &'a [OperationCategory],
	name: &str,
) -> Result<&'a OperationCategory, Error> {
	categories
		.iter()
		.find(|c| c.name == name)
		.ok_or_else(|| Error::CategoryNotFound(name.to_string()))
}

/// Finds an operation by category and name.
///
/// # Arguments
/// * `categories` - The catalog.
/// * `category` - The category name, e.g. `balances`.
/// * `operation` - The operation name, e.g. `transfer`.
pub fn find_operation<'a>(
	categories: &'a [OperationCategory],
	category: &str,
	operation: &str,
) -> Result<&'a Operation, Error> {
	find_category(categories, category)?
		.operations
		.iter()
		.find(|o| o.name == operation)
		.ok_or_else(|| Error::OperationNotFound {
			category: category.to_string(),
			operation: operation.to_string(),
		})
}

/// Finds the first operation of `category` present on the chain, in order of preference.
///
/// # Arguments
/// * `categories` - The catalog.
/// * `category` - The category name, e.g. `balances`.
/// * `preferred` - Operation names, most preferred first.
pub fn find_first_operation<'a>(
	categories: &'a [OperationCategory],
	category: &str,
	preferred: &[&str],
) -> Result<&'a Operation, Error> {
	let found = find_category(categories, category)?;
	preferred
		.iter()
		.find_map(|name| found.operations.iter().find(|o| o.name == *name))
		.ok_or_else(|| Error::OperationNotFound {
			category: category.to_string(),
			operation: preferred.join("|"),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::FieldMetadata;

	fn field(name: &str, type_name: &str) -> FieldMetadata {
		FieldMetadata { name: Some(name.into()), type_name: type_name.into(), is_optional: false }
	}

	fn call(name: &str, fields: Option<Vec<FieldMetadata>>) -> CallMetadata {
		CallMetadata { name: name.into(), docs: format!("Docs of {name}."), fields }
	}

	fn pallet(name: &str, calls: Vec<CallMetadata>) -> PalletMetadata {
		PalletMetadata { name: name.into(), calls, ..Default::default() }
	}

	#[test]
	fn override_always_wins_over_metadata() {
		let metadata = call("transfer", Some(vec![field("to", "AccountId32"), field("x", "u8")]));
		let shape = infer_parameters("balances", "transfer", Some(&metadata));
		assert_eq!(shape.source, ParameterSource::Override);
		assert_eq!(
			shape.parameters,
			vec![
				ParameterSpec::required("dest", "MultiAddress"),
				ParameterSpec::required("value", "Compact<Balance>")
			]
		);
	}

	#[test]
	fn infer_parameters_is_deterministic() {
		let metadata = call("bond", Some(vec![field("value", "Compact<Balance>")]));
		let first = infer_parameters("staking", "bond", Some(&metadata));
		assert_eq!(first, infer_parameters("staking", "bond", Some(&metadata)));
	}

	#[test]
	fn infer_parameters_reads_metadata() {
		let mut optional = field("max_count", "u32");
		optional.is_optional = true;
		let unnamed = FieldMetadata { name: None, type_name: "u64".into(), is_optional: false };
		let metadata = call("bond", Some(vec![field("payee_account", "AccountId32"), optional, unnamed]));
		let shape = infer_parameters("staking", "bond", Some(&metadata));
		assert_eq!(shape.source, ParameterSource::Metadata);
		assert_eq!(
			shape.parameters,
			vec![
				ParameterSpec::required("payeeAccount", "AccountId32"),
				ParameterSpec { name: "maxCount".into(), declared_type: "u32".into(), is_optional: true },
				ParameterSpec::required("param2", "u64"),
			]
		);
		// Calls without arguments have no parameters.
		let shape = infer_parameters("staking", "chill", Some(&call("chill", Some(vec![]))));
		assert_eq!(shape, ParameterShape { source: ParameterSource::Metadata, parameters: vec![] });
	}

	#[test]
	fn infer_parameters_falls_back_to_generic_parameter() {
		let expected = ParameterShape {
			source: ParameterSource::Guessed,
			parameters: vec![ParameterSpec::required("param", "any")],
		};
		assert_eq!(infer_parameters("custom", "doSomething", None), expected);
		assert_eq!(infer_parameters("custom", "doSomething", Some(&call("do_something", None))), expected);
	}

	#[test]
	fn categories_are_filtered_and_sorted() {
		let pallets = vec![
			pallet("System", vec![call("remark", Some(vec![field("remark", "Bytes")]))]),
			pallet(
				"Balances",
				vec![
					call("transfer_keep_alive", None),
					call("transfer_allow_death", None),
					call("burn", Some(vec![])),
				],
			),
			pallet("Council", vec![call("propose", Some(vec![]))]),
			pallet("$metadata", vec![call("inner", Some(vec![]))]),
			pallet("Timestamp", vec![]),
			pallet("Assets", vec![call("create", None)]),
		];
		let categories = categories(&pallets);
		let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["assets", "balances", "system"]);
		let balances = find_category(&categories, "balances").unwrap();
		let operations: Vec<_> = balances.operations.iter().map(|o| o.name.as_str()).collect();
		assert_eq!(operations, vec!["burn", "transferAllowDeath", "transferKeepAlive"]);
		let transfer = &balances.operations[2];
		assert_eq!(transfer.pallet, "Balances");
		assert_eq!(transfer.call, "transfer_keep_alive");
		assert_eq!(transfer.qualified_name(), "balances.transferKeepAlive");
		assert_eq!(transfer.source, ParameterSource::Override);
		assert_eq!(transfer.docs, "Docs of transfer_keep_alive.");
	}

	#[test]
	fn find_operation_works() {
		let pallets =
			vec![pallet("Balances", vec![call("transfer_allow_death", None), call("burn", None)])];
		let categories = categories(&pallets);
		assert_eq!(find_operation(&categories, "balances", "burn").unwrap().call, "burn");
		assert!(matches!(
			find_operation(&categories, "balances", "mint"),
			Err(Error::OperationNotFound { .. })
		));
		assert!(matches!(
			find_operation(&categories, "staking", "bond"),
			Err(Error::CategoryNotFound(c)) if c == "staking"
		));
		let transfer = find_first_operation(
			&categories,
			"balances",
			&["transfer", "transferAllowDeath", "transferKeepAlive"],
		)
		.unwrap();
		assert_eq!(transfer.name, "transferAllowDeath");
		assert!(find_first_operation(&categories, "balances", &["transfer"]).is_err());
	}

	#[test]
	fn reserved_categories_are_detected() {
		assert!(is_reserved_category("$metadata"));
		assert!(is_reserved_category("council"));
		assert!(!is_reserved_category("balances"));
	}
}
