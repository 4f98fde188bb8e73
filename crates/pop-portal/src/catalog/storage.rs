// SPDX-License-Identifier: GPL-3.0

use super::{ParameterSpec, is_reserved_category};
use crate::client::PalletMetadata;
use heck::ToLowerCamelCase;

/// Name of the key parameter of map entries. Entries with several keys number them from one,
/// e.g. `key1` and `key2`.
pub const KEY_PARAMETER: &str = "key";

/// A storage entry that can be queried.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageItem {
	/// The category the entry belongs to, e.g. `system`.
	pub category: String,
	/// The name of the entry, e.g. `account`.
	pub name: String,
	/// The pallet name used for the query, e.g. `System`.
	pub pallet: String,
	/// The entry name used for the query, e.g. `Account`.
	pub entry: String,
	/// The documentation of the entry.
	pub docs: String,
	/// The key parameters: one per key for maps, none for plain values.
	pub parameters: Vec<ParameterSpec>,
	/// The type of the stored value.
	pub value_type: String,
	/// Whether an empty entry reads as its default value.
	pub has_default: bool,
}

/// The storage entries of a pallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageCategory {
	/// The name of the category, e.g. `system`.
	pub name: String,
	/// The storage entries, sorted by name.
	pub items: Vec<StorageItem>,
}

/// Builds the storage catalog from the pallets of a chain, named, filtered and sorted like the
/// operation catalog.
///
/// # Arguments
/// * `pallets` - The pallets exposed by the runtime metadata.
pub fn storage_categories(pallets: &[PalletMetadata]) -> Vec<StorageCategory> {
	let mut categories: Vec<_> = pallets
		.iter()
		.filter_map(|pallet| {
			let name = pallet.name.to_lower_camel_case();
			if is_reserved_category(&pallet.name) || is_reserved_category(&name) {
				return None;
			}
			let mut items: Vec<_> = pallet
				.storage
				.iter()
				.map(|entry| StorageItem {
					category: name.clone(),
					name: entry.name.to_lower_camel_case(),
					pallet: pallet.name.clone(),
					entry: entry.name.clone(),
					docs: entry.docs.clone(),
					parameters: key_parameters(&entry.key_types),
					value_type: entry.value_type.clone(),
					has_default: entry.has_default,
				})
				.collect();
			if items.is_empty() {
				return None;
			}
			items.sort_by(|a, b| a.name.cmp(&b.name));
			Some(StorageCategory { name, items })
		})
		.collect();
	categories.sort_by(|a, b| a.name.cmp(&b.name));
	categories
}

fn key_parameters(key_types: &[String]) -> Vec<ParameterSpec> {
	match key_types {
		[key_type] => vec![ParameterSpec::required(KEY_PARAMETER, key_type)],
		key_types => key_types
			.iter()
			.enumerate()
			.map(|(i, key_type)| {
				ParameterSpec::required(&format!("{KEY_PARAMETER}{}", i + 1), key_type)
			})
			.collect(),
	}
}
