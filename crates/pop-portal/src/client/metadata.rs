// SPDX-License-Identifier: GPL-3.0

use scale_info::{PortableRegistry, TypeDef, TypeDefPrimitive, form::PortableForm};
use subxt::{
	Metadata,
	metadata::types::{StorageEntryModifier, StorageEntryType},
};

// Deeply nested or recursive types are cut off at this depth when rendering names.
const MAX_TYPE_DEPTH: usize = 6;

/// Describes a pallet as exposed by the runtime metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PalletMetadata {
	/// The name of the pallet, e.g. `Balances`.
	pub name: String,
	/// The index of the pallet within the runtime.
	pub index: u8,
	/// The documentation of the pallet.
	pub docs: String,
	/// The dispatchable calls of the pallet.
	pub calls: Vec<CallMetadata>,
	/// The storage entries of the pallet.
	pub storage: Vec<StorageMetadata>,
}

/// Describes a dispatchable call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallMetadata {
	/// The name of the call, e.g. `transfer_keep_alive`.
	pub name: String,
	/// The documentation of the call.
	pub docs: String,
	/// The call arguments, or `None` when they could not be read from the metadata.
	pub fields: Option<Vec<FieldMetadata>>,
}

/// Describes an argument of a call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldMetadata {
	/// The argument name, if the metadata provides one.
	pub name: Option<String>,
	/// The readable type name, e.g. `Compact<u128>` or `MultiAddress`.
	pub type_name: String,
	/// Whether the argument is an `Option<T>`.
	pub is_optional: bool,
}

/// Describes a storage entry.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StorageMetadata {
	/// The name of the entry, e.g. `Account`.
	pub name: String,
	/// The documentation of the entry.
	pub docs: String,
	/// The key types, one per hasher of a map entry. Empty for plain values.
	pub key_types: Vec<String>,
	/// The value type.
	pub value_type: String,
	/// Whether reading an empty entry yields its default value instead of nothing.
	pub has_default: bool,
}

/// Finds the storage entry `entry` of `pallet`, by their raw names.
pub fn find_storage<'a>(
	pallets: &'a [PalletMetadata],
	pallet: &str,
	entry: &str,
) -> Option<&'a StorageMetadata> {
	pallets
		.iter()
		.find(|p| p.name == pallet)
		.and_then(|p| p.storage.iter().find(|s| s.name == entry))
}

/// Parses the chain metadata to extract the pallets with their calls and storage entries.
///
/// NOTE: pallets are ordered by their index within the runtime.
pub fn parse_metadata(metadata: &Metadata) -> Vec<PalletMetadata> {
	let registry = metadata.types();
	metadata
		.pallets()
		.map(|pallet| {
			let calls = pallet
				.call_variants()
				.map(|variants| {
					variants
						.iter()
						.map(|variant| CallMetadata {
							name: variant.name.clone(),
							docs: join_docs(&variant.docs),
							fields: variant
								.fields
								.iter()
								.map(|field| {
									let ty = field.ty.id;
									Some(FieldMetadata {
										name: field.name.clone(),
										is_optional: is_option(registry, ty),
										type_name: type_name(
											registry,
											ty,
											field.type_name.as_deref(),
										)?,
									})
								})
								.collect(),
						})
						.collect()
				})
				.unwrap_or_default();
			let storage = pallet
				.storage()
				.map(|storage| {
					storage
						.entries()
						.into_iter()
						.map(|entry| {
							let entry_type = entry.entry_type();
							let key_types = match entry_type {
								StorageEntryType::Plain(_) => Vec::new(),
								StorageEntryType::Map { hashers, key_ty, .. } =>
									key_types(registry, *key_ty, hashers.len()),
							};
							StorageMetadata {
								name: entry.name().to_string(),
								docs: join_docs(entry.docs()),
								key_types,
								value_type: render(registry, entry_type.value_ty(), 0),
								has_default: matches!(
									entry.modifier(),
									StorageEntryModifier::Default
								),
							}
						})
						.collect()
				})
				.unwrap_or_default();
			PalletMetadata {
				name: pallet.name().to_string(),
				index: pallet.index(),
				docs: join_docs(pallet.docs()),
				calls,
				storage,
			}
		})
		.collect()
}

// Filter out blank lines and then flatten into a single value.
fn join_docs(docs: &[String]) -> String {
	docs.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Renders one type per key of a map entry. Maps with several hashers are keyed by a tuple holding
/// one field per hasher.
fn key_types(registry: &PortableRegistry, key_ty: u32, hashers: usize) -> Vec<String> {
	if hashers > 1 &&
		let Some(ty) = registry.resolve(key_ty) &&
		let TypeDef::Tuple(tuple) = &ty.type_def &&
		tuple.fields.len() == hashers
	{
		return tuple.fields.iter().map(|f| render(registry, f.id, 0)).collect();
	}
	vec![render(registry, key_ty, 0)]
}

fn is_option(registry: &PortableRegistry, id: u32) -> bool {
	registry.resolve(id).is_some_and(|ty| ty.path.segments == ["Option"])
}

/// Returns the readable type name of a call argument, or `None` when the type is missing from
/// the registry.
///
/// Nested calls (`RuntimeCall`) are reported as `Call`. Optional arguments are reported by
/// their inner type.
fn type_name(registry: &PortableRegistry, id: u32, declared: Option<&str>) -> Option<String> {
	let ty = registry.resolve(id)?;
	if declared.is_some_and(|d| d.contains("RuntimeCall")) {
		return Some("Call".to_string());
	}
	if ty.path.segments == ["Option"] {
		let inner = ty.type_params.first().and_then(|p| p.ty)?;
		return Some(render(registry, inner.id, 0));
	}
	// Balances are encoded as plain integers, the declared name keeps their meaning.
	if matches!(ty.type_def, TypeDef::Compact(_)) &&
		declared.is_some_and(|d| d.ends_with("Balance") || d.ends_with("BalanceOf<T>"))
	{
		return Some("Compact<Balance>".to_string());
	}
	Some(render(registry, id, 0))
}

/// Renders a short, readable name for the type `id`, e.g. `Vec<AccountId32>`.
pub fn render(registry: &PortableRegistry, id: u32, depth: usize) -> String {
	let Some(ty) = registry.resolve(id) else {
		return "unknown".to_string();
	};
	if depth > MAX_TYPE_DEPTH {
		return "..".to_string();
	}
	let nested = |id: u32| render(registry, id, depth + 1);
	let name = ty.path.segments.last().cloned();
	if name.as_deref().is_some_and(|n| n.contains("RuntimeCall")) {
		return "Call".to_string();
	}
	match &ty.type_def {
		TypeDef::Primitive(primitive) => primitive_name(primitive).to_string(),
		TypeDef::Compact(compact) => format!("Compact<{}>", nested(compact.type_param.id)),
		TypeDef::Sequence(sequence) => {
			let inner = nested(sequence.type_param.id);
			if inner == "u8" { "Bytes".to_string() } else { format!("Vec<{inner}>") }
		},
		TypeDef::Array(array) => format!("[{}; {}]", nested(array.type_param.id), array.len),
		TypeDef::Tuple(tuple) => {
			let fields: Vec<_> = tuple.fields.iter().map(|f| nested(f.id)).collect();
			format!("({})", fields.join(", "))
		},
		TypeDef::BitSequence(_) => "BitVec".to_string(),
		TypeDef::Composite(composite) => match name {
			Some(name) => with_params(registry, ty, name, depth),
			// Anonymous structs are shown with their fields so they read as structured input.
			None => {
				let fields: Vec<_> = composite
					.fields
					.iter()
					.map(|f| match &f.name {
						Some(field) => format!("{field}: {}", nested(f.ty.id)),
						None => nested(f.ty.id),
					})
					.collect();
				format!("{{ {} }}", fields.join(", "))
			},
		},
		TypeDef::Variant(_) => match name {
			Some(name) => with_params(registry, ty, name, depth),
			None => "enum".to_string(),
		},
	}
}

fn with_params(
	registry: &PortableRegistry,
	ty: &scale_info::Type<PortableForm>,
	name: String,
	depth: usize,
) -> String {
	let params: Vec<_> = ty
		.type_params
		.iter()
		.filter_map(|p| p.ty)
		.map(|p| render(registry, p.id, depth + 1))
		.collect();
	// Well-known wrappers read better without their account/index parameters.
	if params.is_empty() || matches!(name.as_str(), "MultiAddress" | "AccountId32") {
		name
	} else {
		format!("{name}<{}>", params.join(", "))
	}
}

fn primitive_name(primitive: &TypeDefPrimitive) -> &'static str {
	match primitive {
		TypeDefPrimitive::Bool => "bool",
		TypeDefPrimitive::Char => "char",
		TypeDefPrimitive::Str => "String",
		TypeDefPrimitive::U8 => "u8",
		TypeDefPrimitive::U16 => "u16",
		TypeDefPrimitive::U32 => "u32",
		TypeDefPrimitive::U64 => "u64",
		TypeDefPrimitive::U128 => "u128",
		TypeDefPrimitive::U256 => "u256",
		TypeDefPrimitive::I8 => "i8",
		TypeDefPrimitive::I16 => "i16",
		TypeDefPrimitive::I32 => "i32",
		TypeDefPrimitive::I64 => "i64",
		TypeDefPrimitive::I128 => "i128",
		TypeDefPrimitive::I256 => "i256",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use scale::Compact;
	use scale_info::{MetaType, Registry, TypeInfo};

	#[allow(dead_code)]
	#[derive(TypeInfo)]
	struct Transfer {
		dest: [u8; 32],
		value: Compact<u128>,
	}

	fn resolve<T: TypeInfo + 'static>() -> (PortableRegistry, u32) {
		let mut registry = Registry::new();
		let id = registry.register_type(&MetaType::new::<T>()).id;
		(registry.into(), id)
	}

	#[test]
	fn render_primitives_and_collections_works() {
		let (registry, id) = resolve::<bool>();
		assert_eq!(render(&registry, id, 0), "bool");
		let (registry, id) = resolve::<Vec<u8>>();
		assert_eq!(render(&registry, id, 0), "Bytes");
		let (registry, id) = resolve::<Vec<u32>>();
		assert_eq!(render(&registry, id, 0), "Vec<u32>");
		let (registry, id) = resolve::<Compact<u128>>();
		assert_eq!(render(&registry, id, 0), "Compact<u128>");
		let (registry, id) = resolve::<[u8; 20]>();
		assert_eq!(render(&registry, id, 0), "[u8; 20]");
		let (registry, id) = resolve::<(u32, bool)>();
		assert_eq!(render(&registry, id, 0), "(u32, bool)");
		let (registry, id) = resolve::<Option<u64>>();
		assert_eq!(render(&registry, id, 0), "Option<u64>");
	}

	#[test]
	fn render_named_composite_uses_its_name() {
		let (registry, id) = resolve::<Transfer>();
		assert_eq!(render(&registry, id, 0), "Transfer");
	}

	#[test]
	fn type_name_unwraps_options_and_marks_balances() {
		let (registry, id) = resolve::<Option<u64>>();
		assert!(is_option(&registry, id));
		assert_eq!(type_name(&registry, id, None).as_deref(), Some("u64"));

		let (registry, id) = resolve::<Compact<u128>>();
		assert!(!is_option(&registry, id));
		assert_eq!(
			type_name(&registry, id, Some("T::Balance")).as_deref(),
			Some("Compact<Balance>")
		);
		assert_eq!(type_name(&registry, id, Some("u128")).as_deref(), Some("Compact<u128>"));
		assert_eq!(
			type_name(&registry, id, Some("Box<<T as Config>::RuntimeCall>")).as_deref(),
			Some("Call")
		);
		assert_eq!(type_name(&registry, 999, None), None);
	}

	#[test]
	fn key_types_split_one_key_per_hasher() {
		let (registry, id) = resolve::<(u32, [u8; 32])>();
		assert_eq!(key_types(&registry, id, 2), vec!["u32", "[u8; 32]"]);
		// A single hasher over a tuple keeps the tuple as one key.
		assert_eq!(key_types(&registry, id, 1), vec!["(u32, [u8; 32])"]);
		let (registry, id) = resolve::<u64>();
		assert_eq!(key_types(&registry, id, 1), vec!["u64"]);
	}

	#[test]
	fn find_storage_works() {
		let pallets = vec![PalletMetadata {
			name: "Staking".into(),
			storage: vec![StorageMetadata { name: "ValidatorCount".into(), ..Default::default() }],
			..Default::default()
		}];
		assert!(find_storage(&pallets, "Staking", "ValidatorCount").is_some());
		assert!(find_storage(&pallets, "Staking", "Bonded").is_none());
		assert!(find_storage(&pallets, "System", "ValidatorCount").is_none());
	}

	#[test]
	fn join_docs_skips_blank_lines() {
		let docs =
			vec![" Transfer some balance.".to_string(), "".to_string(), " More.".to_string()];
		assert_eq!(join_docs(&docs), "Transfer some balance. More.");
	}
}
