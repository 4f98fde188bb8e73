// SPDX-License-Identifier: GPL-3.0

use super::ParameterSpec;

// Parameters of well-known operations, as (category, operation, [(name, type)]).
const KNOWN_PARAMETERS: &[(&str, &str, &[(&str, &str)])] = &[
	("balances", "transfer", &[("dest", "MultiAddress"), ("value", "Compact<Balance>")]),
	("balances", "transferKeepAlive", &[("dest", "MultiAddress"), ("value", "Compact<Balance>")]),
	("balances", "transferAllowDeath", &[("dest", "MultiAddress"), ("value", "Compact<Balance>")]),
	("balances", "transferAll", &[("dest", "MultiAddress"), ("keepAlive", "bool")]),
	(
		"balances",
		"forceTransfer",
		&[("source", "MultiAddress"), ("dest", "MultiAddress"), ("value", "Compact<Balance>")],
	),
	(
		"balances",
		"setBalance",
		&[
			("who", "MultiAddress"),
			("newFree", "Compact<Balance>"),
			("newReserved", "Compact<Balance>"),
		],
	),
	("balances", "forceSetBalance", &[("who", "MultiAddress"), ("newFree", "Compact<Balance>")]),
	("balances", "upgradeAccounts", &[("who", "Vec<AccountId32>")]),
	("balances", "forceUnreserve", &[("who", "MultiAddress"), ("amount", "u128")]),
	("balances", "forceAdjustTotalIssuance", &[("adjustment", "i128")]),
	("balances", "burn", &[("amount", "Compact<Balance>")]),
	("system", "remark", &[("remark", "Bytes")]),
	("system", "remarkWithEvent", &[("remark", "Bytes")]),
	("system", "setCode", &[("code", "Bytes")]),
	("system", "setStorage", &[("items", "Vec<KeyValue>")]),
	("system", "killStorage", &[("keys", "Vec<Key>")]),
	("system", "killPrefix", &[("prefix", "Key"), ("subkeys", "u32")]),
	("timestamp", "set", &[("now", "Compact<u64>")]),
	("sudo", "sudo", &[("call", "Call")]),
	("sudo", "sudoAs", &[("who", "MultiAddress"), ("call", "Call")]),
	("sudo", "sudoUncheckedWeight", &[("call", "Call"), ("weight", "Weight")]),
	(
		"assets",
		"create",
		&[("id", "Compact<u32>"), ("admin", "MultiAddress"), ("minBalance", "u128")],
	),
	(
		"assets",
		"transfer",
		&[("id", "Compact<u32>"), ("target", "MultiAddress"), ("amount", "Compact<u128>")],
	),
];

/// Looks up the parameters of a well-known operation.
///
/// # Arguments
/// * `category` - The category name, e.g. `balances`.
/// * `operation` - The operation name, e.g. `transferKeepAlive`.
pub(crate) fn lookup(category: &str, operation: &str) -> Option<Vec<ParameterSpec>> {
	KNOWN_PARAMETERS.iter().find(|(c, o, _)| *c == category && *o == operation).map(
		|(_, _, parameters)| {
			parameters
				.iter()
				.map(|(name, declared_type)| ParameterSpec::required(name, declared_type))
				.collect()
		},
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn lookup_works() {
		let parameters = lookup("balances", "transfer").unwrap();
		assert_eq!(
			parameters,
			vec![
				ParameterSpec::required("dest", "MultiAddress"),
				ParameterSpec::required("value", "Compact<Balance>")
			]
		);
		assert_eq!(lookup("timestamp", "set").unwrap()[0].declared_type, "Compact<u64>");
		assert!(lookup("balances", "unknown").is_none());
		assert!(lookup("Balances", "transfer").is_none());
	}

	#[test]
	fn known_parameters_are_unique_and_required() {
		let mut seen = HashSet::new();
		for (category, operation, _) in KNOWN_PARAMETERS {
			assert!(seen.insert((category, operation)), "{category}.{operation} is duplicated");
			assert!(lookup(category, operation).unwrap().iter().all(|p| !p.is_optional));
		}
	}
}
