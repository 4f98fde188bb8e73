// SPDX-License-Identifier: GPL-3.0

//! Conversions between user facing decimal amounts and on-chain base units.
//!
//! Amounts never pass through floating point: the decimal point is shifted on the string
//! representation and percentages are computed with integer arithmetic.

use crate::{client::TokenInfo, errors::Error};

/// Converts a decimal amount (e.g. `"1.5"`) into an integer string of base units.
///
/// # Arguments
/// * `amount` - The amount as entered by the user.
/// * `decimals` - The number of decimals of the chain's token.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<String, Error> {
	let invalid = |reason| Error::InvalidAmount { amount: amount.to_string(), reason };
	let trimmed = amount.trim();
	if trimmed.is_empty() {
		return Err(invalid("the amount is empty"));
	}
	let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
	if whole.is_empty() && fraction.is_empty() {
		return Err(invalid("the amount has no digits"));
	}
	if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
		return Err(invalid("only digits and a single decimal point are allowed"));
	}
	if fraction.len() > decimals as usize {
		return Err(invalid("too many decimal places for this token"));
	}
	let mut digits = String::with_capacity(whole.len() + decimals as usize);
	digits.push_str(whole);
	digits.push_str(fraction);
	digits.extend(std::iter::repeat_n('0', decimals as usize - fraction.len()));
	let digits = digits.trim_start_matches('0');
	Ok(if digits.is_empty() { "0".to_string() } else { digits.to_string() })
}

/// Parses an integer string of base units.
pub fn parse_base_units(value: &str) -> Result<u128, Error> {
	value.trim().parse::<u128>().map_err(|_| Error::InvalidAmount {
		amount: value.to_string(),
		reason: "the amount does not fit into 128 bits",
	})
}

/// Formats base units as a decimal amount, trimming trailing zeros (e.g. `1500000000000` with
/// 12 decimals is `"1.5"`).
pub fn format_units(base_units: u128, decimals: u8) -> String {
	let digits = base_units.to_string();
	let decimals = decimals as usize;
	if decimals == 0 {
		return digits;
	}
	let padded = format!("{digits:0>width$}", width = decimals + 1);
	let (whole, fraction) = padded.split_at(padded.len() - decimals);
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() { whole.to_string() } else { format!("{whole}.{fraction}") }
}

/// Formats base units together with the token symbol, e.g. `"1.5 DOT"`.
pub fn format_balance(base_units: u128, token: &TokenInfo) -> String {
	format!("{} {}", format_units(base_units, token.decimals), token.symbol)
}

/// Computes `percent`% of `balance`, rounding down, without overflow.
pub fn percent_of(balance: u128, percent: u8) -> Result<u128, Error> {
	if percent > 100 {
		return Err(Error::InvalidAmount {
			amount: format!("{percent}%"),
			reason: "the percentage must be between 0 and 100",
		});
	}
	let percent = percent as u128;
	Ok(balance / 100 * percent + balance % 100 * percent / 100)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn to_base_units_shifts_the_decimal_point() -> Result<(), Error> {
		assert_eq!(to_base_units("123456789.123456789012", 12)?, "123456789123456789012");
		assert_eq!(to_base_units("1.5", 12)?, "1500000000000");
		assert_eq!(to_base_units("1", 10)?, "10000000000");
		assert_eq!(to_base_units(" 0.000000000001 ", 12)?, "1");
		assert_eq!(to_base_units(".5", 2)?, "50");
		assert_eq!(to_base_units("2.", 2)?, "200");
		assert_eq!(to_base_units("0", 12)?, "0");
		assert_eq!(to_base_units("007", 0)?, "7");
		Ok(())
	}

	#[test]
	fn to_base_units_rejects_malformed_amounts() {
		for amount in ["", "  ", ".", "1.2.3", "-1", "1e3", "abc", "1,5"] {
			assert!(
				matches!(to_base_units(amount, 12), Err(Error::InvalidAmount { .. })),
				"{amount} should be rejected"
			);
		}
		assert!(matches!(to_base_units("1.123", 2), Err(Error::InvalidAmount { .. })));
	}

	#[test]
	fn format_units_works() {
		assert_eq!(format_units(1_500_000_000_000, 12), "1.5");
		assert_eq!(format_units(1, 12), "0.000000000001");
		assert_eq!(format_units(0, 12), "0");
		assert_eq!(format_units(42, 0), "42");
		assert_eq!(format_units(10_000_000_000, 10), "1");
		assert_eq!(
			format_balance(25_000_000_000, &TokenInfo { symbol: "DOT".into(), decimals: 10 }),
			"2.5 DOT"
		);
	}

	#[test]
	fn percent_of_is_exact() -> Result<(), Error> {
		assert_eq!(percent_of(1_000, 25)?, 250);
		assert_eq!(percent_of(999, 50)?, 499);
		assert_eq!(percent_of(u128::MAX, 100)?, u128::MAX);
		assert_eq!(percent_of(u128::MAX, 50)?, u128::MAX / 2);
		assert_eq!(percent_of(123_456_789_123_456_789_012, 0)?, 0);
		assert!(percent_of(1, 101).is_err());
		Ok(())
	}

	#[test]
	fn parse_base_units_works() {
		assert_eq!(parse_base_units("1500000000000").ok(), Some(1_500_000_000_000));
		assert!(parse_base_units("340282366920938463463374607431768211456").is_err());
	}
}
