// SPDX-License-Identifier: GPL-3.0

use std::time::Duration;
use thiserror::Error;

/// Represents the various errors that can occur in the crate.
#[derive(Error, Debug)]
pub enum Error {
	/// The chain category (pallet) could not be found.
	#[error("Category not found: {0}")]
	CategoryNotFound(String),
	/// Failed to connect to the node.
	#[error("Failed to connect to {endpoint}: {message}")]
	Connection {
		/// The endpoint that could not be reached.
		endpoint: String,
		/// The reason reported by the transport.
		message: String,
	},
	/// The call could not be constructed from the supplied values.
	#[error("Failed to construct the call: {0}")]
	Construction(String),
	/// The transaction was included but its dispatch failed with a known runtime error.
	#[error("Transaction failed: {category}.{name}")]
	Dispatch {
		/// The category (pallet) reporting the error.
		category: String,
		/// The name of the error.
		name: String,
	},
	/// The transaction failed with an error that could not be decoded from metadata.
	#[error("Transaction failed: {0}")]
	DispatchRaw(String),
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// An amount could not be converted into base units.
	#[error("Invalid amount `{amount}`: {reason}")]
	InvalidAmount {
		/// The amount as entered.
		amount: String,
		/// Why it was rejected.
		reason: &'static str,
	},
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Failed to create keypair from URI: {0}")]
	KeyPairCreation(String),
	/// A required parameter was left empty.
	#[error("Missing value for the required parameter `{0}`")]
	MissingParameter(String),
	/// There is no endpoint to connect to.
	#[error("No endpoint has been selected")]
	NoEndpoint,
	/// The wallet has no accounts to sign with.
	#[error("No accounts found. Please create an account in your wallet.")]
	NoAccount,
	/// No wallet is available or it refused to authorize the application.
	#[error("No wallet found. Please install a wallet and authorize this application.")]
	NoWallet,
	/// The operation requires a ready connection.
	#[error("Not connected to a node")]
	NotReady,
	/// The operation could not be found within its category.
	#[error("Operation not found: {category}.{operation}")]
	OperationNotFound {
		/// The category searched.
		category: String,
		/// The missing operation.
		operation: String,
	},
	/// The number of supplied values does not match the operation's parameters.
	#[error("`{operation}` expects {expected} values, but {received} were supplied")]
	ParameterCount {
		/// The operation being prepared.
		operation: String,
		/// Number of declared parameters.
		expected: usize,
		/// Number of supplied values.
		received: usize,
	},
	#[error("ParseError error: {0}")]
	ParseError(#[from] url::ParseError),
	#[error("Failed to parse secret URI: {0}")]
	ParseSecretURI(String),
	/// The user or the wallet declined to sign.
	#[error("The signature request was rejected")]
	SignatureRejected,
	#[error("Storage query failed: {0}")]
	Storage(String),
	/// The transaction could not be submitted or its status could not be followed.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// An operation did not complete in time.
	#[error("Timed out after {after:?} while {operation}")]
	Timeout {
		/// The time waited.
		after: Duration,
		/// What was being waited for.
		operation: &'static str,
	},
	/// The signer address is not managed by the current wallet session.
	#[error("Unknown signer: {0}")]
	UnknownSigner(String),
}
