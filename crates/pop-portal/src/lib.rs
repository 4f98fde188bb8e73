// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

/// The operations and storage entries a chain offers, read from its metadata.
pub mod catalog;
/// Connections to nodes.
pub mod client;
mod config;
/// Well-known networks and the relay allow-list.
pub mod endpoints;
mod errors;
/// The owned node connection.
pub mod session;
mod store;
/// Building, signing and following transactions.
pub mod submission;
/// Test doubles for the connector and chain client.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
/// Conversions between decimal amounts and base units.
pub mod units;
/// Accounts and signature approval.
pub mod wallet;

pub use catalog::{
	Operation, OperationCategory, ParameterShape, ParameterSource, ParameterSpec, StorageCategory,
	StorageItem, WidgetKind, categories, choose_input_widget, infer_parameters,
};
pub use client::{
	ChainClient, Connector, DispatchFailure, EventRecord, SystemInfo, TokenInfo,
	online::{OnlineChainClient, OnlineConnector},
};
pub use config::{
	DEFAULT_APP_NAME, DEFAULT_CONNECT_TIMEOUT, ENDPOINT_ENV_VAR, PortalConfig,
	default_preferences_path, initial_endpoint,
};
pub use endpoints::Network;
pub use errors::Error;
pub use session::{Connection, ConnectionState, Session};
pub use store::{ENDPOINT_KEY, Preferences};
pub use submission::{
	FailureReason, PendingSubmission, Submission, SubmissionEvent, SubmissionStatus, submit,
};
pub use wallet::{Account, Extension, KeyringWallet, Signer, Wallet, connect_wallet};

/// Operations tried, in order, when transferring the native token.
pub const TRANSFER_OPERATIONS: [&str; 3] = ["transfer", "transferAllowDeath", "transferKeepAlive"];
