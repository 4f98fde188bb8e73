// SPDX-License-Identifier: GPL-3.0

//! Signing, submitting and following a transaction.
//!
//! [`submit`] checks every precondition before touching the network, builds the call, asks the
//! wallet for a signature and returns a [`Submission`] reporting the transaction's progress.

use crate::{
	catalog::Operation,
	client::{CallRequest, ChainClient, DispatchFailure, EventRecord, TxUpdate, TxUpdates},
	errors::Error,
	wallet::{SignatureRequest, Wallet, find_account},
};
use futures::{Stream, StreamExt, stream};
use std::fmt::Formatter;
use strum_macros::Display;

pub mod coerce;

pub use coerce::{ArgumentValue, coerce_arguments};

/// The stage a submission is in.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum SubmissionStatus {
	/// The call is being built.
	Preparing,
	/// Waiting for the wallet to approve the signature.
	AwaitingSignature,
	/// Accepted into the transaction pool.
	Submitted,
	/// Included in a block.
	InBlock,
	/// Included in a finalized block and dispatched successfully.
	Finalized,
	/// The transaction failed or its progress was lost.
	Failed,
}

impl SubmissionStatus {
	/// Whether no further progress will be reported.
	pub fn is_terminal(&self) -> bool {
		matches!(self, SubmissionStatus::Finalized | SubmissionStatus::Failed)
	}
}

/// Why a submission failed after being sent to the node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FailureReason {
	/// The runtime reported a dispatch error.
	Dispatch(DispatchFailure),
	/// The node dropped or rejected the transaction.
	Dropped(String),
	/// The status of the transaction could not be followed.
	Transport(String),
	/// The node stopped reporting before the transaction was finalized.
	Interrupted,
}

impl std::fmt::Display for FailureReason {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			FailureReason::Dispatch(failure) => write!(f, "{failure}"),
			FailureReason::Dropped(message) => write!(f, "dropped: {message}"),
			FailureReason::Transport(message) => write!(f, "{message}"),
			FailureReason::Interrupted => write!(f, "the node stopped reporting progress"),
		}
	}
}

impl From<FailureReason> for Error {
	fn from(reason: FailureReason) -> Self {
		match reason {
			FailureReason::Dispatch(failure) => failure.into(),
			reason => Error::Submission(reason.to_string()),
		}
	}
}

/// Progress reported by a [`Submission`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmissionEvent {
	/// The transaction was accepted into the pool.
	Submitted {
		/// Hash of the transaction.
		tx_hash: String,
	},
	/// The transaction was first included in a block.
	InBlock {
		/// Hash of the block.
		block_hash: String,
		/// Events emitted by the transaction, without `System.ExtrinsicSuccess`.
		events: Vec<EventRecord>,
	},
	/// The transaction was finalized and dispatched successfully.
	Finalized {
		/// Hash of the block.
		block_hash: String,
		/// Events emitted by the transaction, without `System.ExtrinsicSuccess`.
		events: Vec<EventRecord>,
	},
	/// The transaction failed.
	Failed(FailureReason),
}

/// The state of a transaction from preparation to a terminal status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingSubmission {
	/// The category of the operation.
	pub category: String,
	/// The operation name.
	pub operation: String,
	/// The values as entered by the user.
	pub parameter_values: Vec<String>,
	/// The signing account.
	pub signer_address: String,
	/// The current stage.
	pub status: SubmissionStatus,
	/// Hash of the transaction, once submitted.
	pub tx_hash: Option<String>,
	/// Hash of the including block, once included.
	pub block_hash: Option<String>,
	/// Events emitted by the transaction, without `System.ExtrinsicSuccess`.
	pub events: Vec<EventRecord>,
	/// Why the transaction failed, if it did.
	pub failure: Option<FailureReason>,
}

/// A submitted transaction whose progress can be followed.
///
/// The status subscription is dropped as soon as a terminal status is reached.
pub struct Submission {
	pending: PendingSubmission,
	updates: Option<TxUpdates>,
}

impl Submission {
	/// The current state of the transaction.
	pub fn pending(&self) -> &PendingSubmission {
		&self.pending
	}

	/// Whether the node is still reporting progress.
	pub fn is_subscribed(&self) -> bool {
		self.updates.is_some()
	}

	/// Waits for the next progress event. Returns `None` once a terminal event was reported.
	pub async fn next_event(&mut self) -> Option<SubmissionEvent> {
		loop {
			let update = self.updates.as_mut()?.next().await;
			let event = match update {
				Some(Ok(TxUpdate::Submitted { tx_hash })) => {
					self.pending.status = SubmissionStatus::Submitted;
					self.pending.tx_hash = Some(tx_hash.clone());
					SubmissionEvent::Submitted { tx_hash }
				},
				Some(Ok(TxUpdate::InBlock { block_hash, events })) => {
					// Only the first inclusion is reported.
					if self.pending.status == SubmissionStatus::InBlock {
						continue;
					}
					let events = without_success(events);
					self.pending.status = SubmissionStatus::InBlock;
					self.pending.block_hash = Some(block_hash.clone());
					self.pending.events = events.clone();
					SubmissionEvent::InBlock { block_hash, events }
				},
				Some(Ok(TxUpdate::Finalized { block_hash, events, failure })) => {
					self.pending.block_hash = Some(block_hash.clone());
					let events = without_success(events);
					if !events.is_empty() {
						self.pending.events = events.clone();
					}
					match failure {
						Some(failure) => self.fail(FailureReason::Dispatch(failure)),
						None => {
							self.pending.status = SubmissionStatus::Finalized;
							SubmissionEvent::Finalized { block_hash, events }
						},
					}
				},
				Some(Ok(TxUpdate::Dropped(message))) => self.fail(FailureReason::Dropped(message)),
				Some(Err(e)) => self.fail(FailureReason::Transport(e.to_string())),
				None => self.fail(FailureReason::Interrupted),
			};
			if self.pending.status.is_terminal() {
				// Unsubscribe.
				self.updates = None;
			}
			log::debug!(
				"{} is {}",
				self.pending.tx_hash.as_deref().unwrap_or("transaction"),
				self.pending.status
			);
			return Some(event);
		}
	}

	/// Follows the transaction until it is finalized.
	///
	/// Returns the final state, or the failure as an error.
	pub async fn wait_for_finalized(mut self) -> Result<PendingSubmission, Error> {
		while let Some(event) = self.next_event().await {
			if let SubmissionEvent::Failed(reason) = event {
				return Err(reason.into());
			}
		}
		Ok(self.pending)
	}

	/// Turns the submission into a stream of its progress events.
	pub fn into_stream(self) -> impl Stream<Item = SubmissionEvent> + Send {
		stream::unfold(self, |mut submission| async move {
			submission.next_event().await.map(|event| (event, submission))
		})
	}

	fn fail(&mut self, reason: FailureReason) -> SubmissionEvent {
		log::warn!("{} failed: {reason}", self.pending.operation);
		self.pending.status = SubmissionStatus::Failed;
		self.pending.failure = Some(reason.clone());
		SubmissionEvent::Failed(reason)
	}
}

/// Builds, signs and submits `operation`.
///
/// The values are checked against the operation's parameters and the signer must be an account
/// of `wallet` before anything is sent to the node. A declined signature fails with
/// [`Error::SignatureRejected`].
///
/// # Arguments
/// * `client` - The ready connection.
/// * `wallet` - The enabled wallet holding the signer.
/// * `operation` - The operation to submit.
/// * `parameter_values` - One value per parameter of `operation`.
/// * `signer_address` - The SS58 address of the signing account.
pub async fn submit<C: ChainClient + ?Sized, W: Wallet + ?Sized>(
	client: &C,
	wallet: &W,
	operation: &Operation,
	parameter_values: Vec<String>,
	signer_address: &str,
) -> Result<Submission, Error> {
	let qualified_name = operation.qualified_name();
	coerce::check_values(&qualified_name, &operation.parameters, &parameter_values)?;
	let account = find_account(wallet, signer_address).await?;
	let mut pending = PendingSubmission {
		category: operation.category.clone(),
		operation: operation.name.clone(),
		parameter_values,
		signer_address: signer_address.to_string(),
		status: SubmissionStatus::Preparing,
		tx_hash: None,
		block_hash: None,
		events: Vec::new(),
		failure: None,
	};

	let args = coerce::to_values(
		&operation.category,
		&operation.parameters,
		pending.parameter_values.clone(),
		client.token().decimals,
	)?;
	let call_data = client.encode_call(&CallRequest {
		pallet: operation.pallet.clone(),
		call: operation.call.clone(),
		args,
	})?;

	pending.status = SubmissionStatus::AwaitingSignature;
	let request =
		SignatureRequest { address: account.address.clone(), operation: qualified_name, call_data };
	let key = wallet.signer(&account.source)?.sign(&request).await?;
	if key.address() != account.address {
		return Err(Error::UnknownSigner(key.address()));
	}

	let updates = client.submit(request.call_data, key).await?;
	Ok(Submission { pending, updates: Some(updates) })
}

fn without_success(events: Vec<EventRecord>) -> Vec<EventRecord> {
	events.into_iter().filter(|event| !event.is_extrinsic_success()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		catalog::{self, ParameterSource},
		client::Connector,
		testing::{ALICE, BOB, MockClient, MockConnector, POLKADOT, sample_events},
		wallet::KeyringWallet,
	};
	use anyhow::Result;
	use url::Url;

	async fn mock_client(connector: &MockConnector) -> Result<MockClient> {
		Ok(connector.connect(&Url::parse(POLKADOT)?).await?)
	}

	async fn wallet() -> Result<KeyringWallet> {
		let mut wallet = KeyringWallet::dev()?;
		wallet.enable("test").await?;
		Ok(wallet)
	}

	fn transfer(client: &MockClient) -> Result<Operation> {
		let categories = catalog::categories(client.pallets());
		Ok(catalog::find_operation(&categories, "balances", "transferKeepAlive")?.clone())
	}

	fn values(values: &[&str]) -> Vec<String> {
		values.iter().map(|v| v.to_string()).collect()
	}

	#[tokio::test]
	async fn submit_reports_progress_until_finalized() -> Result<()> {
		let connector = MockConnector::default();
		let client = mock_client(&connector).await?;
		let operation = transfer(&client)?;
		assert_eq!(operation.source, ParameterSource::Override);
		let mut submission =
			submit(&client, &wallet().await?, &operation, values(&[BOB, "1.5"]), ALICE).await?;
		assert_eq!(submission.pending().status, SubmissionStatus::AwaitingSignature);

		assert_eq!(
			submission.next_event().await,
			Some(SubmissionEvent::Submitted { tx_hash: "0x01".into() })
		);
		let Some(SubmissionEvent::InBlock { block_hash, events }) = submission.next_event().await
		else {
			panic!("expected inclusion");
		};
		assert_eq!(block_hash, "0xb1");
		assert!(events.iter().all(|e| !e.is_extrinsic_success()));
		assert_eq!(events.len(), sample_events().len() - 1);
		// The repeated inclusion is skipped.
		assert!(matches!(
			submission.next_event().await,
			Some(SubmissionEvent::Finalized { block_hash, .. }) if block_hash == "0xb1"
		));
		assert!(!submission.is_subscribed());
		assert!(connector.unsubscribed());
		assert_eq!(submission.next_event().await, None);
		assert_eq!(submission.pending().status, SubmissionStatus::Finalized);
		assert_eq!(submission.pending().tx_hash.as_deref(), Some("0x01"));

		let call = connector.calls().pop().unwrap();
		assert_eq!((call.pallet.as_str(), call.call.as_str()), ("Balances", "transfer_keep_alive"));
		assert_eq!(call.args[1], subxt::dynamic::Value::u128(1_500_000_000_000));
		assert_eq!(connector.submitted_by(), vec![ALICE.to_string()]);
		Ok(())
	}

	#[tokio::test]
	async fn dispatch_error_fails_submission() -> Result<()> {
		let connector = MockConnector::default().with_updates(vec![
			Ok(TxUpdate::Submitted { tx_hash: "0x02".into() }),
			Ok(TxUpdate::Finalized {
				block_hash: "0xb2".into(),
				events: vec![],
				failure: Some(DispatchFailure::Module {
					category: "balances".into(),
					name: "InsufficientBalance".into(),
				}),
			}),
		]);
		let client = mock_client(&connector).await?;
		let submission =
			submit(&client, &wallet().await?, &transfer(&client)?, values(&[BOB, "1"]), ALICE)
				.await?;
		assert!(matches!(
			submission.wait_for_finalized().await,
			Err(Error::Dispatch { category, name })
				if category == "balances" && name == "InsufficientBalance"
		));
		assert!(connector.unsubscribed());
		Ok(())
	}

	#[tokio::test]
	async fn dropped_and_interrupted_transactions_fail() -> Result<()> {
		let connector =
			MockConnector::default().with_updates(vec![Ok(TxUpdate::Dropped("Invalid".into()))]);
		let client = mock_client(&connector).await?;
		let events: Vec<_> =
			submit(&client, &wallet().await?, &transfer(&client)?, values(&[BOB, "1"]), ALICE)
				.await?
				.into_stream()
				.collect()
				.await;
		assert_eq!(events, vec![SubmissionEvent::Failed(FailureReason::Dropped("Invalid".into()))]);

		let connector = MockConnector::default()
			.with_updates(vec![Ok(TxUpdate::Submitted { tx_hash: "0x03".into() })])
			.ending();
		let client = mock_client(&connector).await?;
		let mut submission =
			submit(&client, &wallet().await?, &transfer(&client)?, values(&[BOB, "1"]), ALICE)
				.await?;
		submission.next_event().await;
		assert_eq!(
			submission.next_event().await,
			Some(SubmissionEvent::Failed(FailureReason::Interrupted))
		);
		assert_eq!(submission.pending().failure, Some(FailureReason::Interrupted));
		Ok(())
	}

	#[tokio::test]
	async fn preconditions_fail_before_any_network_call() -> Result<()> {
		let connector = MockConnector::default();
		let client = mock_client(&connector).await?;
		let wallet = wallet().await?;
		let operation = transfer(&client)?;

		assert!(matches!(
			submit(&client, &wallet, &operation, values(&[BOB, ""]), ALICE).await,
			Err(Error::MissingParameter(name)) if name == "value"
		));
		assert!(matches!(
			submit(&client, &wallet, &operation, values(&[BOB]), ALICE).await,
			Err(Error::ParameterCount { .. })
		));
		assert!(matches!(
			submit(
				&client,
				&wallet,
				&operation,
				values(&[BOB, "1"]),
				"5C4hrfjw9DjXZTzV3MwzrrAr9P1MJhSrvWGWqi1eSuyUpnhM"
			)
			.await,
			Err(Error::UnknownSigner(_))
		));
		assert!(matches!(
			submit(&client, &wallet, &operation, values(&[BOB, "1.0000000000001"]), ALICE).await,
			Err(Error::InvalidAmount { .. })
		));
		assert!(connector.calls().is_empty());
		assert!(connector.submitted_by().is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn malformed_call_is_a_construction_error() -> Result<()> {
		let connector = MockConnector::default();
		let client = mock_client(&connector).await?;
		let mut operation = transfer(&client)?;
		operation.call = "transfer_everything".into();
		assert!(matches!(
			submit(&client, &wallet().await?, &operation, values(&[BOB, "1"]), ALICE).await,
			Err(Error::Construction(_))
		));
		assert!(connector.submitted_by().is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn rejected_signature_is_reported() -> Result<()> {
		let connector = MockConnector::default();
		let client = mock_client(&connector).await?;
		let mut wallet = KeyringWallet::dev()?.with_approval(|_| false);
		wallet.enable("test").await?;
		assert!(matches!(
			submit(&client, &wallet, &transfer(&client)?, values(&[BOB, "1"]), ALICE).await,
			Err(Error::SignatureRejected)
		));
		assert!(connector.submitted_by().is_empty());
		Ok(())
	}
}
