// SPDX-License-Identifier: GPL-3.0

use crate::errors::Error;
use std::{
	collections::BTreeMap,
	fs,
	path::PathBuf,
};

/// The key under which the last targeted endpoint is stored.
pub const ENDPOINT_KEY: &str = "polkadot_endpoint";

/// Durable key/value preferences, persisted as a JSON object.
///
/// Every write goes straight to disk so that a restart observes the latest values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preferences {
	path: Option<PathBuf>,
	values: BTreeMap<String, String>,
}

impl Preferences {
	/// Loads the preferences stored at `path`. A missing file yields empty preferences and an
	/// unreadable one is ignored with a warning.
	///
	/// # Arguments
	/// * `path` - Location of the preferences file.
	pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
		let path = path.into();
		let values = match fs::read_to_string(&path) {
			Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
				log::warn!("Ignoring unreadable preferences at {}: {e}", path.display());
				BTreeMap::new()
			}),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(e.into()),
		};
		Ok(Self { path: Some(path), values })
	}

	/// Preferences which are kept in memory only.
	pub fn in_memory() -> Self {
		Self::default()
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.values.get(key).map(String::as_str)
	}

	/// Stores `value` under `key` and writes the preferences through to disk.
	pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
		if self.get(key) == Some(value) {
			return Ok(());
		}
		self.values.insert(key.to_string(), value.to_string());
		self.save()
	}

	/// The last targeted endpoint.
	pub fn endpoint(&self) -> Option<&str> {
		self.get(ENDPOINT_KEY).filter(|endpoint| !endpoint.is_empty())
	}

	/// Remembers `endpoint` as the last targeted endpoint.
	pub fn set_endpoint(&mut self, endpoint: &str) -> Result<(), Error> {
		self.set(ENDPOINT_KEY, endpoint)
	}

	fn save(&self) -> Result<(), Error> {
		let Some(path) = &self.path else {
			return Ok(());
		};
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		// Write to a sibling file first so a crash never leaves a truncated file behind.
		let staging = path.with_extension("json.tmp");
		fs::write(&staging, serde_json::to_string_pretty(&self.values)?)?;
		fs::rename(&staging, path)?;
		Ok(())
	}
}
