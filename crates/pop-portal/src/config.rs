// SPDX-License-Identifier: GPL-3.0

use crate::store::Preferences;
use std::{path::PathBuf, time::Duration};

/// The name the application presents itself with to wallets.
pub const DEFAULT_APP_NAME: &str = "Pop Portal";
/// How long a connection attempt may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Environment variable supplying the endpoint when none was persisted.
pub const ENDPOINT_ENV_VAR: &str = "POP_PORTAL_ENDPOINT";

/// Settings of a portal session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortalConfig {
	/// The name presented to wallets.
	pub app_name: String,
	/// Upper bound for establishing a connection.
	pub connect_timeout: Duration,
	/// Location of the preferences file.
	pub preferences_path: PathBuf,
}

impl Default for PortalConfig {
	fn default() -> Self {
		Self {
			app_name: DEFAULT_APP_NAME.to_string(),
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			preferences_path: default_preferences_path(),
		}
	}
}

impl PortalConfig {
	/// Sets the connection timeout.
	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;
		self
	}

	/// Sets the location of the preferences file.
	pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.preferences_path = path.into();
		self
	}
}

/// `<config dir>/pop/portal.json`, falling back to the temporary directory on platforms without
/// a configuration directory.
pub fn default_preferences_path() -> PathBuf {
	dirs::config_dir().unwrap_or_else(std::env::temp_dir).join("pop").join("portal.json")
}

/// The endpoint to start with: the persisted one, otherwise the one from [`ENDPOINT_ENV_VAR`].
pub fn initial_endpoint(preferences: &Preferences) -> Option<String> {
	preferences.endpoint().map(str::to_string).or_else(|| {
		std::env::var(ENDPOINT_ENV_VAR).ok().filter(|endpoint| !endpoint.trim().is_empty())
	})
}
