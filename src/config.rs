//! Config for the directory.
use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Directory configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
	/// The suffix served by this directory, e.g. `dc=example,dc=org`. Searches
	/// based outside of it find nothing.
	pub base_dn: String,
	/// Path of the YAML document holding the `users` list.
	pub users_file: PathBuf,
	/// When and how the users document is reloaded.
	#[serde(default)]
	pub reload: ReloadConfig,
}

/// Configuration for picking up changes to the users document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReloadConfig {
	/// Whether the users document should be watched at all.
	pub enabled: bool,
	/// Seconds between checks of the users document's modification time.
	pub interval: u64,
}

impl Default for ReloadConfig {
	fn default() -> Self {
		Self { enabled: true, interval: 10 }
	}
}

impl ReloadConfig {
	/// The polling interval as a [`Duration`]. Never zero.
	#[must_use]
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.interval.max(1))
	}
}

impl Config {
	/// Returns an example Config
	#[allow(dead_code)]
	pub(crate) fn example() -> Self {
		Config {
			base_dn: "dc=example,dc=org".to_owned(),
			users_file: PathBuf::from("users.yaml"),
			reload: ReloadConfig { enabled: false, interval: 1 },
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::{Config, ReloadConfig};

	#[test]
	fn deserialize_with_defaults() -> Result<(), Box<dyn std::error::Error>> {
		let config: Config = serde_yaml::from_str(
			"base_dn: dc=example,dc=org\nusers_file: /etc/directory/users.yaml\n",
		)?;
		assert_eq!(config.base_dn, "dc=example,dc=org");
		assert!(config.reload.enabled);
		assert_eq!(config.reload.interval(), Duration::from_secs(10));

		Ok(())
	}

	#[test]
	fn interval_is_never_zero() {
		let reload = ReloadConfig { enabled: true, interval: 0 };
		assert_eq!(reload.interval(), Duration::from_secs(1));
		assert!(!Config::example().reload.enabled);
	}
}
