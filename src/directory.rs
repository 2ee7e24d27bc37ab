//! The in-memory directory: loading entries, authenticating binds and
//! answering searches.
use std::{collections::HashSet, path::Path, sync::Arc, time::SystemTime};

use parking_lot::{Mutex, RwLock};
use serde_yaml::Value;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::{
	config::Config,
	entry::{same_name, Attribute, Entry},
	error::Error,
	filter::Filter,
	password,
};

/// Name of the attribute holding a user's password.
const PASSWORD_ATTRIBUTE: &str = "userPassword";

/// An immutable set of entries, as published by one successful reload.
#[derive(Debug, Default)]
pub struct Snapshot {
	/// The entries, in document order.
	pub entries: Vec<Entry>,
	/// Number of successful reloads that led to this snapshot. The empty
	/// snapshot a directory starts with is generation 0.
	pub generation: u64,
	/// When this snapshot was published.
	pub loaded_at: Option<OffsetDateTime>,
}

/// Result of a bind attempt. Unknown DNs and wrong passwords are deliberately
/// indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
	/// The DN exists and the password matched.
	Success,
	/// Either the DN or the password was wrong.
	InvalidCredentials,
}

/// Holds the directory's entries and provides the operations on them.
///
/// Cloning is cheap, and all clones share the same entries.
#[derive(Debug, Clone)]
pub struct Directory {
	/// The configuration of the directory.
	config: Config,
	/// The currently published snapshot. Writers only hold the lock for the
	/// pointer swap.
	snapshot: Arc<RwLock<Arc<Snapshot>>>,
	/// Serialises reloads.
	reload_lock: Arc<Mutex<()>>,
}

impl Directory {
	/// Create an empty [`Directory`] with the given configuration. Nothing is
	/// loaded until [`Directory::reload`] is called.
	#[must_use]
	pub fn new(config: Config) -> Self {
		Directory {
			config,
			snapshot: Arc::new(RwLock::new(Arc::new(Snapshot::default()))),
			reload_lock: Arc::new(Mutex::new(())),
		}
	}

	/// The configuration this directory was created with.
	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The currently published snapshot. It stays valid, and unchanged, for as
	/// long as the caller holds on to it.
	#[must_use]
	pub fn snapshot(&self) -> Arc<Snapshot> {
		Arc::clone(&self.snapshot.read())
	}

	/// Read the configured users document and replace the entries with its
	/// contents. Returns the number of entries loaded.
	pub async fn reload(&self) -> Result<usize, Error> {
		let path = &self.config.users_file;
		info!(path = %path.display(), "Reloading users");
		let source = tokio::fs::read_to_string(path).await.map_err(|err| {
			error!(path = %path.display(), "Failed to read users document: {err}");
			err
		})?;
		self.reload_from_str(&source)
	}

	/// Replace the entries with the contents of a users document. On error
	/// the previous entries stay in place.
	pub fn reload_from_str(&self, source: &str) -> Result<usize, Error> {
		let _reloading = self.reload_lock.lock();

		let entries = parse_users(source).map_err(|err| {
			error!("Failed to parse users document: {err}");
			err
		})?;
		let count = entries.len();
		let generation = self.snapshot().generation + 1;
		let next = Arc::new(Snapshot {
			entries,
			generation,
			loaded_at: Some(OffsetDateTime::now_utc()),
		});
		*self.snapshot.write() = next;

		info!(generation, entries = count, "Published new directory snapshot");
		Ok(count)
	}

	/// Check a DN and plain text password against the stored entries.
	#[must_use]
	pub fn bind(&self, dn: &str, password: &str) -> BindOutcome {
		let snapshot = self.snapshot();
		let Some(entry) = snapshot.entries.iter().find(|entry| entry.dn == dn) else {
			warn!(operation = "bind", bind_dn = dn, "Bind rejected, dn does not exist");
			return BindOutcome::InvalidCredentials;
		};
		if entry.values(PASSWORD_ATTRIBUTE).any(|stored| password::matches(stored, password)) {
			info!(operation = "bind", bind_dn = dn, "Bind accepted");
			BindOutcome::Success
		} else {
			warn!(operation = "bind", bind_dn = dn, "Bind rejected, invalid password");
			BindOutcome::InvalidCredentials
		}
	}

	/// All entries matching `filter`, in snapshot order.
	#[must_use]
	pub fn search(&self, filter: &Filter) -> Vec<Entry> {
		let snapshot = self.snapshot();
		let matches: Vec<Entry> =
			snapshot.entries.iter().filter(|entry| filter.evaluate(entry)).cloned().collect();
		debug!(operation = "search", %filter, results = matches.len(), "Search completed");
		matches
	}

	/// Parse `filter` and search with it. `(dn=*)` lists every entry.
	pub fn query(&self, filter: &str) -> Result<Vec<Entry>, Error> {
		let filter: Filter = filter.parse()?;
		Ok(self.search(&filter))
	}

	/// Watch the users document forever, reloading whenever its modification
	/// time or size changes. Failed reloads are logged and retried on the next
	/// change. Returns immediately if reloading is disabled.
	///
	/// A rewrite that keeps the file size and lands within the file system's
	/// timestamp granularity of the previous one is not noticed. Call
	/// [`Directory::reload`] directly when that matters.
	pub async fn watch(&self) {
		if !self.config.reload.enabled {
			return;
		}
		let path = &self.config.users_file;
		let interval = self.config.reload.interval();
		let mut last_seen = file_stamp(path).await;
		loop {
			tokio::time::sleep(interval).await;
			let stamp = file_stamp(path).await;
			if stamp == last_seen {
				continue;
			}
			last_seen = stamp;
			if let Err(err) = self.reload().await {
				error!(path = %path.display(), "Reloading users failed: {err}");
			}
		}
	}
}

/// Modification time and size of a file, if it can be read.
async fn file_stamp(path: &Path) -> Option<(SystemTime, u64)> {
	let metadata = tokio::fs::metadata(path).await.ok()?;
	Some((metadata.modified().ok()?, metadata.len()))
}

/// Parse the `users` list of a users document into entries.
fn parse_users(source: &str) -> Result<Vec<Entry>, Error> {
	let document: Value = serde_yaml::from_str(source)?;
	let users = document
		.get("users")
		.ok_or_else(|| Error::Invalid("missing 'users' list".to_owned()))?
		.as_sequence()
		.ok_or_else(|| Error::Invalid("'users' is not a list".to_owned()))?;

	let mut seen = HashSet::new();
	let mut entries = Vec::with_capacity(users.len());
	for entry in users.iter().filter_map(parse_user) {
		if !seen.insert(entry.dn.clone()) {
			warn!(dn = %entry.dn, "Skipping user record with a duplicate dn");
			continue;
		}
		entries.push(entry);
	}
	Ok(entries)
}

/// Parse one user record. Records that aren't mappings or lack a string `dn`
/// are skipped, as are individual fields that can't be turned into attributes.
fn parse_user(user: &Value) -> Option<Entry> {
	let Some(fields) = user.as_mapping() else {
		warn!("Skipping user record that is not a mapping");
		return None;
	};
	let Some(dn) = fields.get("dn").and_then(Value::as_str) else {
		warn!("Skipping user record without a dn");
		return None;
	};

	let mut entry = Entry::new(dn);
	for (key, value) in fields {
		let Some(name) = key.as_str() else {
			warn!(dn, "Skipping attribute because there is no valid name");
			continue;
		};
		if name == "dn" {
			continue;
		}
		let Some(mut values) = attribute_values(value) else {
			warn!(dn, attribute = name, "Skipping attribute because there are no valid values");
			continue;
		};
		if same_name(name, PASSWORD_ATTRIBUTE) {
			values = values
				.iter()
				.filter_map(|value| {
					password::ingest(value)
						.map_err(|err| error!(dn, "Failed to parse password: {err}"))
						.ok()
				})
				.collect();
		}
		debug!(dn, attribute = name, values = values.len(), "Adding attribute");
		entry.attributes.push(Attribute { name: name.to_owned(), values });
	}
	Some(entry)
}

/// Scalars become a single value and lists become multiple values, with
/// non-scalar list items dropped. Anything else has no usable values.
fn attribute_values(value: &Value) -> Option<Vec<String>> {
	match value {
		Value::Sequence(items) => Some(items.iter().filter_map(scalar).collect()),
		other => scalar(other).map(|value| vec![value]),
	}
}

/// The string form of a scalar YAML value.
fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::String(value) => Some(value.clone()),
		Value::Number(value) => Some(value.to_string()),
		Value::Bool(value) => Some(value.to_string()),
		_ => None,
	}
}
