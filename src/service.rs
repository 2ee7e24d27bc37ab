//! Request-level handling of already decoded bind and search operations.
//!
//! The wire protocol lives elsewhere; this module turns requests into
//! [`LdapResult`]s and [`SearchEntry`]s that the protocol layer can encode.
use ldap3::{LdapResult, SearchEntry};
use tracing::{info, warn};

use crate::{
	directory::{BindOutcome, Directory},
	filter::Filter,
};

/// LDAP result codes (RFC4511 section 4.1.9) produced by this service.
pub mod result_code {
	/// The operation completed.
	pub const SUCCESS: u32 = 0;
	/// The search base is not served by this directory.
	pub const NO_SUCH_OBJECT: u32 = 32;
	/// The bind DN or password was wrong.
	pub const INVALID_CREDENTIALS: u32 = 49;
	/// The request cannot be served, e.g. its filter is not understood.
	pub const UNWILLING_TO_PERFORM: u32 = 53;
}

/// A decoded search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
	/// The DN the search is based at.
	pub base: String,
	/// The filter in RFC4515 string form.
	pub filter: String,
}

/// The entries and final result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
	/// Matching entries, in directory order.
	pub entries: Vec<SearchEntry>,
	/// The result to send after the entries.
	pub result: LdapResult,
}

/// Answers bind and search requests from a [`Directory`].
#[derive(Debug, Clone)]
pub struct SearchService {
	/// The directory requests are answered from.
	directory: Directory,
}

impl SearchService {
	/// Create a service answering from `directory`.
	#[must_use]
	pub fn new(directory: Directory) -> Self {
		Self { directory }
	}

	/// The directory requests are answered from.
	#[must_use]
	pub fn directory(&self) -> &Directory {
		&self.directory
	}

	/// Handle a simple bind.
	#[must_use]
	pub fn bind(&self, dn: &str, password: &str) -> LdapResult {
		match self.directory.bind(dn, password) {
			BindOutcome::Success => ldap_result(result_code::SUCCESS, ""),
			BindOutcome::InvalidCredentials => {
				ldap_result(result_code::INVALID_CREDENTIALS, "invalid credentials")
			}
		}
	}

	/// Handle a search made by `bound_dn`. Filters that don't parse are
	/// refused without looking at the directory.
	#[must_use]
	pub fn search(&self, bound_dn: &str, request: &SearchRequest) -> SearchResult {
		info!(
			operation = "search",
			bind_dn = bound_dn,
			filter = %request.filter,
			"Search received"
		);
		let filter: Filter = match request.filter.parse() {
			Ok(filter) => filter,
			Err(err) => {
				warn!(
					operation = "search",
					bind_dn = bound_dn,
					filter = %request.filter,
					"The client submitted an invalid filter: {err}"
				);
				return SearchResult {
					entries: Vec::new(),
					result: ldap_result(result_code::UNWILLING_TO_PERFORM, &err.to_string()),
				};
			}
		};

		let base_dn = &self.directory.config().base_dn;
		if !is_within(&request.base, base_dn) {
			warn!(
				operation = "search",
				base = %request.base,
				"Search base is outside of {base_dn}"
			);
			return SearchResult {
				entries: Vec::new(),
				result: ldap_result(result_code::NO_SUCH_OBJECT, ""),
			};
		}

		let entries: Vec<SearchEntry> = self
			.directory
			.search(&filter)
			.iter()
			.filter(|entry| is_within(&entry.dn, &request.base))
			.map(SearchEntry::from)
			.collect();
		info!(
			operation = "search",
			bind_dn = bound_dn,
			results = entries.len(),
			"Search completed"
		);
		SearchResult { entries, result: ldap_result(result_code::SUCCESS, "") }
	}
}

/// Whether `dn` is `base` or below it. Compared case-insensitively; the empty
/// base contains everything.
fn is_within(dn: &str, base: &str) -> bool {
	if base.is_empty() {
		return true;
	}
	let (dn, base) = (dn.to_lowercase(), base.to_lowercase());
	dn == base || dn.strip_suffix(&base).is_some_and(|parent| parent.ends_with(','))
}

/// Build a result with no referrals or controls.
fn ldap_result(rc: u32, text: &str) -> LdapResult {
	LdapResult {
		rc,
		matched: String::new(),
		text: text.to_owned(),
		refs: Vec::new(),
		ctrls: Vec::new(),
	}
}
