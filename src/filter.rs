//! Search filters: a small subset of the RFC4515 string syntax.
//!
//! Supported are conjunction `(&...)`, disjunction `(|...)`, negation `(!...)`
//! and attribute equality `(attr=value)`, where the value may contain `*` as a
//! wildcard matching any run of characters. Matching is case-insensitive and a
//! value matches when the pattern occurs anywhere in it, so `(uid=person)`
//! also finds `person1`.
//!
//! ```
//! use ldap_directory::{Attribute, Entry, Filter};
//!
//! let filter: Filter = "(&(uid=person*)(!(objectClass=disabled)))".parse()?;
//! let entry = Entry::new("cn=person1,dc=test,dc=lab").with(Attribute::new("uid", ["Person1"]));
//! assert!(filter.evaluate(&entry));
//! assert_eq!(filter.to_string(), "(&(uid=person*)(!(objectclass=disabled)))");
//! # Ok::<(), ldap_directory::Error>(())
//! ```
use std::{fmt, str::FromStr};

use regex::Regex;

use crate::{entry::Entry, error::Error};

mod parse;

pub use self::parse::{parse, parse_and, parse_equals, parse_not, parse_or};

/// A parsed search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
	/// Matches when any value of `attribute` matches `pattern`.
	Equals {
		/// Lower-cased attribute name.
		attribute: String,
		/// The value pattern.
		pattern: Pattern,
	},
	/// Matches when every child matches.
	And(Vec<Filter>),
	/// Matches when at least one child matches.
	Or(Vec<Filter>),
	/// Matches when the child does not.
	Not(Box<Filter>),
}

impl Filter {
	/// Build an equality assertion, normalising both sides to lower case.
	#[must_use]
	pub fn equals(attribute: &str, pattern: &str) -> Self {
		Filter::Equals { attribute: attribute.to_lowercase(), pattern: Pattern::new(pattern) }
	}

	/// Evaluate the filter against an entry. Evaluation never fails: a
	/// pattern that cannot be compiled matches nothing.
	#[must_use]
	pub fn evaluate(&self, entry: &Entry) -> bool {
		match self {
			Filter::Equals { attribute, pattern } => {
				entry.values(attribute).any(|value| pattern.is_match(value))
			}
			Filter::And(children) => children.iter().all(|child| child.evaluate(entry)),
			Filter::Or(children) => children.iter().any(|child| child.evaluate(entry)),
			Filter::Not(child) => !child.evaluate(entry),
		}
	}
}

/// The value side of an equality assertion, compiled once when the filter is
/// built.
///
/// The lower-cased pattern becomes a regular expression with `.` escaped and
/// `*` expanded to `.*`, which is searched for anywhere in the lower-cased
/// value. A pattern of only `*` needs a non-empty value.
#[derive(Debug, Clone)]
pub struct Pattern {
	/// Lower-cased source text.
	source: String,
	/// `None` if the source does not compile.
	regex: Option<Regex>,
}

impl Pattern {
	/// Lower-case and compile `pattern`.
	#[must_use]
	pub fn new(pattern: &str) -> Self {
		let source = pattern.to_lowercase();
		let regex = compile(&source);
		Self { source, regex }
	}

	/// The lower-cased pattern text.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Whether a single attribute value matches.
	#[must_use]
	pub fn is_match(&self, value: &str) -> bool {
		let Some(regex) = &self.regex else {
			return false;
		};
		let presence = !self.source.is_empty() && self.source.chars().all(|c| c == '*');
		if presence && value.is_empty() {
			return false;
		}
		regex.is_match(&value.to_lowercase())
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.source == other.source
	}
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Build the regular expression for a lower-cased pattern.
fn compile(pattern: &str) -> Option<Regex> {
	let expression = pattern.replace('.', "\\.").replace('*', ".*");
	match Regex::new(&expression) {
		Ok(regex) => Some(regex),
		Err(err) => {
			tracing::debug!(pattern, "Filter pattern does not compile: {err}");
			None
		}
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (operator, children) = match self {
			Filter::Equals { attribute, pattern } => return write!(f, "({attribute}={pattern})"),
			Filter::Not(child) => return write!(f, "(!{child})"),
			Filter::And(children) => ('&', children),
			Filter::Or(children) => ('|', children),
		};
		write!(f, "({operator}")?;
		for child in children {
			write!(f, "{child}")?;
		}
		f.write_str(")")
	}
}

impl FromStr for Filter {
	type Err = Error;

	/// Parse a complete filter. Surrounding whitespace is ignored, anything
	/// else left over after the filter is an error.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let (filter, end) = parse(s, 0)?;
		if end != s.len() {
			return Err(Error::InvalidExpression(crate::error::Condition::Any));
		}
		Ok(filter)
	}
}
