//! Directory entries and helpers for reading their attributes.
use std::collections::HashMap;

use ldap3::SearchEntry;

/// Name of the pseudo-attribute that resolves to an entry's DN.
const DN_ATTRIBUTE: &str = "dn";

/// A named, possibly multi-valued, attribute of an [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	/// The attribute name, in the spelling it was loaded with.
	pub name: String,
	/// The attribute's values, in load order.
	pub values: Vec<String>,
}

impl Attribute {
	/// Create an attribute from a name and its values.
	#[must_use]
	pub fn new(
		name: impl Into<String>,
		values: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		Self { name: name.into(), values: values.into_iter().map(Into::into).collect() }
	}
}

/// A directory entry: a distinguished name plus an ordered attribute list.
///
/// The same attribute name may appear more than once in `attributes`. Lookups
/// compare names case-insensitively and treat all matching records as a
/// single logical attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	/// The distinguished name, unique within a snapshot.
	pub dn: String,
	/// The attributes in storage order.
	pub attributes: Vec<Attribute>,
}

impl Entry {
	/// Create an entry with no attributes.
	#[must_use]
	pub fn new(dn: impl Into<String>) -> Self {
		Self { dn: dn.into(), attributes: Vec::new() }
	}

	/// Append an attribute, returning the entry.
	#[must_use]
	pub fn with(mut self, attribute: Attribute) -> Self {
		self.attributes.push(attribute);
		self
	}

	/// All values of the logical attribute `name`, in storage order.
	///
	/// `dn` is answered with the entry's distinguished name when the entry has
	/// no stored attribute of that name.
	pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		let stored = self.attributes.iter().any(|attr| same_name(&attr.name, name));
		let dn = (!stored && same_name(name, DN_ATTRIBUTE)).then_some(self.dn.as_str());
		self.attributes
			.iter()
			.filter(move |attr| same_name(&attr.name, name))
			.flat_map(|attr| attr.values.iter().map(String::as_str))
			.chain(dn)
	}

	/// Get the first value of an attribute.
	#[must_use]
	pub fn attr_first<'a>(&'a self, name: &'a str) -> Option<&'a str> {
		self.values(name).next()
	}
}

impl From<&Entry> for SearchEntry {
	fn from(entry: &Entry) -> Self {
		let mut attrs: HashMap<String, Vec<String>> = HashMap::new();
		for attribute in &entry.attributes {
			let key = attrs
				.keys()
				.find(|key| same_name(key, &attribute.name))
				.cloned()
				.unwrap_or_else(|| attribute.name.clone());
			attrs.entry(key).or_default().extend(attribute.values.iter().cloned());
		}
		SearchEntry { dn: entry.dn.clone(), attrs, bin_attrs: HashMap::new() }
	}
}

/// Compare two attribute names case-insensitively.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
	a == b || a.to_lowercase() == b.to_lowercase()
}
