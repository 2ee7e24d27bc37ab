//! Recursive-descent parser for filter strings.
//!
//! Every entry point takes the full expression plus a byte offset to start
//! at, and returns the parsed [`Filter`] together with the offset just past
//! it. Composite parsers hand that offset on to their children, so nested
//! filters are read without copying the expression.
use super::Filter;
use crate::error::{Condition, Error};

/// Nesting limit for composite filters.
const MAX_DEPTH: usize = 128;

/// Parse the filter starting at `offset`, whatever its kind.
pub fn parse(expression: &str, offset: isize) -> Result<(Filter, usize), Error> {
	let offset = checked(expression, offset)?;
	Parser::new(expression).any(offset)
}

/// Parse an equality assertion, `(attr=value)`, starting at `offset`.
pub fn parse_equals(expression: &str, offset: isize) -> Result<(Filter, usize), Error> {
	let offset = checked(expression, offset)?;
	Parser::new(expression).equals(offset)
}

/// Parse a conjunction, `(&...)`, starting at `offset`.
pub fn parse_and(expression: &str, offset: isize) -> Result<(Filter, usize), Error> {
	let offset = checked(expression, offset)?;
	let (children, end) = Parser::new(expression).composite(offset, Condition::And)?;
	Ok((Filter::And(children), end))
}

/// Parse a disjunction, `(|...)`, starting at `offset`.
pub fn parse_or(expression: &str, offset: isize) -> Result<(Filter, usize), Error> {
	let offset = checked(expression, offset)?;
	let (children, end) = Parser::new(expression).composite(offset, Condition::Or)?;
	Ok((Filter::Or(children), end))
}

/// Parse a negation, `(!...)`, starting at `offset`.
pub fn parse_not(expression: &str, offset: isize) -> Result<(Filter, usize), Error> {
	let offset = checked(expression, offset)?;
	Parser::new(expression).not(offset)
}

/// Validate a caller supplied offset, which must lie within
/// `0..=expression.len()` and on a character boundary.
fn checked(expression: &str, offset: isize) -> Result<usize, Error> {
	usize::try_from(offset)
		.ok()
		.filter(|&start| expression.is_char_boundary(start))
		.ok_or(Error::InvalidOffset { offset, length: expression.len() })
}

/// Parser state shared across one top-level call.
struct Parser<'a> {
	/// The complete expression being parsed.
	expression: &'a str,
	/// Current composite nesting depth.
	depth: usize,
}

impl<'a> Parser<'a> {
	/// Create a parser over `expression`.
	fn new(expression: &'a str) -> Self {
		Self { expression, depth: 0 }
	}

	/// The unparsed remainder starting at `offset`.
	fn rest(&self, offset: usize) -> &'a str {
		self.expression.get(offset..).unwrap_or_default()
	}

	/// Dispatch on the leading characters at `offset`.
	fn any(&mut self, offset: usize) -> Result<(Filter, usize), Error> {
		let rest = self.rest(offset);
		if rest.starts_with("(&") {
			let (children, end) = self.composite(offset, Condition::And)?;
			Ok((Filter::And(children), end))
		} else if rest.starts_with("(|") {
			let (children, end) = self.composite(offset, Condition::Or)?;
			Ok((Filter::Or(children), end))
		} else if rest.starts_with("(!") {
			self.not(offset)
		} else if rest.starts_with('(') {
			self.equals(offset)
		} else {
			Err(Error::InvalidExpression(Condition::Any))
		}
	}

	/// `(attr=value)`; everything up to the first `)` is the assertion.
	fn equals(&mut self, offset: usize) -> Result<(Filter, usize), Error> {
		let invalid = || Error::InvalidExpression(Condition::Equals);
		let rest = self.rest(offset);
		if !rest.starts_with('(') {
			return Err(invalid());
		}
		let close = rest.find(')').ok_or_else(invalid)?;
		let assertion = &rest[1..close];
		if assertion.contains('(') {
			return Err(invalid());
		}
		let (attribute, value) = assertion.split_once('=').ok_or_else(invalid)?;
		if attribute.is_empty() {
			return Err(invalid());
		}
		Ok((Filter::equals(attribute, value), offset + close + 1))
	}

	/// `(&...)` or `(|...)`: one or more filters up to the closing `)`.
	fn composite(
		&mut self,
		offset: usize,
		condition: Condition,
	) -> Result<(Vec<Filter>, usize), Error> {
		let invalid = || Error::InvalidExpression(condition);
		let operator = match condition {
			Condition::And => '&',
			Condition::Or => '|',
			_ => return Err(invalid()),
		};
		let opened =
			self.rest(offset).strip_prefix('(').is_some_and(|rest| rest.starts_with(operator));
		if !opened {
			return Err(invalid());
		}
		self.descend(condition)?;

		let mut children = Vec::new();
		let mut cursor = offset + 2;
		loop {
			match self.expression.as_bytes().get(cursor) {
				None => return Err(invalid()),
				Some(b')') => break,
				Some(_) => {
					let (child, next) = self.any(cursor)?;
					children.push(child);
					cursor = next;
				}
			}
		}
		self.depth -= 1;

		if children.is_empty() {
			return Err(invalid());
		}
		Ok((children, cursor + 1))
	}

	/// `(!filter)`
	fn not(&mut self, offset: usize) -> Result<(Filter, usize), Error> {
		if !self.rest(offset).starts_with("(!") {
			return Err(Error::InvalidExpression(Condition::Not));
		}
		self.descend(Condition::Not)?;
		let (child, cursor) = self.any(offset + 2)?;
		self.depth -= 1;

		if self.expression.as_bytes().get(cursor) != Some(&b')') {
			return Err(Error::InvalidExpression(Condition::Not));
		}
		Ok((Filter::Not(Box::new(child)), cursor + 1))
	}

	/// Enter one more level of nesting.
	fn descend(&mut self, condition: Condition) -> Result<(), Error> {
		if self.depth >= MAX_DEPTH {
			tracing::debug!("Filter nesting exceeds {MAX_DEPTH} levels");
			return Err(Error::InvalidExpression(condition));
		}
		self.depth += 1;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use super::{parse, parse_and, parse_equals, parse_not, parse_or};
	use crate::{
		error::{Condition, Error},
		filter::{
			tests::{person1, person2},
			Filter, Pattern,
		},
	};

	fn invalid(result: Result<(Filter, usize), Error>, expected: Condition) {
		match result {
			Err(Error::InvalidExpression(condition)) => assert_eq!(condition, expected),
			other => panic!("expected an invalid {expected:?} expression, got {other:?}"),
		}
	}

	fn invalid_offset(result: Result<(Filter, usize), Error>, expected: isize, len: usize) {
		match result {
			Err(Error::InvalidOffset { offset, length }) => {
				assert_eq!((offset, length), (expected, len));
			}
			other => panic!("expected an invalid offset, got {other:?}"),
		}
	}

	#[test]
	fn equals_happy_path() {
		let expression = "(uid=person1)";
		let (equals, offset) = parse(expression, 0).unwrap();
		assert_eq!(offset, expression.len());
		assert_eq!(equals, Filter::equals("uid", "person1"));
		assert!(equals.evaluate(&person1()));
		assert!(!equals.evaluate(&person2()));
	}

	#[test]
	fn equals_lowercases_both_sides() {
		let (equals, _) = parse("(objectClass=InetOrgPerson)", 0).unwrap();
		assert_eq!(
			equals,
			Filter::Equals {
				attribute: "objectclass".to_owned(),
				pattern: Pattern::new("inetorgperson"),
			}
		);
	}

	#[test]
	fn equals_malformed() {
		invalid(parse_equals("uid=person1)", 0), Condition::Equals);
		invalid(parse_equals("(uid=person1", 0), Condition::Equals);
		invalid(parse_equals("(uid)", 0), Condition::Equals);
		invalid(parse_equals("()", 0), Condition::Equals);
		invalid(parse_equals("(=person1)", 0), Condition::Equals);
		invalid(parse_equals("((uid=person1)", 0), Condition::Equals);
	}

	#[test]
	fn equals_value_may_be_empty_or_contain_equals() {
		let (equals, _) = parse_equals("(cn=)", 0).unwrap();
		assert_eq!(equals, Filter::equals("cn", ""));
		let (equals, _) = parse_equals("(cn=a=b)", 0).unwrap();
		assert_eq!(equals, Filter::equals("cn", "a=b"));
	}

	#[test]
	fn offsets_advance_past_the_filter() {
		let expression = "xx(uid=a)(cn=b)";
		let (first, offset) = parse(expression, 2).unwrap();
		assert_eq!((first, offset), (Filter::equals("uid", "a"), 9));
		let (second, offset) = parse(expression, 9).unwrap();
		assert_eq!((second, offset), (Filter::equals("cn", "b"), expression.len()));
	}

	#[test]
	fn silly_offsets() {
		let expression = "(&(uid=person1)(objectClass=inetOrgPerson))";
		let len = expression.len();
		invalid_offset(parse(expression, -50), -50, len);
		invalid_offset(parse(expression, 500), 500, len);
		invalid_offset(parse_equals(expression, -1), -1, len);
		invalid_offset(parse_and(expression, -50), -50, len);
		invalid_offset(parse_or(expression, 500), 500, len);
		invalid_offset(parse_not(expression, 500), 500, len);

		let len = isize::try_from(len).unwrap();
		invalid_offset(parse(expression, len + 50), len + 50, expression.len());
		invalid(parse(expression, len), Condition::Any);
	}

	#[test]
	fn offset_inside_a_character() {
		let expression = "(cn=é)";
		invalid_offset(parse(expression, 5), 5, expression.len());
	}

	#[test]
	fn unknown_leading_token() {
		invalid(parse("uid=person1", 0), Condition::Any);
		invalid(parse("", 0), Condition::Any);
	}

	#[test]
	fn and_happy_path() {
		let expression = "(&(uid=person1)(objectClass=inetOrgPerson))";
		let (and, offset) = parse(expression, 0).unwrap();
		assert_eq!(offset, expression.len());
		assert!(and.evaluate(&person1()));
		assert!(!and.evaluate(&person2()));
	}

	#[test]
	fn and_malformed() {
		invalid(parse_and("(&(uid=person1)(objectClass=inetOrgPerson)", 0), Condition::And);
		invalid(parse_and("&(uid=person1)(objectClass=inetOrgPerson))", 0), Condition::And);
		invalid(parse_and("(&)", 0), Condition::And);
		invalid(parse_and("(|(uid=person1))", 0), Condition::And);
		invalid(parse("(&(uid=person1)x)", 0), Condition::Any);
	}

	#[test]
	fn or_happy_path() {
		let expression = "(|(uid=person1)(objectClass=inetOrgPerson))";
		let (or, offset) = parse(expression, 0).unwrap();
		assert_eq!(offset, expression.len());
		assert!(or.evaluate(&person1()));
		assert!(or.evaluate(&person2()));
	}

	#[test]
	fn or_malformed() {
		invalid(parse_or("(|(uid=person1)(objectClass=inetOrgPerson)", 0), Condition::Or);
		invalid(parse_or("|(uid=person1)(objectClass=inetOrgPerson))", 0), Condition::Or);
		invalid(parse_or("(|)", 0), Condition::Or);
	}

	#[test]
	fn not_happy_path() {
		let expression = "(!(uid=person1))";
		let (not, offset) = parse(expression, 0).unwrap();
		assert_eq!(offset, expression.len());
		assert!(!not.evaluate(&person1()));
		assert!(not.evaluate(&person2()));
	}

	#[test]
	fn not_malformed() {
		invalid(parse_not("(!(uid=person1)", 0), Condition::Not);
		invalid(parse_not("!(uid=person1))", 0), Condition::Not);
		invalid(parse_not("(!(uid=a)(uid=b))", 0), Condition::Not);
		invalid(parse_not("(!)", 0), Condition::Any);
		invalid(parse_not("(!(uid))", 0), Condition::Equals);
	}

	#[test]
	fn nested_composites_with_siblings() {
		let expression = "(|(&(uid=person1)(objectClass=inetOrgPerson))(!(uid=*))(uid=person2))";
		let (filter, offset) = parse(expression, 0).unwrap();
		assert_eq!(offset, expression.len());
		assert_eq!(
			filter,
			Filter::Or(vec![
				Filter::And(vec![
					Filter::equals("uid", "person1"),
					Filter::equals("objectclass", "inetorgperson"),
				]),
				Filter::Not(Box::new(Filter::equals("uid", "*"))),
				Filter::equals("uid", "person2"),
			])
		);
	}

	#[test]
	fn nesting_is_bounded() {
		let deep = format!("{}(uid=a){}", "(!".repeat(200), ")".repeat(200));
		invalid(parse(&deep, 0), Condition::Not);

		let shallow = format!("{}(uid=a){}", "(!".repeat(10), ")".repeat(10));
		assert!(parse(&shallow, 0).is_ok());
	}
}
