//! Error codes
use std::fmt;

/// The kind of filter condition a parser was attempting to read when it
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
	/// No condition could be recognised at all.
	Any,
	/// An attribute equality assertion, `(attr=value)`.
	Equals,
	/// A conjunction, `(&...)`.
	And,
	/// A disjunction, `(|...)`.
	Or,
	/// A negation, `(!...)`.
	Not,
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Condition::Any => "",
			Condition::Equals => "equals",
			Condition::And => "and",
			Condition::Or => "or",
			Condition::Not => "not",
		})
	}
}

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// A parser was asked to start outside of the expression.
	#[error(
		"the provided offset ({offset}) is not valid for the length of this expression ({length})"
	)]
	InvalidOffset {
		/// The offset that was requested.
		offset: isize,
		/// The length of the expression in bytes.
		length: usize,
	},
	/// The expression was not valid syntax for the given condition.
	#[error("{}", invalid_expression(.0))]
	InvalidExpression(Condition),
	/// A password was tagged with a scheme this library cannot verify.
	#[error("unsupported password encoding scheme '{0}'")]
	UnsupportedScheme(String),
	/// The users document could not be read.
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// The users document could not be decoded.
	#[error(transparent)]
	Yaml(#[from] serde_yaml::Error),
	/// The users document decoded, but its contents were unusable.
	#[error("Malformed data: {0}")]
	Invalid(String),
}

/// Renders the message for [`Error::InvalidExpression`].
fn invalid_expression(condition: &Condition) -> String {
	match condition {
		Condition::Any => "the provided expression is not a valid condition".to_owned(),
		kind => format!("the provided expression is not a valid '{kind}' condition"),
	}
}

#[cfg(test)]
mod tests {
	use super::{Condition, Error};

	#[test]
	fn messages() {
		assert_eq!(
			Error::InvalidExpression(Condition::Any).to_string(),
			"the provided expression is not a valid condition"
		);
		assert_eq!(
			Error::InvalidExpression(Condition::Or).to_string(),
			"the provided expression is not a valid 'or' condition"
		);
		assert_eq!(
			Error::InvalidOffset { offset: -50, length: 13 }.to_string(),
			"the provided offset (-50) is not valid for the length of this expression (13)"
		);
	}
}
