use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::Expression;
use crate::HclError;
use crate::HclResult;

/// A (possibly partially) evaluated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	/// Arbitrary precision decimal. Never goes through a float.
	Number(BigDecimal),
	String(String),
	/// Lists, sets and tuples.
	List(Vec<Value>),
	/// Maps and objects, sorted by key.
	Object(BTreeMap<String, Value>),
	/// A value that could not be determined during partial evaluation.
	Unknown,
	/// An expression carried around unevaluated.
	Expression(Box<Expression>),
	/// An unevaluated expression bound to the variables in scope where it
	/// was captured.
	Closure(Box<Closure>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
	pub expression: Expression,
	pub variables: BTreeMap<String, Value>,
}

impl Value {
	/// Parse a decimal literal such as `1`, `-2.5` or `1e100`.
	pub fn number(literal: &str) -> HclResult<Self> {
		BigDecimal::from_str(literal)
			.map(Self::Number)
			.map_err(|e| HclError::Evaluation(format!("invalid number `{literal}`: {e}")))
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Object(_) => "object",
			Self::Unknown => "unknown",
			Self::Expression(_) => "expression",
			Self::Closure(_) => "closure",
		}
	}

	/// `false` when this value or anything nested in it is unknown.
	pub fn is_known(&self) -> bool {
		match self {
			Self::Unknown | Self::Expression(_) | Self::Closure(_) => false,
			Self::List(items) => items.iter().all(Self::is_known),
			Self::Object(items) => items.values().all(Self::is_known),
			Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => true,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value),
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Number(BigDecimal::from(value))
	}
}

impl From<BigDecimal> for Value {
	fn from(value: BigDecimal) -> Self {
		Self::Number(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::List(value)
	}
}

impl From<BTreeMap<String, Value>> for Value {
	fn from(value: BTreeMap<String, Value>) -> Self {
		Self::Object(value)
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match crate::tokens_for_value(self) {
			Ok(tokens) => write!(f, "{}", tokens.format()),
			Err(_) => write!(f, "<{}>", self.type_name()),
		}
	}
}
