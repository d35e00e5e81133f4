//! Unevaluated expression trees.
//!
//! The node set is closed: every kind the parser can produce has a variant
//! here and the token builder matches on all of them.

use crate::Value;

#[derive(Debug, Clone, PartialEq)]
#[allow(variant_size_differences)]
pub enum Expression {
	/// A literal value such as `1`, `true` or `null`.
	Literal(Value),
	/// A string template with zero or more interpolations.
	Template(Vec<Expression>),
	/// A template made of a single interpolation, e.g. `"${var}"`.
	TemplateWrap(Box<Expression>),
	Binary(BinaryExpr),
	Unary(UnaryExpr),
	Tuple(Vec<Expression>),
	Parens(Box<Expression>),
	Object(Vec<ObjectItem>),
	ObjectKey(ObjectKeyExpr),
	ScopeTraversal(Traversal),
	Conditional(ConditionalExpr),
	FunctionCall(FunctionCallExpr),
	Index(IndexExpr),
	For(Box<ForExpr>),
	Splat(SplatExpr),
	RelativeTraversal(RelativeTraversalExpr),
	/// Placeholder for the current element of a splat. Only meaningful as
	/// the innermost source of a splat's `each` expression.
	AnonSymbol,
}

impl Expression {
	/// Shorthand for a plain string template, `"value"`.
	pub fn string(value: impl Into<String>) -> Self {
		Self::Template(vec![Self::Literal(Value::String(value.into()))])
	}

	/// Shorthand for a root variable reference followed by attribute steps.
	pub fn traversal<I, S>(root: impl Into<String>, attrs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut traversal = vec![Traverser::Root(root.into())];
		traversal.extend(attrs.into_iter().map(|name| Traverser::Attr(name.into())));
		Self::ScopeTraversal(traversal)
	}

	pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
		Self::Binary(BinaryExpr {
			op,
			lhs: Box::new(lhs),
			rhs: Box::new(rhs),
		})
	}

	pub fn unary(op: UnaryOp, value: Expression) -> Self {
		Self::Unary(UnaryExpr {
			op,
			value: Box::new(value),
		})
	}

	/// Human readable name of the node kind, used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Literal(_) => "literal",
			Self::Template(_) => "template",
			Self::TemplateWrap(_) => "template wrap",
			Self::Binary(_) => "binary operation",
			Self::Unary(_) => "unary operation",
			Self::Tuple(_) => "tuple",
			Self::Parens(_) => "parentheses",
			Self::Object(_) => "object",
			Self::ObjectKey(_) => "object key",
			Self::ScopeTraversal(_) => "scope traversal",
			Self::Conditional(_) => "conditional",
			Self::FunctionCall(_) => "function call",
			Self::Index(_) => "index",
			Self::For(_) => "for expression",
			Self::Splat(_) => "splat",
			Self::RelativeTraversal(_) => "relative traversal",
			Self::AnonSymbol => "anonymous symbol",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
	Equal,
	NotEqual,
	LessThan,
	LessThanOrEqual,
	GreaterThan,
	GreaterThanOrEqual,
	LogicalAnd,
	LogicalOr,
}

impl BinaryOp {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Add => "+",
			Self::Subtract => "-",
			Self::Multiply => "*",
			Self::Divide => "/",
			Self::Modulo => "%",
			Self::Equal => "==",
			Self::NotEqual => "!=",
			Self::LessThan => "<",
			Self::LessThanOrEqual => "<=",
			Self::GreaterThan => ">",
			Self::GreaterThanOrEqual => ">=",
			Self::LogicalAnd => "&&",
			Self::LogicalOr => "||",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Negate,
	Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
	pub op: BinaryOp,
	pub lhs: Box<Expression>,
	pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
	pub op: UnaryOp,
	pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
	pub key: Expression,
	pub value: Expression,
}

/// The key of an object constructor item.
///
/// A bare identifier key is taken literally as a string unless
/// `force_non_literal` is set, which happens when the key is parenthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectKeyExpr {
	pub wrapped: Box<Expression>,
	pub force_non_literal: bool,
}

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Traverser {
	/// The root variable name; only valid as the first step.
	Root(String),
	/// `.name`
	Attr(String),
	/// `[key]` with a literal key.
	Index(Value),
}

pub type Traversal = Vec<Traverser>;

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
	pub condition: Box<Expression>,
	pub true_result: Box<Expression>,
	pub false_result: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpr {
	pub name: String,
	pub args: Vec<Expression>,
	/// The final argument is expanded with `...`.
	pub expand_final: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
	pub collection: Box<Expression>,
	pub key: Box<Expression>,
}

/// `[for k, v in coll : v if cond]` or `{for k, v in coll : k => v... if cond}`.
///
/// The presence of `key_expr` makes it an object-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
	pub key_var: Option<String>,
	pub value_var: String,
	pub collection: Expression,
	pub key_expr: Option<Expression>,
	pub value_expr: Expression,
	pub condition: Option<Expression>,
	/// Group results by key (`...` after the value expression).
	pub group: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplatExpr {
	pub source: Box<Expression>,
	pub each: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeTraversalExpr {
	pub source: Box<Expression>,
	pub traversal: Traversal,
}
