use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use bigdecimal::Zero;

use crate::Attributes;
use crate::BinaryOp;
use crate::Expression;
use crate::ForExpr;
use crate::HclError;
use crate::HclResult;
use crate::ObjectKeyExpr;
use crate::Traverser;
use crate::UnaryOp;
use crate::Value;
use crate::number_literal;

/// Root variables visible to an expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
	variables: BTreeMap<String, Value>,
}

impl EvalContext {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.set(name, value);
		self
	}

	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.variables.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.variables.get(name)
	}
}

/// Partially evaluate `expr`.
///
/// References to unknown variables, function calls and splats evaluate to
/// [`Value::Unknown`], and so does every operation with an unknown operand.
/// Type errors are reported as [`HclError::Evaluation`].
pub fn evaluate(expr: &Expression, ctx: &EvalContext) -> HclResult<Value> {
	match expr {
		Expression::Literal(value) => Ok(value.clone()),
		Expression::Template(parts) => template(parts, ctx),
		Expression::TemplateWrap(inner) | Expression::Parens(inner) => evaluate(inner, ctx),
		Expression::Binary(binary) => {
			let lhs = evaluate(&binary.lhs, ctx)?;
			let rhs = evaluate(&binary.rhs, ctx)?;
			binary_op(binary.op, lhs, rhs)
		}
		Expression::Unary(unary) => unary_op(unary.op, evaluate(&unary.value, ctx)?),
		Expression::Tuple(items) => {
			items
				.iter()
				.map(|item| evaluate(item, ctx))
				.collect::<HclResult<Vec<_>>>()
				.map(Value::List)
		}
		Expression::Object(items) => {
			let mut object = BTreeMap::new();
			for item in items {
				let key = match &item.key {
					Expression::ObjectKey(key) => object_key(key, ctx)?,
					other => evaluate(other, ctx)?,
				};
				let Some(key) = key_string(&key)? else {
					return Ok(Value::Unknown);
				};
				object.insert(key, evaluate(&item.value, ctx)?);
			}
			Ok(Value::Object(object))
		}
		Expression::ObjectKey(key) => object_key(key, ctx),
		Expression::ScopeTraversal(traversal) => {
			let Some((Traverser::Root(root), steps)) = traversal.split_first() else {
				return Err(HclError::MalformedTraversal(
					"scope traversal must start with a root name".into(),
				));
			};
			let Some(value) = ctx.get(root) else {
				tracing::trace!(variable = %root, "unresolved reference");
				return Ok(Value::Unknown);
			};
			traverse(value.clone(), steps)
		}
		Expression::RelativeTraversal(relative) => {
			let source = evaluate(&relative.source, ctx)?;
			traverse(source, &relative.traversal)
		}
		Expression::Conditional(conditional) => {
			match evaluate(&conditional.condition, ctx)? {
				Value::Bool(true) => evaluate(&conditional.true_result, ctx),
				Value::Bool(false) => evaluate(&conditional.false_result, ctx),
				Value::Unknown => Ok(Value::Unknown),
				other => Err(type_error("condition", "bool", &other)),
			}
		}
		Expression::Index(index) => {
			let collection = evaluate(&index.collection, ctx)?;
			let key = evaluate(&index.key, ctx)?;
			index_value(collection, &key)
		}
		Expression::For(for_expr) => for_value(for_expr, ctx),
		Expression::FunctionCall(_) | Expression::Splat(_) => Ok(Value::Unknown),
		Expression::AnonSymbol => {
			Err(HclError::Evaluation(
				"splat element reference outside of a splat".into(),
			))
		}
	}
}

/// Evaluate attributes that may reference each other through
/// `namespace.<name>`, such as merged globals.
///
/// Every pass evaluates all attributes against the results of the previous
/// one until nothing changes. Attributes caught in a reference cycle stay
/// [`Value::Unknown`].
pub fn evaluate_attributes(attributes: &Attributes, namespace: &str) -> HclResult<BTreeMap<String, Value>> {
	let mut values: BTreeMap<String, Value> = attributes
		.keys()
		.map(|name| (name.clone(), Value::Unknown))
		.collect();

	for pass in 0..=attributes.len() {
		let ctx = EvalContext::new().with_variable(namespace, values.clone());
		let mut next = BTreeMap::new();
		for (name, attr) in attributes {
			next.insert(name.clone(), evaluate(&attr.expr, &ctx)?);
		}

		if next == values {
			tracing::trace!(namespace, passes = pass + 1, "attributes settled");
			break;
		}
		values = next;
	}

	Ok(values)
}

fn template(parts: &[Expression], ctx: &EvalContext) -> HclResult<Value> {
	let mut output = String::new();

	for part in parts {
		match evaluate(part, ctx)? {
			Value::String(text) => output.push_str(&text),
			Value::Number(number) => output.push_str(&number_literal(&number)),
			Value::Bool(value) => output.push_str(if value { "true" } else { "false" }),
			Value::Unknown | Value::Expression(_) | Value::Closure(_) => return Ok(Value::Unknown),
			other => return Err(type_error("template interpolation", "string", &other)),
		}
	}

	Ok(Value::String(output))
}

/// An identifier key names itself unless it was parenthesized.
fn object_key(key: &ObjectKeyExpr, ctx: &EvalContext) -> HclResult<Value> {
	if !key.force_non_literal {
		if let Expression::ScopeTraversal(traversal) = key.wrapped.as_ref() {
			if let [Traverser::Root(name)] = traversal.as_slice() {
				return Ok(Value::String(name.clone()));
			}
		}
	}

	evaluate(&key.wrapped, ctx)
}

/// `None` when the key is not known yet.
fn key_string(key: &Value) -> HclResult<Option<String>> {
	match key {
		Value::String(text) => Ok(Some(text.clone())),
		Value::Number(number) => Ok(Some(number_literal(number))),
		Value::Bool(value) => Ok(Some(value.to_string())),
		Value::Unknown | Value::Expression(_) | Value::Closure(_) => Ok(None),
		other => Err(type_error("object key", "string", other)),
	}
}

fn traverse(mut value: Value, steps: &[Traverser]) -> HclResult<Value> {
	for step in steps {
		value = match step {
			Traverser::Root(name) => {
				return Err(HclError::MalformedTraversal(format!(
					"root `{name}` in the middle of a traversal"
				)));
			}
			Traverser::Attr(name) => index_value(value, &Value::String(name.clone()))?,
			Traverser::Index(key) => index_value(value, key)?,
		};
	}

	Ok(value)
}

fn index_value(collection: Value, key: &Value) -> HclResult<Value> {
	if !key.is_known() {
		return Ok(Value::Unknown);
	}

	match collection {
		Value::Unknown | Value::Expression(_) | Value::Closure(_) => Ok(Value::Unknown),
		Value::Object(mut object) => {
			let Some(name) = key_string(key)? else {
				return Ok(Value::Unknown);
			};
			object
				.remove(&name)
				.ok_or_else(|| HclError::Evaluation(format!("object has no attribute `{name}`")))
		}
		Value::List(mut items) => {
			let position = match key {
				Value::Number(number) if number.is_integer() => number.to_usize(),
				Value::String(text) => text.parse::<usize>().ok(),
				_ => None,
			};
			let Some(position) = position else {
				return Err(type_error("list index", "whole number", key));
			};
			if position >= items.len() {
				return Err(HclError::Evaluation(format!(
					"index {position} out of range for list of length {}",
					items.len()
				)));
			}
			Ok(items.swap_remove(position))
		}
		other => {
			Err(HclError::Evaluation(format!(
				"cannot index a value of type {}",
				other.type_name()
			)))
		}
	}
}

fn unary_op(op: UnaryOp, value: Value) -> HclResult<Value> {
	match (op, value) {
		(_, Value::Unknown) => Ok(Value::Unknown),
		(UnaryOp::Negate, Value::Number(number)) => Ok(Value::Number(-number)),
		(UnaryOp::Not, Value::Bool(value)) => Ok(Value::Bool(!value)),
		(UnaryOp::Negate, other) => Err(type_error("operand of `-`", "number", &other)),
		(UnaryOp::Not, other) => Err(type_error("operand of `!`", "bool", &other)),
	}
}

fn binary_op(op: BinaryOp, lhs: Value, rhs: Value) -> HclResult<Value> {
	if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) {
		if !lhs.is_known() || !rhs.is_known() {
			return Ok(Value::Unknown);
		}
		let equal = lhs == rhs;
		return Ok(Value::Bool(if op == BinaryOp::Equal { equal } else { !equal }));
	}

	if matches!(lhs, Value::Unknown) || matches!(rhs, Value::Unknown) {
		return Ok(Value::Unknown);
	}

	if matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
		let (Value::Bool(lhs), Value::Bool(rhs)) = (&lhs, &rhs) else {
			let operand = if matches!(lhs, Value::Bool(_)) { &rhs } else { &lhs };
			return Err(type_error(&format!("operand of `{}`", op.as_str()), "bool", operand));
		};
		let result = if op == BinaryOp::LogicalAnd {
			*lhs && *rhs
		} else {
			*lhs || *rhs
		};
		return Ok(Value::Bool(result));
	}

	let (Value::Number(lhs), Value::Number(rhs)) = (&lhs, &rhs) else {
		let operand = if matches!(lhs, Value::Number(_)) { &rhs } else { &lhs };
		return Err(type_error(&format!("operand of `{}`", op.as_str()), "number", operand));
	};

	let value = match op {
		BinaryOp::Add => Value::Number(lhs + rhs),
		BinaryOp::Subtract => Value::Number(lhs - rhs),
		BinaryOp::Multiply => Value::Number(lhs * rhs),
		BinaryOp::Divide => Value::Number(checked_divisor(rhs).map(|rhs| lhs / rhs)?),
		BinaryOp::Modulo => Value::Number(checked_divisor(rhs).map(|rhs| lhs % rhs)?),
		BinaryOp::LessThan => Value::Bool(lhs < rhs),
		BinaryOp::LessThanOrEqual => Value::Bool(lhs <= rhs),
		BinaryOp::GreaterThan => Value::Bool(lhs > rhs),
		// `>=`; equality and logic returned early.
		_ => Value::Bool(lhs >= rhs),
	};

	Ok(value)
}

fn checked_divisor(rhs: &BigDecimal) -> HclResult<&BigDecimal> {
	if rhs.is_zero() {
		Err(HclError::Evaluation("division by zero".into()))
	} else {
		Ok(rhs)
	}
}

fn for_value(for_expr: &ForExpr, ctx: &EvalContext) -> HclResult<Value> {
	let entries: Vec<(Value, Value)> = match evaluate(&for_expr.collection, ctx)? {
		Value::List(items) => {
			items
				.into_iter()
				.enumerate()
				.map(|(index, item)| (Value::from(i64::try_from(index).unwrap_or(i64::MAX)), item))
				.collect()
		}
		Value::Object(object) => {
			object
				.into_iter()
				.map(|(key, value)| (Value::String(key), value))
				.collect()
		}
		Value::Unknown => return Ok(Value::Unknown),
		other => return Err(type_error("for collection", "list or object", &other)),
	};

	let mut list = Vec::new();
	let mut object: BTreeMap<String, Value> = BTreeMap::new();

	for (key, value) in entries {
		let mut scope = ctx.clone();
		if let Some(key_var) = &for_expr.key_var {
			scope.set(key_var.as_str(), key);
		}
		scope.set(for_expr.value_var.as_str(), value);

		if let Some(condition) = &for_expr.condition {
			match evaluate(condition, &scope)? {
				Value::Bool(true) => {}
				Value::Bool(false) => continue,
				Value::Unknown => return Ok(Value::Unknown),
				other => return Err(type_error("for condition", "bool", &other)),
			}
		}

		let item = evaluate(&for_expr.value_expr, &scope)?;
		let Some(key_expr) = &for_expr.key_expr else {
			list.push(item);
			continue;
		};

		let Some(key) = key_string(&evaluate(key_expr, &scope)?)? else {
			return Ok(Value::Unknown);
		};

		if for_expr.group {
			let group = object.entry(key).or_insert_with(|| Value::List(Vec::new()));
			if let Value::List(items) = group {
				items.push(item);
			}
		} else if object.contains_key(&key) {
			return Err(HclError::Evaluation(format!(
				"duplicate object key `{key}` in for expression; use `...` to group values"
			)));
		} else {
			object.insert(key, item);
		}
	}

	if for_expr.key_expr.is_some() {
		Ok(Value::Object(object))
	} else {
		Ok(Value::List(list))
	}
}

fn type_error(what: &str, expected: &str, got: &Value) -> HclError {
	HclError::Evaluation(format!("{what} must be a {expected}, found {}", got.type_name()))
}
