//! Expression to token conversion.
//!
//! [`tokens_for_expression`] turns an unevaluated [`Expression`] back into
//! source tokens. Formatting the result and parsing it again yields an
//! expression that evaluates to the same value as the input.

use crate::Expression;
use crate::ForExpr;
use crate::HclError;
use crate::HclResult;
use crate::Token;
use crate::TokenType;
use crate::Tokens;
use crate::Traverser;
use crate::UnaryOp;
use crate::Value;
use crate::value_tokens::escape_quoted;

/// Default bound on expression nesting for token building and parsing.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tokens for `expr`, terminated by an [`TokenType::Eof`] token.
pub fn tokens_for_expression(expr: &Expression) -> HclResult<Tokens> {
	TokenBuilder::new(DEFAULT_MAX_DEPTH).expression(expr)
}

/// Tokens for a fully or partially evaluated `value`, terminated by an
/// [`TokenType::Eof`] token.
pub fn tokens_for_value(value: &Value) -> HclResult<Tokens> {
	TokenBuilder::new(DEFAULT_MAX_DEPTH).value(value)
}

/// Accumulates the tokens of one expression or value.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
	pub(crate) tokens: Tokens,
	depth: usize,
	max_depth: usize,
}

impl TokenBuilder {
	pub fn new(max_depth: usize) -> Self {
		Self {
			tokens: Tokens::new(),
			depth: 0,
			max_depth,
		}
	}

	pub fn expression(mut self, expr: &Expression) -> HclResult<Tokens> {
		self.build(expr)?;
		Ok(self.finish())
	}

	pub fn value(mut self, value: &Value) -> HclResult<Tokens> {
		self.build_value(value)?;
		Ok(self.finish())
	}

	fn finish(mut self) -> Tokens {
		if let Some(first) = self.tokens.first_mut() {
			first.spaces_before = 0;
		}
		self.tokens.push(Token::eof());
		self.tokens
	}

	/// A builder for a nested token run that shares the current depth.
	pub(crate) fn nested(&self) -> Self {
		Self {
			tokens: Tokens::new(),
			depth: self.depth,
			max_depth: self.max_depth,
		}
	}

	pub(crate) fn add(&mut self, token: Token) {
		self.tokens.push(token);
	}

	/// Give the token at `index` a single leading space, if one was emitted.
	pub(crate) fn space_at(&mut self, index: usize) {
		if let Some(token) = self.tokens.get_mut(index) {
			token.spaces_before = 1;
		}
	}

	pub(crate) fn enter(&mut self) -> HclResult<()> {
		self.depth += 1;
		if self.depth > self.max_depth {
			return Err(HclError::NestingTooDeep {
				max: self.max_depth,
			});
		}
		Ok(())
	}

	pub(crate) fn leave(&mut self) {
		self.depth = self.depth.saturating_sub(1);
	}

	pub(crate) fn build(&mut self, expr: &Expression) -> HclResult<()> {
		self.enter()?;
		let result = self.build_node(expr);
		self.leave();
		result
	}

	/// Build `expr` and put one space before its first token.
	fn build_spaced(&mut self, expr: &Expression) -> HclResult<()> {
		let next = self.tokens.len();
		self.build(expr)?;
		self.space_at(next);
		Ok(())
	}

	fn build_node(&mut self, expr: &Expression) -> HclResult<()> {
		match expr {
			Expression::Literal(value) => self.build_value(value),
			Expression::Template(parts) => self.template(parts),
			Expression::TemplateWrap(wrapped) => {
				self.add(Token::oquote());
				self.add(Token::interp_begin());
				self.build(wrapped)?;
				self.add(Token::interp_end());
				self.add(Token::cquote());
				Ok(())
			}
			Expression::Binary(binary) => {
				self.build(&binary.lhs)?;
				self.add(Token::new(binary_token(binary.op), binary.op.as_str()).spaced(1));
				self.build_spaced(&binary.rhs)
			}
			Expression::Unary(unary) => {
				self.add(match unary.op {
					UnaryOp::Negate => Token::minus(),
					UnaryOp::Not => Token::bang(),
				});
				self.build(&unary.value)
			}
			Expression::Tuple(items) => {
				self.add(Token::obrack());
				self.comma_separated(items)?;
				self.add(Token::cbrack());
				Ok(())
			}
			Expression::Parens(inner) => {
				self.add(Token::oparen());
				self.build(inner)?;
				self.add(Token::cparen());
				Ok(())
			}
			Expression::Object(items) => {
				self.add(Token::obrace());
				if !items.is_empty() {
					self.add(Token::nl());
				}
				for item in items {
					self.build(&item.key)?;
					self.add(Token::assign().spaced(1));
					self.build_spaced(&item.value)?;
					self.add(Token::nl());
				}
				self.add(Token::cbrace());
				Ok(())
			}
			Expression::ObjectKey(key) => self.build(&key.wrapped),
			Expression::ScopeTraversal(traversal) => {
				match traversal.first() {
					Some(Traverser::Root(_)) => {}
					_ => {
						return Err(HclError::MalformedTraversal(
							"scope traversal must start with a root name".into(),
						));
					}
				}
				self.traversal(traversal, true)
			}
			Expression::Conditional(conditional) => {
				self.build(&conditional.condition)?;
				self.add(Token::question().spaced(1));
				self.build_spaced(&conditional.true_result)?;
				self.add(Token::colon().spaced(1));
				self.build_spaced(&conditional.false_result)
			}
			Expression::FunctionCall(call) => {
				self.add(Token::ident(call.name.as_str()));
				self.add(Token::oparen());
				self.comma_separated(&call.args)?;
				if call.expand_final {
					self.add(Token::ellipsis());
				}
				self.add(Token::cparen());
				Ok(())
			}
			Expression::Index(index) => {
				self.build(&index.collection)?;
				self.add(Token::obrack());
				self.build(&index.key)?;
				self.add(Token::cbrack());
				Ok(())
			}
			Expression::For(for_expr) => self.for_expr(for_expr),
			Expression::Splat(splat) => {
				self.build(&splat.source)?;
				self.add(Token::obrack());
				self.add(Token::star());
				self.add(Token::cbrack());
				self.splat_each(&splat.each)
			}
			Expression::RelativeTraversal(relative) => {
				self.build(&relative.source)?;
				self.traversal(&relative.traversal, false)
			}
			Expression::AnonSymbol => {
				Err(HclError::UnsupportedExpression(
					"anonymous symbol outside of a splat expression".into(),
				))
			}
		}
	}

	fn comma_separated(&mut self, items: &[Expression]) -> HclResult<()> {
		for (index, item) in items.iter().enumerate() {
			if index == 0 {
				self.build(item)?;
			} else {
				self.add(Token::comma());
				self.build_spaced(item)?;
			}
		}
		Ok(())
	}

	/// Render the per-element expression of a splat.
	///
	/// The element placeholder emits nothing, and may only appear as the
	/// innermost source of the chain of traversals applied to each element.
	fn splat_each(&mut self, each: &Expression) -> HclResult<()> {
		self.enter()?;
		let result = match each {
			Expression::AnonSymbol => Ok(()),
			Expression::RelativeTraversal(relative) => {
				self.splat_each(&relative.source)
					.and_then(|()| self.traversal(&relative.traversal, false))
			}
			Expression::Index(index) => {
				self.splat_each(&index.collection).and_then(|()| {
					self.add(Token::obrack());
					self.build(&index.key)?;
					self.add(Token::cbrack());
					Ok(())
				})
			}
			Expression::Splat(splat) => {
				self.splat_each(&splat.source).and_then(|()| {
					self.add(Token::obrack());
					self.add(Token::star());
					self.add(Token::cbrack());
					self.splat_each(&splat.each)
				})
			}
			other => self.build(other),
		};
		self.leave();
		result
	}

	fn traversal(&mut self, traversal: &[Traverser], scoped: bool) -> HclResult<()> {
		for (index, step) in traversal.iter().enumerate() {
			match step {
				Traverser::Root(name) => {
					if !scoped || index > 0 {
						return Err(HclError::MalformedTraversal(format!(
							"root `{name}` found at step {index}"
						)));
					}
					self.add(Token::ident(name.as_str()));
				}
				Traverser::Attr(name) => {
					self.add(Token::dot());
					self.add(Token::ident(name.as_str()));
				}
				Traverser::Index(key) => {
					self.add(Token::obrack());
					self.build_value(key)?;
					self.add(Token::cbrack());
				}
			}
		}
		Ok(())
	}

	fn for_expr(&mut self, for_expr: &ForExpr) -> HclResult<()> {
		let object = for_expr.key_expr.is_some();
		self.add(if object { Token::obrace() } else { Token::obrack() });
		self.add(Token::ident("for"));
		if let Some(key_var) = &for_expr.key_var {
			self.add(Token::ident(key_var.as_str()).spaced(1));
			self.add(Token::comma());
		}
		self.add(Token::ident(for_expr.value_var.as_str()).spaced(1));
		self.add(Token::ident("in").spaced(1));
		self.build_spaced(&for_expr.collection)?;
		self.add(Token::colon().spaced(1));

		if let Some(key_expr) = &for_expr.key_expr {
			self.build_spaced(key_expr)?;
			self.add(Token::arrow().spaced(1));
		}
		self.build_spaced(&for_expr.value_expr)?;

		if for_expr.group {
			self.add(Token::ellipsis());
		}

		if let Some(condition) = &for_expr.condition {
			self.add(Token::ident("if").spaced(1));
			self.build_spaced(condition)?;
		}

		self.add(if object { Token::cbrace() } else { Token::cbrack() });
		Ok(())
	}

	/// Render a string template, choosing heredoc syntax when the content
	/// ends in a real newline and holds only printable characters.
	fn template(&mut self, parts: &[Expression]) -> HclResult<()> {
		let begin = self.tokens.len();
		self.add(Token::oquote());

		// Indices of the string content tokens owned by this template. Content
		// of nested templates inside interpolations is never touched.
		let mut owned = Vec::new();

		for part in parts {
			if let Expression::Literal(Value::String(text)) = part {
				let escaped = escape_quoted(text);
				for line in split_escaped_lines(&escaped) {
					owned.push(self.tokens.len());
					self.add(Token::string_lit(line));
				}
				continue;
			}

			let mut nested = self.nested();
			nested.build(part)?;
			let mut tokens = nested.tokens.into_inner();
			if let Some(first) = tokens.first_mut() {
				first.spaces_before = 0;
			}

			if let [single] = tokens.as_slice() {
				if can_inline(single) {
					owned.push(self.tokens.len());
					self.add(Token::string_lit(single.bytes.clone()));
					continue;
				}
			}

			self.add(Token::interp_begin());
			self.tokens.extend(tokens);
			self.add(Token::interp_end());
		}

		if self.is_heredoc(begin, &owned) {
			let spaces = self.tokens[begin].spaces_before;
			self.tokens[begin] = Token::oheredoc().spaced(spaces);
			for &index in &owned {
				let token = &mut self.tokens[index];
				token.bytes = unescape_heredoc(&token.bytes);
			}
			self.add(Token::cheredoc());
		} else {
			self.add(Token::cquote());
		}

		Ok(())
	}

	fn is_heredoc(&self, begin: usize, owned: &[usize]) -> bool {
		let last = self.tokens.len() - 1;
		if owned.last() != Some(&last) || !ends_with_newline_escape(&self.tokens[last].bytes) {
			return false;
		}

		if owned
			.iter()
			.any(|&index| has_non_printable_escape(&self.tokens[index].bytes))
		{
			return false;
		}

		// The body as it would appear between the heredoc markers, with every
		// interpolation standing in as a single non-blank character.
		let mut body = String::new();
		for (index, token) in self.tokens.iter().enumerate().skip(begin + 1) {
			if owned.binary_search(&index).is_ok() {
				body.push_str(&String::from_utf8_lossy(&unescape_heredoc(&token.bytes)));
			} else {
				body.push('x');
			}
		}

		heredoc_body_is_stable(&body)
	}
}

fn binary_token(op: crate::BinaryOp) -> TokenType {
	use crate::BinaryOp;

	match op {
		BinaryOp::Add => TokenType::Plus,
		BinaryOp::Subtract => TokenType::Minus,
		BinaryOp::Multiply => TokenType::Star,
		BinaryOp::Divide => TokenType::Slash,
		BinaryOp::Modulo => TokenType::Percent,
		BinaryOp::Equal => TokenType::EqualOp,
		BinaryOp::NotEqual => TokenType::NotEqual,
		BinaryOp::LessThan => TokenType::LessThan,
		BinaryOp::LessThanOrEqual => TokenType::LessThanEq,
		BinaryOp::GreaterThan => TokenType::GreaterThan,
		BinaryOp::GreaterThanOrEqual => TokenType::GreaterThanEq,
		BinaryOp::LogicalAnd => TokenType::And,
		BinaryOp::LogicalOr => TokenType::Or,
	}
}

/// Interpolations that reduce to one plain literal are written straight into
/// the surrounding string.
fn can_inline(token: &Token) -> bool {
	match token.r#type {
		TokenType::NumberLit | TokenType::StringLit => true,
		TokenType::Ident => token.bytes == b"true" || token.bytes == b"false",
		_ => false,
	}
}

/// Split escaped string content after every `\n` escape sequence.
pub(crate) fn split_escaped_lines(escaped: &str) -> Vec<String> {
	let bytes = escaped.as_bytes();
	let mut lines = Vec::new();
	let mut start = 0;
	let mut pos = 0;

	while pos < bytes.len() {
		if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
			let escaped_char = bytes[pos + 1];
			pos += 2;
			if escaped_char == b'n' {
				lines.push(escaped[start..pos].to_string());
				start = pos;
			}
			continue;
		}
		pos += 1;
	}

	if start < bytes.len() {
		lines.push(escaped[start..].to_string());
	}

	lines
}

/// `true` when `bytes` ends in a `\n` escape rather than an escaped
/// backslash followed by a literal `n`.
///
/// The run of backslashes right before the final `n` decides: an odd count
/// means the last backslash starts the newline escape.
pub(crate) fn ends_with_newline_escape(bytes: &[u8]) -> bool {
	let Some((&b'n', rest)) = bytes.split_last() else {
		return false;
	};

	let backslashes = rest.iter().rev().take_while(|&&byte| byte == b'\\').count();
	backslashes % 2 == 1
}

/// `true` when the escaped content holds a `\r`, `\u` or `\U` sequence.
fn has_non_printable_escape(bytes: &[u8]) -> bool {
	let mut pos = 0;
	while pos < bytes.len() {
		if bytes[pos] == b'\\' {
			if matches!(bytes.get(pos + 1), Some(b'r' | b'u' | b'U')) {
				return true;
			}
			pos += 2;
			continue;
		}
		pos += 1;
	}
	false
}

/// Undo the escapes heredocs do not need, in a single pass.
fn unescape_heredoc(bytes: &[u8]) -> Vec<u8> {
	let mut output = Vec::with_capacity(bytes.len());
	let mut pos = 0;

	while pos < bytes.len() {
		if let (b'\\', Some(&next)) = (bytes[pos], bytes.get(pos + 1)) {
			match next {
				b'\\' => output.push(b'\\'),
				b't' => output.push(b'\t'),
				b'n' => output.push(b'\n'),
				b'"' => output.push(b'"'),
				other => output.extend_from_slice(&[b'\\', other]),
			}
			pos += 2;
			continue;
		}
		output.push(bytes[pos]);
		pos += 1;
	}

	output
}

/// A heredoc body survives a reparse unchanged when no line would close the
/// heredoc early and flush indentation stripping has nothing to remove.
fn heredoc_body_is_stable(body: &str) -> bool {
	let mut has_unindented = false;
	let mut has_content = false;

	for line in body.lines() {
		if line.trim() == "EOT" {
			return false;
		}
		if line.trim().is_empty() {
			continue;
		}
		has_content = true;
		if !line.starts_with([' ', '\t']) {
			has_unindented = true;
		}
	}

	has_unindented || !has_content
}
