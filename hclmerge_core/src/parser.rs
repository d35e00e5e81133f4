use std::path::Path;

use crate::BinaryOp;
use crate::ConditionalExpr;
use crate::DEFAULT_MAX_DEPTH;
use crate::Expression;
use crate::ForExpr;
use crate::FunctionCallExpr;
use crate::HclError;
use crate::HclResult;
use crate::IndexExpr;
use crate::ObjectItem;
use crate::ObjectKeyExpr;
use crate::RawAttribute;
use crate::RawBlock;
use crate::RawBody;
use crate::RelativeTraversalExpr;
use crate::SourceRange;
use crate::SplatExpr;
use crate::Traverser;
use crate::UnaryOp;
use crate::Value;
use crate::lexer::Spanned;
use crate::lexer::Tok;
use crate::lexer::syntax_error;
use crate::lexer::tokenize;
use crate::position::LineIndex;

/// Parse a standalone expression.
pub fn parse_expression(source: &str, filename: &str) -> HclResult<Expression> {
	parse_expression_with_depth(source, filename, DEFAULT_MAX_DEPTH)
}

pub fn parse_expression_with_depth(source: &str, filename: &str, max_depth: usize) -> HclResult<Expression> {
	let tokens = tokenize(source, filename)?;
	let mut parser = Parser::new(source, Path::new(filename), &tokens, max_depth);
	parser.newline_modes.push(false);
	let expr = parser.expression()?;
	parser.expect_eof()?;
	Ok(expr)
}

/// Parse a whole configuration file into its top-level body.
pub fn parse_file(source: &str, filename: &Path) -> HclResult<RawBody> {
	parse_file_with_depth(source, filename, DEFAULT_MAX_DEPTH)
}

pub fn parse_file_with_depth(source: &str, filename: &Path, max_depth: usize) -> HclResult<RawBody> {
	let display = filename.display().to_string();
	let tokens = tokenize(source, &display)?;
	let mut parser = Parser::new(source, filename, &tokens, max_depth);
	let body = parser.body(0)?;
	parser.expect_eof()?;
	Ok(body)
}

/// Binary operator precedence levels, lowest first.
const PRECEDENCE: [&[(Tok, BinaryOp)]; 6] = [
	&[(Tok::Or, BinaryOp::LogicalOr)],
	&[(Tok::And, BinaryOp::LogicalAnd)],
	&[(Tok::EqualOp, BinaryOp::Equal), (Tok::NotEqual, BinaryOp::NotEqual)],
	&[
		(Tok::LessThan, BinaryOp::LessThan),
		(Tok::LessThanEq, BinaryOp::LessThanOrEqual),
		(Tok::GreaterThan, BinaryOp::GreaterThan),
		(Tok::GreaterThanEq, BinaryOp::GreaterThanOrEqual),
	],
	&[(Tok::Plus, BinaryOp::Add), (Tok::Minus, BinaryOp::Subtract)],
	&[
		(Tok::Star, BinaryOp::Multiply),
		(Tok::Slash, BinaryOp::Divide),
		(Tok::Percent, BinaryOp::Modulo),
	],
];

struct Parser<'a> {
	source: &'a str,
	filename: &'a Path,
	display: String,
	lines: LineIndex<'a>,
	tokens: &'a [Spanned],
	cursor: usize,
	/// Whether newlines are significant in the current context. Bodies and
	/// object constructors use them as separators; brackets, parentheses
	/// and interpolations ignore them.
	newline_modes: Vec<bool>,
	depth: usize,
	max_depth: usize,
}

impl<'a> Parser<'a> {
	fn new(source: &'a str, filename: &'a Path, tokens: &'a [Spanned], max_depth: usize) -> Self {
		Self {
			source,
			filename,
			display: filename.display().to_string(),
			lines: LineIndex::new(source),
			tokens,
			cursor: 0,
			newline_modes: vec![true],
			depth: 0,
			max_depth,
		}
	}

	fn error(&self, byte: usize, message: impl Into<String>) -> HclError {
		syntax_error(self.source, &self.display, byte, message)
	}

	fn range(&self, start: usize, end: usize) -> SourceRange {
		SourceRange::new(self.filename, self.lines.position(start), self.lines.position(end))
	}

	fn newlines_significant(&self) -> bool {
		self.newline_modes.last().copied().unwrap_or(true)
	}

	fn current(&self) -> &'a Spanned {
		let tokens = self.tokens;
		&tokens[self.cursor.min(tokens.len().saturating_sub(1))]
	}

	fn skip_ignored_newlines(&mut self) {
		if self.newlines_significant() {
			return;
		}
		while matches!(self.current().tok, Tok::Newline) {
			self.cursor += 1;
		}
	}

	fn skip_newlines(&mut self) {
		while matches!(self.current().tok, Tok::Newline) {
			self.cursor += 1;
		}
	}

	fn peek(&mut self) -> &'a Tok {
		self.skip_ignored_newlines();
		&self.current().tok
	}

	fn next(&mut self) -> &'a Spanned {
		self.skip_ignored_newlines();
		let spanned = self.current();
		if !matches!(spanned.tok, Tok::Eof) {
			self.cursor += 1;
		}
		spanned
	}

	/// End offset of the last consumed token.
	fn last_end(&self) -> usize {
		self.cursor
			.checked_sub(1)
			.and_then(|index| self.tokens.get(index))
			.map_or(0, |spanned| spanned.end)
	}

	fn expect(&mut self, expected: &Tok, what: &str) -> HclResult<&'a Spanned> {
		let spanned = self.next();
		if &spanned.tok == expected {
			Ok(spanned)
		} else {
			Err(self.error(spanned.start, format!("expected {what}, found {}", describe(&spanned.tok))))
		}
	}

	fn expect_eof(&mut self) -> HclResult<()> {
		self.skip_newlines();
		let spanned = self.current();
		if matches!(spanned.tok, Tok::Eof) {
			Ok(())
		} else {
			Err(self.error(spanned.start, format!("unexpected {}", describe(&spanned.tok))))
		}
	}

	fn with_newlines<T>(&mut self, significant: bool, f: impl FnOnce(&mut Self) -> HclResult<T>) -> HclResult<T> {
		self.newline_modes.push(significant);
		let result = f(self);
		self.newline_modes.pop();
		result
	}

	fn enter(&mut self) -> HclResult<()> {
		self.depth += 1;
		if self.depth > self.max_depth {
			return Err(HclError::NestingTooDeep {
				max: self.max_depth,
			});
		}
		Ok(())
	}

	fn leave(&mut self) {
		self.depth = self.depth.saturating_sub(1);
	}

	/// Attributes and blocks until `}` (for nested bodies) or the end of the
	/// file.
	fn body(&mut self, start: usize) -> HclResult<RawBody> {
		let mut body = RawBody::default();

		loop {
			self.skip_newlines();
			let spanned = self.current();
			let name = match &spanned.tok {
				Tok::Eof | Tok::CBrace => break,
				Tok::Ident(name) => name.clone(),
				other => {
					return Err(self.error(
						spanned.start,
						format!("expected an attribute or block, found {}", describe(other)),
					));
				}
			};
			self.cursor += 1;

			if matches!(self.current().tok, Tok::Assign) {
				self.cursor += 1;
				let expr = self.expression()?;
				let name_range = self.range(spanned.start, spanned.end);
				let range = self.range(spanned.start, self.last_end());

				if body.attributes.contains_key(&name) {
					let position = self.lines.position(spanned.start);
					return Err(HclError::DuplicateAttribute {
						name,
						file: self.display.clone(),
						line: position.line(),
						column: position.column(),
					});
				}

				body.attributes.insert(
					name.clone(),
					RawAttribute {
						name,
						expr,
						name_range,
						range,
					},
				);
			} else {
				let block = self.block(name, spanned)?;
				body.blocks.push(block);
			}

			self.end_of_item()?;
		}

		body.range = self.range(start, self.current().start);
		Ok(body)
	}

	/// Attributes and blocks end at a newline, at the closing brace of a
	/// single line block or at the end of the file.
	fn end_of_item(&mut self) -> HclResult<()> {
		let spanned = self.current();
		match spanned.tok {
			Tok::Newline => {
				self.cursor += 1;
				Ok(())
			}
			Tok::Eof | Tok::CBrace => Ok(()),
			ref other => Err(self.error(spanned.start, format!("expected a newline, found {}", describe(other)))),
		}
	}

	fn block(&mut self, r#type: String, type_token: &'a Spanned) -> HclResult<RawBlock> {
		let mut labels = Vec::new();
		let mut label_ranges = Vec::new();

		loop {
			let spanned = self.current();
			match &spanned.tok {
				Tok::OBrace => break,
				Tok::Ident(label) => {
					self.cursor += 1;
					labels.push(label.clone());
					label_ranges.push(self.range(spanned.start, spanned.end));
				}
				Tok::OQuote => {
					self.cursor += 1;
					let mut label = String::new();
					loop {
						let part = self.current();
						self.cursor += 1;
						match &part.tok {
							Tok::TemplateLit(text) => label.push_str(text),
							Tok::CQuote => break,
							_ => {
								return Err(self.error(part.start, "block labels cannot contain interpolations"));
							}
						}
					}
					labels.push(label);
					label_ranges.push(self.range(spanned.start, self.last_end()));
				}
				other => {
					return Err(self.error(
						spanned.start,
						format!("expected a block label or `{{`, found {}", describe(other)),
					));
				}
			}
		}

		let open = self.current();
		self.cursor += 1;
		let body = self.with_newlines(true, |parser| parser.body(open.end))?;
		let close = self.current();
		if !matches!(close.tok, Tok::CBrace) {
			return Err(self.error(close.start, format!("expected `}}` to close block `{type}`")));
		}
		self.cursor += 1;

		Ok(RawBlock {
			r#type,
			labels,
			body,
			type_range: self.range(type_token.start, type_token.end),
			label_ranges,
			open_brace_range: self.range(open.start, open.end),
			close_brace_range: self.range(close.start, close.end),
		})
	}

	fn expression(&mut self) -> HclResult<Expression> {
		self.enter()?;
		let result = self.conditional();
		self.leave();
		result
	}

	fn conditional(&mut self) -> HclResult<Expression> {
		let condition = self.binary(0)?;
		if !matches!(self.peek(), Tok::Question) {
			return Ok(condition);
		}
		self.next();
		let true_result = self.expression()?;
		self.expect(&Tok::Colon, "`:`")?;
		let false_result = self.expression()?;

		Ok(Expression::Conditional(ConditionalExpr {
			condition: Box::new(condition),
			true_result: Box::new(true_result),
			false_result: Box::new(false_result),
		}))
	}

	fn binary(&mut self, level: usize) -> HclResult<Expression> {
		let Some(operators) = PRECEDENCE.get(level) else {
			return self.unary();
		};

		let mut lhs = self.binary(level + 1)?;
		loop {
			let tok = self.peek();
			let Some((_, op)) = operators.iter().find(|(candidate, _)| candidate == tok) else {
				break;
			};
			self.next();
			self.enter()?;
			let rhs = self.binary(level + 1);
			self.leave();
			lhs = Expression::binary(*op, lhs, rhs?);
		}

		Ok(lhs)
	}

	fn unary(&mut self) -> HclResult<Expression> {
		let op = match self.peek() {
			Tok::Minus => UnaryOp::Negate,
			Tok::Bang => UnaryOp::Not,
			_ => return self.postfix(),
		};
		self.next();
		self.enter()?;
		let value = self.unary();
		self.leave();
		Ok(Expression::unary(op, value?))
	}

	fn postfix(&mut self) -> HclResult<Expression> {
		let primary = self.primary()?;
		self.postfix_chain(primary)
	}

	/// Apply attribute access, indexing and splats to `current`.
	///
	/// Attribute steps and literal index keys extend a traversal; any other
	/// index becomes an index expression. A splat takes the rest of the
	/// chain as the expression applied to each element.
	fn postfix_chain(&mut self, mut current: Expression) -> HclResult<Expression> {
		loop {
			match self.peek() {
				Tok::Dot => {
					self.next();
					let spanned = self.next();
					let step = match &spanned.tok {
						Tok::Ident(name) => Traverser::Attr(name.clone()),
						Tok::Number(number) => Traverser::Index(Value::number(number)?),
						Tok::Star => {
							return Err(self.error(spanned.start, "attribute-only splat `.*` is not supported"));
						}
						other => {
							return Err(self.error(
								spanned.start,
								format!("expected an attribute name, found {}", describe(other)),
							));
						}
					};
					current = push_step(current, step);
				}
				Tok::OBrack => {
					self.next();
					if matches!(self.peek(), Tok::Star) {
						self.next();
						self.expect(&Tok::CBrack, "`]`")?;
						self.enter()?;
						let each = self.postfix_chain(Expression::AnonSymbol);
						self.leave();
						return Ok(Expression::Splat(SplatExpr {
							source: Box::new(current),
							each: Box::new(each?),
						}));
					}

					let key = self.with_newlines(false, |parser| {
						let key = parser.expression()?;
						parser.expect(&Tok::CBrack, "`]`")?;
						Ok(key)
					})?;

					current = match literal_key(&key) {
						Some(value) => push_step(current, Traverser::Index(value)),
						None => {
							Expression::Index(IndexExpr {
								collection: Box::new(current),
								key: Box::new(key),
							})
						}
					};
				}
				_ => return Ok(current),
			}
		}
	}

	fn primary(&mut self) -> HclResult<Expression> {
		let spanned = self.next();
		match &spanned.tok {
			Tok::Number(number) => Ok(Expression::Literal(Value::number(number)?)),
			Tok::Ident(name) => {
				match name.as_str() {
					"true" => return Ok(Expression::Literal(Value::Bool(true))),
					"false" => return Ok(Expression::Literal(Value::Bool(false))),
					"null" => return Ok(Expression::Literal(Value::Null)),
					_ => {}
				}

				if matches!(self.current().tok, Tok::OParen) {
					self.cursor += 1;
					return self.function_call(name.clone());
				}

				Ok(Expression::ScopeTraversal(vec![Traverser::Root(name.clone())]))
			}
			Tok::OQuote => self.quoted_template(),
			Tok::OHeredoc { flush } => self.heredoc_template(*flush),
			Tok::OParen => {
				self.with_newlines(false, |parser| {
					let inner = parser.expression()?;
					parser.expect(&Tok::CParen, "`)`")?;
					Ok(Expression::Parens(Box::new(inner)))
				})
			}
			Tok::OBrack => self.with_newlines(false, Self::tuple_or_for),
			Tok::OBrace => self.object_or_for(),
			other => Err(self.error(spanned.start, format!("expected an expression, found {}", describe(other)))),
		}
	}

	fn function_call(&mut self, name: String) -> HclResult<Expression> {
		self.with_newlines(false, |parser| {
			let mut args = Vec::new();
			let mut expand_final = false;

			loop {
				if matches!(parser.peek(), Tok::CParen) {
					parser.next();
					break;
				}

				args.push(parser.expression()?);

				match parser.peek() {
					Tok::Comma => {
						parser.next();
					}
					Tok::Ellipsis => {
						parser.next();
						expand_final = true;
						parser.expect(&Tok::CParen, "`)` after `...`")?;
						break;
					}
					Tok::CParen => {}
					other => {
						let start = parser.current().start;
						return Err(parser.error(start, format!("expected `,` or `)`, found {}", describe(other))));
					}
				}
			}

			Ok(Expression::FunctionCall(FunctionCallExpr {
				name,
				args,
				expand_final,
			}))
		})
	}

	fn tuple_or_for(&mut self) -> HclResult<Expression> {
		if matches!(self.peek(), Tok::Ident(name) if name == "for") {
			self.next();
			return self.for_expr(false);
		}

		let mut items = Vec::new();
		loop {
			if matches!(self.peek(), Tok::CBrack) {
				self.next();
				break;
			}

			items.push(self.expression()?);

			match self.peek() {
				Tok::Comma => {
					self.next();
				}
				Tok::CBrack => {}
				other => {
					let start = self.current().start;
					return Err(self.error(start, format!("expected `,` or `]`, found {}", describe(other))));
				}
			}
		}

		Ok(Expression::Tuple(items))
	}

	fn object_or_for(&mut self) -> HclResult<Expression> {
		let is_for = self.with_newlines(false, |parser| {
			Ok(matches!(parser.peek(), Tok::Ident(name) if name == "for"))
		})?;
		if is_for {
			return self.with_newlines(false, |parser| {
				parser.next();
				parser.for_expr(true)
			});
		}

		self.with_newlines(true, |parser| {
			let mut items = Vec::new();

			loop {
				parser.skip_newlines();
				if matches!(parser.peek(), Tok::CBrace) {
					parser.next();
					break;
				}

				let key = parser.binary(0)?;
				let force_non_literal = matches!(key, Expression::Parens(_));
				let separator = parser.next();
				if !matches!(separator.tok, Tok::Assign | Tok::Colon) {
					return Err(parser.error(
						separator.start,
						format!("expected `=` or `:` after object key, found {}", describe(&separator.tok)),
					));
				}
				let value = parser.expression()?;

				items.push(ObjectItem {
					key: Expression::ObjectKey(ObjectKeyExpr {
						wrapped: Box::new(key),
						force_non_literal,
					}),
					value,
				});

				match parser.peek() {
					Tok::Comma | Tok::Newline => {
						parser.next();
					}
					Tok::CBrace => {}
					other => {
						let start = parser.current().start;
						return Err(parser.error(
							start,
							format!("expected `,`, a newline or `}}`, found {}", describe(other)),
						));
					}
				}
			}

			Ok(Expression::Object(items))
		})
	}

	/// The rest of a for expression after the `for` keyword.
	fn for_expr(&mut self, object: bool) -> HclResult<Expression> {
		let first = self.identifier("an iteration variable")?;
		let (key_var, value_var) = if matches!(self.peek(), Tok::Comma) {
			self.next();
			(Some(first), self.identifier("an iteration variable")?)
		} else {
			(None, first)
		};

		let keyword = self.identifier("`in`")?;
		if keyword != "in" {
			let start = self.tokens[self.cursor - 1].start;
			return Err(self.error(start, format!("expected `in`, found `{keyword}`")));
		}

		let collection = self.expression()?;
		self.expect(&Tok::Colon, "`:`")?;

		let key_expr = if object {
			let key = self.expression()?;
			self.expect(&Tok::FatArrow, "`=>`")?;
			Some(key)
		} else {
			None
		};

		let value_expr = self.expression()?;
		let group = if object && matches!(self.peek(), Tok::Ellipsis) {
			self.next();
			true
		} else {
			false
		};

		let condition = if matches!(self.peek(), Tok::Ident(name) if name == "if") {
			self.next();
			Some(self.expression()?)
		} else {
			None
		};

		let (close, what) = if object {
			(Tok::CBrace, "`}`")
		} else {
			(Tok::CBrack, "`]`")
		};
		self.expect(&close, what)?;

		Ok(Expression::For(Box::new(ForExpr {
			key_var,
			value_var,
			collection,
			key_expr,
			value_expr,
			condition,
			group,
		})))
	}

	fn identifier(&mut self, what: &str) -> HclResult<String> {
		let spanned = self.next();
		match &spanned.tok {
			Tok::Ident(name) => Ok(name.clone()),
			other => Err(self.error(spanned.start, format!("expected {what}, found {}", describe(other)))),
		}
	}

	fn interpolation(&mut self) -> HclResult<Expression> {
		self.with_newlines(false, |parser| {
			let expr = parser.expression()?;
			parser.expect(&Tok::TemplateSeqEnd, "`}` closing the interpolation")?;
			Ok(expr)
		})
	}

	fn quoted_template(&mut self) -> HclResult<Expression> {
		let mut parts = Vec::new();

		loop {
			let spanned = self.current();
			self.cursor += 1;
			match &spanned.tok {
				Tok::CQuote => break,
				Tok::TemplateLit(text) => push_literal(&mut parts, text),
				Tok::TemplateInterp => parts.push(self.interpolation()?),
				other => {
					return Err(self.error(spanned.start, format!("unexpected {} in template", describe(other))));
				}
			}
		}

		Ok(finish_template(parts))
	}

	fn heredoc_template(&mut self, flush: bool) -> HclResult<Expression> {
		// Literal segments keep their line start flag until flush
		// indentation has been removed.
		let mut segments: Vec<(Option<(String, bool)>, Option<Expression>)> = Vec::new();

		loop {
			let spanned = self.current();
			self.cursor += 1;
			match &spanned.tok {
				Tok::CHeredoc => break,
				Tok::HeredocLit { text, line_start } => segments.push((Some((text.clone(), *line_start)), None)),
				Tok::TemplateInterp => segments.push((None, Some(self.interpolation()?))),
				other => {
					return Err(self.error(spanned.start, format!("unexpected {} in heredoc", describe(other))));
				}
			}
		}

		let indent = if flush {
			segments
				.iter()
				.enumerate()
				.filter_map(|(index, (literal, _))| {
					let (text, line_start) = literal.as_ref()?;
					if !*line_start {
						return None;
					}
					let followed_by_interp = matches!(segments.get(index + 1), Some((None, Some(_))));
					if text.trim().is_empty() && !followed_by_interp {
						return None;
					}
					Some(text.len() - text.trim_start_matches([' ', '\t']).len())
				})
				.min()
				.unwrap_or(0)
		} else {
			0
		};

		let mut parts = Vec::new();
		for (literal, interp) in segments {
			if let Some((text, line_start)) = literal {
				let text = if line_start {
					strip_indent(&text, indent)
				} else {
					text.as_str()
				};
				push_literal(&mut parts, text);
			}
			if let Some(expr) = interp {
				parts.push(expr);
			}
		}

		Ok(finish_template(parts))
	}
}

/// Remove up to `indent` leading spaces or tabs.
fn strip_indent(text: &str, indent: usize) -> &str {
	let whitespace = text.len() - text.trim_start_matches([' ', '\t']).len();
	&text[whitespace.min(indent)..]
}

fn push_literal(parts: &mut Vec<Expression>, text: &str) {
	if text.is_empty() {
		return;
	}
	if let Some(Expression::Literal(Value::String(previous))) = parts.last_mut() {
		previous.push_str(text);
		return;
	}
	parts.push(Expression::Literal(Value::String(text.to_string())));
}

fn finish_template(mut parts: Vec<Expression>) -> Expression {
	if parts.len() == 1 && !matches!(parts[0], Expression::Literal(Value::String(_))) {
		return Expression::TemplateWrap(Box::new(parts.remove(0)));
	}
	if parts.is_empty() {
		parts.push(Expression::Literal(Value::String(String::new())));
	}
	Expression::Template(parts)
}

/// Index keys that are plain literals fold into the traversal.
fn literal_key(key: &Expression) -> Option<Value> {
	match key {
		Expression::Literal(value) => Some(value.clone()),
		Expression::Template(parts) => {
			match parts.as_slice() {
				[Expression::Literal(value @ Value::String(_))] => Some(value.clone()),
				_ => None,
			}
		}
		_ => None,
	}
}

fn push_step(current: Expression, step: Traverser) -> Expression {
	match current {
		Expression::ScopeTraversal(mut traversal) => {
			traversal.push(step);
			Expression::ScopeTraversal(traversal)
		}
		Expression::RelativeTraversal(mut relative) => {
			relative.traversal.push(step);
			Expression::RelativeTraversal(relative)
		}
		source => {
			Expression::RelativeTraversal(RelativeTraversalExpr {
				source: Box::new(source),
				traversal: vec![step],
			})
		}
	}
}

fn describe(tok: &Tok) -> String {
	match tok {
		Tok::Ident(name) => format!("`{name}`"),
		Tok::Number(number) => format!("number `{number}`"),
		Tok::Newline => "newline".into(),
		Tok::Eof => "end of file".into(),
		Tok::OQuote | Tok::CQuote => "`\"`".into(),
		Tok::TemplateLit(_) | Tok::HeredocLit { .. } => "template text".into(),
		Tok::TemplateInterp => "`${`".into(),
		Tok::TemplateSeqEnd => "`}`".into(),
		Tok::OHeredoc { .. } => "heredoc".into(),
		Tok::CHeredoc => "heredoc end".into(),
		other => format!("`{}`", symbol(other)),
	}
}

fn symbol(tok: &Tok) -> &'static str {
	match tok {
		Tok::OBrace => "{",
		Tok::CBrace => "}",
		Tok::OBrack => "[",
		Tok::CBrack => "]",
		Tok::OParen => "(",
		Tok::CParen => ")",
		Tok::EqualOp => "==",
		Tok::NotEqual => "!=",
		Tok::LessThan => "<",
		Tok::LessThanEq => "<=",
		Tok::GreaterThan => ">",
		Tok::GreaterThanEq => ">=",
		Tok::And => "&&",
		Tok::Or => "||",
		Tok::FatArrow => "=>",
		Tok::Ellipsis => "...",
		Tok::Assign => "=",
		Tok::Bang => "!",
		Tok::Plus => "+",
		Tok::Minus => "-",
		Tok::Star => "*",
		Tok::Slash => "/",
		Tok::Percent => "%",
		Tok::Dot => ".",
		Tok::Comma => ",",
		Tok::Question => "?",
		Tok::Colon => ":",
		_ => "?",
	}
}
