//! Merged configuration back to source.

use crate::Attributes;
use crate::Block;
use crate::DEFAULT_MAX_DEPTH;
use crate::Expression;
use crate::HclError;
use crate::HclResult;
use crate::MergedBlock;
use crate::Token;
use crate::TokenBuilder;
use crate::TokenType;
use crate::Tokens;
use crate::Value;
use crate::escape_quoted;
use crate::is_valid_identifier;

/// Tokens for `block`: attributes in name order, then sub-blocks ordered by
/// type and labels.
pub fn tokens_for_merged_block(block: &MergedBlock) -> HclResult<Tokens> {
	tokens_for_merged_block_with_depth(block, DEFAULT_MAX_DEPTH)
}

pub fn tokens_for_merged_block_with_depth(block: &MergedBlock, max_depth: usize) -> HclResult<Tokens> {
	let mut tokens = Tokens::new();
	push_block(&mut tokens, block, max_depth)?;
	tokens.push(Token::eof());
	Ok(tokens)
}

/// Tokens for a block as it was declared, before any merging.
pub fn tokens_for_block(block: &Block) -> HclResult<Tokens> {
	let mut tokens = Tokens::new();
	push_plain_block(&mut tokens, block, DEFAULT_MAX_DEPTH)?;
	tokens.push(Token::eof());
	Ok(tokens)
}

/// Tokens for top-level attributes, one `name = value` line each.
pub fn tokens_for_attributes(attributes: &Attributes) -> HclResult<Tokens> {
	let mut tokens = Tokens::new();
	for (name, attr) in attributes {
		push_attribute(&mut tokens, name, expression_tokens(&attr.expr, DEFAULT_MAX_DEPTH)?);
	}
	tokens.push(Token::eof());
	Ok(tokens)
}

/// Tokens for every entry of an evaluated object as `name = value` lines.
pub fn tokens_for_object_attrs(value: &Value) -> HclResult<Tokens> {
	let Value::Object(attributes) = value else {
		return Err(HclError::UnsupportedExpression(format!(
			"cannot render a {} as attributes",
			value.type_name()
		)));
	};

	let mut tokens = Tokens::new();
	for (name, value) in attributes {
		if !is_valid_identifier(name) {
			return Err(HclError::UnsupportedExpression(format!(
				"`{name}` is not a valid attribute name"
			)));
		}
		let value = TokenBuilder::new(DEFAULT_MAX_DEPTH).value(value)?;
		push_attribute(&mut tokens, name, value);
	}
	tokens.push(Token::eof());

	Ok(tokens)
}

fn push_block(tokens: &mut Tokens, block: &MergedBlock, max_depth: usize) -> HclResult<()> {
	push_header(tokens, &block.r#type, &block.labels);

	for (name, attr) in &block.attributes {
		push_attribute(tokens, name, expression_tokens(&attr.expr, max_depth)?);
	}

	for child in block.blocks.values() {
		push_block(tokens, child, max_depth)?;
	}

	tokens.push(Token::cbrace());
	tokens.push(Token::nl());
	Ok(())
}

fn push_plain_block(tokens: &mut Tokens, block: &Block, max_depth: usize) -> HclResult<()> {
	push_header(tokens, &block.r#type, &block.labels);

	for (name, attr) in &block.attributes {
		push_attribute(tokens, name, expression_tokens(&attr.expr, max_depth)?);
	}

	for child in &block.blocks {
		push_plain_block(tokens, child, max_depth)?;
	}

	tokens.push(Token::cbrace());
	tokens.push(Token::nl());
	Ok(())
}

fn push_header(tokens: &mut Tokens, r#type: &str, labels: &[String]) {
	tokens.push(Token::ident(r#type));
	for label in labels {
		tokens.push(Token::oquote().spaced(1));
		tokens.push(Token::quoted_lit(escape_quoted(label)));
		tokens.push(Token::cquote());
	}
	tokens.push(Token::obrace().spaced(1));
	tokens.push(Token::nl());
}

fn expression_tokens(expr: &Expression, max_depth: usize) -> HclResult<Tokens> {
	TokenBuilder::new(max_depth).expression(expr)
}

fn push_attribute(tokens: &mut Tokens, name: &str, value: Tokens) {
	tokens.push(Token::ident(name));
	tokens.push(Token::assign().spaced(1));

	let mut first = true;
	for mut token in value.into_iter().filter(|token| token.r#type != TokenType::Eof) {
		if first {
			token.spaces_before = 1;
			first = false;
		}
		tokens.push(token);
	}

	// Heredocs end with their own newline.
	if tokens.last().is_none_or(|token| token.r#type != TokenType::CHeredoc) {
		tokens.push(Token::nl());
	}
}
