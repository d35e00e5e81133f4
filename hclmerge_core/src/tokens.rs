use std::fmt;
use std::fmt::Display;

use derive_more::Deref;
use derive_more::DerefMut;

/// The lexical class of an output token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
	/// `{`
	OBrace,
	/// `}`
	CBrace,
	/// `[`
	OBrack,
	/// `]`
	CBrack,
	/// `(`
	OParen,
	/// `)`
	CParen,
	/// `"` opening a quoted template
	OQuote,
	/// `"` closing a quoted template
	CQuote,
	/// `<<-EOT` plus the newline that ends the marker line
	OHeredoc,
	/// `EOT` plus the newline that ends the heredoc
	CHeredoc,
	Star,
	Slash,
	Plus,
	Minus,
	Percent,
	/// `=` as used for attribute assignment and object items
	Equal,
	/// `==`
	EqualOp,
	NotEqual,
	LessThan,
	LessThanEq,
	GreaterThan,
	GreaterThanEq,
	And,
	Or,
	Bang,
	Dot,
	Comma,
	Ellipsis,
	/// `=>`
	FatArrow,
	Question,
	Colon,
	/// `${`
	TemplateInterp,
	/// `}` closing an interpolation
	TemplateSeqEnd,
	/// Escaped string content as it appears between quotes.
	QuotedLit,
	/// One line (or the tail) of template content.
	StringLit,
	NumberLit,
	Ident,
	Newline,
	/// End of the token stream. Renders as nothing.
	Eof,
}

impl TokenType {
	/// Tokens that open a nesting level for [`Tokens::format`].
	pub fn is_opener(self) -> bool {
		matches!(
			self,
			Self::OBrace | Self::OBrack | Self::OParen | Self::TemplateInterp
		)
	}

	/// Tokens that close a nesting level for [`Tokens::format`].
	pub fn is_closer(self) -> bool {
		matches!(
			self,
			Self::CBrace | Self::CBrack | Self::CParen | Self::TemplateSeqEnd
		)
	}
}

/// A single lexical unit of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub r#type: TokenType,
	pub bytes: Vec<u8>,
	/// Number of spaces emitted before the token.
	pub spaces_before: usize,
}

impl Token {
	pub fn new(r#type: TokenType, bytes: impl Into<Vec<u8>>) -> Self {
		Self {
			r#type,
			bytes: bytes.into(),
			spaces_before: 0,
		}
	}

	/// Set the leading spaces hint.
	#[must_use]
	pub fn spaced(mut self, spaces_before: usize) -> Self {
		self.spaces_before = spaces_before;
		self
	}

	pub fn obrace() -> Self {
		Self::new(TokenType::OBrace, "{")
	}

	pub fn cbrace() -> Self {
		Self::new(TokenType::CBrace, "}")
	}

	pub fn obrack() -> Self {
		Self::new(TokenType::OBrack, "[")
	}

	pub fn cbrack() -> Self {
		Self::new(TokenType::CBrack, "]")
	}

	pub fn oparen() -> Self {
		Self::new(TokenType::OParen, "(")
	}

	pub fn cparen() -> Self {
		Self::new(TokenType::CParen, ")")
	}

	pub fn oquote() -> Self {
		Self::new(TokenType::OQuote, "\"")
	}

	pub fn cquote() -> Self {
		Self::new(TokenType::CQuote, "\"")
	}

	pub fn oheredoc() -> Self {
		Self::new(TokenType::OHeredoc, "<<-EOT\n")
	}

	pub fn cheredoc() -> Self {
		Self::new(TokenType::CHeredoc, "EOT\n")
	}

	pub fn star() -> Self {
		Self::new(TokenType::Star, "*")
	}

	pub fn ellipsis() -> Self {
		Self::new(TokenType::Ellipsis, "...")
	}

	pub fn assign() -> Self {
		Self::new(TokenType::Equal, "=")
	}

	pub fn arrow() -> Self {
		Self::new(TokenType::FatArrow, "=>")
	}

	pub fn bang() -> Self {
		Self::new(TokenType::Bang, "!")
	}

	pub fn minus() -> Self {
		Self::new(TokenType::Minus, "-")
	}

	pub fn dot() -> Self {
		Self::new(TokenType::Dot, ".")
	}

	pub fn comma() -> Self {
		Self::new(TokenType::Comma, ",")
	}

	pub fn colon() -> Self {
		Self::new(TokenType::Colon, ":")
	}

	pub fn question() -> Self {
		Self::new(TokenType::Question, "?")
	}

	pub fn interp_begin() -> Self {
		Self::new(TokenType::TemplateInterp, "${")
	}

	pub fn interp_end() -> Self {
		Self::new(TokenType::TemplateSeqEnd, "}")
	}

	pub fn ident(name: impl Into<Vec<u8>>) -> Self {
		Self::new(TokenType::Ident, name)
	}

	pub fn number(literal: impl Into<Vec<u8>>) -> Self {
		Self::new(TokenType::NumberLit, literal)
	}

	pub fn quoted_lit(content: impl Into<Vec<u8>>) -> Self {
		Self::new(TokenType::QuotedLit, content)
	}

	pub fn string_lit(content: impl Into<Vec<u8>>) -> Self {
		Self::new(TokenType::StringLit, content)
	}

	pub fn nl() -> Self {
		Self::new(TokenType::Newline, "\n")
	}

	pub fn eof() -> Self {
		Self::new(TokenType::Eof, "")
	}
}

/// An ordered token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Tokens(
	#[deref]
	#[deref_mut]
	Vec<Token>,
);

impl Tokens {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn into_inner(self) -> Vec<Token> {
		self.0
	}

	/// Concatenate every token, emitting `spaces_before` spaces ahead of each.
	pub fn bytes(&self) -> Vec<u8> {
		let mut output = Vec::new();
		for token in &self.0 {
			output.extend(std::iter::repeat_n(b' ', token.spaces_before));
			output.extend_from_slice(&token.bytes);
		}
		output
	}

	/// Render the tokens with two-space indentation per nesting level.
	///
	/// The first token of every line is indented by the number of open
	/// brackets, braces, parentheses and interpolations, one level less when
	/// the token closes one of them. Heredoc body text is copied verbatim;
	/// interpolations inside a heredoc keep their spacing.
	pub fn format(&self) -> String {
		let mut output = Vec::new();
		let mut depth: usize = 0;
		let mut line_start = true;
		// Open interpolations of every enclosing heredoc, innermost last.
		let mut heredocs: Vec<usize> = Vec::new();

		for token in &self.0 {
			if let Some(open) = heredocs.last_mut() {
				match token.r#type {
					TokenType::Eof | TokenType::OHeredoc | TokenType::CHeredoc => {}
					TokenType::TemplateInterp => {
						push_spaced(&mut output, token, *open > 0);
						*open += 1;
						line_start = false;
						continue;
					}
					TokenType::TemplateSeqEnd if *open > 0 => {
						push_spaced(&mut output, token, true);
						*open -= 1;
						continue;
					}
					_ => {
						push_spaced(&mut output, token, *open > 0);
						continue;
					}
				}
			}

			match token.r#type {
				TokenType::Eof => continue,
				TokenType::OHeredoc => {
					push_leading(&mut output, token, line_start, depth);
					output.extend_from_slice(&token.bytes);
					heredocs.push(0);
					line_start = true;
					continue;
				}
				TokenType::CHeredoc => {
					output.extend_from_slice(&token.bytes);
					heredocs.pop();
					line_start = true;
					continue;
				}
				TokenType::Newline => {
					output.extend_from_slice(&token.bytes);
					line_start = true;
					continue;
				}
				_ => {}
			}

			if token.r#type.is_closer() {
				depth = depth.saturating_sub(1);
			}

			push_leading(&mut output, token, line_start, depth);
			output.extend_from_slice(&token.bytes);
			line_start = false;

			if token.r#type.is_opener() {
				depth += 1;
			}
		}

		String::from_utf8_lossy(&output).into_owned()
	}
}

fn push_spaced(output: &mut Vec<u8>, token: &Token, spaced: bool) {
	if spaced {
		output.extend(std::iter::repeat_n(b' ', token.spaces_before));
	}
	output.extend_from_slice(&token.bytes);
}

fn push_leading(output: &mut Vec<u8>, token: &Token, line_start: bool, depth: usize) {
	if line_start {
		output.extend(std::iter::repeat_n(b' ', depth * 2));
	} else {
		output.extend(std::iter::repeat_n(b' ', token.spaces_before));
	}
}

impl From<Vec<Token>> for Tokens {
	fn from(tokens: Vec<Token>) -> Self {
		Self(tokens)
	}
}

impl FromIterator<Token> for Tokens {
	fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for Tokens {
	type IntoIter = std::vec::IntoIter<Token>;
	type Item = Token;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl Display for Tokens {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", String::from_utf8_lossy(&self.bytes()))
	}
}
