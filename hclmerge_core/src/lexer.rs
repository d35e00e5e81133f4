use logos::Logos;

use crate::HclError;
use crate::HclResult;
use crate::position::LineIndex;

/// Raw tokens produced by logos for the non-template parts of the source.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[token("\n")]
	Newline,
	#[regex(r"<<-?[A-Za-z_][A-Za-z0-9_-]*\r?\n")]
	Heredoc,
	#[regex(r"[\p{L}_][\p{L}\p{N}_-]*")]
	Ident,
	#[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
	Number,
	#[token("\"")]
	Quote,
	#[token("{")]
	OBrace,
	#[token("}")]
	CBrace,
	#[token("[")]
	OBrack,
	#[token("]")]
	CBrack,
	#[token("(")]
	OParen,
	#[token(")")]
	CParen,
	#[token("==")]
	EqualOp,
	#[token("!=")]
	NotEqual,
	#[token("<=")]
	LessThanEq,
	#[token(">=")]
	GreaterThanEq,
	#[token("&&")]
	And,
	#[token("||")]
	Or,
	#[token("=>")]
	FatArrow,
	#[token("...")]
	Ellipsis,
	#[token("=")]
	Assign,
	#[token("<")]
	LessThan,
	#[token(">")]
	GreaterThan,
	#[token("!")]
	Bang,
	#[token("+")]
	Plus,
	#[token("-")]
	Minus,
	#[token("*")]
	Star,
	#[token("/")]
	Slash,
	#[token("%")]
	Percent,
	#[token(".")]
	Dot,
	#[token(",")]
	Comma,
	#[token("?")]
	Question,
	#[token(":")]
	Colon,
}

/// Tokens handed to the parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
	Ident(String),
	Number(String),
	OBrace,
	CBrace,
	OBrack,
	CBrack,
	OParen,
	CParen,
	EqualOp,
	NotEqual,
	LessThan,
	LessThanEq,
	GreaterThan,
	GreaterThanEq,
	And,
	Or,
	FatArrow,
	Ellipsis,
	Assign,
	Bang,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Dot,
	Comma,
	Question,
	Colon,
	Newline,
	OQuote,
	CQuote,
	/// Decoded text of a quoted template.
	TemplateLit(String),
	/// `${`
	TemplateInterp,
	/// `}` closing an interpolation.
	TemplateSeqEnd,
	OHeredoc {
		flush: bool,
	},
	/// Heredoc text up to and including a newline, or up to an
	/// interpolation. `line_start` is set when the text begins a line.
	HeredocLit {
		text: String,
		line_start: bool,
	},
	CHeredoc,
	Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
	pub tok: Tok,
	pub start: usize,
	pub end: usize,
}

/// Context states for the walker.
#[derive(Debug, Clone)]
enum Mode {
	/// Attributes, blocks and expressions.
	Normal,
	/// Inside `${ ... }`; `depth` counts the braces opened within it.
	Interp { depth: usize },
	/// Inside a quoted template.
	Quoted,
	/// Inside a heredoc body.
	Heredoc { marker: String, at_line_start: bool },
}

/// Walks the source with a stack of contexts, using logos for everything
/// outside of template bodies.
struct TokenWalker<'a> {
	source: &'a str,
	filename: &'a str,
	lines: LineIndex<'a>,
	pos: usize,
	modes: Vec<Mode>,
	tokens: Vec<Spanned>,
}

/// Tokenize a whole source text.
pub(crate) fn tokenize(source: &str, filename: &str) -> HclResult<Vec<Spanned>> {
	let mut walker = TokenWalker::new(source, filename);
	walker.walk()?;
	Ok(walker.tokens)
}

/// Build a syntax error pointing at `byte` of `source`.
pub(crate) fn syntax_error(source: &str, filename: &str, byte: usize, message: impl Into<String>) -> HclError {
	let position = LineIndex::new(source).position(byte);
	HclError::Syntax {
		file: filename.to_string(),
		line: position.line(),
		column: position.column(),
		message: message.into(),
	}
}

impl<'a> TokenWalker<'a> {
	fn new(source: &'a str, filename: &'a str) -> Self {
		Self {
			source,
			filename,
			lines: LineIndex::new(source),
			pos: 0,
			modes: vec![Mode::Normal],
			tokens: Vec::new(),
		}
	}

	fn error(&self, byte: usize, message: impl Into<String>) -> HclError {
		let position = self.lines.position(byte);
		HclError::Syntax {
			file: self.filename.to_string(),
			line: position.line(),
			column: position.column(),
			message: message.into(),
		}
	}

	fn push(&mut self, tok: Tok, start: usize, end: usize) {
		self.tokens.push(Spanned { tok, start, end });
	}

	fn rest(&self) -> &'a str {
		&self.source[self.pos..]
	}

	fn walk(&mut self) -> HclResult<()> {
		while self.pos < self.source.len() {
			match self.modes.last() {
				Some(Mode::Quoted) => self.quoted()?,
				Some(Mode::Heredoc { .. }) => self.heredoc()?,
				_ => self.normal()?,
			}
		}

		match self.modes.last() {
			Some(Mode::Quoted) => return Err(self.error(self.pos, "unterminated template string")),
			Some(Mode::Heredoc { marker, .. }) => {
				return Err(self.error(self.pos, format!("unterminated heredoc, expected `{marker}`")));
			}
			Some(Mode::Interp { .. }) => {
				return Err(self.error(self.pos, "unterminated template interpolation"));
			}
			_ => {}
		}

		self.push(Tok::Eof, self.pos, self.pos);
		Ok(())
	}

	fn normal(&mut self) -> HclResult<()> {
		let rest = self.rest();

		if rest.starts_with('#') || rest.starts_with("//") {
			self.pos += rest.find('\n').unwrap_or(rest.len());
			return Ok(());
		}

		if rest.starts_with("/*") {
			let Some(end) = rest[2..].find("*/") else {
				return Err(self.error(self.pos, "unterminated comment"));
			};
			self.pos += end + 4;
			return Ok(());
		}

		let mut lexer = RawToken::lexer(rest);
		let Some(result) = lexer.next() else {
			self.pos = self.source.len();
			return Ok(());
		};

		let start = self.pos;
		let end = start + lexer.span().end;
		let slice = lexer.slice();
		let Ok(raw) = result else {
			let found = rest.chars().next().unwrap_or_default();
			return Err(self.error(start, format!("unexpected character `{found}`")));
		};
		self.pos = end;

		let tok = match raw {
			RawToken::Whitespace => return Ok(()),
			RawToken::Newline => Tok::Newline,
			RawToken::Heredoc => {
				let header = slice.trim_end_matches(['\r', '\n']);
				let flush = header.starts_with("<<-");
				let marker = header.trim_start_matches("<<-").trim_start_matches("<<");
				self.modes.push(Mode::Heredoc {
					marker: marker.to_string(),
					at_line_start: true,
				});
				Tok::OHeredoc { flush }
			}
			RawToken::Ident => Tok::Ident(slice.to_string()),
			RawToken::Number => Tok::Number(slice.to_string()),
			RawToken::Quote => {
				self.modes.push(Mode::Quoted);
				Tok::OQuote
			}
			RawToken::OBrace => {
				if let Some(Mode::Interp { depth }) = self.modes.last_mut() {
					*depth += 1;
				}
				Tok::OBrace
			}
			RawToken::CBrace => {
				match self.modes.last_mut() {
					Some(Mode::Interp { depth: 0 }) => {
						self.modes.pop();
						Tok::TemplateSeqEnd
					}
					Some(Mode::Interp { depth }) => {
						*depth -= 1;
						Tok::CBrace
					}
					_ => Tok::CBrace,
				}
			}
			RawToken::OBrack => Tok::OBrack,
			RawToken::CBrack => Tok::CBrack,
			RawToken::OParen => Tok::OParen,
			RawToken::CParen => Tok::CParen,
			RawToken::EqualOp => Tok::EqualOp,
			RawToken::NotEqual => Tok::NotEqual,
			RawToken::LessThanEq => Tok::LessThanEq,
			RawToken::GreaterThanEq => Tok::GreaterThanEq,
			RawToken::And => Tok::And,
			RawToken::Or => Tok::Or,
			RawToken::FatArrow => Tok::FatArrow,
			RawToken::Ellipsis => Tok::Ellipsis,
			RawToken::Assign => Tok::Assign,
			RawToken::LessThan => Tok::LessThan,
			RawToken::GreaterThan => Tok::GreaterThan,
			RawToken::Bang => Tok::Bang,
			RawToken::Plus => Tok::Plus,
			RawToken::Minus => Tok::Minus,
			RawToken::Star => Tok::Star,
			RawToken::Slash => Tok::Slash,
			RawToken::Percent => Tok::Percent,
			RawToken::Dot => Tok::Dot,
			RawToken::Comma => Tok::Comma,
			RawToken::Question => Tok::Question,
			RawToken::Colon => Tok::Colon,
		};

		self.push(tok, start, end);
		Ok(())
	}

	/// Handle the template sequences shared by quoted strings and heredocs.
	///
	/// Returns `Some(true)` when an interpolation was opened, `Some(false)`
	/// when an escaped sequence was appended to `text`, and `None` when the
	/// current character is ordinary text.
	fn template_sequence(&mut self, text: &mut String, text_start: usize) -> HclResult<Option<bool>> {
		let rest = self.rest();

		if rest.starts_with("$${") {
			text.push_str("${");
			self.pos += 3;
			return Ok(Some(false));
		}

		if rest.starts_with("%%{") {
			text.push_str("%{");
			self.pos += 3;
			return Ok(Some(false));
		}

		if rest.starts_with("%{") {
			return Err(self.error(self.pos, "template directives are not supported"));
		}

		if rest.starts_with("${") {
			self.flush_literal(text, text_start);
			self.push(Tok::TemplateInterp, self.pos, self.pos + 2);
			self.pos += 2;
			self.modes.push(Mode::Interp { depth: 0 });
			return Ok(Some(true));
		}

		Ok(None)
	}

	fn flush_literal(&mut self, text: &mut String, text_start: usize) {
		if text.is_empty() {
			return;
		}
		let tok = Tok::TemplateLit(std::mem::take(text));
		self.push(tok, text_start, self.pos);
	}

	fn quoted(&mut self) -> HclResult<()> {
		let text_start = self.pos;
		let mut text = String::new();

		while let Some(ch) = self.rest().chars().next() {
			match ch {
				'"' => {
					self.flush_literal(&mut text, text_start);
					self.push(Tok::CQuote, self.pos, self.pos + 1);
					self.pos += 1;
					self.modes.pop();
					return Ok(());
				}
				'\n' => return Err(self.error(self.pos, "unterminated template string")),
				'\\' => {
					let decoded = self.escape_sequence()?;
					text.push(decoded);
				}
				'$' | '%' => {
					match self.template_sequence(&mut text, text_start)? {
						Some(true) => return Ok(()),
						Some(false) => {}
						None => {
							text.push(ch);
							self.pos += 1;
						}
					}
				}
				_ => {
					text.push(ch);
					self.pos += ch.len_utf8();
				}
			}
		}

		self.flush_literal(&mut text, text_start);
		Ok(())
	}

	fn escape_sequence(&mut self) -> HclResult<char> {
		let start = self.pos;
		let rest = &self.source[start + 1..];
		let Some(kind) = rest.chars().next() else {
			return Err(self.error(start, "unterminated escape sequence"));
		};

		let (decoded, length) = match kind {
			'n' => ('\n', 2),
			'r' => ('\r', 2),
			't' => ('\t', 2),
			'"' => ('"', 2),
			'\\' => ('\\', 2),
			'u' | 'U' => {
				let digits = if kind == 'u' { 4 } else { 8 };
				let hex = rest.get(1..=digits).unwrap_or_default();
				let decoded = u32::from_str_radix(hex, 16)
					.ok()
					.filter(|_| hex.len() == digits)
					.and_then(char::from_u32)
					.ok_or_else(|| self.error(start, format!("invalid unicode escape `\\{kind}{hex}`")))?;
				(decoded, digits + 2)
			}
			other => return Err(self.error(start, format!("invalid escape sequence `\\{other}`"))),
		};

		self.pos += length;
		Ok(decoded)
	}

	fn heredoc(&mut self) -> HclResult<()> {
		let Some(Mode::Heredoc {
			marker,
			at_line_start,
		}) = self.modes.last().cloned()
		else {
			return Ok(());
		};

		let rest = self.rest();
		if at_line_start {
			let line_end = rest.find('\n').unwrap_or(rest.len());
			if rest[..line_end].trim() == marker {
				let start = self.pos + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
				self.push(Tok::CHeredoc, start, self.pos + line_end);
				self.pos += line_end;
				self.modes.pop();
				return Ok(());
			}
		}

		let text_start = self.pos;
		let mut text = String::new();
		let mut next_line_start = false;

		while let Some(ch) = self.rest().chars().next() {
			match ch {
				'\n' => {
					text.push('\n');
					self.pos += 1;
					next_line_start = true;
					break;
				}
				'$' | '%' => {
					let rest = self.rest();
					if rest.starts_with("$${") || rest.starts_with("%%{") {
						text.push_str(&rest[1..3]);
						self.pos += 3;
					} else if rest.starts_with("%{") {
						return Err(self.error(self.pos, "template directives are not supported"));
					} else if rest.starts_with("${") {
						// Lines starting with an interpolation still get an entry
						// so flush indentation takes them into account.
						if !text.is_empty() || at_line_start {
							self.push(
								Tok::HeredocLit {
									text,
									line_start: at_line_start,
								},
								text_start,
								self.pos,
							);
						}
						self.push(Tok::TemplateInterp, self.pos, self.pos + 2);
						self.pos += 2;
						self.set_line_start(false);
						self.modes.push(Mode::Interp { depth: 0 });
						return Ok(());
					} else {
						text.push(ch);
						self.pos += 1;
					}
				}
				_ => {
					text.push(ch);
					self.pos += ch.len_utf8();
				}
			}
		}

		self.push(
			Tok::HeredocLit {
				text,
				line_start: at_line_start,
			},
			text_start,
			self.pos,
		);
		self.set_line_start(next_line_start);
		Ok(())
	}

	fn set_line_start(&mut self, value: bool) {
		if let Some(Mode::Heredoc { at_line_start, .. }) = self.modes.last_mut() {
			*at_line_start = value;
		}
	}
}
