use bigdecimal::BigDecimal;
use unicode_general_category::GeneralCategory;
use unicode_general_category::get_general_category;

use crate::HclResult;
use crate::Token;
use crate::TokenBuilder;
use crate::Value;

impl TokenBuilder {
	pub(crate) fn build_value(&mut self, value: &Value) -> HclResult<()> {
		self.enter()?;
		let result = self.build_value_node(value);
		self.leave();
		result
	}

	fn build_value_node(&mut self, value: &Value) -> HclResult<()> {
		match value {
			// Partial evaluation can leave values undetermined. Rendering them
			// as `null` keeps generation going.
			Value::Null | Value::Unknown => self.add(Token::ident("null")),
			Value::Bool(true) => self.add(Token::ident("true")),
			Value::Bool(false) => self.add(Token::ident("false")),
			Value::Number(number) => self.add(Token::number(number_literal(number))),
			Value::String(text) => self.quoted_string(text),
			Value::List(items) => {
				self.add(Token::obrack());
				for (index, item) in items.iter().enumerate() {
					let next = self.tokens.len();
					if index > 0 {
						self.add(Token::comma());
					}
					self.build_value(item)?;
					if index > 0 {
						self.space_at(next + 1);
					}
				}
				self.add(Token::cbrack());
			}
			Value::Object(items) => {
				self.add(Token::obrace());
				if !items.is_empty() {
					self.add(Token::nl());
				}
				for (key, item) in items {
					if is_valid_identifier(key) {
						self.add(Token::ident(key.as_str()));
					} else {
						self.quoted_string(key);
					}
					self.add(Token::assign().spaced(1));
					let next = self.tokens.len();
					self.build_value(item)?;
					self.space_at(next);
					self.add(Token::nl());
				}
				self.add(Token::cbrace());
			}
			Value::Expression(expr) => self.build(expr)?,
			Value::Closure(closure) => self.build(&closure.expression)?,
		}

		Ok(())
	}

	fn quoted_string(&mut self, text: &str) {
		self.add(Token::oquote());
		self.add(Token::quoted_lit(escape_quoted(text)));
		self.add(Token::cquote());
	}
}

/// Plain decimal notation, never scientific, with no trailing fractional
/// zeros.
pub fn number_literal(number: &BigDecimal) -> String {
	let (digits, scale) = number.normalized().as_bigint_and_exponent();
	let digits = digits.to_string();
	let (sign, magnitude) = match digits.strip_prefix('-') {
		Some(magnitude) => ("-", magnitude),
		None => ("", digits.as_str()),
	};

	if scale <= 0 {
		let zeros = "0".repeat(scale.unsigned_abs() as usize);
		return format!("{sign}{magnitude}{zeros}");
	}

	let scale = scale as usize;
	if magnitude.len() > scale {
		let (integer, fraction) = magnitude.split_at(magnitude.len() - scale);
		format!("{sign}{integer}.{fraction}")
	} else {
		let zeros = "0".repeat(scale - magnitude.len());
		format!("{sign}0.{zeros}{magnitude}")
	}
}

/// Escape `text` for use between double quotes.
///
/// `$` and `%` are doubled only when followed by `{`, which is the only
/// position where they would start a template sequence.
pub fn escape_quoted(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'\n' => output.push_str("\\n"),
			'\r' => output.push_str("\\r"),
			'\t' => output.push_str("\\t"),
			'"' => output.push_str("\\\""),
			'\\' => output.push_str("\\\\"),
			'$' | '%' => {
				output.push(ch);
				if chars.peek() == Some(&'{') {
					output.push(ch);
				}
			}
			ch if is_printable(ch) => output.push(ch),
			ch if u32::from(ch) < 0x10000 => {
				output.push_str(&format!("\\u{:04x}", u32::from(ch)));
			}
			ch => {
				output.push_str(&format!("\\U{:08x}", u32::from(ch)));
			}
		}
	}

	output
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
pub fn is_printable(ch: char) -> bool {
	if ch == ' ' {
		return true;
	}

	!matches!(
		get_general_category(ch),
		GeneralCategory::Control
			| GeneralCategory::Format
			| GeneralCategory::Surrogate
			| GeneralCategory::PrivateUse
			| GeneralCategory::Unassigned
			| GeneralCategory::LineSeparator
			| GeneralCategory::ParagraphSeparator
			| GeneralCategory::SpaceSeparator
	)
}

fn is_letter(ch: char) -> bool {
	matches!(
		get_general_category(ch),
		GeneralCategory::UppercaseLetter
			| GeneralCategory::LowercaseLetter
			| GeneralCategory::TitlecaseLetter
			| GeneralCategory::ModifierLetter
			| GeneralCategory::OtherLetter
	)
}

fn is_number(ch: char) -> bool {
	matches!(
		get_general_category(ch),
		GeneralCategory::DecimalNumber | GeneralCategory::LetterNumber | GeneralCategory::OtherNumber
	)
}

/// Whether `name` can be written as a bare identifier.
///
/// The keywords `null`, `true` and `false` are excluded since they would not
/// read back as a string key.
pub fn is_valid_identifier(name: &str) -> bool {
	if matches!(name, "null" | "true" | "false") {
		return false;
	}

	let mut chars = name.chars();
	let Some(first) = chars.next() else {
		return false;
	};

	(first == '_' || is_letter(first))
		&& chars.all(|ch| ch == '_' || ch == '-' || is_letter(ch) || is_number(ch))
}
