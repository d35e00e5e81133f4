use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::HclError;
use crate::HclResult;

/// A location inside a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
	line: usize,
	column: usize,
	byte: usize,
}

impl Position {
	pub const fn new(line: usize, column: usize, byte: usize) -> Self {
		Self { line, column, byte }
	}

	/// 1-based line number.
	pub const fn line(&self) -> usize {
		self.line
	}

	/// 1-based column, counted in characters.
	pub const fn column(&self) -> usize {
		self.column
	}

	/// 0-based byte offset.
	pub const fn byte(&self) -> usize {
		self.byte
	}
}

/// A range as produced by the parser: the file name exactly as it was given
/// plus the start and end positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SourceRange {
	pub filename: PathBuf,
	pub start: Position,
	pub end: Position,
}

impl SourceRange {
	pub fn new(filename: impl Into<PathBuf>, start: Position, end: Position) -> Self {
		Self {
			filename: filename.into(),
			start,
			end,
		}
	}

	/// The smallest range covering both `self` and `other`.
	pub fn to(&self, other: &SourceRange) -> SourceRange {
		SourceRange {
			filename: self.filename.clone(),
			start: self.start.min(other.start),
			end: self.end.max(other.end),
		}
	}
}

impl fmt::Display for SourceRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{},{}-{},{}",
			self.filename.display(),
			self.start.line,
			self.start.column,
			self.end.line,
			self.end.column
		)
	}
}

/// A source range anchored to a project.
///
/// Carries both the absolute path on the host and the project path, which
/// always starts with `/` and uses `/` separators regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
	host_path: PathBuf,
	path: String,
	start: Position,
	end: Position,
}

impl Range {
	/// Anchor `source` to the project at `rootdir`.
	///
	/// The file name of `source` must be absolute and live under `rootdir`.
	pub fn new(rootdir: &Path, source: &SourceRange) -> HclResult<Self> {
		let host_path = source.filename.clone();
		let outside = || HclError::PathOutsideRoot {
			path: host_path.display().to_string(),
			root: rootdir.display().to_string(),
		};

		if !host_path.is_absolute() {
			return Err(outside());
		}

		let relative = host_path.strip_prefix(rootdir).map_err(|_| outside())?;
		let mut path = String::new();
		for component in relative.components() {
			match component {
				Component::Normal(part) => {
					path.push('/');
					path.push_str(&part.to_string_lossy());
				}
				Component::CurDir => {}
				_ => return Err(outside()),
			}
		}

		if path.is_empty() {
			path.push('/');
		}

		Ok(Self {
			host_path,
			path,
			start: source.start,
			end: source.end,
		})
	}

	/// Absolute path of the file on the host.
	pub fn host_path(&self) -> &Path {
		&self.host_path
	}

	/// Project path of the file, e.g. `/stacks/a/config.tm`.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn start(&self) -> Position {
		self.start
	}

	pub fn end(&self) -> Position {
		self.end
	}

	/// Directory holding the file on the host.
	pub fn host_dir(&self) -> &Path {
		self.host_path.parent().unwrap_or(Path::new("/"))
	}

	/// The range from the start of `self` to the end of `other`, both in the
	/// same file.
	#[must_use]
	pub fn to(&self, other: &Range) -> Range {
		Range {
			host_path: self.host_path.clone(),
			path: self.path.clone(),
			start: self.start.min(other.start),
			end: self.end.max(other.end),
		}
	}
}

impl fmt::Display for Range {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{},{}-{},{}",
			self.host_path.display(),
			self.start.line,
			self.start.column,
			self.end.line,
			self.end.column
		)
	}
}

/// Maps byte offsets of a source text to line and column positions.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex<'a> {
	source: &'a str,
	line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
	pub(crate) fn new(source: &'a str) -> Self {
		let mut line_starts = vec![0];
		line_starts.extend(
			source
				.bytes()
				.enumerate()
				.filter(|(_, byte)| *byte == b'\n')
				.map(|(index, _)| index + 1),
		);

		Self {
			source,
			line_starts,
		}
	}

	pub(crate) fn position(&self, byte: usize) -> Position {
		let byte = byte.min(self.source.len());
		let line = match self.line_starts.binary_search(&byte) {
			Ok(line) => line,
			Err(next) => next - 1,
		};
		let line_start = self.line_starts[line];
		let column = self
			.source
			.get(line_start..byte)
			.map_or(byte - line_start, |prefix| prefix.chars().count());

		Position::new(line + 1, column + 1, byte)
	}
}
