use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::Range;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum HclError {
	#[error(transparent)]
	#[diagnostic(code(hclmerge::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(hclmerge::config_parse),
		help("check that hclmerge.toml is valid TOML with [files], [schema] and/or [render] sections")
	)]
	ConfigParse(String),

	#[error("{file}:{line},{column}: {message}")]
	#[diagnostic(code(hclmerge::syntax))]
	Syntax {
		file: String,
		line: usize,
		column: usize,
		message: String,
	},

	#[error("{file}:{line},{column}: attribute `{name}` redefined in the same body")]
	#[diagnostic(code(hclmerge::duplicate_attribute))]
	DuplicateAttribute {
		name: String,
		file: String,
		line: usize,
		column: usize,
	},

	#[error("{range}: labels on block of type `{block_type}` are not allowed")]
	#[diagnostic(
		code(hclmerge::labels_not_allowed),
		help("remove the labels or add `{block_type}` to [schema].labelled")
	)]
	LabelsNotAllowed { block_type: String, range: Range },

	#[error(
		"{range}: cannot merge blocks of type `{block_type}` with different set of labels ({expected} != {got})"
	)]
	#[diagnostic(
		code(hclmerge::label_mismatch),
		help("every file contributing to the same block must declare identical labels in the same order")
	)]
	LabelMismatch {
		block_type: String,
		expected: String,
		got: String,
		range: Range,
	},

	#[error("block `{block_type}` declares {count} labels (limit: {limit})")]
	#[diagnostic(code(hclmerge::too_many_labels))]
	TooManyLabels {
		block_type: String,
		count: usize,
		limit: usize,
	},

	#[error("{range}: attribute `{name}` redeclared in file `{file}` (first defined in `{first_file}`)")]
	#[diagnostic(
		code(hclmerge::attribute_redeclared),
		help("files in the same directory cannot redefine an attribute; move one definition into a child directory to override it")
	)]
	AttributeRedeclared {
		name: String,
		file: String,
		first_file: String,
		range: Range,
	},

	#[error("{range}: unrecognized block `{block_type}`")]
	#[diagnostic(code(hclmerge::unrecognized_block))]
	UnrecognizedBlock { block_type: String, range: Range },

	#[error("file `{path}` is outside of the project root `{root}`")]
	#[diagnostic(code(hclmerge::path_outside_root))]
	PathOutsideRoot { path: String, root: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(hclmerge::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("internal error: cannot render expression: {0}")]
	#[diagnostic(
		code(hclmerge::unsupported_expression),
		help("the token builder is out of sync with the parser; please report this")
	)]
	UnsupportedExpression(String),

	#[error("internal error: malformed traversal: {0}")]
	#[diagnostic(code(hclmerge::malformed_traversal))]
	MalformedTraversal(String),

	#[error("expression nesting exceeds the maximum depth of {max}")]
	#[diagnostic(
		code(hclmerge::nesting_too_deep),
		help("raise [render].max_depth in hclmerge.toml if this is intended")
	)]
	NestingTooDeep { max: usize },

	#[error("evaluation failed: {0}")]
	#[diagnostic(code(hclmerge::evaluation))]
	Evaluation(String),
}

/// A list of errors collected across a merge or load pass.
///
/// Merging keeps going after a failure so a single pass can report every
/// problem in every contributing file.
#[derive(Debug, Default, Diagnostic)]
#[diagnostic(code(hclmerge::errors))]
pub struct ErrorList {
	#[related]
	pub errors: Vec<HclError>,
}

impl ErrorList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, error: HclError) {
		self.errors.push(error);
	}

	/// Append the failure (if any) of an operation that returns either a
	/// single error or a list of them.
	pub fn append<E: Into<ErrorList>>(&mut self, result: Result<(), E>) {
		if let Err(error) = result {
			self.errors.extend(error.into().errors);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, HclError> {
		self.errors.iter()
	}

	/// `Ok(())` when nothing was collected.
	pub fn into_result(self) -> Result<(), ErrorList> {
		if self.errors.is_empty() {
			Ok(())
		} else {
			Err(self)
		}
	}
}

impl fmt::Display for ErrorList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.errors.as_slice() {
			[] => write!(f, "no errors"),
			[single] => write!(f, "{single}"),
			many => {
				write!(f, "{} errors found", many.len())?;
				for error in many {
					write!(f, "\n  - {error}")?;
				}
				Ok(())
			}
		}
	}
}

impl std::error::Error for ErrorList {}

impl From<HclError> for ErrorList {
	fn from(error: HclError) -> Self {
		Self {
			errors: vec![error],
		}
	}
}

impl IntoIterator for ErrorList {
	type IntoIter = std::vec::IntoIter<HclError>;
	type Item = HclError;

	fn into_iter(self) -> Self::IntoIter {
		self.errors.into_iter()
	}
}

pub type HclResult<T> = Result<T, HclError>;
pub type MergeResult = Result<(), ErrorList>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
