//! Parsed configuration nodes.
//!
//! The `Raw*` types are what the parser produces, with ranges exactly as the
//! parser saw them. [`Attribute`] and [`Block`] wrap them with ranges anchored
//! to a project root, which is what merging and diagnostics work with.

use std::collections::BTreeMap;
use std::path::Path;

use crate::Expression;
use crate::HclResult;
use crate::Range;
use crate::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
	pub name: String,
	pub expr: Expression,
	pub name_range: SourceRange,
	pub range: SourceRange,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBody {
	pub attributes: BTreeMap<String, RawAttribute>,
	pub blocks: Vec<RawBlock>,
	pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
	pub r#type: String,
	pub labels: Vec<String>,
	pub body: RawBody,
	pub type_range: SourceRange,
	pub label_ranges: Vec<SourceRange>,
	pub open_brace_range: SourceRange,
	pub close_brace_range: SourceRange,
}

impl RawBlock {
	/// The whole block, from its type name to the closing brace.
	pub fn range(&self) -> SourceRange {
		self.type_range.to(&self.close_brace_range)
	}
}

/// An attribute plus its project anchored ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	pub name: String,
	pub expr: Expression,
	pub name_range: Range,
	pub range: Range,
}

impl Attribute {
	pub fn new(rootdir: &Path, raw: &RawAttribute) -> HclResult<Self> {
		Ok(Self {
			name: raw.name.clone(),
			expr: raw.expr.clone(),
			name_range: Range::new(rootdir, &raw.name_range)?,
			range: Range::new(rootdir, &raw.range)?,
		})
	}
}

/// Attributes keyed, and therefore sorted, by name.
pub type Attributes = BTreeMap<String, Attribute>;

/// One occurrence of a block in one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
	pub r#type: String,
	pub labels: Vec<String>,
	pub attributes: Attributes,
	pub blocks: Vec<Block>,
	pub type_range: Range,
	pub label_ranges: Vec<Range>,
	pub open_brace_range: Range,
	pub range: Range,
}

impl Block {
	pub fn new(rootdir: &Path, raw: &RawBlock) -> HclResult<Self> {
		let attributes = raw
			.body
			.attributes
			.values()
			.map(|attr| Ok((attr.name.clone(), Attribute::new(rootdir, attr)?)))
			.collect::<HclResult<Attributes>>()?;
		let blocks = raw
			.body
			.blocks
			.iter()
			.map(|block| Block::new(rootdir, block))
			.collect::<HclResult<Vec<_>>>()?;
		let label_ranges = raw
			.label_ranges
			.iter()
			.map(|range| Range::new(rootdir, range))
			.collect::<HclResult<Vec<_>>>()?;

		Ok(Self {
			r#type: raw.r#type.clone(),
			labels: raw.labels.clone(),
			attributes,
			blocks,
			type_range: Range::new(rootdir, &raw.type_range)?,
			label_ranges,
			open_brace_range: Range::new(rootdir, &raw.open_brace_range)?,
			range: Range::new(rootdir, &raw.range())?,
		})
	}

	/// The block header: type name, labels and the opening brace.
	pub fn def_range(&self) -> Range {
		self.type_range.to(&self.open_brace_range)
	}
}
