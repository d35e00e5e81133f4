use std::collections::BTreeMap;
use std::fmt;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::Attributes;
use crate::Block;
use crate::ErrorList;
use crate::HclError;
use crate::HclResult;
use crate::MergeResult;
use crate::Range;

/// Upper bound on the number of labels of a block identity.
pub const MAX_LABELS: usize = 8;

/// The identity of a logical block: its type plus its ordered labels.
///
/// Blocks with equal identities contributed by different files are merged
/// into one [`MergedBlock`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelBlockType {
	r#type: String,
	labels: Vec<String>,
}

impl LabelBlockType {
	pub fn new(r#type: impl Into<String>, labels: &[String]) -> HclResult<Self> {
		let r#type = r#type.into();
		if labels.len() > MAX_LABELS {
			return Err(HclError::TooManyLabels {
				block_type: r#type,
				count: labels.len(),
				limit: MAX_LABELS,
			});
		}

		Ok(Self {
			r#type,
			labels: labels.to_vec(),
		})
	}

	/// An identity without labels.
	pub fn empty(r#type: impl Into<String>) -> Self {
		Self {
			r#type: r#type.into(),
			labels: Vec::new(),
		}
	}

	pub fn r#type(&self) -> &str {
		&self.r#type
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}
}

impl fmt::Display for LabelBlockType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.r#type)?;
		for label in &self.labels {
			write!(f, " {label:?}")?;
		}
		Ok(())
	}
}

/// How an incoming attribute relates to one already merged under the same
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
	/// Both come from the same directory. Neither may win.
	Conflict,
	/// The incoming attribute replaces the existing one.
	Override,
}

/// Directory precedence between two definitions of one attribute.
///
/// Files are merged ancestors first, so an incoming definition from another
/// directory is always at least as specific as the existing one and wins.
/// Two definitions from the same directory have no order between them.
/// Between sibling directories the later one in discovery order wins.
pub fn attribute_precedence(existing: &Range, incoming: &Range) -> Precedence {
	if existing.host_dir() == incoming.host_dir() {
		Precedence::Conflict
	} else {
		Precedence::Override
	}
}

/// A block assembled from every same-identity block of a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedBlock {
	pub r#type: String,
	pub labels: Vec<String>,
	pub attributes: Attributes,
	pub blocks: BTreeMap<LabelBlockType, MergedBlock>,
	/// Every block that was merged in successfully, in merge order.
	pub raw_origins: Vec<Block>,
	/// Child blocks as they were before merging, grouped by type.
	pub raw_blocks: BTreeMap<String, Vec<Block>>,
}

impl MergedBlock {
	pub fn new(r#type: impl Into<String>, labels: &[String]) -> Self {
		Self {
			r#type: r#type.into(),
			labels: labels.to_vec(),
			attributes: Attributes::new(),
			blocks: BTreeMap::new(),
			raw_origins: Vec::new(),
			raw_blocks: BTreeMap::new(),
		}
	}

	pub fn label_block_type(&self) -> HclResult<LabelBlockType> {
		LabelBlockType::new(self.r#type.as_str(), &self.labels)
	}

	/// Merge `other` into this block.
	///
	/// Label problems are reported on their own since the rest of the block
	/// cannot be matched against this one. Otherwise every attribute and
	/// child block problem is collected. `other` is recorded as an origin
	/// only when nothing failed.
	pub fn merge_block(&mut self, other: &Block, is_labelled: bool) -> MergeResult {
		if !is_labelled && !other.labels.is_empty() {
			tracing::debug!(block_type = %other.r#type, file = %other.range.path(), "labels not allowed");
			return Err(HclError::LabelsNotAllowed {
				block_type: other.r#type.clone(),
				range: labels_range(other),
			}
			.into());
		}

		if self.labels != other.labels {
			return Err(HclError::LabelMismatch {
				block_type: other.r#type.clone(),
				expected: self.labels.join("."),
				got: other.labels.join("."),
				range: labels_range(other),
			}
			.into());
		}

		let mut errors = ErrorList::new();
		errors.append(self.merge_attributes(&other.attributes));
		errors.append(self.merge_blocks(&other.blocks));

		if errors.is_empty() {
			self.raw_origins.push(other.clone());
		} else {
			tracing::debug!(
				block_type = %other.r#type,
				file = %other.range.path(),
				errors = errors.len(),
				"contributor rejected"
			);
		}

		errors.into_result()
	}

	fn merge_attributes(&mut self, other: &Attributes) -> MergeResult {
		merge_attributes(&mut self.attributes, other)
	}

	fn merge_blocks(&mut self, others: &[Block]) -> MergeResult {
		let mut errors = ErrorList::new();

		for other in others {
			let key = match LabelBlockType::new(other.r#type.as_str(), &other.labels) {
				Ok(key) => key,
				Err(error) => {
					errors.push(error);
					continue;
				}
			};

			let result = if let Some(existing) = self.blocks.get_mut(&key) {
				existing.merge_block(other, true)
			} else {
				let mut merged = MergedBlock::new(other.r#type.as_str(), &other.labels);
				let result = merged.merge_block(other, true);
				if result.is_ok() {
					tracing::trace!(block = %key, "child block created");
					self.blocks.insert(key, merged);
				}
				result
			};

			if result.is_ok() {
				self.raw_blocks
					.entry(other.r#type.clone())
					.or_default()
					.push(other.clone());
			}

			errors.append(result);
		}

		errors.into_result()
	}

	/// Report every child block whose type is not in `allowed`.
	pub fn validate_sub_blocks(&self, allowed: &[&str]) -> MergeResult {
		let mut errors = ErrorList::new();

		for (block_type, blocks) in &self.raw_blocks {
			if allowed.contains(&block_type.as_str()) {
				continue;
			}

			for block in blocks {
				errors.push(HclError::UnrecognizedBlock {
					block_type: block.r#type.clone(),
					range: block.def_range(),
				});
			}
		}

		tracing::trace!(block_type = %self.r#type, errors = errors.len(), "validated sub blocks");
		errors.into_result()
	}
}

/// Merge `other` into `attributes` following [`attribute_precedence`],
/// visiting attributes in name order.
pub(crate) fn merge_attributes(attributes: &mut Attributes, other: &Attributes) -> MergeResult {
	let mut errors = ErrorList::new();

	for (name, attr) in other {
		if let Some(existing) = attributes.get(name) {
			match attribute_precedence(&existing.range, &attr.range) {
				Precedence::Conflict => {
					tracing::debug!(
						attribute = %name,
						file = %attr.range.path(),
						first_file = %existing.range.path(),
						"attribute conflict"
					);
					errors.push(HclError::AttributeRedeclared {
						name: name.clone(),
						file: attr.range.path().to_string(),
						first_file: existing.range.path().to_string(),
						range: attr.name_range.clone(),
					});
					continue;
				}
				Precedence::Override => {
					tracing::debug!(
						attribute = %name,
						file = %attr.range.path(),
						previous = %existing.range.path(),
						"attribute overridden"
					);
				}
			}
		}

		attributes.insert(name.clone(), attr.clone());
	}

	errors.into_result()
}

fn labels_range(block: &Block) -> Range {
	match (block.label_ranges.first(), block.label_ranges.last()) {
		(Some(first), Some(last)) => first.to(last),
		_ => block.def_range(),
	}
}

/// Merged blocks keyed by identity. Iteration is ordered by type and then by
/// labels.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
pub struct MergedBlocks(
	#[deref]
	#[deref_mut]
	BTreeMap<LabelBlockType, MergedBlock>,
);

impl MergedBlocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merge `block` into the merged block with the same identity, creating
	/// it on first sight.
	///
	/// When `is_labelled` is false the identity is the type alone and any
	/// label on `block` is an error.
	pub fn merge(&mut self, block: &Block, is_labelled: bool) -> MergeResult {
		let key = if is_labelled {
			LabelBlockType::new(block.r#type.as_str(), &block.labels)?
		} else {
			LabelBlockType::empty(block.r#type.as_str())
		};

		if let Some(existing) = self.0.get_mut(&key) {
			return existing.merge_block(block, is_labelled);
		}

		let mut merged = MergedBlock::new(key.r#type(), key.labels());
		merged.merge_block(block, is_labelled)?;
		tracing::debug!(block = %key, file = %block.range.path(), "merged block created");
		self.0.insert(key, merged);
		Ok(())
	}

	/// Every contributing raw block, grouped by identity.
	pub fn as_blocks(&self) -> Vec<&Block> {
		self.0
			.values()
			.flat_map(|merged| merged.raw_origins.iter())
			.collect()
	}

	/// Merged blocks ordered by type and labels.
	pub fn sorted(&self) -> Vec<&MergedBlock> {
		self.0.values().collect()
	}

	/// Merged blocks of one type, ordered by labels.
	pub fn of_type<'a>(&'a self, r#type: &'a str) -> impl Iterator<Item = &'a MergedBlock> + 'a {
		self.0
			.iter()
			.filter(move |(key, _)| key.r#type() == r#type)
			.map(|(_, merged)| merged)
	}
}
