use std::collections::BTreeMap;
use std::path::Path;

use crate::Attribute;
use crate::Attributes;
use crate::Block;
use crate::ErrorList;
use crate::HclError;
use crate::MergeResult;
use crate::MergedBlocks;
use crate::RawBody;
use crate::SchemaConfig;
use crate::merged_block::merge_attributes;

/// What to do with a top-level block of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeHandler {
	/// Merge with every other block of the same identity.
	Merge { labelled: bool },
	/// Keep each occurrence as is.
	Append,
	/// Accept and drop.
	Ignore,
}

/// Maps top-level block types to their [`MergeHandler`]. Types without an
/// entry are unrecognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSchema {
	handlers: BTreeMap<String, MergeHandler>,
}

impl BlockSchema {
	/// A schema that recognizes nothing.
	pub fn empty() -> Self {
		Self {
			handlers: BTreeMap::new(),
		}
	}

	#[must_use]
	pub fn with(mut self, block_type: impl Into<String>, handler: MergeHandler) -> Self {
		self.handlers.insert(block_type.into(), handler);
		self
	}

	pub fn handler(&self, block_type: &str) -> Option<MergeHandler> {
		self.handlers.get(block_type).copied()
	}
}

impl Default for BlockSchema {
	fn default() -> Self {
		Self::from(&SchemaConfig::default())
	}
}

impl From<&SchemaConfig> for BlockSchema {
	fn from(config: &SchemaConfig) -> Self {
		let mut schema = Self::empty();
		for block_type in &config.merged {
			let labelled = config.labelled.contains(block_type);
			schema = schema.with(block_type.as_str(), MergeHandler::Merge { labelled });
		}
		for block_type in &config.unmerged {
			schema = schema.with(block_type.as_str(), MergeHandler::Append);
		}
		for block_type in &config.ignored {
			schema = schema.with(block_type.as_str(), MergeHandler::Ignore);
		}
		schema
	}
}

/// Top-level configuration gathered from many files, before any schema
/// checks on block contents.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig {
	/// Top-level attributes of every file.
	pub merged_attributes: Attributes,
	/// Blocks merged by identity.
	pub merged_blocks: MergedBlocks,
	/// Blocks kept as they were declared, in merge order.
	pub unmerged_blocks: Vec<Block>,
	schema: BlockSchema,
}

impl RawConfig {
	pub fn new(schema: BlockSchema) -> Self {
		Self {
			merged_attributes: Attributes::new(),
			merged_blocks: MergedBlocks::new(),
			unmerged_blocks: Vec::new(),
			schema,
		}
	}

	pub fn schema(&self) -> &BlockSchema {
		&self.schema
	}

	/// Merge the top level of one parsed file.
	pub fn merge_body(&mut self, rootdir: &Path, body: &RawBody) -> MergeResult {
		let mut errors = ErrorList::new();

		let mut attributes = Attributes::new();
		for raw in body.attributes.values() {
			match Attribute::new(rootdir, raw) {
				Ok(attr) => {
					attributes.insert(attr.name.clone(), attr);
				}
				Err(error) => errors.push(error),
			}
		}
		errors.append(self.merge_attributes(&attributes));

		let mut blocks = Vec::with_capacity(body.blocks.len());
		for raw in &body.blocks {
			match Block::new(rootdir, raw) {
				Ok(block) => blocks.push(block),
				Err(error) => errors.push(error),
			}
		}
		errors.append(self.merge_blocks(&blocks));

		errors.into_result()
	}

	pub fn merge_attributes(&mut self, other: &Attributes) -> MergeResult {
		merge_attributes(&mut self.merged_attributes, other)
	}

	/// Route every block through the schema.
	pub fn merge_blocks<'a>(&mut self, blocks: impl IntoIterator<Item = &'a Block>) -> MergeResult {
		let mut errors = ErrorList::new();

		for block in blocks {
			match self.schema.handler(&block.r#type) {
				Some(MergeHandler::Merge { labelled }) => {
					errors.append(self.merged_blocks.merge(block, labelled));
				}
				Some(MergeHandler::Append) => self.unmerged_blocks.push(block.clone()),
				Some(MergeHandler::Ignore) => {}
				None => {
					errors.push(HclError::UnrecognizedBlock {
						block_type: block.r#type.clone(),
						range: block.def_range(),
					});
				}
			}
		}

		errors.into_result()
	}

	/// Fold `other` into this config, re-merging its raw origins.
	pub fn merge(&mut self, other: &RawConfig) -> MergeResult {
		let mut errors = ErrorList::new();
		errors.append(self.merge_attributes(&other.merged_attributes));
		errors.append(self.merge_blocks(other.merged_blocks.as_blocks()));
		errors.append(self.merge_blocks(&other.unmerged_blocks));
		errors.into_result()
	}

	/// Unmerged blocks of one type, in merge order.
	pub fn unmerged_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
		self.unmerged_blocks
			.iter()
			.filter(move |block| block.r#type == block_type)
	}
}

impl Default for RawConfig {
	fn default() -> Self {
		Self::new(BlockSchema::default())
	}
}
