//! `hclmerge_core` merges layered configuration trees and turns the merged
//! result back into source.
//!
//! ## Processing Pipeline
//!
//! ```text
//! configuration files (*.tm, *.tm.hcl)
//!   -> Lexer (logos tokens, template and heredoc contexts)
//!   -> Parser (RawBody with attributes, blocks and source ranges)
//!   -> Project (directory walk, ancestors first)
//!   -> RawConfig (top-level routing: merge, append, ignore)
//!   -> MergedBlocks (block identity, directory precedence, provenance)
//!   -> Token builders (Expression / Value -> Tokens -> formatted source)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `hclmerge.toml` loading: file discovery, block schema and render limits.
//! - [`project`]: directory walking and per-directory merging.
//! - [`render`]: merged blocks and evaluated objects back to source.
//!
//! ## Key Types
//!
//! - [`Range`]: a source range anchored to the project root.
//! - [`MergedBlock`]: one logical block assembled from many files.
//! - [`RawConfig`]: merged top-level attributes and blocks.
//! - [`Tokens`]: re-serialized source, printable with [`Tokens::format`].
//! - [`ErrorList`]: every problem found by a merge or check.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use hclmerge_core::Project;
//! use hclmerge_core::render::tokens_for_merged_block;
//!
//! let project = Project::load(Path::new(".")).unwrap();
//! let config = project.load_dir(Path::new("/stacks/app")).unwrap();
//!
//! for block in config.merged_blocks.sorted() {
//! 	print!("{}", tokens_for_merged_block(block).unwrap().format());
//! }
//! ```

pub use ast::*;
pub use config::*;
pub use error::*;
pub use eval::*;
pub use expr::*;
pub use merged_block::*;
pub use parser::*;
pub use position::*;
pub use project::*;
pub use raw_config::*;
pub use token_builder::*;
pub use tokens::*;
pub use value::*;
pub use value_tokens::*;

mod ast;
pub mod config;
#[allow(unused_assignments)]
mod error;
mod eval;
mod expr;
pub(crate) mod lexer;
mod merged_block;
mod parser;
mod position;
pub mod project;
mod raw_config;
pub mod render;
mod token_builder;
mod tokens;
mod value;
mod value_tokens;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
