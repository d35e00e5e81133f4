use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DEFAULT_MAX_DEPTH;
use crate::HclError;
use crate::HclResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"hclmerge.toml",
	".hclmerge.toml",
	".config/hclmerge.toml",
];

/// Configuration loaded from an `hclmerge.toml` file.
///
/// ```toml
/// [files]
/// extensions = ["tm", "tm.hcl"]
/// exclude = ["vendor/"]
/// disable_gitignore = false
///
/// [schema]
/// merged = ["terramate", "globals"]
/// labelled = ["globals"]
/// unmerged = ["stack", "generate_file", "generate_hcl"]
/// ignored = ["import"]
///
/// [render]
/// max_depth = 256
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HclMergeConfig {
	#[serde(default)]
	pub files: FilesConfig,
	#[serde(default)]
	pub schema: SchemaConfig,
	#[serde(default)]
	pub render: RenderConfig,
}

/// Which files make up the configuration tree.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
	/// File name suffixes, without the leading dot, of configuration files.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
	/// Gitignore-style patterns for files and directories to skip. Relative
	/// to the project root.
	///
	/// Examples: `"vendor/"`, `"*.generated.tm"`, `"!keep.tm"`.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// When true, `.gitignore` files are not used for filtering.
	#[serde(default)]
	pub disable_gitignore: bool,
}

impl Default for FilesConfig {
	fn default() -> Self {
		Self {
			extensions: default_extensions(),
			exclude: Vec::new(),
			disable_gitignore: false,
		}
	}
}

impl FilesConfig {
	/// Whether `path` has one of the configured extensions.
	pub fn matches(&self, path: &Path) -> bool {
		let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
			return false;
		};

		self.extensions.iter().any(|extension| {
			name.strip_suffix(extension.as_str())
				.and_then(|stem| stem.strip_suffix('.'))
				.is_some_and(|stem| !stem.is_empty())
		})
	}
}

/// How top-level blocks are combined across files.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
	/// Block types merged across files by identity.
	#[serde(default = "default_merged")]
	pub merged: Vec<String>,
	/// Merged block types that may carry labels.
	#[serde(default = "default_labelled")]
	pub labelled: Vec<String>,
	/// Block types kept as separate declarations.
	#[serde(default = "default_unmerged")]
	pub unmerged: Vec<String>,
	/// Block types accepted and dropped.
	#[serde(default = "default_ignored")]
	pub ignored: Vec<String>,
}

impl Default for SchemaConfig {
	fn default() -> Self {
		Self {
			merged: default_merged(),
			labelled: default_labelled(),
			unmerged: default_unmerged(),
			ignored: default_ignored(),
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
	/// Maximum expression nesting accepted by the parser and token builders.
	#[serde(default = "default_max_depth")]
	pub max_depth: usize,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			max_depth: default_max_depth(),
		}
	}
}

fn default_extensions() -> Vec<String> {
	vec!["tm".into(), "tm.hcl".into()]
}

fn default_merged() -> Vec<String> {
	vec!["terramate".into(), "globals".into()]
}

fn default_labelled() -> Vec<String> {
	vec!["globals".into()]
}

fn default_unmerged() -> Vec<String> {
	vec!["stack".into(), "generate_file".into(), "generate_hcl".into()]
}

fn default_ignored() -> Vec<String> {
	vec!["import".into()]
}

fn default_max_depth() -> usize {
	DEFAULT_MAX_DEPTH
}

impl HclMergeConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> HclResult<Option<HclMergeConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> HclResult<HclMergeConfig> {
		toml::from_str(content).map_err(|e| HclError::ConfigParse(e.to_string()))
	}
}
