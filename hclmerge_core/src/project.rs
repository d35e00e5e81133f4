use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::BlockSchema;
use crate::ErrorList;
use crate::FilesConfig;
use crate::HclError;
use crate::HclMergeConfig;
use crate::HclResult;
use crate::RawConfig;
use crate::parser::parse_file_with_depth;

/// A configuration file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
	/// Absolute path on the host.
	pub path: PathBuf,
	pub source: String,
}

/// A configuration tree rooted at one directory.
///
/// Files are grouped by the directory that holds them. Directories iterate
/// in discovery order: the root first, then subdirectories in lexicographic
/// order with every parent before its children.
#[derive(Debug, Clone)]
pub struct Project {
	root: PathBuf,
	config: HclMergeConfig,
	schema: BlockSchema,
	dirs: BTreeMap<PathBuf, Vec<ConfigFile>>,
}

impl Project {
	/// Discover and read every configuration file under `root`, using the
	/// `hclmerge.toml` found there or the defaults.
	pub fn load(root: &Path) -> HclResult<Self> {
		let config = HclMergeConfig::load(root)?.unwrap_or_default();
		Self::load_with_config(root, config)
	}

	pub fn load_with_config(root: &Path, config: HclMergeConfig) -> HclResult<Self> {
		let root = root.canonicalize()?;
		let files = collect_files(&root, &config.files)?;
		let mut dirs: BTreeMap<PathBuf, Vec<ConfigFile>> = BTreeMap::new();

		for path in files {
			let source = std::fs::read_to_string(&path)?;
			let dir = path.parent().unwrap_or(&root).to_path_buf();
			dirs.entry(dir).or_default().push(ConfigFile { path, source });
		}

		for files in dirs.values_mut() {
			files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
		}

		tracing::debug!(
			root = %root.display(),
			dirs = dirs.len(),
			files = dirs.values().map(Vec::len).sum::<usize>(),
			"project discovered"
		);

		Ok(Self {
			schema: BlockSchema::from(&config.schema),
			root,
			config,
			dirs,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn config(&self) -> &HclMergeConfig {
		&self.config
	}

	/// Directories holding at least one configuration file, as project
	/// paths, in discovery order.
	pub fn dirs(&self) -> Vec<String> {
		self.dirs.keys().map(|dir| self.project_path(dir)).collect()
	}

	/// Files of one directory, sorted by name.
	pub fn files_in(&self, dir: &Path) -> HclResult<&[ConfigFile]> {
		let dir = self.host_dir(dir)?;
		Ok(self.dirs.get(&dir).map_or(&[], Vec::as_slice))
	}

	/// The configuration seen from `dir`: every file from the project root
	/// down to `dir`, ancestors first, so deeper directories override their
	/// parents.
	///
	/// `dir` is a project path (`/a/b`) or a path relative to the root.
	pub fn load_dir(&self, dir: &Path) -> Result<RawConfig, ErrorList> {
		let target = self.host_dir(dir)?;
		let scope = self
			.dirs
			.iter()
			.filter(|(candidate, _)| target.starts_with(candidate));

		self.merge_dirs(scope)
	}

	/// Every directory merged in discovery order. Later siblings override
	/// earlier ones.
	pub fn load_all(&self) -> Result<RawConfig, ErrorList> {
		self.merge_dirs(self.dirs.iter())
	}

	/// Parse and merge every directory on its own, reporting every problem
	/// found in the project.
	///
	/// Attributes only conflict within one directory and label or schema
	/// problems belong to a single block, so each problem is reported once.
	pub fn check(&self) -> Result<(), ErrorList> {
		let mut errors = ErrorList::new();

		for (dir, files) in &self.dirs {
			let result = self.merge_dirs(std::iter::once((dir, files))).map(|_| ());
			if let Err(dir_errors) = &result {
				tracing::debug!(dir = %self.project_path(dir), errors = dir_errors.len(), "directory has errors");
			}
			errors.append(result);
		}

		errors.into_result()
	}

	fn merge_dirs<'a>(
		&self,
		dirs: impl Iterator<Item = (&'a PathBuf, &'a Vec<ConfigFile>)>,
	) -> Result<RawConfig, ErrorList> {
		let mut config = RawConfig::new(self.schema.clone());
		let mut errors = ErrorList::new();

		for (dir, files) in dirs {
			tracing::trace!(dir = %self.project_path(dir), files = files.len(), "loading directory");
			for file in files {
				let body = match parse_file_with_depth(&file.source, &file.path, self.config.render.max_depth) {
					Ok(body) => body,
					Err(error) => {
						errors.push(error);
						continue;
					}
				};
				errors.append(config.merge_body(&self.root, &body));
			}
		}

		errors.into_result()?;
		Ok(config)
	}

	fn host_dir(&self, dir: &Path) -> HclResult<PathBuf> {
		let mut host = self.root.clone();
		for component in dir.components() {
			match component {
				Component::Normal(part) => host.push(part),
				Component::RootDir | Component::CurDir => {}
				_ => {
					return Err(HclError::PathOutsideRoot {
						path: dir.display().to_string(),
						root: self.root.display().to_string(),
					});
				}
			}
		}
		Ok(host)
	}

	fn project_path(&self, dir: &Path) -> String {
		let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
		let mut path = String::new();
		for component in relative.components() {
			if let Component::Normal(part) = component {
				path.push('/');
				path.push_str(&part.to_string_lossy());
			}
		}
		if path.is_empty() {
			path.push('/');
		}
		path
	}
}

/// Gitignore-style `[files].exclude` patterns, relative to the root.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> HclResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder
			.add_line(None, pattern)
			.map_err(|e| HclError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}")))?;
	}
	builder
		.build()
		.map_err(|e| HclError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Every configuration file under `root`, sorted by path.
fn collect_files(root: &Path, files_config: &FilesConfig) -> HclResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if files_config.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let exclude = build_exclude_matcher(root, &files_config.exclude)?;

	let walker = Walker {
		files_config,
		gitignore: &gitignore,
		exclude: &exclude,
	};
	walker.walk_dir(root, &mut files, &mut visited_dirs)?;
	files.sort();

	Ok(files)
}

struct Walker<'a> {
	files_config: &'a FilesConfig,
	gitignore: &'a Gitignore,
	exclude: &'a Gitignore,
}

impl Walker<'_> {
	fn walk_dir(&self, dir: &Path, files: &mut Vec<PathBuf>, visited_dirs: &mut HashSet<PathBuf>) -> HclResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Symlinked directories are followed once.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(HclError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with('.'))
			{
				continue;
			}

			let is_dir = path.is_dir();
			if self.gitignore.matched(&path, is_dir).is_ignore() || self.exclude.matched(&path, is_dir).is_ignore() {
				tracing::trace!(path = %path.display(), "excluded");
				continue;
			}

			if is_dir {
				self.walk_dir(&path, files, visited_dirs)?;
			} else if self.files_config.matches(&path) {
				files.push(path);
			}
		}

		Ok(())
	}
}
