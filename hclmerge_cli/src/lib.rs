use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Merge layered configuration trees and print the result.",
	long_about = "hclmerge loads every configuration file (`*.tm`, `*.tm.hcl`) of a project, \
	              merges blocks with the same type and labels, and lets deeper directories \
	              override the attributes of their parents.\n\nQuick start:\n  hclmerge check    \
	              Report every merge problem in the project\n  hclmerge show     Print the \
	              merged configuration of a directory\n  hclmerge globals  Print the evaluated \
	              globals of a directory"
)]
pub struct HclMergeCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Check that every directory of the project merges cleanly.
	///
	/// Parses every configuration file and merges each directory, reporting
	/// syntax errors, redeclared attributes, label problems and unrecognized
	/// blocks all at once. Exits with status 1 when any problem is found.
	Check,
	/// Print the merged configuration seen from one directory.
	///
	/// Files from the project root down to `--dir` are merged ancestors
	/// first, so deeper directories override their parents.
	Show {
		/// Directory to show, relative to the project root.
		#[arg(long, default_value = "/")]
		dir: PathBuf,

		/// Output format. Use `text` for formatted configuration or `json`
		/// for a summary of every merged block and where it came from.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Evaluate the merged `globals` of one directory.
	///
	/// Globals may reference each other through `global.<name>`. Values
	/// that cannot be determined statically print as `null`.
	Globals {
		/// Directory to evaluate, relative to the project root.
		#[arg(long, default_value = "/")]
		dir: PathBuf,
	},
	/// Parse an expression and print it re-serialized.
	FmtExpr {
		/// The expression source, for example `[1, 2, 3]`.
		expression: String,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Formatted configuration.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
