use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use hclmerge_cli::Commands;
use hclmerge_cli::HclMergeCli;
use hclmerge_cli::OutputFormat;
use hclmerge_core::Block;
use hclmerge_core::ErrorList;
use hclmerge_core::HclError;
use hclmerge_core::MergedBlock;
use hclmerge_core::Project;
use hclmerge_core::RawConfig;
use hclmerge_core::Value;
use hclmerge_core::evaluate_attributes;
use hclmerge_core::parse_expression;
use hclmerge_core::render::tokens_for_attributes;
use hclmerge_core::render::tokens_for_block;
use hclmerge_core::render::tokens_for_merged_block;
use hclmerge_core::render::tokens_for_object_attrs;
use hclmerge_core::tokens_for_expression;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `hclmerge_core=trace`.
const LOG_ENV: &str = "HCLMERGE_LOG";

/// Failures sorted by exit code.
enum Failure {
	/// Problems found in the configuration itself.
	Reported(miette::Report),
	/// Usage or I/O problems that stopped the command.
	Fatal(miette::Report),
}

impl Failure {
	fn exit_code(&self) -> i32 {
		match self {
			Self::Reported(_) => 1,
			Self::Fatal(_) => 2,
		}
	}

	fn report(&self) -> &miette::Report {
		match self {
			Self::Reported(report) | Self::Fatal(report) => report,
		}
	}
}

impl From<ErrorList> for Failure {
	fn from(errors: ErrorList) -> Self {
		Self::Reported(errors.into())
	}
}

impl From<HclError> for Failure {
	fn from(error: HclError) -> Self {
		match error {
			HclError::Io(_) | HclError::ConfigParse(_) | HclError::SymlinkCycle { .. } => {
				Self::Fatal(error.into())
			}
			other => Self::Reported(other.into()),
		}
	}
}

type CliResult = Result<(), Failure>;

fn main() {
	let args = HclMergeCli::parse();

	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	init_logging(args.verbose, use_color);

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Check) => run_check(&args, use_color),
		Some(Commands::Show { dir, format }) => run_show(&args, dir, *format),
		Some(Commands::Globals { dir }) => run_globals(&args, dir),
		Some(Commands::FmtExpr { expression }) => run_fmt_expr(expression),
		None => {
			eprintln!("No subcommand specified. Run `hclmerge --help` for usage.");
			process::exit(2);
		}
	};

	if let Err(failure) = result {
		eprintln!("{:?}", failure.report());
		process::exit(failure.exit_code());
	}
}

fn init_logging(verbose: bool, use_color: bool) {
	let default = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_ansi(use_color)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn resolve_root(args: &HclMergeCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_project(args: &HclMergeCli) -> Result<Project, Failure> {
	let root = resolve_root(args);
	Ok(Project::load(&root)?)
}

fn run_check(args: &HclMergeCli, use_color: bool) -> CliResult {
	let project = load_project(args)?;
	let dirs = project.dirs();

	if args.verbose {
		for dir in &dirs {
			println!("  {dir}");
		}
	}

	project.check()?;

	let summary = format!("ok: {} director{} merged cleanly", dirs.len(), if dirs.len() == 1 { "y" } else { "ies" });
	if use_color {
		println!("{}", summary.green());
	} else {
		println!("{summary}");
	}

	Ok(())
}

fn run_show(args: &HclMergeCli, dir: &Path, format: OutputFormat) -> CliResult {
	let project = load_project(args)?;
	let config = project.load_dir(dir)?;

	match format {
		OutputFormat::Text => print!("{}", render_config(&config)?),
		OutputFormat::Json => {
			let summary = ConfigSummary::new(&config);
			let json = serde_json::to_string_pretty(&summary)
				.map_err(|e| Failure::Fatal(miette::miette!("failed to serialize output: {e}")))?;
			println!("{json}");
		}
	}

	Ok(())
}

fn render_config(config: &RawConfig) -> Result<String, HclError> {
	let mut sections = Vec::new();

	if !config.merged_attributes.is_empty() {
		sections.push(tokens_for_attributes(&config.merged_attributes)?.format());
	}
	for block in config.merged_blocks.sorted() {
		sections.push(tokens_for_merged_block(block)?.format());
	}
	for block in &config.unmerged_blocks {
		sections.push(tokens_for_block(block)?.format());
	}

	Ok(sections.join("\n"))
}

fn run_globals(args: &HclMergeCli, dir: &Path) -> CliResult {
	let project = load_project(args)?;
	let config = project.load_dir(dir)?;

	let Some(globals) = config
		.merged_blocks
		.of_type("globals")
		.find(|block| block.labels.is_empty())
	else {
		tracing::debug!(dir = %dir.display(), "no globals");
		return Ok(());
	};

	let values = evaluate_attributes(&globals.attributes, "global")?;
	print!("{}", tokens_for_object_attrs(&Value::Object(values))?.format());

	Ok(())
}

fn run_fmt_expr(source: &str) -> CliResult {
	let expr = parse_expression(source, "<expression>")?;
	println!("{}", tokens_for_expression(&expr)?.format());
	Ok(())
}

#[derive(Serialize)]
struct ConfigSummary {
	attributes: Vec<String>,
	blocks: Vec<BlockSummary>,
	unmerged: Vec<BlockSummary>,
}

impl ConfigSummary {
	fn new(config: &RawConfig) -> Self {
		Self {
			attributes: config.merged_attributes.keys().cloned().collect(),
			blocks: config
				.merged_blocks
				.sorted()
				.into_iter()
				.map(BlockSummary::merged)
				.collect(),
			unmerged: config
				.unmerged_blocks
				.iter()
				.map(BlockSummary::plain)
				.collect(),
		}
	}
}

#[derive(Serialize)]
struct BlockSummary {
	#[serde(rename = "type")]
	r#type: String,
	labels: Vec<String>,
	attributes: Vec<String>,
	origins: Vec<String>,
}

impl BlockSummary {
	fn merged(block: &MergedBlock) -> Self {
		Self {
			r#type: block.r#type.clone(),
			labels: block.labels.clone(),
			attributes: block.attributes.keys().cloned().collect(),
			origins: block
				.raw_origins
				.iter()
				.map(|origin| origin.type_range.path().to_string())
				.collect(),
		}
	}

	fn plain(block: &Block) -> Self {
		Self {
			r#type: block.r#type.clone(),
			labels: block.labels.clone(),
			attributes: block.attributes.keys().cloned().collect(),
			origins: vec![block.type_range.path().to_string()],
		}
	}
}
