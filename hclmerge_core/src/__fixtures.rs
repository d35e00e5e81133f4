use std::path::Path;

use tempfile::TempDir;

use crate::Block;
use crate::EvalContext;
use crate::Expression;
use crate::HclResult;
use crate::Value;
use crate::evaluate;
use crate::parse_expression;
use crate::parse_file;
use crate::tokens_for_expression;

/// Host directory used for in-memory sources.
pub const ROOT: &str = "/project";

/// Write `files` (project relative path, content) into a fresh directory.
pub fn project_tree(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (path, content) in files {
		let path = tmp.path().join(path);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
		}
		std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	}
	tmp
}

pub fn expr(source: &str) -> Expression {
	parse_expression(source, "test.tm").unwrap_or_else(|e| panic!("parse `{source}`: {e}"))
}

/// Top-level blocks of `source` as if read from `file` under [`ROOT`].
pub fn blocks(file: &str, source: &str) -> Vec<Block> {
	let path = Path::new(ROOT).join(file.trim_start_matches('/'));
	let body = parse_file(source, &path).unwrap_or_else(|e| panic!("parse {file}: {e}"));
	body.blocks
		.iter()
		.map(|raw| Block::new(Path::new(ROOT), raw))
		.collect::<HclResult<Vec<_>>>()
		.unwrap_or_else(|e| panic!("block {file}: {e}"))
}

pub fn block(file: &str, source: &str) -> Block {
	blocks(file, source)
		.into_iter()
		.next()
		.unwrap_or_else(|| panic!("no block in {file}"))
}

/// Format the tokens of `expr` and parse the result again.
pub fn reparse(expr: &Expression) -> (String, Expression) {
	let formatted = tokens_for_expression(expr)
		.unwrap_or_else(|e| panic!("tokens: {e}"))
		.format();
	let reparsed = parse_expression(&formatted, "formatted.tm")
		.unwrap_or_else(|e| panic!("reparse `{formatted}`: {e}"));
	(formatted, reparsed)
}

pub fn sample_context() -> EvalContext {
	let mut object = std::collections::BTreeMap::new();
	object.insert("name".to_string(), Value::from("app"));
	object.insert("port".to_string(), Value::from(8080_i64));

	EvalContext::new()
		.with_variable("a", 3_i64)
		.with_variable("b", 4_i64)
		.with_variable("flag", true)
		.with_variable("text", "hello")
		.with_variable("list", vec![Value::from(1_i64), Value::from(2_i64), Value::from(3_i64)])
		.with_variable("obj", object)
}

pub fn eval(expr: &Expression) -> Value {
	evaluate(expr, &sample_context()).unwrap_or_else(|e| panic!("evaluate: {e}"))
}
