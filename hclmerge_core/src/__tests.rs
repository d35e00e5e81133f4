use std::collections::BTreeMap;
use std::path::Path;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::render::tokens_for_attributes;
use crate::render::tokens_for_block;
use crate::render::tokens_for_merged_block;
use crate::render::tokens_for_object_attrs;

fn num(literal: &str) -> Value {
	Value::number(literal).unwrap_or_else(|e| panic!("number: {e}"))
}

fn object(entries: &[(&str, Value)]) -> Value {
	Value::Object(
		entries
			.iter()
			.map(|(key, value)| ((*key).to_string(), value.clone()))
			.collect(),
	)
}

fn globals_of(config: &RawConfig, labels: &[&str]) -> MergedBlock {
	let labels: Vec<String> = labels.iter().map(ToString::to_string).collect();
	let key = LabelBlockType::new("globals", &labels).unwrap_or_else(|e| panic!("key: {e}"));
	config
		.merged_blocks
		.get(&key)
		.cloned()
		.unwrap_or_else(|| panic!("no merged block for {key}"))
}

fn attr_value(block: &MergedBlock, name: &str) -> Value {
	let attr = block
		.attributes
		.get(name)
		.unwrap_or_else(|| panic!("missing attribute `{name}`"));
	evaluate(&attr.expr, &EvalContext::new()).unwrap_or_else(|e| panic!("evaluate: {e}"))
}

// --- Expression tokens ---

#[rstest]
#[case::arithmetic("1 + 2 * 3", "1 + 2 * 3")]
#[case::parens("(a + 1) * b", "(a + 1) * b")]
#[case::logic("a < b && !flag", "a < b && !flag")]
#[case::negate("-a", "-a")]
#[case::conditional(r#"flag ? "yes" : "no""#, r#"flag ? "yes" : "no""#)]
#[case::tuple("[1,2,   3]", "[1, 2, 3]")]
#[case::index_literal("list[0]", "list[0]")]
#[case::attribute("obj.name", "obj.name")]
#[case::string_key(r#"obj["port"]"#, r#"obj["port"]"#)]
#[case::index_expression("list[a - 2]", "list[a - 2]")]
#[case::template(r#""${text} world""#, r#""${text} world""#)]
#[case::template_wrap(r#""${a}""#, r#""${a}""#)]
#[case::escaped_interpolation(r#""$${text}""#, r#""$${text}""#)]
#[case::for_list("[for v in list : v * 2 if v > 1]", "[for v in list : v * 2 if v > 1]")]
#[case::for_object("{for k, v in obj : k => v}", "{for k, v in obj : k => v}")]
#[case::function("upper(text)", "upper(text)")]
#[case::function_expand("concat(list, [4]...)", "concat(list, [4]...)")]
#[case::splat("list[*]", "list[*]")]
#[case::splat_each("obj[*].name[0]", "obj[*].name[0]")]
#[case::relative("[obj][0].name", "[obj][0].name")]
#[case::object("{ a = 1, \"b c\" = text }", "{\n  a = 1\n  \"b c\" = text\n}")]
#[case::heredoc_conditional("\"x ${flag?a:b}\\n\"", "<<-EOT\nx ${flag ? a : b}\nEOT\n")]
fn expression_tokens_round_trip(#[case] source: &str, #[case] expected: &str) {
	let original = expr(source);
	let (formatted, reparsed) = reparse(&original);

	assert_eq!(formatted, expected);
	assert_eq!(reparsed, original);
	assert_eq!(eval(&reparsed), eval(&original));
}

#[rstest]
#[case::heredoc("a b c\n", "<<-EOT\na b c\nEOT\n")]
#[case::heredoc_lines("line one\nline two\n", "<<-EOT\nline one\nline two\nEOT\n")]
#[case::printable_unicode("test\u{1000}\n", "<<-EOT\ntest\u{1000}\nEOT\n")]
#[case::escaped_backslash_n("a\\n", "\"a\\\\n\"")]
#[case::carriage_return("\r\n", "\"\\r\\n\"")]
#[case::no_trailing_newline("a\nb", "\"a\\nb\"")]
#[case::closing_marker_line("EOT\n", "\"EOT\\n\"")]
#[case::fully_indented("  indented\n", "\"  indented\\n\"")]
#[case::quote_in_heredoc("say \"hi\"\n", "<<-EOT\nsay \"hi\"\nEOT\n")]
fn string_templates_choose_heredoc_or_quotes(#[case] text: &str, #[case] expected: &str) -> HclResult<()> {
	let original = Expression::string(text);
	let tokens = tokens_for_expression(&original)?;

	assert_eq!(tokens.format(), expected);
	let reparsed = parse_expression(&tokens.format(), "test.tm")?;
	assert_eq!(evaluate(&reparsed, &EvalContext::new())?, Value::from(text));

	Ok(())
}

#[test]
fn heredoc_keeps_interpolations() -> HclResult<()> {
	let original = Expression::Template(vec![
		Expression::Literal(Value::from("hello ")),
		Expression::traversal("text", Vec::<String>::new()),
		Expression::Literal(Value::from("\n")),
	]);
	let (formatted, reparsed) = reparse(&original);

	assert_eq!(formatted, "<<-EOT\nhello ${text}\nEOT\n");
	assert_eq!(reparsed, original);

	Ok(())
}

#[rstest]
#[case::for_list(r#""${[for v in list : v]}\n""#, "<<-EOT\n${[for v in list : v]}\nEOT\n")]
#[case::for_object(r#""${{for k, v in obj : k => v}}\n""#, "<<-EOT\n${{for k, v in obj : k => v}}\nEOT\n")]
#[case::conditional(r#""x ${flag?a:b}\n""#, "<<-EOT\nx ${flag ? a : b}\nEOT\n")]
#[case::binary(r#""${a+1} items\n""#, "<<-EOT\n${a + 1} items\nEOT\n")]
#[case::nested_quote(r#""${upper("a b")}\n""#, "<<-EOT\n${upper(\"a b\")}\nEOT\n")]
fn heredoc_interpolations_keep_spacing(#[case] source: &str, #[case] expected: &str) {
	let original = expr(source);
	let (formatted, reparsed) = reparse(&original);

	assert_eq!(formatted, expected);
	assert_eq!(reparsed, original);
}

#[test]
fn inlined_literal_interpolations() -> HclResult<()> {
	let original = Expression::Template(vec![
		Expression::Literal(Value::from("v")),
		Expression::Literal(num("1.50")),
		Expression::Literal(Value::Bool(true)),
	]);
	let tokens = tokens_for_expression(&original)?;

	assert_eq!(tokens.format(), "\"v1.5true\"");
	assert_eq!(
		evaluate(&parse_expression(&tokens.format(), "test.tm")?, &EvalContext::new())?,
		Value::from("v1.5true")
	);

	Ok(())
}

#[test]
fn tokens_end_with_eof() -> HclResult<()> {
	let tokens = tokens_for_expression(&expr("a"))?;
	let types: Vec<TokenType> = tokens.iter().map(|token| token.r#type).collect();
	assert_eq!(types, vec![TokenType::Ident, TokenType::Eof]);
	assert_eq!(tokens.bytes(), b"a".to_vec());

	Ok(())
}

#[test]
fn anonymous_symbol_outside_splat_is_rejected() {
	let result = tokens_for_expression(&Expression::AnonSymbol);
	assert!(matches!(result, Err(HclError::UnsupportedExpression(_))));
}

#[test]
fn traversal_without_root_is_rejected() {
	let traversal = Expression::ScopeTraversal(vec![Traverser::Attr("name".into())]);
	let result = tokens_for_expression(&traversal);
	assert!(matches!(result, Err(HclError::MalformedTraversal(_))));
}

#[test]
fn nesting_guard_applies_to_token_builders_and_parser() {
	let nested = expr("((((1))))");
	let built = TokenBuilder::new(3).expression(&nested);
	assert!(matches!(built, Err(HclError::NestingTooDeep { max: 3 })));

	let parsed = parse_expression_with_depth("((((1))))", "test.tm", 2);
	assert!(matches!(parsed, Err(HclError::NestingTooDeep { max: 2 })));
}

// --- Value tokens ---

#[rstest]
#[case::null(Value::Null, "null")]
#[case::unknown(Value::Unknown, "null")]
#[case::bool(Value::Bool(false), "false")]
#[case::integer(num("42"), "42")]
#[case::negative(num("-12.50"), "-12.5")]
#[case::exponent(num("1e3"), "1000")]
#[case::small(num("0.0100"), "0.01")]
#[case::huge(num("123456789012345678901234567890.5"), "123456789012345678901234567890.5")]
#[case::quote(Value::from("a\"b"), "\"a\\\"b\"")]
#[case::interpolation_text(Value::from("${x}"), "\"$${x}\"")]
#[case::directive_text(Value::from("%{x}"), "\"%%{x}\"")]
#[case::percent(Value::from("100%"), "\"100%\"")]
#[case::unicode(Value::from("café"), "\"café\"")]
#[case::zero_width_space(Value::from("\u{200b}"), "\"\\u200b\"")]
#[case::private_use_plane(Value::from("\u{f0000}"), "\"\\U000f0000\"")]
#[case::newline(Value::from("a\nb"), "\"a\\nb\"")]
#[case::empty_list(Value::List(vec![]), "[]")]
#[case::list(Value::List(vec![num("1"), Value::from("x"), Value::Bool(true)]), "[1, \"x\", true]")]
#[case::empty_object(Value::Object(BTreeMap::new()), "{}")]
#[case::object(
	object(&[("a", num("1")), ("b c", Value::Null), ("true", num("2"))]),
	"{\n  a = 1\n  \"b c\" = null\n  \"true\" = 2\n}"
)]
#[case::nested(
	object(&[("outer", object(&[("x", Value::List(vec![num("1")]))]))]),
	"{\n  outer = {\n    x = [1]\n  }\n}"
)]
fn value_tokens(#[case] value: Value, #[case] expected: &str) -> HclResult<()> {
	let formatted = tokens_for_value(&value)?.format();
	assert_eq!(formatted, expected);

	if value.is_known() {
		let reparsed = parse_expression(&formatted, "value.tm")?;
		assert_eq!(evaluate(&reparsed, &EvalContext::new())?, value);
	}

	Ok(())
}

#[test]
fn value_display_uses_formatted_tokens() {
	let value = object(&[("name", Value::from("app"))]);
	assert_eq!(value.to_string(), "{\n  name = \"app\"\n}");
}

#[test]
fn embedded_expressions_render_as_source() -> HclResult<()> {
	let value = Value::List(vec![
		Value::Expression(Box::new(expr("a + 1"))),
		Value::Closure(Box::new(Closure {
			expression: expr("upper(text)"),
			variables: BTreeMap::new(),
		})),
	]);

	assert_eq!(tokens_for_value(&value)?.format(), "[a + 1, upper(text)]");

	Ok(())
}

#[rstest]
#[case("name", true)]
#[case("_private", true)]
#[case("with-dash", true)]
#[case("ünïcode", true)]
#[case("1abc", false)]
#[case("has space", false)]
#[case("", false)]
#[case("null", false)]
#[case("true", false)]
fn identifiers(#[case] name: &str, #[case] expected: bool) {
	assert_eq!(is_valid_identifier(name), expected);
}

// --- Parser ---

#[test]
fn parse_file_collects_attributes_and_blocks() -> HclResult<()> {
	let source = "# comment\nname = \"app\"\n\nglobals \"net\" {\n  cidr = \"10.0.0.0/16\" // trailing\n  nested {\n  }\n}\n";
	let body = parse_file(source, Path::new("/project/config.tm"))?;

	assert_eq!(body.attributes.keys().map(String::as_str).collect::<Vec<_>>(), vec!["name"]);
	assert_eq!(body.blocks.len(), 1);

	let block = &body.blocks[0];
	assert_eq!(block.r#type, "globals");
	assert_eq!(block.labels, vec!["net".to_string()]);
	assert_eq!(block.body.attributes.len(), 1);
	assert_eq!(block.body.blocks.len(), 1);
	assert_eq!(block.type_range.start.line(), 4);
	assert_eq!(block.type_range.start.column(), 1);
	assert_eq!(block.label_ranges[0].start.column(), 9);

	Ok(())
}

#[test]
fn duplicate_attributes_are_syntax_errors() {
	let result = parse_file("x = 1\nx = 2\n", Path::new("/project/a.tm"));
	let Err(HclError::DuplicateAttribute { name, line, .. }) = result else {
		panic!("expected a duplicate attribute error");
	};
	assert_eq!(name, "x");
	assert_eq!(line, 2);
}

#[rstest]
#[case::missing_value("x = \n")]
#[case::unclosed_block("globals {\n  x = 1\n")]
#[case::two_attributes_on_a_line("x = 1 y = 2\n")]
#[case::directive("x = \"%{if a}\"\n")]
#[case::newline_in_string("x = \"a\nb\"\n")]
fn syntax_errors(#[case] source: &str) {
	let result = parse_file(source, Path::new("/project/a.tm"));
	assert!(matches!(result, Err(HclError::Syntax { .. })), "got {result:?}");
}

#[rstest]
#[case::flush("<<-EOT\n    a\n      b\n    EOT\n", "a\n  b\n")]
#[case::plain("<<EOT\n  a\nEOT\n", "  a\n")]
#[case::blank_lines_ignored("<<-EOT\n  a\n\n  b\nEOT\n", "a\n\nb\n")]
fn heredoc_parsing(#[case] source: &str, #[case] expected: &str) -> HclResult<()> {
	let parsed = parse_expression(source, "test.tm")?;
	assert_eq!(parsed, Expression::string(expected));

	Ok(())
}

#[test]
fn multi_line_collections_ignore_newlines() -> HclResult<()> {
	let parsed = parse_expression("[\n  1,\n  2,\n]", "test.tm")?;
	assert_eq!(
		parsed,
		Expression::Tuple(vec![
			Expression::Literal(num("1")),
			Expression::Literal(num("2"))
		])
	);

	Ok(())
}

#[test]
fn parenthesized_object_keys_are_not_literal() -> HclResult<()> {
	let Expression::Object(items) = parse_expression("{ (text) = 1, name = 2 }", "test.tm")? else {
		panic!("expected an object");
	};
	let Expression::ObjectKey(first) = &items[0].key else {
		panic!("expected an object key");
	};
	assert!(first.force_non_literal);

	let value = eval(&Expression::Object(items));
	assert_eq!(value, object(&[("hello", num("1")), ("name", num("2"))]));

	Ok(())
}

// --- Evaluation ---

#[rstest]
#[case::arithmetic("1 + 2 * 3", num("7"))]
#[case::variables("a * b - 2", num("10"))]
#[case::division("10 / 4", num("2.5"))]
#[case::modulo("7 % 3", num("1"))]
#[case::logic("a < b && flag", Value::Bool(true))]
#[case::equality("list == [1, 2, 3]", Value::Bool(true))]
#[case::template(r#""${text}-${a}""#, Value::from("hello-3"))]
#[case::conditional(r#"flag ? obj.name : "none""#, Value::from("app"))]
#[case::index("list[1]", num("2"))]
#[case::index_expression("list[a - 2]", num("2"))]
#[case::unresolved("missing.attr", Value::Unknown)]
#[case::unknown_propagates("missing + 1", Value::Unknown)]
#[case::function("upper(text)", Value::Unknown)]
#[case::for_list("[for v in list : v if v != 2]", Value::List(vec![num("1"), num("3")]))]
#[case::for_group(
	r#"{for v in list : v % 2 == 0 ? "even" : "odd" => v...}"#,
	object(&[("even", Value::List(vec![num("2")])), ("odd", Value::List(vec![num("1"), num("3")]))])
)]
#[case::object(r#"{ name = text, "x" = 1 }"#, object(&[("name", Value::from("hello")), ("x", num("1"))]))]
fn evaluation(#[case] source: &str, #[case] expected: Value) {
	assert_eq!(eval(&expr(source)), expected);
}

#[rstest]
#[case::division_by_zero("1 / 0")]
#[case::not_a_bool("!1")]
#[case::missing_attribute("obj.nope")]
#[case::out_of_range("list[5]")]
#[case::duplicate_for_key("{for v in list : \"k\" => v}")]
fn evaluation_errors(#[case] source: &str) {
	let result = evaluate(&expr(source), &sample_context());
	assert!(matches!(result, Err(HclError::Evaluation(_))), "got {result:?}");
}

#[test]
fn globals_reference_each_other() -> HclResult<()> {
	let merged = {
		let mut merged = MergedBlock::new("globals", &[]);
		let result = merged.merge_block(
			&block(
				"/globals.tm",
				"globals {\n  a = 1\n  b = global.a + 1\n  c = \"${global.b}x\"\n  d = global.e\n  e = global.d\n}\n",
			),
			false,
		);
		assert!(result.is_ok());
		merged
	};

	let values = evaluate_attributes(&merged.attributes, "global")?;
	assert_eq!(values["a"], num("1"));
	assert_eq!(values["b"], num("2"));
	assert_eq!(values["c"], Value::from("2x"));
	assert_eq!(values["d"], Value::Unknown);
	assert_eq!(values["e"], Value::Unknown);

	Ok(())
}

// --- Ranges ---

#[test]
fn range_is_anchored_to_project_root() -> HclResult<()> {
	let source = SourceRange::new(
		"/project/stacks/app/main.tm",
		Position::new(2, 3, 10),
		Position::new(2, 8, 15),
	);
	let range = Range::new(Path::new("/project"), &source)?;

	assert_eq!(range.path(), "/stacks/app/main.tm");
	assert_eq!(range.host_path(), Path::new("/project/stacks/app/main.tm"));
	assert_eq!(range.host_dir(), Path::new("/project/stacks/app"));
	assert_eq!(range.start(), Position::new(2, 3, 10));
	assert_eq!(range.to_string(), "/project/stacks/app/main.tm:2,3-2,8");

	Ok(())
}

#[rstest]
#[case::outside("/elsewhere/main.tm")]
#[case::relative("stacks/main.tm")]
#[case::parent_component("/project/../main.tm")]
fn range_outside_root_is_rejected(#[case] file: &str) {
	let source = SourceRange::new(file, Position::new(1, 1, 0), Position::new(1, 2, 1));
	let result = Range::new(Path::new("/project"), &source);
	assert!(matches!(result, Err(HclError::PathOutsideRoot { .. })), "got {result:?}");
}

// --- Block merging ---

#[test]
fn label_block_type_is_bounded() {
	let labels: Vec<String> = (0..=MAX_LABELS).map(|index| index.to_string()).collect();
	let result = LabelBlockType::new("globals", &labels);
	assert!(matches!(result, Err(HclError::TooManyLabels { count, .. }) if count == MAX_LABELS + 1));
}

#[test]
fn label_mismatch_is_reported() {
	let mut merged = MergedBlock::new("globals", &["a".to_string()]);
	let result = merged.merge_block(&block("/g.tm", "globals \"a\" \"b\" {}\n"), true);

	let Err(errors) = result else {
		panic!("expected a label mismatch");
	};
	assert_eq!(errors.len(), 1);
	let Some(HclError::LabelMismatch { expected, got, .. }) = errors.iter().next() else {
		panic!("expected a label mismatch, got {errors}");
	};
	assert_eq!(expected, "a");
	assert_eq!(got, "a.b");
	assert!(merged.raw_origins.is_empty());
}

#[test]
fn labels_not_allowed_on_unlabelled_types() {
	let mut config = RawConfig::default();
	let blocks = blocks("/t.tm", "terramate \"x\" {}\n");
	let result = config.merge_blocks(&blocks);

	let Err(errors) = result else {
		panic!("expected labels not allowed");
	};
	assert!(matches!(
		errors.iter().next(),
		Some(HclError::LabelsNotAllowed { block_type, .. }) if block_type == "terramate"
	));
	assert!(config.merged_blocks.is_empty());
}

#[test]
fn top_level_blocks_follow_the_schema() {
	let mut config = RawConfig::default();
	let blocks = blocks(
		"/t.tm",
		"stack {\n  name = \"a\"\n}\nstack {\n  name = \"b\"\n}\nimport {\n  source = \"x\"\n}\nunknown {}\nterramate {}\n",
	);
	let result = config.merge_blocks(&blocks);

	let Err(errors) = result else {
		panic!("expected an unrecognized block");
	};
	assert_eq!(errors.len(), 1);
	let Some(HclError::UnrecognizedBlock { block_type, range }) = errors.iter().next() else {
		panic!("expected an unrecognized block, got {errors}");
	};
	assert_eq!(block_type, "unknown");
	assert_eq!(range.path(), "/t.tm");
	assert_eq!(range.start().line(), 10);

	assert_eq!(config.unmerged_of_type("stack").count(), 2);
	assert_eq!(config.merged_blocks.len(), 1);
}

#[test]
fn custom_schema_from_config() {
	let schema_config = HclMergeConfig::parse("[schema]\nmerged = [\"settings\"]\nunmerged = []\nignored = []\n")
		.unwrap_or_else(|e| panic!("config: {e}"))
		.schema;
	let mut config = RawConfig::new(BlockSchema::from(&schema_config));

	assert!(config.merge_blocks(&blocks("/a.tm", "settings {\n  x = 1\n}\n")).is_ok());
	assert!(config.merge_blocks(&blocks("/a.tm", "stack {}\n")).is_err());
	assert_eq!(
		config.schema().handler("settings"),
		Some(MergeHandler::Merge { labelled: false })
	);
}

#[test]
fn provenance_is_kept_when_a_later_contributor_fails() {
	let mut merged = MergedBlock::new("globals", &[]);
	assert!(merged.merge_block(&block("/a.tm", "globals {\n  x = 1\n}\n"), false).is_ok());

	let result = merged.merge_block(&block("/b.tm", "globals {\n  x = 2\n  y = 3\n}\n"), false);
	let Err(errors) = result else {
		panic!("expected a conflict");
	};
	let Some(HclError::AttributeRedeclared { name, file, first_file, .. }) = errors.iter().next() else {
		panic!("expected a redeclared attribute, got {errors}");
	};
	assert_eq!(name, "x");
	assert_eq!(file, "/b.tm");
	assert_eq!(first_file, "/a.tm");

	assert_eq!(merged.raw_origins.len(), 1);
	assert_eq!(merged.raw_origins[0].range.path(), "/a.tm");
	assert_eq!(attr_value(&merged, "x"), num("1"));
}

#[test]
fn child_blocks_merge_by_identity() {
	let mut merged = MergedBlock::new("terramate", &[]);
	assert!(
		merged
			.merge_block(&block("/terramate.tm", "terramate {\n  config {\n    x = 1\n  }\n}\n"), false)
			.is_ok()
	);
	assert!(
		merged
			.merge_block(&block("/stacks/terramate.tm", "terramate {\n  config {\n    y = 2\n  }\n}\n"), false)
			.is_ok()
	);

	let config = &merged.blocks[&LabelBlockType::empty("config")];
	assert_eq!(config.attributes.keys().map(String::as_str).collect::<Vec<_>>(), vec!["x", "y"]);
	assert_eq!(merged.raw_blocks["config"].len(), 2);
	assert_eq!(merged.raw_origins.len(), 2);
	assert!(merged.validate_sub_blocks(&["config"]).is_ok());
}

#[test]
fn unrecognized_sub_blocks() {
	let mut merged = MergedBlock::new("terramate", &[]);
	assert!(
		merged
			.merge_block(&block("/a.tm", "terramate {\n  config {}\n  other {}\n}\n"), false)
			.is_ok()
	);

	let Err(errors) = merged.validate_sub_blocks(&["config"]) else {
		panic!("expected an unrecognized sub block");
	};
	assert_eq!(errors.len(), 1);
	assert!(matches!(
		errors.iter().next(),
		Some(HclError::UnrecognizedBlock { block_type, .. }) if block_type == "other"
	));
}

#[test]
fn precedence_depends_on_directory() {
	let parent = block("/a.tm", "globals {\n  x = 1\n}\n");
	let sibling = block("/b.tm", "globals {\n  x = 1\n}\n");
	let child = block("/stacks/a.tm", "globals {\n  x = 1\n}\n");
	let range = |block: &Block| block.attributes["x"].range.clone();

	assert_eq!(attribute_precedence(&range(&parent), &range(&sibling)), Precedence::Conflict);
	assert_eq!(attribute_precedence(&range(&parent), &range(&child)), Precedence::Override);
}

#[test]
fn raw_config_merge_replays_origins() {
	let mut parent = RawConfig::default();
	assert!(parent.merge_blocks(&blocks("/a.tm", "globals {\n  x = 1\n}\nstack {}\n")).is_ok());

	let mut child = RawConfig::default();
	assert!(child.merge_blocks(&blocks("/stacks/a.tm", "globals {\n  x = 2\n}\n")).is_ok());
	assert!(parent.merge(&child).is_ok());

	let globals = globals_of(&parent, &[]);
	assert_eq!(attr_value(&globals, "x"), num("2"));
	assert_eq!(globals.raw_origins.len(), 2);
	assert_eq!(parent.unmerged_blocks.len(), 1);
}

// --- Projects ---

#[test]
fn same_directory_conflicts_are_reported() -> HclResult<()> {
	let tmp = project_tree(&[
		("a.tm", "globals {\n  x = 1\n}\n"),
		("b.tm", "globals {\n  x = 2\n}\n"),
	]);
	let project = Project::load(tmp.path())?;

	let Err(errors) = project.check() else {
		panic!("expected a conflict");
	};
	assert_eq!(errors.len(), 1);
	assert!(matches!(
		errors.iter().next(),
		Some(HclError::AttributeRedeclared { file, first_file, .. }) if file == "/b.tm" && first_file == "/a.tm"
	));

	Ok(())
}

#[traced_test]
#[test]
fn child_directory_overrides_parent() -> HclResult<()> {
	let tmp = project_tree(&[
		("globals.tm", "globals {\n  env = \"prod\"\n  region = \"eu\"\n}\n"),
		("stacks/app/globals.tm", "globals {\n  env = \"dev\"\n}\n"),
	]);
	let project = Project::load(tmp.path())?;
	assert!(project.check().is_ok());

	let config = project
		.load_dir(Path::new("/stacks/app"))
		.unwrap_or_else(|e| panic!("load: {e}"));
	let globals = globals_of(&config, &[]);
	assert_eq!(attr_value(&globals, "env"), Value::from("dev"));
	assert_eq!(attr_value(&globals, "region"), Value::from("eu"));

	let origins: Vec<&str> = globals.raw_origins.iter().map(|block| block.range.path()).collect();
	assert_eq!(origins, vec!["/globals.tm", "/stacks/app/globals.tm"]);
	assert!(logs_contain("attribute overridden"));

	let parent = project
		.load_dir(Path::new("stacks"))
		.unwrap_or_else(|e| panic!("load: {e}"));
	assert_eq!(attr_value(&globals_of(&parent, &[]), "env"), Value::from("prod"));

	Ok(())
}

#[rstest]
#[case::root("/", ["1", "1", "1"])]
#[case::parent("/p", ["1", "2", "2"])]
#[case::child("/p/c", ["1", "2", "3"])]
#[case::child_without_files("/p/c/empty", ["1", "2", "3"])]
fn three_level_precedence(#[case] dir: &str, #[case] expected: [&str; 3]) -> HclResult<()> {
	let tmp = project_tree(&[
		("globals.tm", "globals {\n  a = 1\n  b = 1\n  c = 1\n}\n"),
		("p/globals.tm", "globals {\n  b = 2\n  c = 2\n}\n"),
		("p/c/globals.tm", "globals {\n  c = 3\n}\n"),
	]);
	let project = Project::load(tmp.path())?;
	let config = project
		.load_dir(Path::new(dir))
		.unwrap_or_else(|e| panic!("load: {e}"));
	let globals = globals_of(&config, &[]);

	for (name, value) in ["a", "b", "c"].into_iter().zip(expected) {
		assert_eq!(attr_value(&globals, name), num(value), "attribute {name} in {dir}");
	}

	Ok(())
}

#[test]
fn later_sibling_overrides_earlier_one() -> HclResult<()> {
	let tmp = project_tree(&[
		("b/x.tm", "globals {\n  v = \"b\"\n}\n"),
		("a/x.tm", "globals {\n  v = \"a\"\n}\n"),
	]);
	let project = Project::load(tmp.path())?;
	assert_eq!(project.dirs(), vec!["/a".to_string(), "/b".to_string()]);

	let config = project.load_all().unwrap_or_else(|e| panic!("load: {e}"));
	assert_eq!(attr_value(&globals_of(&config, &[]), "v"), Value::from("b"));

	Ok(())
}

#[test]
fn project_respects_file_filters() -> HclResult<()> {
	let tmp = project_tree(&[
		("hclmerge.toml", "[files]\nexclude = [\"vendor/\"]\n"),
		(".gitignore", "ignored.tm\n"),
		("main.tm", "globals {\n  x = 1\n}\n"),
		("ignored.tm", "not valid {{{\n"),
		("notes.txt", "not valid {{{\n"),
		("vendor/lib.tm", "not valid {{{\n"),
		(".hidden/a.tm", "not valid {{{\n"),
		("extra.tm.hcl", "globals {\n  y = 2\n}\n"),
	]);
	let project = Project::load(tmp.path())?;

	assert_eq!(project.dirs(), vec!["/".to_string()]);
	let names: Vec<String> = project
		.files_in(Path::new("/"))?
		.iter()
		.filter_map(|file| file.path.file_name())
		.map(|name| name.to_string_lossy().into_owned())
		.collect();
	assert_eq!(names, vec!["extra.tm.hcl".to_string(), "main.tm".to_string()]);
	assert!(project.check().is_ok());

	Ok(())
}

#[test]
fn check_collects_every_problem() -> HclResult<()> {
	let tmp = project_tree(&[
		("a.tm", "globals {\n  x = 1\n}\nterramate \"bad\" {}\n"),
		("b.tm", "globals {\n  x = 2\n}\n"),
		("stacks/broken.tm", "x = \n"),
		("stacks/other.tm", "mystery {}\n"),
	]);
	let project = Project::load(tmp.path())?;

	let Err(errors) = project.check() else {
		panic!("expected errors");
	};
	let codes: Vec<&str> = errors
		.iter()
		.map(|error| {
			match error {
				HclError::LabelsNotAllowed { .. } => "labels",
				HclError::AttributeRedeclared { .. } => "redeclared",
				HclError::Syntax { .. } => "syntax",
				HclError::UnrecognizedBlock { .. } => "unrecognized",
				_ => "other",
			}
		})
		.collect();
	assert_eq!(codes, vec!["labels", "redeclared", "syntax", "unrecognized"]);

	Ok(())
}

#[test]
fn load_dir_rejects_paths_leaving_the_root() -> HclResult<()> {
	let tmp = project_tree(&[("a.tm", "globals {}\n")]);
	let project = Project::load(tmp.path())?;

	let Err(errors) = project.load_dir(Path::new("../outside")) else {
		panic!("expected an error");
	};
	assert!(matches!(errors.iter().next(), Some(HclError::PathOutsideRoot { .. })));

	Ok(())
}

// --- Rendering ---

#[test]
fn render_merged_block() -> HclResult<()> {
	let tmp = project_tree(&[
		(
			"globals.tm",
			"globals \"net\" {\n  cidr  = \"10.0.0.0/16\"\n  zones = [\"a\", \"b\"]\n}\n",
		),
		(
			"stacks/globals.tm",
			"globals \"net\" {\n  zones = concat(global.zones, [\"c\"])\n  motd = <<-EOT\n    welcome\n  EOT\n}\n",
		),
	]);
	let project = Project::load(tmp.path())?;
	let config = project
		.load_dir(Path::new("/stacks"))
		.unwrap_or_else(|e| panic!("load: {e}"));
	let globals = globals_of(&config, &["net"]);
	let rendered = tokens_for_merged_block(&globals)?.format();

	insta::assert_snapshot!(rendered.trim_end(), @r#"
	globals "net" {
	  cidr = "10.0.0.0/16"
	  motd = <<-EOT
	welcome
	EOT
	  zones = concat(global.zones, ["c"])
	}
	"#);

	Ok(())
}

#[test]
fn render_object_attributes() -> HclResult<()> {
	let value = object(&[("name", Value::from("app")), ("port", num("8080"))]);
	assert_eq!(tokens_for_object_attrs(&value)?.format(), "name = \"app\"\nport = 8080\n");

	let invalid = object(&[("not valid", Value::Null)]);
	assert!(matches!(tokens_for_object_attrs(&invalid), Err(HclError::UnsupportedExpression(_))));
	assert!(tokens_for_object_attrs(&num("1")).is_err());

	Ok(())
}

#[test]
fn render_declared_block() -> HclResult<()> {
	let stack = block(
		"/stacks/app/stack.tm",
		"stack {\n  name = \"app\"\n  tags = [\"a\",\"b\"]\n  lifecycle \"prod\" {\n    protect = true\n  }\n}\n",
	);

	assert_eq!(
		tokens_for_block(&stack)?.format(),
		"stack {\n  name = \"app\"\n  tags = [\"a\", \"b\"]\n  lifecycle \"prod\" {\n    protect = true\n  }\n}\n"
	);

	Ok(())
}

#[test]
fn render_top_level_attributes() -> HclResult<()> {
	let body = parse_file("version = 2\nname = \"root\"\n", Path::new("/project/root.tm"))?;
	let attributes = body
		.attributes
		.values()
		.map(|raw| Ok((raw.name.clone(), Attribute::new(Path::new(ROOT), raw)?)))
		.collect::<HclResult<Attributes>>()?;

	assert_eq!(tokens_for_attributes(&attributes)?.format(), "name = \"root\"\nversion = 2\n");

	Ok(())
}

// --- Configuration ---

#[test]
fn config_defaults() -> HclResult<()> {
	let config = HclMergeConfig::parse("")?;
	assert_eq!(config, HclMergeConfig::default());
	assert_eq!(config.files.extensions, vec!["tm".to_string(), "tm.hcl".to_string()]);
	assert_eq!(config.render.max_depth, DEFAULT_MAX_DEPTH);

	let schema = BlockSchema::default();
	assert_eq!(schema.handler("globals"), Some(MergeHandler::Merge { labelled: true }));
	assert_eq!(schema.handler("terramate"), Some(MergeHandler::Merge { labelled: false }));
	assert_eq!(schema.handler("stack"), Some(MergeHandler::Append));
	assert_eq!(schema.handler("import"), Some(MergeHandler::Ignore));
	assert_eq!(schema.handler("mystery"), None);

	Ok(())
}

#[test]
fn config_rejects_unknown_fields() {
	let result = HclMergeConfig::parse("[files]\nunknown = true\n");
	assert!(matches!(result, Err(HclError::ConfigParse(_))));
}

#[rstest]
#[case("main.tm", true)]
#[case("main.tm.hcl", true)]
#[case("main.hcl", false)]
#[case(".tm", false)]
#[case("maintm", false)]
fn file_extensions(#[case] name: &str, #[case] expected: bool) {
	assert_eq!(FilesConfig::default().matches(Path::new(name)), expected);
}
