mod common;

use rstest::rstest;

#[rstest]
#[case::tuple("[1,2,   3]", "[1, 2, 3]\n")]
#[case::arithmetic("a+b*2", "a + b * 2\n")]
#[case::object("{a=1,b=true}", "{\n  a = 1\n  b = true\n}\n")]
#[case::heredoc("<<EOT\nhello\nEOT\n", "<<-EOT\nhello\nEOT\n\n")]
fn fmt_expr_reformats(#[case] source: &str, #[case] expected: &str) {
	common::hclmerge_cmd()
		.arg("fmt-expr")
		.arg(source)
		.assert()
		.success()
		.stdout(expected.to_string());
}

#[test]
fn fmt_expr_reports_syntax_errors() {
	common::hclmerge_cmd()
		.arg("fmt-expr")
		.arg("[1, 2")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("hclmerge::syntax"));
}
