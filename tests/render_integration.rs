//! Integration tests for rendering templates against an inventory

use std::fs;
use std::path::Path;

use gotgen::functions::MAX_INDENT;
use gotgen::numeric::{ArithOp, OperandPosition};
use gotgen::{
    render, render_with_config, DelimiterPair, GenConfig, MapEnvironment, RenderConfig,
    RenderError, Value, ValueKind,
};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

fn fixture_config() -> GenConfig {
    GenConfig::from_json_str(&fixture("gg.conf.json")).expect("Fixture config should parse")
}

fn test_config() -> RenderConfig {
    RenderConfig::new().with_environment(
        MapEnvironment::new()
            .with("GOTGEN_TEST_REGION", "eu-west-1")
            .with("EMPTY_VAR", ""),
    )
}

fn render_fixture_inventory(template: &str) -> Result<String, RenderError> {
    render_with_config(template, &fixture_config().inventory_value(), &test_config())
}

#[test]
fn test_example_template_matches_expected_output() {
    let config = fixture_config();
    let output = render_with_config(
        &fixture("example.txt.gg"),
        &config.inventory_value(),
        &test_config().with_delimiters(config.delimiter.clone()),
    )
    .expect("Should render");
    assert_eq!(output, fixture("example.txt"));
}

#[test]
fn test_var_and_field_scenario() {
    let inventory: Value = [("KeyOne", Value::from("v1")), ("KeyTwo", Value::Int(2))]
        .into_iter()
        .collect();
    let output = render(r#"{{ var "KeyOne" }}-{{ .KeyTwo }}"#, &inventory, "{{", "}}").unwrap();
    assert_eq!(output, "v1-2");
}

#[test]
fn test_missing_keys_fail_strictly() {
    assert_eq!(
        render_fixture_inventory(r#"{{ var "Missing" }}"#),
        Err(RenderError::MissingKey("Missing".into()))
    );
    assert_eq!(
        render_fixture_inventory("{{ .Nested.KeyB.Key1 }}"),
        Err(RenderError::MissingKey("KeyB".into()))
    );
}

#[test]
fn test_required_environment_variables() {
    assert_eq!(
        render_fixture_inventory(r#"{{ getenvRequired "UNSET_VAR" }}"#),
        Err(RenderError::MissingEnvironmentVariable("UNSET_VAR".into()))
    );
    assert_eq!(
        render_fixture_inventory(r#"{{ getenvRequired "EMPTY_VAR" }}"#),
        Err(RenderError::MissingEnvironmentVariable("EMPTY_VAR".into()))
    );
    assert_eq!(
        render_fixture_inventory(r#"[{{ getenv "UNSET_VAR" }}]"#).unwrap(),
        "[]"
    );
}

#[test]
fn test_arithmetic_errors() {
    assert_eq!(
        render_fixture_inventory("{{ 6 | divide 0 }}"),
        Err(RenderError::DivideByZero(ArithOp::Divide))
    );
    assert_eq!(
        render_fixture_inventory("{{ 6.5 | modulo 2 }}"),
        Err(RenderError::UnsupportedOperand {
            op: ArithOp::Modulo,
            kind: ValueKind::Float,
            position: OperandPosition::Second,
        })
    );
    assert_eq!(
        render_fixture_inventory(r#"{{ .KeyOne | add 1 }}"#),
        Err(RenderError::UnsupportedOperand {
            op: ArithOp::Add,
            kind: ValueKind::String,
            position: OperandPosition::Second,
        })
    );
    assert_eq!(
        render_fixture_inventory("{{ 9223372036854775807 | add 1 }}"),
        Err(RenderError::ArithmeticOverflow(ArithOp::Add))
    );
}

#[test]
fn test_float_arithmetic() {
    assert_eq!(render_fixture_inventory("{{ 7 | divide 2.0 }}").unwrap(), "3.5");
    assert_eq!(render_fixture_inventory("{{ 7 | divide 2 }}").unwrap(), "3");
    assert_eq!(render_fixture_inventory("{{ 1.0 | divide 0.0 }}").unwrap(), "+Inf");
}

#[test]
fn test_yaml_of_var_lookup_indents_first_line_only() {
    let output = render_fixture_inventory(r#"{{ var "Nested" | yaml | indentWithSpaces 2 }}"#).unwrap();
    assert_eq!(output, "  KeyA:\n  Key1: KeyA-Key1 value\n");
}

#[test]
fn test_oversized_indentation_is_an_error() {
    assert_eq!(
        render_fixture_inventory(r#"{{ "a" | indentWithSpaces 9223372036854775807 }}"#),
        Err(RenderError::IndentTooWide {
            count: i64::MAX as u64,
            max: MAX_INDENT,
        })
    );
}

#[test]
fn test_unsigned_literal_and_empty_action() {
    assert_eq!(
        render_fixture_inventory("{{ 18446744073709551615 }}").unwrap(),
        "18446744073709551615"
    );
    assert!(matches!(
        render_fixture_inventory("a{{ }}b"),
        Err(RenderError::TemplateSyntax(_))
    ));
}

#[test]
fn test_custom_delimiters_leave_braces_alone() {
    let config = test_config().with_delimiters(DelimiterPair::new("[[", "]]"));
    let output = render_with_config(
        "{{ .Helm.Value }} [[ .KeyTwo ]]",
        &fixture_config().inventory_value(),
        &config,
    )
    .unwrap();
    assert_eq!(output, "{{ .Helm.Value }} 2");
}

#[test]
fn test_syntax_error_reports_span() {
    let err = render_fixture_inventory("ok {{ if .KeyBool }}unterminated").unwrap_err();
    match err {
        RenderError::TemplateSyntax(syntax) => {
            assert_eq!(syntax.message, "unexpected end of template");
            let report = syntax.format("ok {{ if .KeyBool }}unterminated", "broken.gg");
            assert!(report.contains("unexpected end of template"));
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_trim_markers_and_range() {
    let output = render_fixture_inventory(
        "items:\n{{- range $k, $v := .Nested }}\n  {{ $k }}: {{ len $v }}\n{{- end }}\n",
    )
    .unwrap();
    assert_eq!(output, "items:\n  KeyA: 1\n");
}
