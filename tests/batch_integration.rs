//! Batch generation over a directory of .gg templates

use std::fs;
use std::path::Path;

use gotgen::batch::{discover_jobs, run_batch, single_job, BatchError, FailurePolicy};
use gotgen::{GenConfig, MapEnvironment, RenderConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn fixtures() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"))
}

fn render_config(config: &GenConfig) -> RenderConfig {
    RenderConfig::new()
        .with_delimiters(config.delimiter.clone())
        .with_environment(MapEnvironment::new().with("GOTGEN_TEST_REGION", "eu-west-1"))
}

#[test]
fn test_generate_directory() {
    let dir = tempdir().unwrap();
    fs::copy(
        fixtures().join("example.txt.gg"),
        dir.path().join("example.txt.gg"),
    )
    .unwrap();
    fs::write(dir.path().join("count.txt.gg"), "{{ len .Nested }}\n").unwrap();

    let config = GenConfig::from_file(&fixtures().join("gg.conf.json")).unwrap();
    let jobs = discover_jobs(dir.path()).unwrap();
    let report = run_batch(
        &jobs,
        &config.inventory_value(),
        &render_config(&config),
        FailurePolicy::FailFast,
    )
    .unwrap();

    assert_eq!(
        report.written,
        vec![dir.path().join("count.txt"), dir.path().join("example.txt")]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("example.txt")).unwrap(),
        fs::read_to_string(fixtures().join("example.txt")).unwrap()
    );
    assert_eq!(fs::read_to_string(dir.path().join("count.txt")).unwrap(), "1\n");
}

#[test]
fn test_single_file_with_explicit_output() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("values.tmpl");
    let output = dir.path().join("values.yml");
    fs::write(&template, "replicas: <% .KeyTwo | multiply 3 %>\n").unwrap();

    let config = GenConfig::from_json_str(
        r#"{"Inventory": {"KeyTwo": 2}, "Delimiter": {"Left": "<%", "Right": "%>"}}"#,
    )
    .unwrap();
    let job = single_job(&template, Some(&output)).unwrap();
    run_batch(
        &[job],
        &config.inventory_value(),
        &render_config(&config),
        FailurePolicy::FailFast,
    )
    .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "replicas: 6\n");
}

#[test]
fn test_syntax_error_names_the_template() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.txt.gg"), "{{ nope 1 }}").unwrap();

    let config = GenConfig::default();
    let jobs = discover_jobs(dir.path()).unwrap();
    let err = run_batch(
        &jobs,
        &config.inventory_value(),
        &RenderConfig::new(),
        FailurePolicy::FailFast,
    )
    .unwrap_err();

    match &err {
        BatchError::Render { path, .. } => assert!(path.ends_with("broken.txt.gg")),
        other => panic!("Expected render error, got {:?}", other),
    }
    assert!(err.to_string().contains(r#"function "nope" not defined"#));
}
