use hati_transpiler::{run, Diagnostic, TranspileError, TranspileOptions, ERR_DIRECTIVE_ARGUMENT};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, contents).expect("write");
}

const DESCRIPTOR: &str = indoc! {"
    service: shop
    provider:
      name: aws
      runtime: nodejs14.x
"};

#[test]
fn test_run_writes_outputs_and_descriptor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(&root.join("input/serverless.yml"), DESCRIPTOR);
    write(
        &root.join("src/users.ts"),
        indoc! {r#"
            /**
             * $Fixed
             * $HttpApi("/users", "POST")
             */
            export function createUser(event: any) {
                return { id: 1 };
            }
        "#},
    );
    write(
        &root.join("src/jobs/cleanup.ts"),
        indoc! {r#"
            /** $Scheduled("rate(5 minutes)") */
            export async function cleanup() {}
        "#},
    );
    write(&root.join("src/broken.ts"), "export function (\n");

    let options = TranspileOptions {
        inputs: vec![root.join("src")],
        out_dir: root.join("output"),
        descriptor: root.join("input/serverless.yml"),
        write_descriptor: Some(root.join("serverless.yml")),
        dry_run: false,
    };
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let report = run(&options, |d| diagnostics.push(d.clone())).expect("run");

    assert!(root.join("output/users.ts").is_file());
    assert!(root.join("output/jobs/cleanup.ts").is_file());
    let users = fs::read_to_string(root.join("output/users.ts")).expect("read");
    assert!(users.contains("export async function createUser"));

    assert_eq!(report.registry.len(), 2);
    assert!(diagnostics.iter().all(|d| d.file.ends_with("broken.ts")));

    let written = fs::read_to_string(root.join("serverless.yml")).expect("read");
    assert_eq!(written, report.descriptor);
    let doc: serde_yaml::Value = serde_yaml::from_str(&written).expect("yaml");
    assert_eq!(doc["service"].as_str(), Some("shop"));
    let handler = doc["functions"]["createUser"]["handler"].as_str().expect("handler");
    assert!(handler.ends_with("output/users.createUser"), "{handler}");
    assert_eq!(
        doc["functions"]["createUser"]["events"][0]["http"]["method"].as_str(),
        Some("POST")
    );
    assert_eq!(
        doc["functions"]["cleanup"]["events"][0]["schedule"].as_str(),
        Some("rate(5 minutes)")
    );
}

#[test]
fn test_fatal_directive_stops_before_writing_that_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(&root.join("input/serverless.yml"), DESCRIPTOR);
    write(
        &root.join("src/a.ts"),
        "/** $Fixed */\nexport function ok() {\n  return 1;\n}\n",
    );
    write(
        &root.join("src/b.ts"),
        "/** $HttpApi() */\nexport function broken() {\n  return 1;\n}\n",
    );

    let options = TranspileOptions {
        inputs: vec![root.join("src")],
        out_dir: root.join("output"),
        descriptor: root.join("input/serverless.yml"),
        write_descriptor: Some(root.join("serverless.yml")),
        dry_run: false,
    };
    let err = run(&options, |_| {}).expect_err("fatal directive");
    match err {
        TranspileError::Directive(err) => {
            assert_eq!(err.code, ERR_DIRECTIVE_ARGUMENT);
            assert_eq!(err.function, "broken");
            assert_eq!(err.declaration_line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(root.join("output/a.ts").is_file());
    assert!(!root.join("output/b.ts").exists());
    assert!(!root.join("serverless.yml").exists());
}

#[test]
fn test_missing_descriptor_shows_reference() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(&root.join("src/a.ts"), "export const a = 1;\n");

    let options = TranspileOptions {
        inputs: vec![root.join("src")],
        out_dir: root.join("output"),
        descriptor: root.join("input/serverless.yml"),
        ..TranspileOptions::default()
    };
    match run(&options, |_| {}) {
        Err(TranspileError::MissingDescriptor { help, .. }) => {
            assert!(help.contains("service: my-service-name"), "{help}");
        }
        other => panic!("expected a missing descriptor error, got {other:?}"),
    }
    assert!(!root.join("output").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(&root.join("input/serverless.yml"), DESCRIPTOR);
    write(
        &root.join("src/a.ts"),
        "/** $Fixed */\nexport function handler() {\n  return 1;\n}\n",
    );

    let options = TranspileOptions {
        inputs: vec![root.join("src")],
        out_dir: root.join("output"),
        descriptor: root.join("input/serverless.yml"),
        write_descriptor: Some(root.join("serverless.yml")),
        dry_run: true,
    };
    let report = run(&options, |_| {}).expect("run");
    assert_eq!(report.files.len(), 1);
    assert!(report.descriptor.contains("handler:"));
    assert!(!root.join("output").exists());
    assert!(!root.join("serverless.yml").exists());
}
