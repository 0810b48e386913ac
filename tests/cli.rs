use assert_cmd::Command;
use predicates::prelude::*;

const LIB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/lib.json");

fn cli() -> Command {
    Command::cargo_bin("type-schema").unwrap()
}

#[test]
fn schema_prints_json() {
    let output = cli()
        .args(["schema", "--input", LIB, "--type", "Array<string>"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value, serde_json::json!({ "type": "array", "items": { "type": "string" } }));
}

#[test]
fn expr_prints_an_export() {
    cli()
        .args(["expr", "-i", LIB, "-t", "Date", "--export", "DateSchema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export const DateSchema = {\n  $ref: \"runtime#date\"\n};"));
}

#[test]
fn generics_flag_switches_substitution() {
    cli()
        .args(["schema", "-i", LIB, "-t", "Box<string>", "--generics", "instantiated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"string\""));
}

#[test]
fn later_documents_override_earlier_ids() {
    let dir = tempfile::tempdir().unwrap();
    let patch = dir.path().join("patch.json");
    std::fs::write(
        &patch,
        r#"{ "graph": { "types": { "Foo": { "kind": "intrinsic", "name": "boolean" } } } }"#,
    )
    .unwrap();
    let out = dir.path().join("out/foo.json");

    // the pointer applies to every input, so wrap the fixture too
    let wrapped = dir.path().join("lib.json");
    let lib: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(LIB).unwrap()).unwrap();
    std::fs::write(&wrapped, serde_json::json!({ "graph": lib }).to_string()).unwrap();

    cli()
        .args(["schema", "--json-pointer", "/graph", "-t", "Foo", "--out"])
        .arg(&out)
        .arg("--input")
        .arg(&wrapped)
        .arg(&patch)
        .assert()
        .success();

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(written, serde_json::json!({ "type": "boolean" }));
}

#[test]
fn unknown_type_reference_fails() {
    cli()
        .args(["schema", "-i", LIB, "-t", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nope"));
}

#[test]
fn unmatched_glob_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.json", dir.path().display());
    cli()
        .args(["schema", "-t", "Foo", "-i", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("glob pattern matched no files"));
}
