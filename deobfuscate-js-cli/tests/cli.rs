use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn deobfuscate_js_cli() -> Command {
  let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deobfuscate-js-cli");
  cmd.timeout(Duration::from_secs(10)).env_remove("RUST_LOG");
  cmd
}

#[test]
fn reads_stdin_and_writes_stdout() {
  let assert = deobfuscate_js_cli()
    .write_stdin("var _0x1 = [10, 20, 30]; console.log(_0x1[1]);")
    .assert()
    .success()
    .code(0);

  assert_eq!(
    String::from_utf8_lossy(&assert.get_output().stdout),
    "console.log(20);"
  );
  assert!(
    assert.get_output().stderr.is_empty(),
    "expected stderr to be empty, got: {}",
    String::from_utf8_lossy(&assert.get_output().stderr)
  );
}

#[test]
fn writes_output_file_and_logs_when_verbose() {
  let dir = tempdir().unwrap();
  let input = dir.path().join("in.js");
  let output = dir.path().join("out.js");
  fs::write(&input, r#"console["log"]("a" + "b");"#).unwrap();

  let assert = deobfuscate_js_cli()
    .arg("-i")
    .arg(&input)
    .arg("-o")
    .arg(&output)
    .arg("--verbose")
    .assert()
    .success();

  assert!(assert.get_output().stdout.is_empty());
  assert_eq!(fs::read_to_string(&output).unwrap(), r#"console.log("ab");"#);
  let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
  assert!(
    stderr.contains(&format!("The output file {} has been created", output.display())),
    "missing creation message in stderr: {stderr}"
  );
}

#[test]
fn refuses_to_overwrite_without_force() {
  let dir = tempdir().unwrap();
  let output = dir.path().join("out.js");
  fs::write(&output, "original").unwrap();

  deobfuscate_js_cli()
    .arg("-o")
    .arg(&output)
    .write_stdin("f(1 + 1);")
    .assert()
    .failure()
    .code(1);
  assert_eq!(fs::read_to_string(&output).unwrap(), "original");

  deobfuscate_js_cli()
    .arg("-o")
    .arg(&output)
    .arg("--force")
    .write_stdin("f(1 + 1);")
    .assert()
    .success();
  assert_eq!(fs::read_to_string(&output).unwrap(), "f(2);");
}

#[test]
fn syntax_errors_fail_without_output() {
  let dir = tempdir().unwrap();
  let output = dir.path().join("out.js");

  let assert = deobfuscate_js_cli()
    .arg("-o")
    .arg(&output)
    .write_stdin("function {")
    .assert()
    .failure()
    .code(1);

  assert!(!output.exists());
  assert!(
    !assert.get_output().stderr.is_empty(),
    "expected stderr to describe the error"
  );
}

#[test]
fn config_file_disables_transforms() {
  let dir = tempdir().unwrap();
  let config = dir.path().join("config.json");
  fs::write(
    &config,
    r#"{"expressions": {"simplifyExpressions": false}, "miscellaneous": {"beautify": false}}"#,
  )
  .unwrap();

  let assert = deobfuscate_js_cli()
    .arg("-c")
    .arg(&config)
    .write_stdin("f(1 + 1);")
    .assert()
    .success();
  assert_eq!(
    String::from_utf8_lossy(&assert.get_output().stdout),
    "f(1+1);"
  );
}

#[test]
fn invalid_config_fails() {
  let dir = tempdir().unwrap();
  let config = dir.path().join("config.json");
  fs::write(&config, r#"{"arrays": {"unpackArrays": "yes"}}"#).unwrap();

  deobfuscate_js_cli()
    .arg("--config")
    .arg(&config)
    .write_stdin("f();")
    .assert()
    .failure()
    .code(1);
}

#[test]
fn module_flag_allows_imports() {
  deobfuscate_js_cli()
    .write_stdin(r#"import x from "y"; x();"#)
    .assert()
    .failure();

  let assert = deobfuscate_js_cli()
    .arg("--module")
    .write_stdin(r#"import x from "y"; x();"#)
    .assert()
    .success();
  let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
  assert!(stdout.contains("import x from"), "unexpected output: {stdout}");
}

#[test]
fn writes_name_mapping() {
  let dir = tempdir().unwrap();
  let mapping = dir.path().join("names.json");

  let assert = deobfuscate_js_cli()
    .arg("--mapping")
    .arg(&mapping)
    .write_stdin("var _0xabc = 1; function _0xdef(_0x1) { g(); return _0x1; } f(_0xabc, _0xdef);")
    .assert()
    .success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
  assert!(!stdout.contains("_0x"), "obfuscated names remain: {stdout}");
  let json: Value = serde_json::from_str(&fs::read_to_string(&mapping).unwrap()).unwrap();
  let root = json.as_object().unwrap();
  let originals: Vec<&str> = root
    .iter()
    .filter(|(k, _)| k.as_str() != "children")
    .map(|(_, v)| v.as_str().unwrap())
    .collect();
  assert_eq!(originals.len(), 2);
  assert!(originals.contains(&"_0xabc"));
  assert!(originals.contains(&"_0xdef"));
  assert!(json["children"].is_array());
}
