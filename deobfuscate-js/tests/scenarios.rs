mod common;

use common::bare_config;
use common::full_config;
use common::run;
use deobfuscate_js::deobfuscate;
use deobfuscate_js::Config;

#[test]
fn unpacks_literal_array() {
  let mut config = bare_config();
  config.arrays.unpack_arrays = true;
  config.arrays.remove_arrays = true;
  assert_eq!(
    run("var _0x1=[10,20,30]; console.log(_0x1[1]);", &config),
    "console.log(20);"
  );
}

#[test]
fn inlines_and_folds_proxy() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  config.expressions.simplify_expressions = true;
  assert_eq!(
    run("function _0xabc(a,b){return a+b;} console.log(_0xabc(1,2));", &config),
    "console.log(3);"
  );
}

#[test]
fn keeps_cyclic_proxies() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  assert_eq!(
    run("function a(x){return b(x);} function b(x){return a(x);}", &config),
    "function a(x){return b(x);}function b(x){return a(x);}"
  );
}

#[test]
fn removes_dead_branch_after_folding() {
  let mut config = bare_config();
  config.expressions.simplify_expressions = true;
  config.expressions.remove_dead_branches = true;
  assert_eq!(run("if (1 === 1) { f(); } else { g(); }", &config), "f();");
}

#[test]
fn decodes_char_codes() {
  let mut config = bare_config();
  config.expressions.undo_string_operations = true;
  // A leading string statement is parenthesized so it can't read as a directive.
  assert_eq!(run("String.fromCharCode(72,105)", &config), "(\"Hi\");");
}

#[test]
fn decodes_reversed_strings() {
  let mut config = bare_config();
  config.expressions.undo_string_operations = true;
  assert_eq!(
    run(r#"x = "dlroW olleH".split("").reverse().join("");"#, &config),
    r#"x="Hello World";"#
  );
}

#[test]
fn decodes_xor_idiom() {
  let mut config = bare_config();
  config.expressions.undo_string_operations = true;
  let source = r#"
    function _0xd(s, k) {
      k = 7;
      var out = "", codes = s.split("."), i;
      codes.pop();
      for (i = 0; i < codes.length; i++) {
        out += String.fromCharCode(codes[i] ^ k);
      }
      return out;
    }
    log(_0xd("79.98.107.107.104."));
  "#;
  assert_eq!(run(source, &config), r#"log("Hello");"#);
}

#[test]
fn keeps_xor_decoder_with_dynamic_calls() {
  let mut config = bare_config();
  config.expressions.undo_string_operations = true;
  let source = r#"
    function _0xd(s, k) {
      k = 7;
      var out = "", codes = s.split("."), i;
      codes.pop();
      for (i = 0; i < codes.length; i++) {
        out += String.fromCharCode(codes[i] ^ k);
      }
      return out;
    }
    log(_0xd("79.98."), _0xd(input));
  "#;
  let out = run(source, &config);
  assert!(out.starts_with("function _0xd(s,k){"), "{out}");
  assert!(out.ends_with(r#"log("He",_0xd(input));"#), "{out}");
}

#[test]
fn pretty_output_by_default() {
  let mut config = Config::default();
  config.miscellaneous.rename_hex_identifiers = false;
  assert_eq!(
    deobfuscate("var _0x1=['log','hi']; console[_0x1[0]](_0x1[1]);", &config).unwrap(),
    "console.log(\"hi\");"
  );
}

#[test]
fn full_pipeline_on_layered_obfuscation() {
  let source = r#"
    var _0x5a1b = ['\x6c\x6f\x67', 'Hello', 'World'];
    function _0x2c(_0x1, _0x2) { return _0x1 + _0x2; }
    function _0x3d(_0x1) { return _0x5a1b[_0x1]; }
    if (!![]) {
      console[_0x5a1b[0]](_0x2c(_0x5a1b[1], ' ' + _0x5a1b[2]));
    } else {
      console['error']('unreachable');
    }
  "#;
  assert_eq!(run(source, &full_config()), r#"console.log("Hello World");"#);
}

#[test]
fn syntax_errors_are_fatal() {
  assert!(deobfuscate("var = ;", &full_config()).is_err());
}

#[test]
fn module_exports_keep_their_names() {
  let source = "import { _0x1 } from 'm'; export const _0x2 = _0x1; const _0x3 = _0x2;";
  let mut config = full_config();
  config.is_module = true;
  let out = run(source, &config);
  assert!(out.contains("_0x1 as "), "{out}");
  assert!(out.contains("export const _0x2="), "{out}");
  assert!(!out.contains("_0x3"), "{out}");
}
