mod common;

use common::bare_config;
use common::full_config;
use common::run;
use deobfuscate_js::deobfuscate_with_mapping;
use deobfuscate_js::passes::rename::is_obfuscated;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use syntax_js::parse;
use syntax_js::ParseOptions;

const LAYERED: &str = r#"
  var _0x4e = ['push', 'length', 'Hello', 'fromCharCode'];
  function _0x1a(_0x2, _0x3) { return _0x2 < _0x3; }
  function _0x1b(_0x2) { return _0x2 * 2; }
  var _0x9 = [];
  for (var _0x5 = 0; _0x1a(_0x5, 3); _0x5++) {
    _0x9[_0x4e[0]](_0x1b(_0x5));
  }
  if ('a' == 'a') {
    console.log(_0x9[_0x4e[1]], _0x4e[2]);
  }
  function _0x77(_0x8) {
    let _0x6 = _0x8 + 1;
    { let _0x6 = 2; _0x8 += _0x6; }
    return [_0x6, _0x8];
  }
  _0x77(String.fromCharCode(65));
"#;

#[test]
fn second_run_is_a_no_op() {
  let config = full_config();
  let once = run(LAYERED, &config);
  assert_eq!(run(&once, &config), once);
}

#[test]
fn idempotent_without_renaming() {
  let mut config = full_config();
  config.miscellaneous.rename_hex_identifiers = false;
  for source in [
    "if (1 === 1) { f(); } else { g(); }",
    "var _0x1=[10,20,30]; console.log(_0x1[1], _0x1[7], _0x1[i]);",
    "function a(x){return b(x);} function b(x){return a(x);} a(1);",
    "x = 'dlroW'.split('').reverse().join('') + -5 - -3;",
  ] {
    let once = run(source, &config);
    assert_eq!(run(&once, &config), once, "{source}");
  }
}

fn collect_names(node: &Node, out: &mut Vec<String>) {
  if let Syntax::IdPat { name } | Syntax::IdExpr { name } = node.stx.as_ref() {
    out.push(name.clone());
  }
  for child in node.children() {
    collect_names(child, out);
  }
}

/// Names declared directly in each scope-creating node, per node.
fn declared_per_scope(node: &Node, out: &mut Vec<Vec<String>>) {
  let scoped = matches!(
    node.stx.as_ref(),
    Syntax::Program { .. } | Syntax::BlockStmt { .. } | Syntax::FuncDecl { .. }
  );
  if scoped {
    let mut names = Vec::new();
    for child in node.children() {
      if let Syntax::VarDecl { declarators, .. } = child.stx.as_ref() {
        for d in declarators {
          if let Syntax::VarDeclarator { target, .. } = d.stx.as_ref() {
            collect_names(target, &mut names);
          }
        }
      }
    }
    out.push(names);
  }
  for child in node.children() {
    declared_per_scope(child, out);
  }
}

#[test]
fn renaming_leaves_no_obfuscated_names_and_no_duplicates() {
  let mut config = bare_config();
  config.miscellaneous.rename_hex_identifiers = true;
  let out = deobfuscate_with_mapping(LAYERED, &config).unwrap();
  let program = parse(&out.code, ParseOptions::default()).unwrap();

  let mut names = Vec::new();
  collect_names(&program, &mut names);
  assert!(names.iter().all(|n| !is_obfuscated(n)), "{}", out.code);
  for reserved in ["console", "String", "log", "if", "for"] {
    assert!(out.name_mapping.as_ref().unwrap().original(reserved).is_none());
  }

  let mut scopes = Vec::new();
  declared_per_scope(&program, &mut scopes);
  for mut declared in scopes {
    let len = declared.len();
    declared.sort();
    declared.dedup();
    assert_eq!(declared.len(), len, "{}", out.code);
  }

  let mapping = out.name_mapping.unwrap();
  // `_0x4e`, `_0x1a`, `_0x1b`, `_0x9`, `_0x5` and `_0x77` globally, then three parameters of
  // the proxies, and `_0x8` plus both `_0x6` in `_0x77`.
  assert_eq!(mapping.renamed.len(), 6);
  assert_eq!(mapping.len(), 12);
}

#[test]
fn renaming_is_reproducible_per_seed() {
  let mut config = bare_config();
  config.miscellaneous.rename_hex_identifiers = true;
  config.miscellaneous.rename_seed = 42;
  let first = run(LAYERED, &config);
  assert_eq!(run(LAYERED, &config), first);
}

#[test]
fn cyclic_chains_are_left_alone() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  let source = "function a(x){return b(x);}function b(x){return c(x);}function c(x){return a(x);}\
                function d(x){return a(x);}d(1);";
  let out = run(source, &config);
  assert!(out.starts_with(
    "function a(x){return b(x);}function b(x){return c(x);}function c(x){return a(x);}"
  ));
  // `d` leads into the cycle, so it isn't inlined either.
  assert!(out.ends_with("d(1);"), "{out}");
}

#[test]
fn acyclic_chains_inline_fully() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  let out = run(
    "function a(x,y){return b(y,x);}function b(p,q){return p-q;}log(a(1,g()));",
    &config,
  );
  assert_eq!(out, "log(g()-1);");
}

#[test]
fn shadowed_proxies_are_not_inlined() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  let out = run(
    "function p(x){return x+1;}function f(q){var p=q;return p(2);}log(p(1),f(g));",
    &config,
  );
  assert_eq!(out, "function f(q){var p=q;return p(2);}log(1+1,f(g));");
}

#[test]
fn fully_inlined_aliases_are_removed() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  assert_eq!(
    run("function f(a){return a+1;}var g=f;log(g(2));", &config),
    "log(2+1);"
  );
}

#[test]
fn aliases_with_calls_left_are_kept() {
  let mut config = bare_config();
  config.proxy_functions.replace_proxy_functions = true;
  config.proxy_functions.remove_proxy_functions = true;
  assert_eq!(
    run("function f(a){return a+1;}var g=f;log(g(...xs),g(3));", &config),
    "function f(a){return a+1;}var g=f;log(g(...xs),3+1);"
  );
  // `x` means something else inside `h`, so `g(1)` can't be inlined there.
  assert_eq!(
    run(
      "var x=1;function f(a){return x+a;}function h(){var x=2;var g=f;return g(1);}log(f(1),h());",
      &config,
    ),
    "var x=1;function f(a){return x+a;}function h(){var x=2;var g=f;return g(1);}log(x+1,h());"
  );
}

#[test]
fn written_arrays_are_not_unpacked() {
  let mut config = bare_config();
  config.arrays.unpack_arrays = true;
  config.arrays.remove_arrays = true;
  assert_eq!(
    run("var a=[1,2];a[0]=5;log(a[0],a[1]);", &config),
    "var a=[1,2];a[0]=5;log(a[0],a[1]);"
  );
}

#[test]
fn mutated_or_escaping_arrays_are_not_unpacked() {
  let mut config = bare_config();
  config.arrays.unpack_arrays = true;
  config.arrays.remove_arrays = true;
  for source in [
    "var a=[1,2];a.reverse();log(a[0]);",
    "var a=[1,2];a.push(3);log(a[2]);",
    "var a=[1,2];f(a);log(a[0]);",
    "var a=[1,2];var b=a;b[0]=5;log(a[0]);",
  ] {
    assert_eq!(run(source, &config), source);
  }
  assert_eq!(
    run("var a=[1,2];log(a.length,a[i],a[1]);", &config),
    "var a=[1,2];log(a.length,a[i],2);"
  );
}

#[test]
fn unpacking_reveals_nested_arrays() {
  let mut config = bare_config();
  config.arrays.unpack_arrays = true;
  config.arrays.remove_arrays = true;
  assert_eq!(
    run("var a=['x','y'];var b=[a[1],a[0]];log(b[0]+b[1]);", &config),
    "log(\"y\"+\"x\");"
  );
}
