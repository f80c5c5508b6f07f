mod util;

use print_js::print;
use print_js::PrintOptions;
use syntax_js::ast::syntax::Syntax;
use syntax_js::parse;
use syntax_js::ParseOptions;
use util::compact;
use util::pretty;
use util::pretty_module;

#[test]
fn control_flow() {
  assert_eq!(
    compact("for (var i = (a in b); i < 1; i++);"),
    "for(var i=(a in b);i<1;i++);"
  );
  assert_eq!(compact("for (const x of xs) {}"), "for(const x of xs){}");
  assert_eq!(compact("for (x in y);"), "for(x in y);");
  assert_eq!(
    compact("switch (a) { case 1: b(); break; default: c(); }"),
    "switch(a){case 1:b();break;default:c();}"
  );
  assert_eq!(
    compact("try { a(); } catch (e) { b(); } finally { c(); }"),
    "try{a();}catch(e){b();}finally{c();}"
  );
  assert_eq!(compact("try {} catch {}"), "try{}catch{}");
  assert_eq!(compact("outer: for (;;) { break outer; }"), "outer:for(;;){break outer;}");
  assert_eq!(compact("do x(); while (a)"), "do x();while(a);");
}

#[test]
fn dangling_else_gets_a_block() {
  let mut program = parse("if (a) if (b) c(); else d();", ParseOptions::default()).unwrap();
  let Syntax::Program { body, .. } = program.stx.as_mut() else {
    panic!("expected program");
  };
  let Syntax::IfStmt {
    consequent,
    alternate,
    ..
  } = body[0].stx.as_mut()
  else {
    panic!("expected if statement");
  };
  let Syntax::IfStmt {
    alternate: inner_alternate,
    ..
  } = consequent.stx.as_mut()
  else {
    panic!("expected nested if statement");
  };
  *alternate = inner_alternate.take();
  assert_eq!(
    print(&program, PrintOptions::default()),
    "if(a){if(b)c();}else d();"
  );
}

#[test]
fn functions_and_classes() {
  assert_eq!(
    compact("async function* f(a, b = 1, ...c) { 'use strict'; yield* g(); }"),
    "async function*f(a,b=1,...c){\"use strict\";yield*g();}"
  );
  assert_eq!(
    compact("class A extends B { static x = 1; #y; get z() { return this.#y; } static { init(); } }"),
    "class A extends B{static x=1;#y;get z(){return this.#y;}static{init();}}"
  );
  assert_eq!(
    compact("x = { get a() { return 1; }, async *b() {}, [c]: d, 'e-f': 1 };"),
    "x={get a(){return 1;},async*b(){},[c]:d,\"e-f\":1};"
  );
  assert_eq!(
    compact("const { a, b: c, d = 1, ...e } = f;"),
    "const{a,b:c,d=1,...e}=f;"
  );
}

#[test]
fn literals() {
  assert_eq!(compact("x = 'it\\'s \"q\"';"), "x=\"it's \\\"q\\\"\";");
  assert_eq!(compact("x = 0x10 + 1e21 + .5;"), "x=16+1e+21+0.5;");
  assert_eq!(compact("x = -0;"), "x=-0;");
  assert_eq!(compact("x = `a${b}c`;"), "x=`a${b}c`;");
  assert_eq!(compact("tag`x${y}`;"), "tag`x${y}`;");
  assert_eq!(compact("x = /ab+c/gi.test(s);"), "x=/ab+c/gi.test(s);");
  assert_eq!(compact("x = [, a, , ];"), "x=[,a,,];");
  assert_eq!(compact("x = 10n;"), "x=10n;");
}

#[test]
fn pretty_blocks() {
  assert_eq!(
    pretty("function f(a) { if (a) { return 1; } else { return 2; } }"),
    "function f(a) {\n  if (a) {\n    return 1;\n  } else {\n    return 2;\n  }\n}"
  );
  assert_eq!(pretty("x = {a: 1, b};"), "x = {\n  a: 1,\n  b\n};");
  assert_eq!(pretty("for (let i = 0; i < n; i++) f(i);"), "for (let i = 0; i < n; i++) f(i);");
}

#[test]
fn pretty_modules() {
  assert_eq!(
    pretty_module(
      "import a, { b as c, d } from 'm'; export { c as e }; export default function () {} export * as ns from 'n';"
    ),
    "import a, {b as c, d} from \"m\";\nexport {c as e};\nexport default function() {}\nexport * as ns from \"n\";"
  );
  assert_eq!(pretty_module("import 'side-effect';"), "import \"side-effect\";");
}
