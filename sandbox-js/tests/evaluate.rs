mod common;

use common::eval;
use common::eval_in;
use common::thrown_name;
use sandbox_js::Budget;
use sandbox_js::Realm;
use sandbox_js::SandboxError;

#[test]
fn completion_value_of_last_statement() -> Result<(), SandboxError> {
  assert_eq!(eval("1; 2; if (true) {}")?, "2");
  assert_eq!(eval("var x = 5;")?, "undefined");
  assert_eq!(eval("'a' + 'b'")?, "\"ab\"");
  Ok(())
}

#[test]
fn declarations_persist_across_evaluations() -> Result<(), SandboxError> {
  let mut realm = Realm::new(Budget::default());
  eval_in(&mut realm, "function add(a, b) { return a + b; } var base = 10;")?;
  assert_eq!(eval_in(&mut realm, "add(base, 5)")?, "15");
  assert_eq!(eval_in(&mut realm, "base = add(base, 1); base")?, "11");
  assert_eq!(eval_in(&mut realm, "base")?, "11");
  Ok(())
}

#[test]
fn closures_and_recursion() -> Result<(), SandboxError> {
  assert_eq!(
    eval("function counter() { var n = 0; return function() { return ++n; }; } var c = counter(); c(); c(); c()")?,
    "3"
  );
  assert_eq!(eval("function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)")?, "610");
  assert_eq!(eval("var f = function g(n) { return n ? n * g(n - 1) : 1; }; f(5)")?, "120");
  assert_eq!(eval("var fns = []; for (let i = 0; i < 3; i++) fns.push(() => i); fns.map(f => f()).join()")?, "\"0,1,2\"");
  Ok(())
}

#[test]
fn hoisting_and_dead_zone() -> Result<(), SandboxError> {
  assert_eq!(eval("f(); function f() { return 1; }")?, "1");
  assert_eq!(eval("typeof v; var v = 1; typeof v")?, "\"number\"");
  assert_eq!(thrown_name("x; let x = 1;"), "ReferenceError");
  assert_eq!(thrown_name("const c = 1; c = 2;"), "TypeError");
  assert_eq!(eval("typeof notDeclared")?, "\"undefined\"");
  assert_eq!(thrown_name("notDeclared"), "ReferenceError");
  Ok(())
}

#[test]
fn control_flow() -> Result<(), SandboxError> {
  assert_eq!(eval("var s = 0; for (var i = 0; i < 10; i++) { if (i % 2) continue; s += i; } s")?, "20");
  assert_eq!(
    eval("var out = ''; outer: for (var a of [1, 2, 3]) { for (var b in [0, 1]) { if (a == 2) continue outer; if (a == 3) break outer; out += a + b; } } out")?,
    "\"1011\""
  );
  assert_eq!(eval("var n = 0; do { n++; } while (n < 5); n")?, "5");
  assert_eq!(
    eval("function f(x) { switch (x) { case 1: return 'one'; case 2: case 3: return 'few'; default: return 'many'; } } [f(1), f(3), f(9)].join()")?,
    "\"one,few,many\""
  );
  assert_eq!(eval("var r = ''; switch (2) { case 1: r += 'a'; case 2: r += 'b'; case 3: r += 'c'; break; case 4: r += 'd'; } r")?, "\"bc\"");
  Ok(())
}

#[test]
fn exceptions() -> Result<(), SandboxError> {
  assert_eq!(eval("try { throw new TypeError('bad'); } catch (e) { e.name + ': ' + e.message }")?, "\"TypeError: bad\"");
  assert_eq!(eval("var log = []; try { log.push(1); } finally { log.push(2); } log.join()")?, "\"1,2\"");
  assert_eq!(eval("function f() { try { return 1; } finally { return 2; } } f()")?, "2");
  assert_eq!(eval("try { null.x } catch ({ name }) { name }")?, "\"TypeError\"");
  assert_eq!(eval("try { undefinedFn() } catch (e) { e instanceof ReferenceError }")?, "true");
  assert!(matches!(eval("throw 42"), Err(SandboxError::Throw(_))));
  Ok(())
}

#[test]
fn objects_arrays_and_this() -> Result<(), SandboxError> {
  assert_eq!(eval("var o = { a: 1, get2() { return this.a + 1; } }; o.get2()")?, "2");
  assert_eq!(eval("function P(x) { this.x = x; } P.prototype.twice = function() { return this.x * 2; }; new P(4).twice()")?, "8");
  assert_eq!(eval("var a = [1, 2]; a[4] = 5; a.length")?, "5");
  assert_eq!(eval("var { a, b: [c, ...d] } = { a: 1, b: [2, 3, 4] }; a + c + d.length")?, "5");
  assert_eq!(eval("var x, y; [x, y] = [1, 2]; [x, y] = [y, x]; x * 10 + y")?, "21");
  assert_eq!(eval("var o = { x: 1 }; delete o.x; 'x' in o")?, "false");
  assert_eq!(eval("Math.max(...[1, 5, 3])")?, "5");
  assert_eq!(eval("`a${1 + 1}b${'c'}`")?, "\"a2bc\"");
  assert_eq!(eval("var o = null; o?.x ?? 'none'")?, "\"none\"");
  assert_eq!(eval("var n = 1; n ||= 2; var m = 0; m ||= 3; n + m")?, "4");
  Ok(())
}

#[test]
fn unsupported_constructs_are_reported() {
  assert!(matches!(eval("/a/.test('a')"), Err(SandboxError::Unsupported(_))));
  assert!(matches!(eval("class A {}"), Err(SandboxError::Unsupported(_))));
  assert!(matches!(eval("var"), Err(SandboxError::Syntax(_))));
}
