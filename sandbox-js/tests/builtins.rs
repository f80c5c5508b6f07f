mod common;

use common::eval;
use common::thrown_name;
use sandbox_js::SandboxError;

#[test]
fn string_methods() -> Result<(), SandboxError> {
  assert_eq!(eval("String.fromCharCode(72, 101, 108, 108, 111)")?, "\"Hello\"");
  assert_eq!(eval("'dlroW olleH'.split('').reverse().join('')")?, "\"Hello World\"");
  assert_eq!(eval("'abc'.charCodeAt(1) + 'abc'.charAt(2)")?, "\"98c\"");
  assert_eq!(eval("'a,b,,c'.split(',', 3).length")?, "3");
  assert_eq!(eval("'hello'.slice(-3, -1) + 'hello'.substring(3, 1) + 'hello'.substr(1, 2)")?, "\"llelel\"");
  assert_eq!(eval("'aXbX'.replace('X', '[$&]')")?, "\"a[X]bX\"");
  assert_eq!(eval("'abc'.replace('b', function(m, i) { return m.toUpperCase() + i; })")?, "\"aB1c\"");
  assert_eq!(eval("'  pad '.trim().padStart(5, '*')")?, "\"**pad\"");
  assert_eq!(eval("'ab'.repeat(3).lastIndexOf('ab')")?, "4");
  assert_eq!(eval("'Hello'.startsWith('He') && 'Hello'.endsWith('lo') && 'Hello'.includes('ll')")?, "true");
  assert_eq!(thrown_name("'a'.repeat(-1)"), "RangeError");
  Ok(())
}

#[test]
fn array_methods() -> Result<(), SandboxError> {
  assert_eq!(eval("var a = [1, 2, 3]; a.push(4); a.shift(); a.unshift(0); a.join('-')")?, "\"0-2-3-4\"");
  assert_eq!(eval("var a = [1, 2, 3, 4]; var r = a.splice(1, 2, 'x'); a.join() + '|' + r.join()")?, "\"1,x,4|2,3\"");
  assert_eq!(eval("[1, 2, 3].map(x => x * 2).filter(x => x > 2).reduce((a, b) => a + b)")?, "10");
  assert_eq!(eval("[1, [2, [3]]].concat([4], 5).length")?, "4");
  assert_eq!(eval("[NaN].includes(NaN) + ',' + [NaN].indexOf(NaN)")?, "\"true,-1\"");
  assert_eq!(eval("Array.isArray([]) && !Array.isArray({})")?, "true");
  assert_eq!(eval("var s = 0; [1, 2, 3].forEach(function(x) { s += x; }); s")?, "6");
  assert_eq!(eval("String([1, [2, 3], null])")?, "\"1,2,3,\"");
  assert_eq!(eval("Object.keys({ b: 1, 2: 0, a: 1, 1: 0 }).join()")?, "\"1,2,b,a\"");
  assert_eq!(thrown_name("[].reduce((a, b) => a)"), "TypeError");
  Ok(())
}

#[test]
fn number_and_global_functions() -> Result<(), SandboxError> {
  assert_eq!(eval("(255).toString(16) + (5).toString(2)")?, "\"ff101\"");
  assert_eq!(eval("parseInt('0x1f') + parseInt('12px', 10) + parseFloat('.5e1')")?, "48");
  assert_eq!(eval("isNaN('abc') && isFinite('12') && !isFinite(Infinity)")?, "true");
  assert_eq!(eval("Number('  12 ') + Number('') + Number(true)")?, "13");
  assert_eq!(eval("Boolean('') || String(null)")?, "\"null\"");
  assert_eq!(eval("encodeURIComponent('a b&é')")?, "\"a%20b%26%C3%A9\"");
  assert_eq!(eval("decodeURIComponent('%E2%9C%93ok')")?, "\"✓ok\"");
  assert_eq!(thrown_name("decodeURIComponent('%E2%9C')"), "URIError");
  assert_eq!(thrown_name("(1).toString(40)"), "RangeError");
  Ok(())
}

#[test]
fn math_and_function_helpers() -> Result<(), SandboxError> {
  assert_eq!(eval("Math.floor(-1.5) + Math.ceil(1.2) + Math.round(2.5) + Math.abs(-4)")?, "7");
  assert_eq!(eval("Math.pow(2, 10) + Math.sqrt(16) + Math.trunc(-3.7) + Math.sign(-2)")?, "1024");
  assert_eq!(eval("Math.min() + ',' + Math.max()")?, "\"Infinity,-Infinity\"");
  assert_eq!(eval("function f(a, b) { return this.k + a + b; } f.call({ k: 1 }, 2, 3) + f.apply({ k: 10 }, [20, 30])")?, "66");
  assert_eq!(eval("({}).hasOwnProperty.call({ a: 1 }, 'a')")?, "true");
  Ok(())
}

#[test]
fn host_dependent_globals_are_absent() {
  assert_eq!(thrown_name("Math.random()"), "TypeError");
  assert_eq!(thrown_name("Date.now()"), "ReferenceError");
}
