mod util;

use util::compact;

#[test]
fn keeps_required_parentheses_only() {
  assert_eq!(compact("(a + b) * c;"), "(a+b)*c;");
  assert_eq!(compact("a + (b * c);"), "a+b*c;");
  assert_eq!(compact("a - (b - c);"), "a-(b-c);");
  assert_eq!(compact("(a - b) - c;"), "a-b-c;");
  assert_eq!(compact("x = (y = z);"), "x=y=z;");
  assert_eq!(compact("(a, b) ? c : d;"), "(a,b)?c:d;");
  assert_eq!(compact("f((a, b));"), "f((a,b));");
}

#[test]
fn exponentiation_operands() {
  assert_eq!(compact("(-a) ** b;"), "(-a)**b;");
  assert_eq!(compact("a ** -b;"), "a**-b;");
  assert_eq!(compact("(a ** b) ** c;"), "(a**b)**c;");
  assert_eq!(compact("a ** (b ** c);"), "a**b**c;");
}

#[test]
fn nullish_mixed_with_logical() {
  assert_eq!(compact("a ?? (b || c);"), "a??(b||c);");
  assert_eq!(compact("(a && b) ?? c;"), "(a&&b)??c;");
}

#[test]
fn adjacent_sign_operators_stay_separate() {
  assert_eq!(compact("a + +b;"), "a+ +b;");
  assert_eq!(compact("a - -b;"), "a- -b;");
  assert_eq!(compact("a - --b;"), "a- --b;");
  assert_eq!(compact("a++ + b;"), "a++ +b;");
}

#[test]
fn word_operators() {
  assert_eq!(compact("typeof x === 'string';"), "typeof x===\"string\";");
  assert_eq!(compact("void 0;"), "void 0;");
  assert_eq!(compact("delete a[b];"), "delete a[b];");
  assert_eq!(compact("a instanceof B;"), "a instanceof B;");
}

#[test]
fn new_callees() {
  assert_eq!(compact("new (foo())();"), "new(foo())();");
  assert_eq!(compact("new (a().b)();"), "new(a().b)();");
  assert_eq!(compact("new foo.bar(1);"), "new foo.bar(1);");
  assert_eq!(compact("new X;"), "new X();");
  assert_eq!(compact("new X().y;"), "new X().y;");
}

#[test]
fn member_receivers() {
  assert_eq!(compact("(1).toString();"), "(1).toString();");
  assert_eq!(compact("a?.b?.[c]?.(d);"), "a?.b?.[c]?.(d);");
  assert_eq!(compact("(a + b).c;"), "(a+b).c;");
  assert_eq!(compact("(async () => {})();"), "(async()=>{})();");
}
