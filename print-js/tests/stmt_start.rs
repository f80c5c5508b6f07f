mod util;

use util::compact;

#[test]
fn object_literal_at_statement_start() {
  assert_eq!(compact("({}).toString();"), "({}.toString());");
  assert_eq!(compact("({a} = b);"), "({a}=b);");
}

#[test]
fn function_at_statement_start() {
  assert_eq!(compact("(function () {})();"), "(function(){}());");
  assert_eq!(compact("(class {}).name;"), "(class{}.name);");
}

#[test]
fn arrow_body_object_literal() {
  assert_eq!(compact("x => ({a: 1});"), "(x)=>({a:1});");
  assert_eq!(compact("x => ({}).a;"), "(x)=>({}.a);");
}

#[test]
fn string_statement_is_not_a_directive() {
  assert_eq!(
    compact("'use strict'; ('not a directive');"),
    "\"use strict\";(\"not a directive\");"
  );
}
