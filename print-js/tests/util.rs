use print_js::print;
use print_js::PrintOptions;
use syntax_js::parse;
use syntax_js::ParseOptions;

pub fn print_source(source: &str, is_module: bool, pretty: bool) -> String {
  let program = parse(source, ParseOptions { is_module }).expect("parse source");
  print(&program, PrintOptions { pretty })
}

/// Prints compactly, then checks the output reparses and prints to the same text.
pub fn compact(source: &str) -> String {
  let out = print_source(source, false, false);
  let again = print_source(&out, false, false);
  assert_eq!(again, out, "printing is not stable for {source:?}");
  out
}

pub fn pretty(source: &str) -> String {
  let out = print_source(source, false, true);
  let again = print_source(&out, false, true);
  assert_eq!(again, out, "printing is not stable for {source:?}");
  out
}

pub fn pretty_module(source: &str) -> String {
  let out = print_source(source, true, true);
  let again = print_source(&out, true, true);
  assert_eq!(again, out, "printing is not stable for {source:?}");
  out
}
