//! Prints a program tree produced by `syntax-js` back to JavaScript source.
//!
//! The printer never sees the original source text: parentheses are derived from operator
//! precedence and a handful of syntactic hazards, and string literals are always re-quoted with
//! double quotes. Printing the output again after parsing it yields identical text.

use emitter::Emitter;
use syntax_js::ast::node::Node;

mod emitter;
pub mod escape;
mod expr;
pub mod precedence;
mod stmt;
mod stmt_start;

#[derive(Clone, Copy, Default, Debug)]
pub struct PrintOptions {
  /// Indented multi-line output with spaces around operators. Otherwise whitespace is kept to
  /// the minimum needed to separate tokens.
  pub pretty: bool,
}

pub(crate) struct Printer {
  out: Emitter,
}

impl Printer {
  fn new(options: PrintOptions) -> Printer {
    Printer {
      out: Emitter::new(options.pretty),
    }
  }
}

/// Prints a `Program`, or any single statement or expression node.
pub fn print(node: &Node, options: PrintOptions) -> String {
  let mut p = Printer::new(options);
  p.print_node(node);
  p.out.into_string()
}
