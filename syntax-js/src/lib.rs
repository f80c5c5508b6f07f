use ast::node::Node;
use error::SyntaxResult;
use lex::Lexer;
use parse::Parser;

pub mod ast;
pub mod char;
pub mod error;
pub mod lex;
pub mod loc;
pub mod num;
pub mod operator;
pub mod parse;
pub mod token;

pub use parse::lit::decode_escapes;

#[derive(Clone, Copy, Default, Debug)]
pub struct ParseOptions {
  /// Parse as an ES module: `import`/`export` are allowed and `await` is reserved.
  pub is_module: bool,
}

/// Parses a whole program into a `Program` node.
pub fn parse(source: &str, options: ParseOptions) -> SyntaxResult<Node> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  parser.top_level(options.is_module)
}

/// Parses a single expression, which must span the entire source.
pub fn parse_expression(source: &str) -> SyntaxResult<Node> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer);
  parser.standalone_expr()
}
