use syntax_js::ast::NodeId;
use syntax_js::error::SyntaxError;

/// A tree edit or lookup that the program's shape doesn't allow. These indicate unsupported
/// input, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
  #[error("node {0} fills a required slot and cannot be removed")]
  RequiredSlot(NodeId),

  #[error("the program root cannot be replaced")]
  RootReplaced,

  #[error("no scope was recorded for node {0}")]
  MissingScope(NodeId),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeobfuscateError {
  #[error("syntax error: {0}")]
  Syntax(#[from] SyntaxError),

  #[error("structural error: {0}")]
  Structural(#[from] StructuralError),

  /// Several nodes were offered as the replacement of a node held in a single-node slot.
  #[error("node {0} cannot be replaced by a list of nodes")]
  UnsupportedReplacement(NodeId),

  #[error("ran out of variable names")]
  Exhaustion,

  #[error("Identifier {0} has already been declared")]
  Redeclaration(String),
}

pub type DeobfuscateResult<T> = Result<T, DeobfuscateError>;
