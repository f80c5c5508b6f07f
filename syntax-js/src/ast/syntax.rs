use crate::ast::node::Node;
use crate::operator::OperatorName;
use derive_visitor::Drive;
use derive_visitor::DriveMut;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VarDeclKind {
  Const,
  Let,
  Var,
}

impl VarDeclKind {
  pub fn keyword(self) -> &'static str {
    match self {
      VarDeclKind::Const => "const",
      VarDeclKind::Let => "let",
      VarDeclKind::Var => "var",
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PropKind {
  // `a: b`, `"a": b`, `[a]: b`.
  Init,
  // `a`, or `a = b` inside a destructuring assignment.
  Shorthand,
  Method,
  Getter,
  Setter,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClassMemberKind {
  Method,
  Getter,
  Setter,
  Field,
  StaticBlock,
}

/// Shared shape of function declarations, function expressions, arrow functions and methods.
#[derive(Drive, DriveMut, Clone, Debug)]
pub struct Func {
  /// `IdPat` binding the function's own name.
  pub name: Option<Node>,
  pub params: Vec<Node>,
  /// A `BlockStmt`, or any expression for a concise arrow body.
  pub body: Node,
  /// Cooked values of the directive prologue, e.g. `use strict`.
  #[drive(skip)]
  pub directives: Vec<String>,
  #[drive(skip)]
  pub is_async: bool,
  #[drive(skip)]
  pub is_generator: bool,
  #[drive(skip)]
  pub is_arrow: bool,
}

impl Func {
  pub fn has_expression_body(&self) -> bool {
    !matches!(self.body.stx.as_ref(), Syntax::BlockStmt { .. })
  }
}

#[derive(Drive, DriveMut, Clone, Debug)]
pub struct Class {
  pub name: Option<Node>,
  pub extends: Option<Node>,
  pub members: Vec<Node>,
}

/// Every syntactic construct of the program tree.
///
/// Identifiers come in three flavours: `IdExpr` is a reference (including a plain assignment
/// target), `IdPat` declares a binding, and `PropKey` is a property name that never refers to a
/// binding.
#[derive(Drive, DriveMut, Clone, Debug)]
pub enum Syntax {
  Program {
    body: Vec<Node>,
    #[drive(skip)]
    directives: Vec<String>,
    #[drive(skip)]
    is_module: bool,
  },

  BlockStmt {
    body: Vec<Node>,
  },
  BreakStmt {
    #[drive(skip)]
    label: Option<String>,
  },
  ClassDecl {
    class: Class,
  },
  ContinueStmt {
    #[drive(skip)]
    label: Option<String>,
  },
  DebuggerStmt {},
  DoWhileStmt {
    body: Node,
    test: Node,
  },
  EmptyStmt {},
  ExprStmt {
    expr: Node,
  },
  ForInStmt {
    // A `VarDecl` without initializer, or an assignment target.
    left: Node,
    right: Node,
    body: Node,
  },
  ForOfStmt {
    #[drive(skip)]
    is_await: bool,
    left: Node,
    right: Node,
    body: Node,
  },
  ForStmt {
    init: Option<Node>,
    test: Option<Node>,
    update: Option<Node>,
    body: Node,
  },
  FuncDecl {
    func: Func,
  },
  IfStmt {
    test: Node,
    consequent: Node,
    alternate: Option<Node>,
  },
  LabelStmt {
    #[drive(skip)]
    name: String,
    body: Node,
  },
  ReturnStmt {
    value: Option<Node>,
  },
  SwitchStmt {
    discriminant: Node,
    cases: Vec<Node>,
  },
  SwitchCase {
    // None for `default:`.
    test: Option<Node>,
    body: Vec<Node>,
  },
  ThrowStmt {
    value: Node,
  },
  TryStmt {
    block: Node,
    handler: Option<Node>,
    finalizer: Option<Node>,
  },
  CatchClause {
    param: Option<Node>,
    body: Node,
  },
  VarDecl {
    #[drive(skip)]
    kind: VarDeclKind,
    declarators: Vec<Node>,
  },
  VarDeclarator {
    target: Node,
    init: Option<Node>,
  },
  WhileStmt {
    test: Node,
    body: Node,
  },
  WithStmt {
    object: Node,
    body: Node,
  },

  ImportDecl {
    default: Option<Node>,
    namespace: Option<Node>,
    named: Vec<Node>,
    #[drive(skip)]
    source: String,
  },
  ImportSpecifier {
    #[drive(skip)]
    imported: String,
    local: Node,
  },
  ExportAll {
    #[drive(skip)]
    alias: Option<String>,
    #[drive(skip)]
    source: String,
  },
  ExportDecl {
    decl: Node,
  },
  ExportDefaultExpr {
    value: Node,
  },
  ExportNamed {
    specifiers: Vec<Node>,
    #[drive(skip)]
    source: Option<String>,
  },
  ExportSpecifier {
    local: Node,
    #[drive(skip)]
    exported: String,
  },

  ArrHole {},
  ArrowFunc {
    func: Func,
  },
  AwaitExpr {
    argument: Node,
  },
  BinaryExpr {
    #[drive(skip)]
    operator: OperatorName,
    left: Node,
    right: Node,
  },
  CallExpr {
    callee: Node,
    arguments: Vec<Node>,
    #[drive(skip)]
    optional: bool,
  },
  ClassExpr {
    class: Class,
  },
  ClassMember {
    key: Node,
    value: Option<Node>,
    #[drive(skip)]
    computed: bool,
    #[drive(skip)]
    is_static: bool,
    #[drive(skip)]
    kind: ClassMemberKind,
  },
  ComputedMemberExpr {
    object: Node,
    member: Node,
    #[drive(skip)]
    optional: bool,
  },
  CondExpr {
    test: Node,
    consequent: Node,
    alternate: Node,
  },
  FuncExpr {
    func: Func,
  },
  IdExpr {
    #[drive(skip)]
    name: String,
  },
  IdPat {
    #[drive(skip)]
    name: String,
  },
  ImportCall {
    argument: Node,
  },
  ImportMeta {},
  LitArr {
    elements: Vec<Node>,
  },
  LitBigInt {
    #[drive(skip)]
    raw: String,
  },
  LitBool {
    #[drive(skip)]
    value: bool,
  },
  LitNull {},
  LitNum {
    #[drive(skip)]
    value: f64,
  },
  LitObj {
    props: Vec<Node>,
  },
  LitRegex {
    #[drive(skip)]
    pattern: String,
    #[drive(skip)]
    flags: String,
  },
  LitStr {
    #[drive(skip)]
    value: String,
  },
  LitTemplate {
    // Raw text between substitutions; always one more than `exprs`.
    #[drive(skip)]
    quasis: Vec<String>,
    exprs: Vec<Node>,
  },
  MemberExpr {
    object: Node,
    #[drive(skip)]
    prop: String,
    #[drive(skip)]
    optional: bool,
  },
  NewExpr {
    callee: Node,
    arguments: Vec<Node>,
  },
  NewTarget {},
  ObjProp {
    key: Node,
    value: Node,
    #[drive(skip)]
    computed: bool,
    #[drive(skip)]
    kind: PropKind,
  },
  PropKey {
    #[drive(skip)]
    name: String,
  },
  SpreadElement {
    argument: Node,
  },
  SuperExpr {},
  TaggedTemplate {
    tag: Node,
    #[drive(skip)]
    quasis: Vec<String>,
    exprs: Vec<Node>,
  },
  ThisExpr {},
  UnaryExpr {
    #[drive(skip)]
    operator: OperatorName,
    argument: Node,
  },
  UnaryPostfixExpr {
    #[drive(skip)]
    operator: OperatorName,
    argument: Node,
  },
  YieldExpr {
    argument: Option<Node>,
    #[drive(skip)]
    delegate: bool,
  },

  ArrPat {
    // `ArrHole` for elisions, `RestPat` last.
    elements: Vec<Node>,
  },
  AssignPat {
    target: Node,
    default: Node,
  },
  ObjPat {
    // `PatProp`s, optionally followed by a `RestPat`.
    props: Vec<Node>,
  },
  PatProp {
    key: Node,
    target: Node,
    #[drive(skip)]
    computed: bool,
    #[drive(skip)]
    shorthand: bool,
  },
  RestPat {
    target: Node,
  },
}

impl Syntax {
  pub fn is_literal(&self) -> bool {
    matches!(
      self,
      Syntax::LitBigInt { .. }
        | Syntax::LitBool { .. }
        | Syntax::LitNull {}
        | Syntax::LitNum { .. }
        | Syntax::LitRegex { .. }
        | Syntax::LitStr { .. }
    )
  }

  pub fn is_function(&self) -> bool {
    matches!(
      self,
      Syntax::FuncDecl { .. } | Syntax::FuncExpr { .. } | Syntax::ArrowFunc { .. }
    )
  }

  pub fn func(&self) -> Option<&Func> {
    match self {
      Syntax::FuncDecl { func } | Syntax::FuncExpr { func } | Syntax::ArrowFunc { func } => {
        Some(func)
      }
      _ => None,
    }
  }

  pub fn func_mut(&mut self) -> Option<&mut Func> {
    match self {
      Syntax::FuncDecl { func } | Syntax::FuncExpr { func } | Syntax::ArrowFunc { func } => {
        Some(func)
      }
      _ => None,
    }
  }

  /// The name of an `IdExpr` or `IdPat`.
  pub fn ident_name(&self) -> Option<&str> {
    match self {
      Syntax::IdExpr { name } | Syntax::IdPat { name } => Some(name),
      _ => None,
    }
  }
}
