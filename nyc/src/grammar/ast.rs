use super::token::Pos;
use crate::symbols::{ScopeId, SymbolId};
use crate::types::Type;

/// Root of the tree: top-level statements, function definitions and struct
/// definitions, each in source order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub functions: Vec<Function>,
    pub structs: Vec<StructDef>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_extern: bool,
    pub pos: Pos,
    /// Body scope, recorded by the analyzer and read back by codegen for
    /// frame size and parameter slots. Extern functions have none.
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<StructMember>,
    pub size: i64,
    pub pos: Pos,
    /// Detached scope holding one member symbol per field, filled in by the
    /// analyzer.
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct StructMember {
    pub vis: Visibility,
    pub ty: Type,
    pub name: String,
    pub offset: i64,
}

/// Tracked on struct members, not enforced anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),            // expr ";"
    VarDecl(VarDecl),      // type ident [ "[" num "]" ] [ "=" expr ] ";"
    Const(ConstDecl),      // "const" type ident "=" expr ";"
    Return(ReturnStmt),    // "return" expr ";"
    Print(PrintStmt),      // "print" expr { "," expr } ";"
    If(IfStmt),            // "if" "(" expr ")" block [ "else" block ]
    While(WhileStmt),      // "while" "(" expr ")" block
    For(ForStmt),          // "for" "(" init ";" cond ";" step ")" block
    Asm(AsmBlock),         // "asm" "{" { string ";" } "}"
    Enum(EnumDef),         // "enum" ident "{" members "}"
    Struct(StructDef),     // "struct" ident "{" members "}"
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub init: Option<Expr>,
    pub pos: Pos,
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: String,
    pub ty: Type,
    pub value: Expr,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Expr,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct PrintStmt {
    pub args: Vec<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Vec<Stmt>,
    pub else_block: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct AsmBlock {
    pub lines: Vec<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expr>,
    pub pos: Pos,
}

/// An expression node: the variant payload plus the source position and the
/// annotation slots the analyzer fills in. `ty` is set on every expression
/// of a well-typed program, `symbol` on the variants that bind a name.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
    pub ty: Option<Type>,
    pub symbol: Option<SymbolId>,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Pos) -> Self {
        Expr {
            kind,
            pos,
            ty: None,
            symbol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Int(i64),
    Str(String),
    Bool(bool),
    Char(char),
    Var(String),
    Member { base: Box<Expr>, member: String }, // expr "." ident
    Index { base: Box<Expr>, index: Box<Expr> }, // expr "[" expr "]"
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { name: String, args: Vec<Expr> }, // ident "(" [ expr { "," expr } ] ")"
    Assign { target: Box<Expr>, value: Box<Expr> }, // lvalue "=" expr
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Deref, // '*'
    Addr,  // '&'
    Not,   // '!'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, // '+'
    Sub, // '-'
    Mul, // '*'
    Div, // '/'
    Eq,  // '=='
    Ne,  // '!='
    Lt,  // '<'
    Gt,  // '>'
    Le,  // '<='
    Ge,  // '>='
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }
}
