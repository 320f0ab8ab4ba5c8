use std::fmt;

use thiserror::Error;

use crate::grammar::ast::BinaryOp;
use crate::grammar::token::{Token, TokenKind};

/// Top-level error for the whole pipeline. Display renders the
/// `<Category>: <message>` form the tools print to the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("LexicalError: {0}")]
    Lex(#[from] LexicalError),

    #[error("ParseError: {0}")]
    Parse(#[from] ParseError),

    #[error("SemanticError: {0}")]
    Semantic(#[from] SemanticError),

    #[error("CodeGenError: {0}")]
    Codegen(#[from] CodegenError),

    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone)]
pub enum LexicalError {
    #[error("unknown character '{ch}' at line {line}, column {column}")]
    UnknownCharacter { ch: char, line: usize, column: usize },

    #[error("unclosed string literal at line {line}, column {column}")]
    UnclosedString { line: usize, column: usize },

    #[error("unclosed or empty character literal at line {line}, column {column}")]
    UnclosedChar { line: usize, column: usize },

    #[error("integer literal out of range at line {line}, column {column}")]
    IntegerOutOfRange { line: usize, column: usize },
}

/// Token snapshot for error reporting, without ties to the token stream.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} at line {}, column {}",
            self.kind, self.line, self.column
        )
    }
}

impl From<&Token> for TokenInfo {
    fn from(token: &Token) -> Self {
        TokenInfo {
            kind: token.kind.clone(),
            line: token.pos.line,
            column: token.pos.column,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("{expected} (got {got})")]
    Expected { expected: String, got: TokenInfo },

    #[error("invalid assignment target at line {line}, column {column}")]
    InvalidAssignTarget { line: usize, column: usize },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("invalid include directive at line {line}, column {column}; includes are resolved by the preprocessor")]
    InvalidInclude { line: usize, column: usize },

    #[error("only string literals are allowed inside asm blocks at line {line}, column {column}")]
    InvalidAsmLine { line: usize, column: usize },
}

#[derive(Debug, Error, Clone)]
pub enum SemanticError {
    #[error("redefinition of '{name}' at line {line}, column {column}")]
    Redefinition { name: String, line: usize, column: usize },

    #[error("use of undeclared identifier '{name}' at line {line}, column {column}")]
    Undeclared { name: String, line: usize, column: usize },

    #[error("type mismatch in {context} at line {line}, column {column}")]
    TypeMismatch { context: String, line: usize, column: usize },

    #[error("incompatible operand types in binary operation at line {line}, column {column}")]
    IncompatibleOperands { line: usize, column: usize },

    #[error("condition must be boolean at line {line}, column {column}")]
    NonBoolCondition { line: usize, column: usize },

    #[error("array index must be an integer at line {line}, column {column}")]
    NonIntegerIndex { line: usize, column: usize },

    #[error("address-of operator '&' can only be applied to variables at line {line}, column {column}")]
    AddressOfNonVariable { line: usize, column: usize },

    #[error("dereference operator '*' requires a pointer operand at line {line}, column {column}")]
    DerefNonPointer { line: usize, column: usize },

    #[error("logical not '!' requires a bool operand at line {line}, column {column}")]
    NotNonBool { line: usize, column: usize },

    #[error("member access '.' used on non-struct type at line {line}, column {column}")]
    MemberOfNonStruct { line: usize, column: usize },

    #[error("struct '{name}' has no member named '{member}' at line {line}, column {column}")]
    UnknownMember {
        name: String,
        member: String,
        line: usize,
        column: usize,
    },

    #[error("array access '[]' used on non-array type at line {line}, column {column}")]
    IndexOfNonArray { line: usize, column: usize },

    #[error("call to undeclared function '{name}' at line {line}, column {column}")]
    UndeclaredFunction { name: String, line: usize, column: usize },

    #[error("function '{name}' expects {expected} arguments, but {found} were provided at line {line}, column {column}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        line: usize,
        column: usize,
    },

    #[error("type mismatch in argument {index} of function '{name}' at line {line}, column {column}")]
    ArgumentTypeMismatch {
        name: String,
        index: usize,
        line: usize,
        column: usize,
    },

    #[error("undefined struct '{name}' at line {line}, column {column}")]
    UndefinedStruct { name: String, line: usize, column: usize },

    #[error("array declared with non-positive size at line {line}, column {column}")]
    NonPositiveArraySize { line: usize, column: usize },

    #[error("enum member value must be an integer literal at line {line}, column {column}")]
    NonConstantEnumValue { line: usize, column: usize },

    #[error("'main' function must return int")]
    MainMustReturnInt,

    #[error("'main' function should have no parameters")]
    MainHasParameters,

    #[error("No 'main' function defined.")]
    MissingMain,
}

/// Internal emission failures. The analyzer is supposed to make these
/// unreachable; hitting one is a compiler bug, not a user error.
#[derive(Debug, Error, Clone)]
pub enum CodegenError {
    #[error("unresolved symbol '{name}' during emission")]
    UnresolvedSymbol { name: String },

    #[error("unknown binary operator {op:?}")]
    UnknownOperator { op: BinaryOp },

    #[error("missing resolved type on {what} expression")]
    MissingType { what: &'static str },

    #[error("undefined struct '{name}' during emission")]
    UndefinedStruct { name: String },
}
