#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }
}

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Double character tokens
    EqualEqual,  // '=='
    ExclEqual,   // '!='
    LAngleEqual, // '<='
    RAngleEqual, // '>='

    // Single character tokens
    Equal,     // '='
    Plus,      // '+'
    Minus,     // '-'
    Star,      // '*'
    Slash,     // '/'
    Ampersand, // '&'
    Excl,      // '!'
    LAngle,    // '<'
    RAngle,    // '>'
    Semicolon, // ';'
    Colon,     // ':'
    Comma,     // ','
    Period,    // '.'
    LParen,    // '('
    RParen,    // ')'
    LCurly,    // '{'
    RCurly,    // '}'
    LBracket,  // '['
    RBracket,  // ']'

    // Keywords
    KwReturn,  // "return"
    KwPrint,   // "print"
    KwInt,     // "int"
    KwString,  // "string"
    KwBool,    // "bool"
    KwChar,    // "char"
    KwVoid,    // "void"
    KwIf,      // "if"
    KwElse,    // "else"
    KwWhile,   // "while"
    KwFor,     // "for"
    KwConst,   // "const"
    KwStruct,  // "struct"
    KwSwitch,  // "switch"
    KwCase,    // "case"
    KwDefault, // "default"
    KwAsm,     // "asm"
    KwEnum,    // "enum"
    KwPublic,  // "public"
    KwPrivate, // "private"
    KwExtern,  // "extern"
    KwAuto,    // "auto"

    // Identifier
    Ident(String),

    // Literals
    Number(i64),
    Text(String),
    Char(char),
    True,  // "true"
    False, // "false"

    // Special
    Eof,
    Unknown(char),
}
