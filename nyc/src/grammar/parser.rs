use super::ast::{
    AsmBlock, ConstDecl, EnumDef, EnumMember, Expr, ExprKind, ForStmt, Function, IfStmt, Param,
    PrintStmt, Program, ReturnStmt, Stmt, StructDef, StructMember, UnaryOp, VarDecl, Visibility,
    WhileStmt,
};
use super::ast::BinaryOp;
use super::parsercore::Parser;
use super::token::TokenKind;
use crate::error::{ParseError, TokenInfo};
use crate::symbols::{Symbol, SymbolKind};
use crate::types::{Primitive, Type};
use crate::{check, expect, optional};

impl Parser {
    /// Parse the whole token stream into a program plus the symbol-table
    /// skeleton (struct registry, function declarations, parameter scopes).
    pub fn parse(mut self) -> Result<(Program, crate::symbols::SymbolTable), ParseError> {
        let mut program = Program::default();
        while !check!(self, TokenKind::Eof) {
            if check!(self, TokenKind::KwStruct) {
                let def = self.parse_struct_definition()?;
                self.table.define_struct(def.clone());
                program.structs.push(def);
                optional!(self, TokenKind::Semicolon);
            } else if check!(self, TokenKind::KwEnum) {
                let def = self.parse_enum_definition()?;
                program.statements.push(Stmt::Enum(def));
                optional!(self, TokenKind::Semicolon);
            } else if check!(self, TokenKind::KwExtern) {
                let func = self.parse_extern_function()?;
                program.functions.push(func);
            } else if self.starts_function() {
                let func = self.parse_function_definition()?;
                program.functions.push(func);
            } else if self.looks_like_include() {
                let pos = self.peek().pos;
                return Err(ParseError::InvalidInclude {
                    line: pos.line,
                    column: pos.column,
                });
            } else {
                program.statements.push(self.parse_statement()?);
            }
        }
        Ok((program, self.table))
    }

    /// A type, then an identifier, then '(' opens a function definition.
    /// Pointer stars between the base type and the name are skipped over.
    fn starts_function(&self) -> bool {
        if !matches!(
            self.peek().kind,
            TokenKind::KwInt
                | TokenKind::KwString
                | TokenKind::KwBool
                | TokenKind::KwChar
                | TokenKind::KwVoid
                | TokenKind::Ident(_)
        ) {
            return false;
        }
        let mut offset = 1;
        while matches!(self.peek_at(offset).kind, TokenKind::Star) {
            offset += 1;
        }
        matches!(self.peek_at(offset).kind, TokenKind::Ident(_))
            && matches!(self.peek_at(offset + 1).kind, TokenKind::LParen)
    }

    /// Struct-typed local: an identifier, zero or more pointer stars, then
    /// the variable name.
    fn starts_struct_declaration(&self) -> bool {
        if !matches!(self.peek().kind, TokenKind::Ident(_)) {
            return false;
        }
        let mut offset = 1;
        while matches!(self.peek_at(offset).kind, TokenKind::Star) {
            offset += 1;
        }
        matches!(self.peek_at(offset).kind, TokenKind::Ident(_))
    }

    // Include directives belong to the preprocessor; one leaking through is
    // a parse error rather than an unknown identifier.
    fn looks_like_include(&self) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == "include")
            && matches!(
                self.peek_at(1).kind,
                TokenKind::Text(_) | TokenKind::LAngle
            )
    }

    fn parse_ident(&mut self, expected: &str) -> Result<(String, super::token::Pos), ParseError> {
        let token = expect!(self, TokenKind::Ident(_), expected)?;
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.pos)),
            _ => unreachable!(),
        }
    }

    /// type = ( "int" | "string" | "bool" | "char" | "void" | struct-name ) { "*" }
    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let token = self.peek().clone();
        let mut ty = match token.kind {
            TokenKind::KwInt => {
                self.advance();
                Type::Primitive(Primitive::Int)
            }
            TokenKind::KwString => {
                self.advance();
                Type::Primitive(Primitive::Str)
            }
            TokenKind::KwBool => {
                self.advance();
                Type::Primitive(Primitive::Bool)
            }
            TokenKind::KwChar => {
                self.advance();
                Type::Primitive(Primitive::Char)
            }
            TokenKind::KwVoid => {
                self.advance();
                Type::Primitive(Primitive::Void)
            }
            TokenKind::Ident(name) => {
                self.advance();
                Type::Struct(name)
            }
            TokenKind::Eof => return Err(ParseError::UnexpectedEof),
            _ => {
                return Err(ParseError::Expected {
                    expected:
                        "Expected 'int', 'string', 'bool', 'char', or a defined struct name for type."
                            .to_string(),
                    got: TokenInfo::from(&token),
                })
            }
        };
        while optional!(self, TokenKind::Star).is_some() {
            ty = Type::Pointer(Box::new(ty));
        }
        Ok(ty)
    }

    /// array declarator attaches to the variable: ident [ "[" number "]" ]
    fn parse_array_suffix(&mut self, base: Type) -> Result<Type, ParseError> {
        if optional!(self, TokenKind::LBracket).is_none() {
            return Ok(base);
        }
        let size_token = expect!(
            self,
            TokenKind::Number(_),
            "Expected integer literal for array size."
        )?;
        let size = match size_token.kind {
            TokenKind::Number(n) => n,
            _ => unreachable!(),
        };
        expect!(self, TokenKind::RBracket, "Expected ']' after array size.")?;
        Ok(Type::Array(Box::new(base), size))
    }

    /// var-decl = type ident [ "[" number "]" ] [ "=" expr ]
    fn parse_variable_declaration(&mut self) -> Result<VarDecl, ParseError> {
        let base = self.parse_type()?;
        let (name, pos) = self.parse_ident("Expected variable name after type.")?;
        let ty = self.parse_array_suffix(base)?;
        let init = if optional!(self, TokenKind::Equal).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(VarDecl {
            name,
            ty,
            init,
            pos,
            symbol: None,
        })
    }

    /// const-decl = "const" type ident "=" expr
    fn parse_constant_declaration(&mut self) -> Result<ConstDecl, ParseError> {
        let const_token = expect!(self, TokenKind::KwConst, "Expected 'const' keyword.")?;
        let ty = self.parse_type()?;
        let (name, _) = self.parse_ident("Expected constant name after type.")?;
        expect!(self, TokenKind::Equal, "Expected '=' after constant name.")?;
        let value = self.parse_expression()?;
        Ok(ConstDecl {
            name,
            ty,
            value,
            pos: const_token.pos,
        })
    }

    /// return-stmt = "return" expr ";"
    fn parse_return_statement(&mut self) -> Result<ReturnStmt, ParseError> {
        let return_token = expect!(self, TokenKind::KwReturn, "Expected 'return' keyword.")?;
        let value = self.parse_expression()?;
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after return expression."
        )?;
        Ok(ReturnStmt {
            value,
            pos: return_token.pos,
        })
    }

    /// print-stmt = "print" expr { "," expr } ";"
    fn parse_print_statement(&mut self) -> Result<PrintStmt, ParseError> {
        let print_token = expect!(self, TokenKind::KwPrint, "Expected 'print' keyword.")?;
        let mut args = vec![self.parse_expression()?];
        while optional!(self, TokenKind::Comma).is_some() {
            args.push(self.parse_expression()?);
        }
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after print statement."
        )?;
        Ok(PrintStmt {
            args,
            pos: print_token.pos,
        })
    }

    fn parse_block(&mut self, what: &str) -> Result<Vec<Stmt>, ParseError> {
        expect!(
            self,
            TokenKind::LCurly,
            &format!("Expected '{{' to begin {what} block.")
        )?;
        let mut stmts = Vec::new();
        while !check!(self, TokenKind::RCurly) && !check!(self, TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        expect!(
            self,
            TokenKind::RCurly,
            &format!("Expected '}}' to close {what} block.")
        )?;
        Ok(stmts)
    }

    /// if-stmt = "if" "(" expr ")" block [ "else" block ]
    fn parse_if_statement(&mut self) -> Result<IfStmt, ParseError> {
        let if_token = expect!(self, TokenKind::KwIf, "Expected 'if' keyword.")?;
        expect!(self, TokenKind::LParen, "Expected '(' after 'if'.")?;
        let cond = self.parse_expression()?;
        expect!(self, TokenKind::RParen, "Expected ')' after if condition.")?;
        let then_block = self.parse_block("'if'")?;
        let else_block = if optional!(self, TokenKind::KwElse).is_some() {
            self.parse_block("'else'")?
        } else {
            Vec::new()
        };
        Ok(IfStmt {
            cond,
            then_block,
            else_block,
            pos: if_token.pos,
        })
    }

    /// while-stmt = "while" "(" expr ")" block
    fn parse_while_statement(&mut self) -> Result<WhileStmt, ParseError> {
        let while_token = expect!(self, TokenKind::KwWhile, "Expected 'while' keyword.")?;
        expect!(self, TokenKind::LParen, "Expected '(' after 'while'.")?;
        let cond = self.parse_expression()?;
        expect!(self, TokenKind::RParen, "Expected ')' after while condition.")?;
        let body = self.parse_block("'while'")?;
        Ok(WhileStmt {
            cond,
            body,
            pos: while_token.pos,
        })
    }

    /// for-stmt = "for" "(" [ init ] ";" [ expr ] ";" [ expr ] ")" block
    fn parse_for_statement(&mut self) -> Result<ForStmt, ParseError> {
        let for_token = expect!(self, TokenKind::KwFor, "Expected 'for' keyword.")?;
        expect!(self, TokenKind::LParen, "Expected '(' after 'for'.")?;

        let init = if check!(self, TokenKind::Semicolon) {
            None
        } else if check!(
            self,
            TokenKind::KwInt | TokenKind::KwString | TokenKind::KwBool | TokenKind::KwChar
        ) {
            Some(Box::new(Stmt::VarDecl(self.parse_variable_declaration()?)))
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expression()?)))
        };
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after for loop initializer."
        )?;

        let cond = if check!(self, TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after for loop condition."
        )?;

        let step = if check!(self, TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        expect!(
            self,
            TokenKind::RParen,
            "Expected ')' after for loop increment."
        )?;

        let body = self.parse_block("'for'")?;
        Ok(ForStmt {
            init,
            cond,
            step,
            body,
            pos: for_token.pos,
        })
    }

    /// asm-stmt = "asm" "{" { string [ ";" ] } "}"
    fn parse_asm_statement(&mut self) -> Result<AsmBlock, ParseError> {
        let asm_token = expect!(self, TokenKind::KwAsm, "Expected 'asm' keyword.")?;
        expect!(self, TokenKind::LCurly, "Expected '{' after 'asm'.")?;
        let mut lines = Vec::new();
        while !check!(self, TokenKind::RCurly) && !check!(self, TokenKind::Eof) {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Text(line) => {
                    self.advance();
                    optional!(self, TokenKind::Semicolon);
                    lines.push(line);
                }
                _ => {
                    return Err(ParseError::InvalidAsmLine {
                        line: token.pos.line,
                        column: token.pos.column,
                    })
                }
            }
        }
        expect!(self, TokenKind::RCurly, "Expected '}' to close 'asm' block.")?;
        Ok(AsmBlock {
            lines,
            pos: asm_token.pos,
        })
    }

    /// enum-def = "enum" ident "{" [ ident [ "=" expr ] { "," ident [ "=" expr ] } ] "}"
    fn parse_enum_definition(&mut self) -> Result<EnumDef, ParseError> {
        let enum_token = expect!(self, TokenKind::KwEnum, "Expected 'enum' keyword.")?;
        let (name, _) = self.parse_ident("Expected enum name.")?;
        expect!(self, TokenKind::LCurly, "Expected '{' after enum name.")?;

        let mut members = Vec::new();
        while !check!(self, TokenKind::RCurly) {
            let (member_name, member_pos) = self.parse_ident("Expected enum member name.")?;
            let value = if optional!(self, TokenKind::Equal).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                value,
                pos: member_pos,
            });

            if optional!(self, TokenKind::Comma).is_none() && !check!(self, TokenKind::RCurly) {
                let got = TokenInfo::from(self.peek());
                return Err(ParseError::Expected {
                    expected: "Expected ',' or '}' after enum member.".to_string(),
                    got,
                });
            }
        }
        expect!(
            self,
            TokenKind::RCurly,
            "Expected '}' to close enum declaration."
        )?;
        Ok(EnumDef {
            name,
            members,
            pos: enum_token.pos,
        })
    }

    /// struct-def = "struct" ident "{" { [ "public" | "private" ] type ident [ "[" number "]" ] ";" } "}"
    ///
    /// Member offsets are packed provisionally here (pointer/array 8, int 4,
    /// bool/char 1, struct 0); the analyzer recomputes them with real sizes.
    fn parse_struct_definition(&mut self) -> Result<StructDef, ParseError> {
        let struct_token = expect!(self, TokenKind::KwStruct, "Expected 'struct' keyword.")?;
        let (name, _) = self.parse_ident("Expected struct name.")?;
        expect!(self, TokenKind::LCurly, "Expected '{' after struct name.")?;

        let mut members = Vec::new();
        let mut offset = 0;
        while !check!(self, TokenKind::RCurly) && !check!(self, TokenKind::Eof) {
            let vis = if optional!(self, TokenKind::KwPublic).is_some() {
                Visibility::Public
            } else if optional!(self, TokenKind::KwPrivate).is_some() {
                Visibility::Private
            } else {
                Visibility::Public
            };
            let base = self.parse_type()?;
            let (member_name, _) = self.parse_ident("Expected struct member name.")?;
            let ty = self.parse_array_suffix(base)?;
            expect!(
                self,
                TokenKind::Semicolon,
                "Expected ';' after struct member declaration."
            )?;

            let size = provisional_member_size(&ty);
            members.push(StructMember {
                vis,
                ty,
                name: member_name,
                offset,
            });
            offset += size;
        }
        expect!(
            self,
            TokenKind::RCurly,
            "Expected '}' after struct definition."
        )?;
        Ok(StructDef {
            name,
            members,
            size: offset,
            pos: struct_token.pos,
            scope: None,
        })
    }

    /// params = "(" [ type ident { "," type ident } ] ")"
    fn parse_parameters(&mut self) -> Result<Vec<Param>, ParseError> {
        expect!(self, TokenKind::LParen, "Expected '(' after function name.")?;
        let mut params = Vec::new();
        if !check!(self, TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (name, pos) = self.parse_ident("Expected identifier for parameter name.")?;
                params.push(Param { ty, name, pos });
                if optional!(self, TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        expect!(
            self,
            TokenKind::RParen,
            "Expected ')' after function parameters."
        )?;
        Ok(params)
    }

    fn declare_function(&mut self, name: &str, ret: &Type, params: &[Param], is_extern: bool) {
        let _ = self.table.add_symbol(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Func {
                ret: ret.clone(),
                params: params.iter().map(|p| p.ty.clone()).collect(),
                is_extern,
            },
        });
    }

    /// func-def = type ident "(" params ")" "{" { stmt } "}"
    fn parse_function_definition(&mut self) -> Result<Function, ParseError> {
        let return_type = self.parse_type()?;
        let (name, pos) = self.parse_ident("Expected function name.")?;
        let params = self.parse_parameters()?;
        self.declare_function(&name, &return_type, &params, false);

        // Skeleton scope for the body: parameters only, placeholder offsets.
        self.table.enter_scope();
        for param in &params {
            let _ = self.table.add_symbol(Symbol {
                name: param.name.clone(),
                kind: SymbolKind::Var {
                    ty: param.ty.clone(),
                    offset: 0,
                    size: 0,
                },
            });
        }

        expect!(
            self,
            TokenKind::LCurly,
            "Expected '{' to begin function body."
        )?;
        let mut body = Vec::new();
        while !check!(self, TokenKind::RCurly) && !check!(self, TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        expect!(self, TokenKind::RCurly, "Expected '}' to end function body.")?;
        self.table.exit_scope();

        Ok(Function {
            return_type,
            name,
            params,
            body,
            is_extern: false,
            pos,
            scope: None,
        })
    }

    /// extern-def = "extern" type ident "(" params ")" ";"
    fn parse_extern_function(&mut self) -> Result<Function, ParseError> {
        expect!(self, TokenKind::KwExtern, "Expected 'extern' keyword.")?;
        let return_type = self.parse_type()?;
        let (name, pos) = self.parse_ident("Expected function name after 'extern'.")?;
        let params = self.parse_parameters()?;
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after extern function declaration."
        )?;
        self.declare_function(&name, &return_type, &params, true);
        Ok(Function {
            return_type,
            name,
            params,
            body: Vec::new(),
            is_extern: true,
            pos,
            scope: None,
        })
    }

    /// stmt = const-decl | return-stmt | var-decl | print-stmt | if-stmt
    ///      | while-stmt | for-stmt | asm-stmt | enum-def | struct-def
    ///      | expr-stmt
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if check!(self, TokenKind::KwConst) {
            let decl = self.parse_constant_declaration()?;
            expect!(
                self,
                TokenKind::Semicolon,
                "Expected ';' after constant declaration."
            )?;
            return Ok(Stmt::Const(decl));
        }
        if check!(self, TokenKind::KwReturn) {
            return self.parse_return_statement().map(Stmt::Return);
        }
        if check!(
            self,
            TokenKind::KwInt | TokenKind::KwString | TokenKind::KwBool | TokenKind::KwChar
        ) {
            let decl = self.parse_variable_declaration()?;
            expect!(
                self,
                TokenKind::Semicolon,
                "Expected ';' after variable declaration."
            )?;
            return Ok(Stmt::VarDecl(decl));
        }
        if self.starts_struct_declaration() {
            let decl = self.parse_variable_declaration()?;
            expect!(
                self,
                TokenKind::Semicolon,
                "Expected ';' after variable declaration."
            )?;
            return Ok(Stmt::VarDecl(decl));
        }
        if check!(self, TokenKind::KwPrint) {
            return self.parse_print_statement().map(Stmt::Print);
        }
        if check!(self, TokenKind::KwIf) {
            return self.parse_if_statement().map(Stmt::If);
        }
        if check!(self, TokenKind::KwWhile) {
            return self.parse_while_statement().map(Stmt::While);
        }
        if check!(self, TokenKind::KwFor) {
            return self.parse_for_statement().map(Stmt::For);
        }
        if check!(self, TokenKind::KwAsm) {
            return self.parse_asm_statement().map(Stmt::Asm);
        }
        if check!(self, TokenKind::KwEnum) {
            let def = self.parse_enum_definition()?;
            optional!(self, TokenKind::Semicolon);
            return Ok(Stmt::Enum(def));
        }
        if check!(self, TokenKind::KwStruct) {
            let def = self.parse_struct_definition()?;
            self.table.define_struct(def.clone());
            optional!(self, TokenKind::Semicolon);
            return Ok(Stmt::Struct(def));
        }

        let expr = self.parse_expression()?;
        expect!(
            self,
            TokenKind::Semicolon,
            "Expected ';' after expression statement."
        )?;
        Ok(Stmt::Expr(expr))
    }

    /// expr = comparison [ "=" expr ]
    ///
    /// Assignment sits at the lowest precedence and associates to the
    /// right; the already-parsed left side must be an lvalue.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_comparison()?;
        if check!(self, TokenKind::Equal) {
            let eq_token = self.advance();
            let value = self.parse_expression()?;
            return match left.kind {
                ExprKind::Var(_) | ExprKind::Member { .. } | ExprKind::Index { .. } => {
                    let pos = left.pos;
                    Ok(Expr::new(
                        ExprKind::Assign {
                            target: Box::new(left),
                            value: Box::new(value),
                        },
                        pos,
                    ))
                }
                _ => Err(ParseError::InvalidAssignTarget {
                    line: eq_token.pos.line,
                    column: eq_token.pos.column,
                }),
            };
        }
        Ok(left)
    }

    /// comparison = additive { ( "==" | "!=" | "<" | ">" | "<=" | ">=" ) additive }
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::ExclEqual => BinaryOp::Ne,
                TokenKind::LAngle => BinaryOp::Lt,
                TokenKind::RAngle => BinaryOp::Gt,
                TokenKind::LAngleEqual => BinaryOp::Le,
                TokenKind::RAngleEqual => BinaryOp::Ge,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_additive()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                op_token.pos,
            );
        }
        Ok(left)
    }

    /// additive = term { ( "+" | "-" ) term }
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_term()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                op_token.pos,
            );
        }
        Ok(left)
    }

    /// term = unary { ( "*" | "/" ) unary }
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                op_token.pos,
            );
        }
        Ok(left)
    }

    /// unary = ( "*" | "&" | "!" ) unary | postfix
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Ampersand => Some(UnaryOp::Addr),
            TokenKind::Excl => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let op_token = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                op_token.pos,
            ));
        }
        self.parse_postfix()
    }

    /// postfix = primary { "." ident | "[" expr "]" | "(" args ")" }
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if optional!(self, TokenKind::Period).is_some() {
                let (member, pos) =
                    self.parse_ident("Expected identifier after '.' for member access.")?;
                expr = Expr::new(
                    ExprKind::Member {
                        base: Box::new(expr),
                        member,
                    },
                    pos,
                );
                continue;
            }
            if optional!(self, TokenKind::LBracket).is_some() {
                let index = self.parse_expression()?;
                expect!(self, TokenKind::RBracket, "Expected ']' after array index.")?;
                let pos = expr.pos;
                expr = Expr::new(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    pos,
                );
                continue;
            }
            if check!(self, TokenKind::LParen) {
                let name = match expr.kind {
                    ExprKind::Var(ref name) => name.clone(),
                    _ => {
                        let got = TokenInfo::from(self.peek());
                        return Err(ParseError::Expected {
                            expected: "Expected a function name before '('.".to_string(),
                            got,
                        });
                    }
                };
                self.advance(); // consume '('
                let mut args = Vec::new();
                if !check!(self, TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    while optional!(self, TokenKind::Comma).is_some() {
                        args.push(self.parse_expression()?);
                    }
                }
                expect!(
                    self,
                    TokenKind::RParen,
                    "Expected ')' after function call arguments."
                )?;
                let pos = expr.pos;
                expr = Expr::new(ExprKind::Call { name, args }, pos);
                continue;
            }
            break;
        }
        Ok(expr)
    }

    /// primary = number | string | char | "true" | "false" | ident | "(" expr ")"
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(value), token.pos))
            }
            TokenKind::Text(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(value), token.pos))
            }
            TokenKind::Char(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Char(value), token.pos))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), token.pos))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), token.pos))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Var(name), token.pos))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                expect!(
                    self,
                    TokenKind::RParen,
                    "Expected ')' after expression in parentheses."
                )?;
                Ok(inner)
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof),
            _ => Err(ParseError::Expected {
                expected:
                    "Expected an integer literal, identifier, or '(' for an expression factor."
                        .to_string(),
                got: TokenInfo::from(&token),
            }),
        }
    }
}

// Provisional struct packing before the analyzer knows nested sizes.
fn provisional_member_size(ty: &Type) -> i64 {
    match ty {
        Type::Primitive(p) => p.size(),
        Type::Pointer(_) => 8,
        Type::Array(_, _) => 8,
        Type::Struct(_) => 0,
    }
}
