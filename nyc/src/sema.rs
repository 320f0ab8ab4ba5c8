use crate::error::SemanticError;
use crate::grammar::ast::{
    ConstDecl, EnumDef, Expr, ExprKind, Function, Program, Stmt, StructDef, UnaryOp, VarDecl,
};
use crate::grammar::token::Pos;
use crate::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::types::{Primitive, Type};

/// Syntax-directed analysis over the tree built by the parser. Produces no
/// new structure of its own: it annotates expression nodes with resolved
/// types and symbol ids, and fills the symbol table with sizes and frame
/// offsets the code generator reads back.
///
/// Three phases: struct definitions first, then function signatures (so
/// bodies can reference functions defined later in the file), then global
/// statements and function bodies.
pub struct SemanticAnalyzer {
    table: SymbolTable,
}

impl SemanticAnalyzer {
    pub fn new(table: SymbolTable) -> Self {
        SemanticAnalyzer { table }
    }

    pub fn into_table(self) -> SymbolTable {
        self.table
    }

    pub fn analyze(&mut self, program: &mut Program) -> Result<(), SemanticError> {
        // Fresh global scope on top of the parser's skeleton; skeleton
        // symbols stay below it and are shadowed, never duplicated.
        self.table.enter_scope();

        for def in &mut program.structs {
            self.register_struct(def)?;
        }

        for func in &program.functions {
            let symbol = Symbol {
                name: func.name.clone(),
                kind: SymbolKind::Func {
                    ret: func.return_type.clone(),
                    params: func.params.iter().map(|p| p.ty.clone()).collect(),
                    is_extern: func.is_extern,
                },
            };
            self.table
                .add_symbol(symbol)
                .ok_or_else(|| SemanticError::Redefinition {
                    name: func.name.clone(),
                    line: func.pos.line,
                    column: func.pos.column,
                })?;
        }

        for stmt in &mut program.statements {
            self.visit_stmt(stmt)?;
        }

        for func in &mut program.functions {
            self.visit_function(func)?;
        }

        self.check_main(program)
    }

    fn check_main(&self, program: &Program) -> Result<(), SemanticError> {
        let main = program
            .functions
            .iter()
            .find(|f| f.name == "main")
            .ok_or(SemanticError::MissingMain)?;
        if !main.return_type.is_primitive(Primitive::Int) {
            return Err(SemanticError::MainMustReturnInt);
        }
        if !main.params.is_empty() {
            return Err(SemanticError::MainHasParameters);
        }
        Ok(())
    }

    /// Compute member offsets by plain packing and register the definition.
    /// Struct-typed members require their struct to be registered already,
    /// so order of appearance matters.
    fn register_struct(&mut self, def: &mut StructDef) -> Result<(), SemanticError> {
        let scope = self.table.push_detached_scope();
        let mut offset = 0;
        for member in &mut def.members {
            let size = self.type_size(&member.ty, def.pos)?;
            member.offset = offset;
            self.table
                .insert_into(
                    scope,
                    Symbol {
                        name: member.name.clone(),
                        kind: SymbolKind::Member {
                            vis: member.vis,
                            ty: member.ty.clone(),
                            offset,
                            size,
                        },
                    },
                )
                .ok_or_else(|| SemanticError::Redefinition {
                    name: member.name.clone(),
                    line: def.pos.line,
                    column: def.pos.column,
                })?;
            offset += size;
        }
        def.size = offset;
        def.scope = Some(scope);

        self.table.define_struct(def.clone());
        self.table
            .add_symbol(Symbol {
                name: def.name.clone(),
                kind: SymbolKind::Struct {
                    name: def.name.clone(),
                },
            })
            .ok_or_else(|| SemanticError::Redefinition {
                name: def.name.clone(),
                line: def.pos.line,
                column: def.pos.column,
            })?;
        Ok(())
    }

    fn visit_function(&mut self, func: &mut Function) -> Result<(), SemanticError> {
        if func.is_extern {
            return Ok(());
        }

        let scope = self.table.enter_scope();
        func.scope = Some(scope);

        // Saved frame base and return address occupy the first 16 bytes;
        // arguments are pushed as full 8-byte slots in declaration order.
        let mut offset = 16;
        for param in &func.params {
            let size = self.type_size(&param.ty, param.pos)?;
            self.table
                .add_symbol(Symbol {
                    name: param.name.clone(),
                    kind: SymbolKind::Var {
                        ty: param.ty.clone(),
                        offset,
                        size,
                    },
                })
                .ok_or_else(|| SemanticError::Redefinition {
                    name: param.name.clone(),
                    line: param.pos.line,
                    column: param.pos.column,
                })?;
            offset += 8;
        }
        self.table.scope_mut(scope).current_offset = 0;

        for stmt in &mut func.body {
            self.visit_stmt(stmt)?;
        }

        // The scope stays archived; only the head moves back.
        self.table.exit_scope();
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.visit_expr(expr)?;
                Ok(())
            }
            Stmt::VarDecl(decl) => self.visit_var_decl(decl),
            Stmt::Const(decl) => self.visit_const_decl(decl),
            Stmt::Return(ret) => {
                self.visit_expr(&mut ret.value)?;
                Ok(())
            }
            Stmt::Print(print) => {
                for arg in &mut print.args {
                    self.visit_expr(arg)?;
                }
                Ok(())
            }
            Stmt::If(if_stmt) => {
                let cond_ty = self.visit_expr(&mut if_stmt.cond)?;
                if !cond_ty.is_primitive(Primitive::Bool) {
                    return Err(SemanticError::NonBoolCondition {
                        line: if_stmt.pos.line,
                        column: if_stmt.pos.column,
                    });
                }
                // if does not open a scope of its own
                for stmt in &mut if_stmt.then_block {
                    self.visit_stmt(stmt)?;
                }
                for stmt in &mut if_stmt.else_block {
                    self.visit_stmt(stmt)?;
                }
                Ok(())
            }
            Stmt::While(while_stmt) => {
                let cond_ty = self.visit_expr(&mut while_stmt.cond)?;
                if !cond_ty.is_primitive(Primitive::Bool) {
                    return Err(SemanticError::NonBoolCondition {
                        line: while_stmt.pos.line,
                        column: while_stmt.pos.column,
                    });
                }
                self.table.enter_scope();
                for stmt in &mut while_stmt.body {
                    self.visit_stmt(stmt)?;
                }
                self.table.exit_scope();
                Ok(())
            }
            Stmt::For(for_stmt) => {
                // One scope around initializer, condition, step and body.
                self.table.enter_scope();
                if let Some(init) = &mut for_stmt.init {
                    self.visit_stmt(init)?;
                }
                if let Some(cond) = &mut for_stmt.cond {
                    let cond_ty = self.visit_expr(cond)?;
                    if !cond_ty.is_primitive(Primitive::Bool) {
                        return Err(SemanticError::NonBoolCondition {
                            line: for_stmt.pos.line,
                            column: for_stmt.pos.column,
                        });
                    }
                }
                if let Some(step) = &mut for_stmt.step {
                    self.visit_expr(step)?;
                }
                for stmt in &mut for_stmt.body {
                    self.visit_stmt(stmt)?;
                }
                self.table.exit_scope();
                Ok(())
            }
            Stmt::Asm(_) => Ok(()),
            Stmt::Enum(def) => self.visit_enum_def(def),
            Stmt::Struct(def) => self.register_struct(def),
        }
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl) -> Result<(), SemanticError> {
        if self.table.lookup_current(&decl.name).is_some() {
            return Err(SemanticError::Redefinition {
                name: decl.name.clone(),
                line: decl.pos.line,
                column: decl.pos.column,
            });
        }

        let size = self.type_size(&decl.ty, decl.pos)?;
        let scope = self.table.current_scope();
        self.table.scope_mut(scope).current_offset -= size;
        let offset = self.table.scope(scope).current_offset;

        let id = self
            .table
            .add_symbol(Symbol {
                name: decl.name.clone(),
                kind: SymbolKind::Var {
                    ty: decl.ty.clone(),
                    offset,
                    size,
                },
            })
            .ok_or_else(|| SemanticError::Redefinition {
                name: decl.name.clone(),
                line: decl.pos.line,
                column: decl.pos.column,
            })?;
        decl.symbol = Some(id);

        if let Some(init) = &mut decl.init {
            let init_ty = self.visit_expr(init)?;
            if !init_ty.compatible(&decl.ty) {
                return Err(SemanticError::TypeMismatch {
                    context: format!("variable initialization for '{}'", decl.name),
                    line: decl.pos.line,
                    column: decl.pos.column,
                });
            }
        }
        Ok(())
    }

    fn visit_const_decl(&mut self, decl: &mut ConstDecl) -> Result<(), SemanticError> {
        let value_ty = self.visit_expr(&mut decl.value)?;
        if !value_ty.compatible(&decl.ty) {
            return Err(SemanticError::TypeMismatch {
                context: format!("constant declaration '{}'", decl.name),
                line: decl.pos.line,
                column: decl.pos.column,
            });
        }
        self.table
            .add_symbol(Symbol {
                name: decl.name.clone(),
                kind: SymbolKind::Const {
                    ty: decl.ty.clone(),
                    value: decl.value.clone(),
                },
            })
            .ok_or_else(|| SemanticError::Redefinition {
                name: decl.name.clone(),
                line: decl.pos.line,
                column: decl.pos.column,
            })?;
        Ok(())
    }

    /// Members get sequential values from 0, or an explicit integer
    /// literal; both the type name and every member land in the current
    /// scope so members inline like constants.
    fn visit_enum_def(&mut self, def: &mut EnumDef) -> Result<(), SemanticError> {
        self.table
            .add_symbol(Symbol {
                name: def.name.clone(),
                kind: SymbolKind::EnumType {
                    name: def.name.clone(),
                },
            })
            .ok_or_else(|| SemanticError::Redefinition {
                name: def.name.clone(),
                line: def.pos.line,
                column: def.pos.column,
            })?;

        let mut next = 0;
        for member in &def.members {
            let value = match &member.value {
                None => next,
                Some(Expr {
                    kind: ExprKind::Int(n),
                    ..
                }) => *n,
                Some(expr) => {
                    return Err(SemanticError::NonConstantEnumValue {
                        line: expr.pos.line,
                        column: expr.pos.column,
                    })
                }
            };
            self.table
                .add_symbol(Symbol {
                    name: member.name.clone(),
                    kind: SymbolKind::EnumMember { value },
                })
                .ok_or_else(|| SemanticError::Redefinition {
                    name: member.name.clone(),
                    line: member.pos.line,
                    column: member.pos.column,
                })?;
            next = value + 1;
        }
        Ok(())
    }

    /// Type an expression, annotating the node with the result and (where
    /// the variant binds a name) the resolved symbol id.
    fn visit_expr(&mut self, expr: &mut Expr) -> Result<Type, SemanticError> {
        let pos = expr.pos;
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Type::Primitive(Primitive::Int),
            ExprKind::Str(_) => Type::Primitive(Primitive::Str),
            ExprKind::Bool(_) => Type::Primitive(Primitive::Bool),
            ExprKind::Char(_) => Type::Primitive(Primitive::Char),

            ExprKind::Var(name) => {
                let name = name.clone();
                let id = self
                    .table
                    .lookup(&name)
                    .ok_or_else(|| SemanticError::Undeclared {
                        name: name.clone(),
                        line: pos.line,
                        column: pos.column,
                    })?;
                let ty = match &self.table.symbol(id).kind {
                    SymbolKind::Var { ty, .. } => ty.clone(),
                    SymbolKind::Const { ty, .. } => ty.clone(),
                    SymbolKind::EnumMember { .. } => Type::Primitive(Primitive::Int),
                    _ => {
                        return Err(SemanticError::Undeclared {
                            name,
                            line: pos.line,
                            column: pos.column,
                        })
                    }
                };
                expr.symbol = Some(id);
                ty
            }

            ExprKind::Member { base, member } => {
                let member = member.clone();
                let base_ty = self.visit_expr(base)?;
                let struct_name = match base_ty {
                    Type::Struct(name) => name,
                    _ => {
                        return Err(SemanticError::MemberOfNonStruct {
                            line: pos.line,
                            column: pos.column,
                        })
                    }
                };
                let (scope, slot, member_ty) = {
                    let def = self.table.struct_def(&struct_name).ok_or_else(|| {
                        SemanticError::UndefinedStruct {
                            name: struct_name.clone(),
                            line: pos.line,
                            column: pos.column,
                        }
                    })?;
                    let scope = def.scope.ok_or_else(|| SemanticError::UndefinedStruct {
                        name: struct_name.clone(),
                        line: pos.line,
                        column: pos.column,
                    })?;
                    let slot = self
                        .table
                        .scope(scope)
                        .symbols
                        .get_index_of(member.as_str())
                        .ok_or_else(|| SemanticError::UnknownMember {
                            name: struct_name.clone(),
                            member: member.clone(),
                            line: pos.line,
                            column: pos.column,
                        })?;
                    let id = SymbolId { scope, slot };
                    let member_ty = match &self.table.symbol(id).kind {
                        SymbolKind::Member { ty, .. } => ty.clone(),
                        _ => unreachable!("struct scopes hold member symbols only"),
                    };
                    (scope, slot, member_ty)
                };
                expr.symbol = Some(SymbolId { scope, slot });
                member_ty
            }

            ExprKind::Index { base, index } => {
                let base_ty = self.visit_expr(base)?;
                let index_ty = self.visit_expr(index)?;
                let elem_ty = match base_ty {
                    Type::Array(elem, _) => *elem,
                    _ => {
                        return Err(SemanticError::IndexOfNonArray {
                            line: pos.line,
                            column: pos.column,
                        })
                    }
                };
                if !index_ty.is_primitive(Primitive::Int) {
                    return Err(SemanticError::NonIntegerIndex {
                        line: pos.line,
                        column: pos.column,
                    });
                }
                expr.symbol = base.symbol;
                elem_ty
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                match op {
                    UnaryOp::Addr => {
                        if !matches!(operand.kind, ExprKind::Var(_)) {
                            return Err(SemanticError::AddressOfNonVariable {
                                line: pos.line,
                                column: pos.column,
                            });
                        }
                        let operand_ty = self.visit_expr(operand)?;
                        expr.symbol = operand.symbol;
                        Type::Pointer(Box::new(operand_ty))
                    }
                    UnaryOp::Deref => {
                        let operand_ty = self.visit_expr(operand)?;
                        match operand_ty {
                            Type::Pointer(base) => *base,
                            _ => {
                                return Err(SemanticError::DerefNonPointer {
                                    line: pos.line,
                                    column: pos.column,
                                })
                            }
                        }
                    }
                    UnaryOp::Not => {
                        let operand_ty = self.visit_expr(operand)?;
                        if !operand_ty.is_primitive(Primitive::Bool) {
                            return Err(SemanticError::NotNonBool {
                                line: pos.line,
                                column: pos.column,
                            });
                        }
                        Type::Primitive(Primitive::Bool)
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let left_ty = self.visit_expr(lhs)?;
                let right_ty = self.visit_expr(rhs)?;
                if left_ty.category() != right_ty.category() {
                    return Err(SemanticError::IncompatibleOperands {
                        line: pos.line,
                        column: pos.column,
                    });
                }
                if op.is_comparison() {
                    Type::Primitive(Primitive::Bool)
                } else {
                    left_ty
                }
            }

            ExprKind::Call { name, args } => {
                let name = name.clone();
                let id = self
                    .table
                    .lookup(&name)
                    .ok_or_else(|| SemanticError::UndeclaredFunction {
                        name: name.clone(),
                        line: pos.line,
                        column: pos.column,
                    })?;
                let (ret, params) = match &self.table.symbol(id).kind {
                    SymbolKind::Func { ret, params, .. } => (ret.clone(), params.clone()),
                    _ => {
                        return Err(SemanticError::UndeclaredFunction {
                            name,
                            line: pos.line,
                            column: pos.column,
                        })
                    }
                };
                if args.len() != params.len() {
                    return Err(SemanticError::ArityMismatch {
                        name,
                        expected: params.len(),
                        found: args.len(),
                        line: pos.line,
                        column: pos.column,
                    });
                }
                for (index, (arg, param_ty)) in args.iter_mut().zip(&params).enumerate() {
                    let arg_ty = self.visit_expr(arg)?;
                    if !arg_ty.compatible(param_ty) {
                        return Err(SemanticError::ArgumentTypeMismatch {
                            name: name.clone(),
                            index: index + 1,
                            line: arg.pos.line,
                            column: arg.pos.column,
                        });
                    }
                }
                expr.symbol = Some(id);
                ret
            }

            ExprKind::Assign { target, value } => {
                let value_ty = self.visit_expr(value)?;
                let target_ty = self.visit_expr(target)?;
                if !target_ty.compatible(&value_ty) {
                    return Err(SemanticError::TypeMismatch {
                        context: "assignment".to_string(),
                        line: pos.line,
                        column: pos.column,
                    });
                }
                target_ty
            }
        };

        expr.ty = Some(ty.clone());
        Ok(ty)
    }

    /// Byte size of a type, erroring on unregistered structs and on
    /// non-positive array sizes (local arrays must have a positive constant
    /// element count).
    fn type_size(&self, ty: &Type, pos: Pos) -> Result<i64, SemanticError> {
        match ty {
            Type::Primitive(p) => Ok(p.size()),
            Type::Pointer(_) => Ok(8),
            Type::Array(base, count) => {
                if *count <= 0 {
                    return Err(SemanticError::NonPositiveArraySize {
                        line: pos.line,
                        column: pos.column,
                    });
                }
                Ok(self.type_size(base, pos)? * count)
            }
            // Only definitions this pass has registered count; the parser's
            // skeleton entries carry provisional sizes and no member scope.
            Type::Struct(name) => self
                .table
                .struct_def(name)
                .filter(|def| def.scope.is_some())
                .map(|def| def.size)
                .ok_or_else(|| SemanticError::UndefinedStruct {
                    name: name.clone(),
                    line: pos.line,
                    column: pos.column,
                }),
        }
    }
}
