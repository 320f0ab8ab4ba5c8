use super::{store_through_rax, CodeGen, Mode};
use crate::error::CodegenError;
use crate::grammar::ast::{Function, Stmt};
use crate::symbols::SymbolKind;
use crate::types::{Primitive, Type};

impl CodeGen<'_> {
    pub(crate) fn gen_stmt(
        &mut self,
        stmt: &Stmt,
        func: &Function,
        out: &mut String,
    ) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Expr(expr) => self.gen_expr(expr, Mode::RValue, out),

            Stmt::VarDecl(decl) => {
                // Struct locals only need their frame space.
                if matches!(decl.ty, Type::Struct(_)) {
                    return Ok(());
                }
                let Some(init) = &decl.init else {
                    return Ok(());
                };
                self.gen_expr(init, Mode::RValue, out)?;
                out.push_str("    push rax\n");
                let id = decl
                    .symbol
                    .ok_or_else(|| CodegenError::UnresolvedSymbol {
                        name: decl.name.clone(),
                    })?;
                let (offset, size) = match &self.table().symbol(id).kind {
                    SymbolKind::Var { offset, size, .. } => (*offset, *size),
                    _ => {
                        return Err(CodegenError::UnresolvedSymbol {
                            name: decl.name.clone(),
                        })
                    }
                };
                out.push_str(&format!("    lea rax, [rbp + {offset}]\n"));
                out.push_str("    pop rbx\n");
                store_through_rax(out, size);
                Ok(())
            }

            // Definitions emit nothing; constants and enum members inline
            // at their reference sites.
            Stmt::Const(_) | Stmt::Enum(_) | Stmt::Struct(_) => Ok(()),

            Stmt::Return(ret) => {
                self.gen_expr(&ret.value, Mode::RValue, out)?;
                if func.name == "main" {
                    out.push_str("    jmp .main_epilogue\n");
                } else {
                    out.push_str("    leave\n");
                    out.push_str("    ret\n");
                }
                Ok(())
            }

            Stmt::Print(print) => {
                for arg in &print.args {
                    self.gen_expr(arg, Mode::RValue, out)?;
                    out.push_str("    mov rsi, rax\n");
                    let ty = arg
                        .ty
                        .as_ref()
                        .ok_or(CodegenError::MissingType { what: "print" })?;
                    let fmt = if ty.is_primitive(Primitive::Str) {
                        "_print_str_format"
                    } else if ty.is_primitive(Primitive::Char) {
                        "_print_char_format"
                    } else {
                        "_print_int_format"
                    };
                    out.push_str(&format!("    lea rdi, [rel {fmt}]\n"));
                    out.push_str("    xor rax, rax\n");
                    out.push_str("    call printf\n");
                }
                Ok(())
            }

            Stmt::If(if_stmt) => {
                let id = self.next_label();
                let true_label = format!(".if_true_{id}");
                let false_label = format!(".if_false_{id}");
                let end_label = format!(".if_end_{id}");

                self.gen_expr(&if_stmt.cond, Mode::RValue, out)?;
                out.push_str("    cmp rax, 0\n");
                out.push_str(&format!("    je {false_label}\n"));

                out.push_str(&format!("{true_label}:\n"));
                for stmt in &if_stmt.then_block {
                    self.gen_stmt(stmt, func, out)?;
                }
                out.push_str(&format!("    jmp {end_label}\n"));

                out.push_str(&format!("{false_label}:\n"));
                for stmt in &if_stmt.else_block {
                    self.gen_stmt(stmt, func, out)?;
                }

                out.push_str(&format!("{end_label}:\n"));
                Ok(())
            }

            Stmt::While(while_stmt) => {
                let id = self.next_label();
                let start_label = format!(".while_start_{id}");
                let end_label = format!(".while_end_{id}");

                out.push_str(&format!("{start_label}:\n"));
                self.gen_expr(&while_stmt.cond, Mode::RValue, out)?;
                out.push_str("    cmp rax, 0\n");
                out.push_str(&format!("    je {end_label}\n"));

                for stmt in &while_stmt.body {
                    self.gen_stmt(stmt, func, out)?;
                }

                out.push_str(&format!("    jmp {start_label}\n"));
                out.push_str(&format!("{end_label}:\n"));
                Ok(())
            }

            Stmt::For(for_stmt) => {
                let id = self.next_label();
                let start_label = format!(".for_loop_start_{id}");
                let condition_label = format!(".for_loop_condition_{id}");
                let end_label = format!(".for_loop_end_{id}");

                if let Some(init) = &for_stmt.init {
                    self.gen_stmt(init, func, out)?;
                }

                out.push_str(&format!("{condition_label}:\n"));
                if let Some(cond) = &for_stmt.cond {
                    self.gen_expr(cond, Mode::RValue, out)?;
                    out.push_str("    cmp rax, 0\n");
                    out.push_str(&format!("    je {end_label}\n"));
                }

                out.push_str(&format!("{start_label}:\n"));
                for stmt in &for_stmt.body {
                    self.gen_stmt(stmt, func, out)?;
                }
                if let Some(step) = &for_stmt.step {
                    self.gen_expr(step, Mode::RValue, out)?;
                }

                out.push_str(&format!("    jmp {condition_label}\n"));
                out.push_str(&format!("{end_label}:\n"));
                Ok(())
            }

            Stmt::Asm(block) => {
                for line in &block.lines {
                    out.push_str(&format!("    {line}\n"));
                }
                Ok(())
            }
        }
    }
}
