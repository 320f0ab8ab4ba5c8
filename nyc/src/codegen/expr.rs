use super::{load_from_frame, load_from_rax, store_through_rax, CodeGen, Mode, ARG_REGISTERS};
use crate::error::CodegenError;
use crate::grammar::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::symbols::SymbolKind;
use crate::types::{Category, Primitive};

impl CodeGen<'_> {
    /// Emit one expression. rax is the accumulator; rbx/rcx/rdx are
    /// scratch, with the stack for intermediate saves. In `LValue` mode the
    /// address of the expression is left in rax instead of its value.
    pub(crate) fn gen_expr(
        &mut self,
        expr: &Expr,
        mode: Mode,
        out: &mut String,
    ) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::Int(value) => {
                out.push_str(&format!("    mov rax, {value}\n"));
                Ok(())
            }

            ExprKind::Bool(value) => {
                out.push_str(&format!("    mov rax, {}\n", i64::from(*value)));
                Ok(())
            }

            ExprKind::Char(value) => {
                out.push_str(&format!("    mov rax, {}\n", *value as u32));
                Ok(())
            }

            ExprKind::Str(value) => {
                let label = self.next_string_label();
                out.push_str("section .data\n");
                out.push_str(&format!("{label} db \"{value}\", 0\n"));
                out.push_str("section .text\n");
                out.push_str(&format!("    lea rax, [rel {label}]\n"));
                Ok(())
            }

            ExprKind::Var(name) => {
                let id = expr
                    .symbol
                    .ok_or_else(|| CodegenError::UnresolvedSymbol { name: name.clone() })?;
                let kind = self.table().symbol(id).kind.clone();
                match kind {
                    SymbolKind::Var { ty, offset, size } => {
                        if mode == Mode::LValue {
                            out.push_str(&format!("    lea rax, [rbp + {offset}]\n"));
                        } else {
                            match ty.category() {
                                // Arrays and structs stand for their address.
                                Category::Array | Category::Struct => {
                                    out.push_str(&format!("    lea rax, [rbp + {offset}]\n"));
                                }
                                _ => load_from_frame(out, size, offset),
                            }
                        }
                        Ok(())
                    }
                    // Constants inline their stored value expression.
                    SymbolKind::Const { value, .. } => self.gen_expr(&value, Mode::RValue, out),
                    SymbolKind::EnumMember { value } => {
                        out.push_str(&format!("    mov rax, {value}\n"));
                        Ok(())
                    }
                    _ => Err(CodegenError::UnresolvedSymbol { name: name.clone() }),
                }
            }

            ExprKind::Unary { op, operand } => match op {
                // Address-of: the operand's address is the value.
                UnaryOp::Addr => self.gen_expr(operand, Mode::LValue, out),
                UnaryOp::Deref => {
                    self.gen_expr(operand, Mode::RValue, out)?;
                    if mode == Mode::RValue {
                        out.push_str("    mov rax, [rax]\n");
                    }
                    Ok(())
                }
                UnaryOp::Not => {
                    self.gen_expr(operand, Mode::RValue, out)?;
                    out.push_str("    test rax, rax\n");
                    out.push_str("    setz al\n");
                    out.push_str("    movzx rax, al\n");
                    Ok(())
                }
            },

            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs, out),

            ExprKind::Index { base, index } => {
                self.gen_expr(index, Mode::RValue, out)?;
                out.push_str("    push rax\n");
                self.gen_expr(base, Mode::LValue, out)?;
                out.push_str("    pop rbx\n");
                let elem_ty = expr.ty.as_ref().ok_or(CodegenError::MissingType {
                    what: "array access",
                })?;
                let elem_size = self.sized(elem_ty)?;
                out.push_str(&format!("    imul rbx, {elem_size}\n"));
                out.push_str("    add rax, rbx\n");
                if mode == Mode::RValue {
                    load_from_rax(out, elem_size);
                }
                Ok(())
            }

            ExprKind::Member { base, member } => {
                // Struct expression in lvalue mode leaves its address.
                self.gen_expr(base, Mode::LValue, out)?;
                let id = expr
                    .symbol
                    .ok_or_else(|| CodegenError::UnresolvedSymbol {
                        name: member.clone(),
                    })?;
                let kind = self.table().symbol(id).kind.clone();
                let (offset, size) = match kind {
                    SymbolKind::Member { offset, size, .. } => (offset, size),
                    _ => {
                        return Err(CodegenError::UnresolvedSymbol {
                            name: member.clone(),
                        })
                    }
                };
                out.push_str(&format!("    add rax, {offset}\n"));
                if mode == Mode::RValue {
                    load_from_rax(out, size);
                }
                Ok(())
            }

            ExprKind::Call { name, args } => {
                // All arguments go on the stack right-to-left; the first six
                // also travel in registers, loaded from those slots.
                for arg in args.iter().rev() {
                    self.gen_expr(arg, Mode::RValue, out)?;
                    out.push_str("    push rax\n");
                }
                for index in 0..args.len().min(ARG_REGISTERS.len()) {
                    out.push_str(&format!(
                        "    mov {}, [rsp + {}]\n",
                        ARG_REGISTERS[index],
                        8 * index
                    ));
                }
                out.push_str(&format!("    call {name}\n"));
                if !args.is_empty() {
                    out.push_str(&format!("    add rsp, {}\n", 8 * args.len()));
                }
                Ok(())
            }

            ExprKind::Assign { target, value } => {
                self.gen_expr(value, Mode::RValue, out)?;
                out.push_str("    push rax\n");
                self.gen_expr(target, Mode::LValue, out)?;
                out.push_str("    pop rbx\n");
                let target_ty = target.ty.as_ref().ok_or(CodegenError::MissingType {
                    what: "assignment target",
                })?;
                let size = self.sized(target_ty)?;
                store_through_rax(out, size);
                out.push_str("    mov rax, rbx\n");
                Ok(())
            }
        }
    }

    fn gen_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        out: &mut String,
    ) -> Result<(), CodegenError> {
        // String equality and inequality compare contents via strcmp.
        let lhs_is_str = lhs
            .ty
            .as_ref()
            .map(|ty| ty.is_primitive(Primitive::Str))
            .unwrap_or(false);
        if lhs_is_str && matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            self.gen_expr(lhs, Mode::RValue, out)?;
            out.push_str("    push rax\n");
            self.gen_expr(rhs, Mode::RValue, out)?;
            out.push_str("    mov rsi, rax\n");
            out.push_str("    pop rdi\n");
            out.push_str("    call strcmp\n");
            out.push_str("    cmp eax, 0\n");
            out.push_str(if op == BinaryOp::Eq {
                "    sete al\n"
            } else {
                "    setne al\n"
            });
            out.push_str("    movzx rax, al\n");
            return Ok(());
        }

        self.gen_expr(lhs, Mode::RValue, out)?;
        out.push_str("    push rax\n");
        self.gen_expr(rhs, Mode::RValue, out)?;
        out.push_str("    pop rcx\n"); // left in rcx, right in rax

        match op {
            BinaryOp::Add => out.push_str("    add rax, rcx\n"),
            BinaryOp::Sub => {
                out.push_str("    sub rcx, rax\n");
                out.push_str("    mov rax, rcx\n");
            }
            BinaryOp::Mul => out.push_str("    imul rax, rcx\n"),
            BinaryOp::Div => {
                out.push_str("    mov rbx, rax\n");
                out.push_str("    mov rax, rcx\n");
                out.push_str("    cqo\n");
                out.push_str("    idiv rbx\n");
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => {
                out.push_str("    cmp rcx, rax\n");
                let set = match op {
                    BinaryOp::Eq => "sete",
                    BinaryOp::Ne => "setne",
                    BinaryOp::Lt => "setl",
                    BinaryOp::Gt => "setg",
                    BinaryOp::Le => "setle",
                    BinaryOp::Ge => "setge",
                    _ => return Err(CodegenError::UnknownOperator { op }),
                };
                out.push_str(&format!("    {set} al\n"));
                out.push_str("    movzx rax, al\n");
            }
        }
        Ok(())
    }
}
