mod expr;
mod stmt;

use itertools::chain;

use crate::error::CodegenError;
use crate::grammar::ast::{Function, Program, Stmt};
use crate::symbols::SymbolTable;
use crate::types::Type;

/// System V integer argument registers, in order.
pub(crate) const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Emission mode threaded through expression visits: `LValue` leaves the
/// address of the expression in rax, `RValue` its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    RValue,
    LValue,
}

/// Walks the analyzed tree and renders NASM text for Linux x86-64. Reads
/// the symbol table through the symbol ids the analyzer left on the nodes;
/// never mutates it.
pub struct CodeGen<'a> {
    program: &'a Program,
    table: &'a SymbolTable,
    label_counter: usize,
    string_counter: usize,
}

impl<'a> CodeGen<'a> {
    pub fn new(program: &'a Program, table: &'a SymbolTable) -> Self {
        CodeGen {
            program,
            table,
            label_counter: 0,
            string_counter: 0,
        }
    }

    pub(crate) fn table(&self) -> &SymbolTable {
        self.table
    }

    /// Produce the complete assembly for the program, chained together from
    /// its segments: prelude, reserved globals, one text block per function,
    /// and the `_start` shim. The caller writes it to disk only on success,
    /// so a failed run leaves nothing behind.
    pub fn generate(mut self) -> Result<String, CodegenError> {
        let program = self.program;

        let mut prelude = String::new();
        prelude.push_str("section .data\n");
        prelude.push_str("  _print_int_format db \"%d\", 10, 0\n");
        prelude.push_str("  _print_str_format db \"%s\", 10, 0\n");
        prelude.push_str("  _print_char_format db \"%c\", 10, 0\n");
        prelude.push_str("section .text\n");
        prelude.push_str("global _start\n");
        prelude.push_str("extern printf\n");
        prelude.push_str("extern strcmp\n");
        for func in &program.functions {
            if func.is_extern {
                prelude.push_str(&format!("extern {}\n", func.name));
            }
        }

        let globals = self.emit_globals()?;

        let functions = program
            .functions
            .iter()
            .filter(|func| !func.is_extern)
            .map(|func| self.gen_function(func))
            .collect::<Result<Vec<_>, _>>()?;

        let mut start = String::new();
        start.push_str("_start:\n");
        start.push_str("  call main\n");
        start.push_str("  mov rdi, rax\n");
        start.push_str("  mov rax, 60\n");
        start.push_str("  syscall\n");

        Ok(chain!([prelude, globals], functions, [start]).collect())
    }

    // Top-level declarations reserve zeroed storage.
    fn emit_globals(&self) -> Result<String, CodegenError> {
        let globals: Vec<_> = self
            .program
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::VarDecl(decl) => Some(decl),
                _ => None,
            })
            .collect();
        if globals.is_empty() {
            return Ok(String::new());
        }
        let mut out = String::new();
        out.push_str("section .bss\n");
        for decl in globals {
            let size = self.sized(&decl.ty)?;
            out.push_str(&format!("{}: resb {}\n", decl.name, size));
        }
        out.push_str("section .text\n");
        Ok(out)
    }

    fn gen_function(&mut self, func: &Function) -> Result<String, CodegenError> {
        // The body is rendered first so the prologue can know the final
        // frame size.
        let mut body = String::new();
        for stmt in &func.body {
            self.gen_stmt(stmt, func, &mut body)?;
        }

        let mut prologue = String::new();
        prologue.push_str(&format!("{}:\n", func.name));
        prologue.push_str("    push rbp\n");
        prologue.push_str("    mov rbp, rsp\n");

        let scope = func.scope.ok_or_else(|| CodegenError::UnresolvedSymbol {
            name: func.name.clone(),
        })?;
        let mut frame_size = -self.table.scope(scope).current_offset;
        if frame_size == 0 {
            frame_size = 64; // leaf code still pushes temporaries
        }
        frame_size = (frame_size + 15) / 16 * 16;
        prologue.push_str(&format!("    sub rsp, {frame_size}\n"));

        // Register-passed parameters re-land in their stack slots; the
        // caller pushed the same values there, so the slots exist.
        for (index, _) in func.params.iter().take(ARG_REGISTERS.len()).enumerate() {
            let offset = 16 + 8 * index as i64;
            prologue.push_str(&format!(
                "    mov [rbp + {offset}], {}\n",
                ARG_REGISTERS[index]
            ));
        }

        let mut epilogue = String::new();
        if func.name == "main" {
            epilogue.push_str(".main_epilogue:\n");
        }
        epilogue.push_str("    leave\n");
        epilogue.push_str("    ret\n\n");

        Ok(chain!([prologue], [body], [epilogue]).collect())
    }

    pub(crate) fn next_label(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    pub(crate) fn next_string_label(&mut self) -> String {
        let label = format!("_str_{}", self.string_counter);
        self.string_counter += 1;
        label
    }

    pub(crate) fn sized(&self, ty: &Type) -> Result<i64, CodegenError> {
        self.table
            .type_size(ty)
            .ok_or_else(|| CodegenError::UndefinedStruct {
                name: ty.to_string(),
            })
    }
}

// Width-dispatched moves: 1- and 4-byte values sign-extend into rax,
// 8-byte values move directly.

pub(crate) fn load_from_frame(out: &mut String, size: i64, offset: i64) {
    match size {
        1 => out.push_str(&format!("    movsx rax, byte [rbp + {offset}]\n")),
        4 => out.push_str(&format!("    movsx rax, dword [rbp + {offset}]\n")),
        _ => out.push_str(&format!("    mov rax, [rbp + {offset}]\n")),
    }
}

pub(crate) fn load_from_rax(out: &mut String, size: i64) {
    match size {
        1 => out.push_str("    movsx rax, byte [rax]\n"),
        4 => out.push_str("    movsx rax, dword [rax]\n"),
        _ => out.push_str("    mov rax, [rax]\n"),
    }
}

/// Store rbx (the value) through rax (the address).
pub(crate) fn store_through_rax(out: &mut String, size: i64) {
    match size {
        1 => out.push_str("    mov [rax], bl\n"),
        4 => out.push_str("    mov [rax], ebx\n"),
        _ => out.push_str("    mov [rax], rbx\n"),
    }
}
