use color_print::cprintln;

use crate::grammar::ast::Program;
use crate::grammar::token::Token;
use crate::symbols::{SymbolKind, SymbolTable};

/// Dump the token stream, one token per line with its source position.
pub fn print_tokens(tokens: &[Token]) {
    for (idx, token) in tokens.iter().enumerate() {
        println!(
            "{:>4}: {:?} at {}:{}",
            idx, token.kind, token.pos.line, token.pos.column
        );
    }
}

/// Summarize the analyzed program: struct layouts, function signatures and
/// the frame slots of every function body.
pub fn print_summary(program: &Program, table: &SymbolTable) {
    cprintln!("<bold>Structs</>");
    for (name, def) in table.structs() {
        cprintln!(
            "  <green>{}</> : {} members, {} bytes",
            name,
            def.members.len(),
            def.size
        );
        for member in &def.members {
            println!("    +{:<3} {} : {}", member.offset, member.name, member.ty);
        }
    }

    cprintln!("<bold>Functions</>");
    for func in &program.functions {
        let params = func
            .params
            .iter()
            .map(|p| p.ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if func.is_extern {
            cprintln!(
                "  <red>{}</>({}) -> {} [extern]",
                func.name,
                params,
                func.return_type
            );
        } else {
            cprintln!("  <green>{}</>({}) -> {}", func.name, params, func.return_type);
        }
    }

    cprintln!("<bold>Frame slots</>");
    for func in &program.functions {
        let Some(scope) = func.scope else { continue };
        for (name, symbol) in &table.scope(scope).symbols {
            if let SymbolKind::Var { offset, size, .. } = &symbol.kind {
                println!("  {:>5} : {name} ({size} bytes) in {}", offset, func.name);
            }
        }
    }
}
