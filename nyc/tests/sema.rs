use nyc::error::SemanticError;
use nyc::grammar::ast::{Expr, Program, Stmt};
use nyc::grammar::lexer::Lexer;
use nyc::symbols::{SymbolKind, SymbolTable};
use nyc::types::Type;
use nyc::{Parser, SemanticAnalyzer};

fn analyze(code: &str) -> Result<(Program, SymbolTable), SemanticError> {
    let (tokens, errors) = Lexer::new(code).tokenize();
    assert!(errors.is_empty(), "lexical errors in test input: {errors:?}");
    let (mut program, table) = Parser::new(tokens).parse().expect("parse");
    let mut analyzer = SemanticAnalyzer::new(table);
    analyzer.analyze(&mut program)?;
    Ok((program, analyzer.into_table()))
}

fn analyze_ok(code: &str) -> (Program, SymbolTable) {
    match analyze(code) {
        Ok(out) => out,
        Err(err) => panic!("analysis failed for {code:?}: {err}"),
    }
}

fn expect_err(code: &str, needle: &str) {
    let err = analyze(code).err().expect("expected a semantic error");
    let msg = err.to_string();
    assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
}

// --- resolution completeness ------------------------------------------------

fn check_expr(expr: &Expr) {
    assert!(expr.ty.is_some(), "unresolved type on {:?}", expr.kind);
    use nyc::grammar::ast::ExprKind::*;
    match &expr.kind {
        Var(_) | Member { .. } | Call { .. } => {
            assert!(expr.symbol.is_some(), "unresolved symbol on {:?}", expr.kind)
        }
        _ => {}
    }
    match &expr.kind {
        Member { base, .. } => check_expr(base),
        Index { base, index } => {
            check_expr(base);
            check_expr(index);
        }
        Unary { operand, .. } => check_expr(operand),
        Binary { lhs, rhs, .. } => {
            check_expr(lhs);
            check_expr(rhs);
        }
        Call { args, .. } => args.iter().for_each(check_expr),
        Assign { target, value } => {
            check_expr(target);
            check_expr(value);
        }
        _ => {}
    }
}

fn check_stmt(stmt: &Stmt) {
    match stmt {
        Stmt::Expr(expr) => check_expr(expr),
        Stmt::VarDecl(decl) => {
            assert!(decl.symbol.is_some(), "unresolved declaration {}", decl.name);
            if let Some(init) = &decl.init {
                check_expr(init);
            }
        }
        Stmt::Const(decl) => check_expr(&decl.value),
        Stmt::Return(ret) => check_expr(&ret.value),
        Stmt::Print(print) => print.args.iter().for_each(check_expr),
        Stmt::If(if_stmt) => {
            check_expr(&if_stmt.cond);
            if_stmt.then_block.iter().for_each(check_stmt);
            if_stmt.else_block.iter().for_each(check_stmt);
        }
        Stmt::While(while_stmt) => {
            check_expr(&while_stmt.cond);
            while_stmt.body.iter().for_each(check_stmt);
        }
        Stmt::For(for_stmt) => {
            if let Some(init) = &for_stmt.init {
                check_stmt(init);
            }
            if let Some(cond) = &for_stmt.cond {
                check_expr(cond);
            }
            if let Some(step) = &for_stmt.step {
                check_expr(step);
            }
            for_stmt.body.iter().for_each(check_stmt);
        }
        Stmt::Asm(_) | Stmt::Enum(_) | Stmt::Struct(_) => {}
    }
}

#[test]
fn resolution_is_complete_on_a_well_typed_program() {
    let (program, _) = analyze_ok(
        "struct P { int x; int y; }\n\
         int add(int a, int b) { return a + b; }\n\
         int main() {\n\
             P p;\n\
             p.x = 4;\n\
             int a[3];\n\
             a[0] = add(1, 2);\n\
             int v = 7;\n\
             int* q = &v;\n\
             bool flag = a[0] == 3;\n\
             if (flag) { print p.x; }\n\
             return 0;\n\
         }",
    );
    for func in &program.functions {
        func.body.iter().for_each(check_stmt);
    }
}

// --- offsets ----------------------------------------------------------------

#[test]
fn parameter_offsets_start_at_sixteen_and_locals_go_negative() {
    let (program, table) = analyze_ok(
        "int f(int a, int b) { int x = 1; int y = 2; return x; }\n\
         int main() { return f(1, 2); }",
    );
    let scope_id = program.functions[0].scope.expect("body scope recorded");
    let scope = table.scope(scope_id);
    for (name, symbol) in &scope.symbols {
        let SymbolKind::Var { offset, .. } = &symbol.kind else {
            panic!("non-variable symbol in a body scope");
        };
        match name.as_str() {
            "a" => assert_eq!(*offset, 16),
            "b" => assert_eq!(*offset, 24),
            "x" | "y" => assert!(*offset < 0, "local {name} has offset {offset}"),
            other => panic!("unexpected symbol {other}"),
        }
    }
    assert_eq!(scope.current_offset, -8); // two 4-byte ints
}

#[test]
fn offset_sign_discipline_holds_table_wide() {
    let (_, table) = analyze_ok(
        "struct P { int x; char c; int* p; }\n\
         int f(int a, bool b) { int v = 0; P q; return v; }\n\
         int main() { int m = f(1, true); return m; }",
    );
    for scope in table.all_scopes() {
        for symbol in scope.symbols.values() {
            if let SymbolKind::Member { offset, size, .. } = &symbol.kind {
                assert!(*offset >= 0);
                assert!(*size > 0);
            }
        }
    }
    let def = table.struct_def("P").expect("registered struct");
    for member in &def.members {
        assert!(member.offset >= 0 && member.offset < def.size);
    }
}

// --- struct layout ----------------------------------------------------------

#[test]
fn struct_members_pack_without_padding() {
    let (_, table) = analyze_ok(
        "struct P { int x; char c; int y; }\nint main() { P p; return 0; }",
    );
    let def = table.struct_def("P").expect("registered struct");
    assert_eq!(def.members[0].offset, 0);
    assert_eq!(def.members[1].offset, 4);
    assert_eq!(def.members[2].offset, 5);
    assert_eq!(def.size, 9);
}

#[test]
fn struct_size_is_idempotent() {
    let (_, table) = analyze_ok("struct P { int x; int y; }\nint main() { P p; return 0; }");
    let ty = Type::Struct("P".to_string());
    let first = table.type_size(&ty);
    let second = table.type_size(&ty);
    assert_eq!(first, second);
    assert_eq!(first, Some(8));
}

#[test]
fn nested_struct_members_require_prior_definition() {
    let (_, table) = analyze_ok(
        "struct Inner { int a; int b; }\n\
         struct Outer { Inner i; int c; }\n\
         int main() { Outer o; return 0; }",
    );
    let outer = table.struct_def("Outer").expect("registered struct");
    assert_eq!(outer.members[1].offset, 8);
    assert_eq!(outer.size, 12);

    expect_err(
        "struct Outer { Inner i; }\nint main() { return 0; }",
        "undefined struct 'Inner'",
    );
}

// --- negative cases ---------------------------------------------------------

#[test]
fn undeclared_identifier() {
    expect_err("int main() { return x; }", "undeclared");
}

#[test]
fn string_into_int_is_a_type_mismatch() {
    expect_err(
        "int main() { int x = \"hi\"; return 0; }",
        "type mismatch",
    );
}

#[test]
fn call_arity_is_checked() {
    expect_err(
        "int f(int a) { return a; }\nint main() { return f(1, 2); }",
        "expects 1 arguments",
    );
}

#[test]
fn conditions_must_be_boolean() {
    expect_err(
        "int main() { for (int i = 0; 5; i = i + 1) { } return 0; }",
        "condition must be boolean",
    );
    expect_err("int main() { if (1) { } return 0; }", "condition must be boolean");
    expect_err("int main() { while (1) { } return 0; }", "condition must be boolean");
}

#[test]
fn missing_main() {
    let err = analyze("int f() { return 1; }").err().expect("error");
    assert_eq!(err.to_string(), "No 'main' function defined.");
}

#[test]
fn main_shape_is_enforced() {
    expect_err("string main() { return \"x\"; }", "must return int");
    expect_err("int main(int argc) { return 0; }", "no parameters");
}

#[test]
fn redefinition_in_same_scope() {
    expect_err(
        "int main() { int x = 1; int x = 2; return 0; }",
        "redefinition of 'x'",
    );
}

#[test]
fn while_scope_allows_shadow_free_redeclaration() {
    // while opens its own scope, so an inner declaration does not collide
    analyze_ok(
        "int main() { bool go = true; while (go) { int t = 1; go = false; } return 0; }",
    );
}

#[test]
fn address_of_requires_a_variable() {
    expect_err("int main() { int* p = &1; return 0; }", "address-of");
}

#[test]
fn deref_requires_a_pointer() {
    expect_err("int main() { int x = 1; return *x; }", "dereference");
}

#[test]
fn not_requires_bool() {
    expect_err("int main() { bool b = !1; return 0; }", "'!' requires a bool");
}

#[test]
fn member_access_on_non_struct() {
    expect_err("int main() { int x = 1; return x.y; }", "non-struct");
}

#[test]
fn unknown_member() {
    expect_err(
        "struct P { int x; }\nint main() { P p; return p.z; }",
        "no member named 'z'",
    );
}

#[test]
fn array_index_must_be_int() {
    expect_err(
        "int main() { int a[2]; return a[true]; }",
        "index must be an integer",
    );
}

#[test]
fn array_size_must_be_positive() {
    expect_err("int main() { int a[0]; return 0; }", "non-positive size");
}

#[test]
fn enum_members_get_sequential_values() {
    let (_, table) = analyze_ok(
        "enum Color { RED, GREEN = 5, BLUE }\nint main() { return 0; }",
    );
    let lookup = |name: &str| {
        // enum members land in the analyzer's global scope
        table
            .all_scopes()
            .iter()
            .find_map(|scope| scope.symbols.get(name))
            .map(|symbol| match &symbol.kind {
                SymbolKind::EnumMember { value } => *value,
                other => panic!("unexpected kind {other:?}"),
            })
    };
    assert_eq!(lookup("RED"), Some(0));
    assert_eq!(lookup("GREEN"), Some(5));
    assert_eq!(lookup("BLUE"), Some(6));
}

#[test]
fn forward_references_between_functions_work() {
    analyze_ok(
        "int even(int n) { if (n == 0) { return 1; } return odd(n - 1); }\n\
         int odd(int n) { if (n == 0) { return 0; } return even(n - 1); }\n\
         int main() { return even(4); }",
    );
}
