use nyc::compile;

fn compile_ok(code: &str) -> String {
    match compile(code) {
        Ok(asm) => {
            println!("{asm}");
            asm
        }
        Err(err) => panic!("compile failed for {code:?}: {err}"),
    }
}

fn assert_has(asm: &str, needle: &str) {
    assert!(asm.contains(needle), "assembly lacks {needle:?}:\n{asm}");
}

// --- the prelude and _start --------------------------------------------------

#[test]
fn prelude_and_start_shim() {
    let asm = compile_ok("int main() { return 42; }");
    assert_has(&asm, "section .data");
    assert_has(&asm, "_print_int_format db \"%d\", 10, 0");
    assert_has(&asm, "_print_str_format db \"%s\", 10, 0");
    assert_has(&asm, "_print_char_format db \"%c\", 10, 0");
    assert_has(&asm, "global _start");
    assert_has(&asm, "extern printf");
    assert_has(&asm, "extern strcmp");
    assert_has(&asm, "_start:");
    assert_has(&asm, "  call main");
    assert_has(&asm, "  mov rdi, rax");
    assert_has(&asm, "  mov rax, 60");
    assert_has(&asm, "  syscall");
}

// --- the six pipeline scenarios ---------------------------------------------

#[test]
fn minimal_return() {
    let asm = compile_ok("int main() { return 42; }");
    assert_has(&asm, "main:");
    assert_has(&asm, "    mov rax, 42");
    assert_has(&asm, "    jmp .main_epilogue");
    assert_has(&asm, ".main_epilogue:");
    assert_has(&asm, "    leave");
}

#[test]
fn integer_print_and_add() {
    let asm = compile_ok(
        "int add(int a, int b) { return a + b; }\n\
         int main() { int x = add(2, 3); print x; return 0; }",
    );
    assert_has(&asm, "add:");
    assert_has(&asm, "    add rax, rcx");
    assert_has(&asm, "    call add");
    // the callee spills its register parameters into their slots
    assert_has(&asm, "    mov [rbp + 16], rdi");
    assert_has(&asm, "    mov [rbp + 24], rsi");
    assert_has(&asm, "    movsx rax, dword [rbp + 16]");
    assert_has(&asm, "    lea rdi, [rel _print_int_format]");
    assert_has(&asm, "    call printf");
    // a non-main return leaves through its own epilogue
    assert_has(&asm, "    ret");
}

#[test]
fn string_print() {
    let asm = compile_ok("int main() { print \"hello\"; return 0; }");
    assert_has(&asm, "_str_0 db \"hello\", 0");
    assert_has(&asm, "    lea rax, [rel _str_0]");
    assert_has(&asm, "    lea rdi, [rel _print_str_format]");
    assert_has(&asm, "    xor rax, rax");
    assert_has(&asm, "    call printf");
}

#[test]
fn if_else_and_comparison() {
    let asm = compile_ok(
        "int main() { int x = 7; if (x > 3) { print 1; } else { print 0; } return 0; }",
    );
    assert_has(&asm, "    setg al");
    assert_has(&asm, "    movzx rax, al");
    assert_has(&asm, "    cmp rax, 0");
    assert_has(&asm, "    je .if_false_0");
    assert_has(&asm, ".if_true_0:");
    assert_has(&asm, "    jmp .if_end_0");
    assert_has(&asm, ".if_false_0:");
    assert_has(&asm, ".if_end_0:");
}

#[test]
fn while_loop() {
    let asm = compile_ok(
        "int main() { int i = 0; int s = 0; while (i < 5) { s = s + i; i = i + 1; } return s; }",
    );
    assert_has(&asm, ".while_start_0:");
    assert_has(&asm, "    setl al");
    assert_has(&asm, "    je .while_end_0");
    assert_has(&asm, "    jmp .while_start_0");
    assert_has(&asm, ".while_end_0:");
}

#[test]
fn struct_member_access() {
    let asm = compile_ok(
        "struct P { int x; int y; }\n\
         int main() { P p; p.x = 4; p.y = 5; return p.x + p.y; }",
    );
    // p.y sits four bytes into the struct
    assert_has(&asm, "    add rax, 4");
    assert_has(&asm, "    mov [rax], ebx");
    assert_has(&asm, "    movsx rax, dword [rax]");
    // 8 bytes of locals round up to one 16-byte frame
    assert_has(&asm, "    sub rsp, 16");
}

// --- emitted-code properties -------------------------------------------------

#[test]
fn frame_sizes_are_16_byte_aligned() {
    let sources = [
        "int main() { return 0; }",
        "int main() { int x = 1; return x; }",
        "int main() { int a[3]; char c = 'x'; bool b = true; return 0; }",
        "struct P { int x; char c; }\nint main() { P p; int y = 2; return y; }",
    ];
    for code in sources {
        let asm = compile_ok(code);
        for line in asm.lines() {
            if let Some(n) = line.trim().strip_prefix("sub rsp, ") {
                let n: i64 = n.trim().parse().expect("numeric frame size");
                assert_eq!(n % 16, 0, "unaligned frame in: {line}");
            }
        }
    }
}

#[test]
fn empty_frames_fall_back_to_64_bytes() {
    let asm = compile_ok("int f() { return 1; }\nint main() { return f(); }");
    assert_has(&asm, "    sub rsp, 64");
}

#[test]
fn labels_are_unique_per_compilation_unit() {
    let asm = compile_ok(
        "int main() {\n\
             int i = 0;\n\
             if (i == 0) { print 1; } else { print 2; }\n\
             if (i == 0) { print 3; }\n\
             while (i < 2) { i = i + 1; }\n\
             for (int j = 0; j < 2; j = j + 1) { print j; }\n\
             print \"a\", \"b\";\n\
             return 0;\n\
         }",
    );
    let mut labels = Vec::new();
    for line in asm.lines() {
        if line.ends_with(':') && !line.starts_with("section") {
            labels.push(line.to_string());
        }
        if let Some(rest) = line.strip_prefix("_str_") {
            if let Some(label_end) = rest.find(' ') {
                labels.push(format!("_str_{}", &rest[..label_end]));
            }
        }
    }
    let mut deduped = labels.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(
        labels.len(),
        deduped.len(),
        "duplicate labels in:\n{labels:?}"
    );
}

#[test]
fn for_loop_labels() {
    let asm = compile_ok("int main() { for (int i = 0; i < 3; i = i + 1) { print i; } return 0; }");
    assert_has(&asm, ".for_loop_condition_0:");
    assert_has(&asm, ".for_loop_start_0:");
    assert_has(&asm, "    jmp .for_loop_condition_0");
    assert_has(&asm, ".for_loop_end_0:");
}

#[test]
fn array_access_scales_by_element_size() {
    let asm = compile_ok(
        "int main() { int a[3]; a[0] = 5; a[1] = 6; return a[0] + a[1]; }",
    );
    assert_has(&asm, "    imul rbx, 4");
    assert_has(&asm, "    add rax, rbx");
    // int elements store through ebx and load with sign extension
    assert_has(&asm, "    mov [rax], ebx");
    assert_has(&asm, "    movsx rax, dword [rax]");
}

#[test]
fn address_of_and_deref() {
    let asm = compile_ok("int main() { int x = 3; int* p = &x; return *p; }");
    assert_has(&asm, "    lea rax, [rbp + -4]");
    assert_has(&asm, "    mov rax, [rax]");
}

#[test]
fn logical_not() {
    let asm = compile_ok("int main() { bool b = true; if (!b) { print 0; } return 0; }");
    assert_has(&asm, "    test rax, rax");
    assert_has(&asm, "    setz al");
}

#[test]
fn string_equality_calls_strcmp() {
    let asm = compile_ok(
        "int main() { string a = \"x\"; string b = \"y\"; if (a == b) { print 1; } return 0; }",
    );
    assert_has(&asm, "    call strcmp");
    assert_has(&asm, "    cmp eax, 0");
    assert_has(&asm, "    sete al");
}

#[test]
fn division_sign_extends() {
    let asm = compile_ok("int main() { int x = 7; return x / 2; }");
    assert_has(&asm, "    cqo");
    assert_has(&asm, "    idiv rbx");
}

#[test]
fn char_print_uses_char_format() {
    let asm = compile_ok("int main() { char c = 'A'; print c; return 0; }");
    assert_has(&asm, "    lea rdi, [rel _print_char_format]");
    // chars are one byte on the frame
    assert_has(&asm, "    movsx rax, byte [rbp + -1]");
}

#[test]
fn constants_inline_their_value() {
    let asm = compile_ok("int main() { const int K = 7; return K; }");
    assert_has(&asm, "    mov rax, 7");
}

#[test]
fn enum_members_inline_their_value() {
    let asm = compile_ok("enum Color { RED, GREEN, BLUE }\nint main() { return GREEN; }");
    assert_has(&asm, "    mov rax, 1");
}

#[test]
fn inline_asm_lines_pass_through() {
    let asm = compile_ok("int main() { asm { \"mov rax, 5\"; \"nop\"; } return 0; }");
    assert_has(&asm, "    mov rax, 5");
    assert_has(&asm, "    nop");
}

#[test]
fn extern_functions_emit_extern_directives_only() {
    let asm = compile_ok(
        "extern int putchar(int c);\n\
         int main() { putchar(65); return 0; }",
    );
    assert_has(&asm, "extern putchar");
    assert_has(&asm, "    call putchar");
    assert!(!asm.contains("putchar:"), "extern function got a body:\n{asm}");
}

#[test]
fn seventh_argument_lands_in_its_slot() {
    let asm = compile_ok(
        "int sum7(int a, int b, int c, int d, int e, int f, int g) {\n\
             return a + g;\n\
         }\n\
         int main() { return sum7(1, 2, 3, 4, 5, 6, 7); }",
    );
    // caller pushes all seven and cleans them up afterwards
    assert_has(&asm, "    add rsp, 56");
    // callee reads the seventh from beyond the register slots
    assert_has(&asm, "    movsx rax, dword [rbp + 64]");
}

#[test]
fn globals_reserve_bss_storage() {
    let asm = compile_ok("int counter;\nint main() { return 0; }");
    assert_has(&asm, "section .bss");
    assert_has(&asm, "counter: resb 4");
}

// --- failures keep their category --------------------------------------------

#[test]
fn error_messages_carry_their_category() {
    let cases = [
        ("int main() { return x; }", "SemanticError:"),
        ("int main() { return 42 }", "ParseError:"),
        ("int main() { return 4$2; }", "LexicalError:"),
    ];
    for (code, category) in cases {
        let err = compile(code).unwrap_err().to_string();
        assert!(
            err.starts_with(category),
            "expected {category} prefix, got: {err}"
        );
    }
}

#[test]
fn negative_scenarios() {
    let cases = [
        ("int main() { return x; }", "undeclared"),
        ("int main() { int x = \"hi\"; return 0; }", "type mismatch"),
        (
            "int f(int a) { return a; }\nint main() { return f(1, 2); }",
            "expects 1 arguments",
        ),
        (
            "int main() { for (int i = 0; 5; i = i + 1) { } return 0; }",
            "condition must be boolean",
        ),
        ("int f() { return 1; }", "No 'main' function defined."),
    ];
    for (code, needle) in cases {
        let err = compile(code).unwrap_err().to_string();
        assert!(err.contains(needle), "message {err:?} lacks {needle:?}");
    }
}
