use nyc::grammar::lexer::Lexer;
use nyc::grammar::token::TokenKind;

fn case(code: &str, expects: Vec<TokenKind>) {
    let (tokens, errors) = Lexer::new(code).tokenize();

    println!(" {code}");
    for (idx, token) in tokens.iter().enumerate() {
        println!(
            "{:>2}: {:?} at {}:{}",
            idx, token.kind, token.pos.line, token.pos.column
        );
    }

    assert!(errors.is_empty(), "unexpected lexical errors: {errors:?}");
    assert_eq!(tokens.len(), expects.len());
    for (idx, expect) in expects.iter().enumerate() {
        assert_eq!(tokens[idx].kind, *expect);
    }
}

#[test]
fn tokens() {
    use TokenKind::*;
    case(
        "int main() { return 42; } // trailing comment",
        vec![
            KwInt,
            Ident(format!("main")),
            LParen,
            RParen,
            LCurly,
            KwReturn,
            Number(42),
            Semicolon,
            RCurly,
            Eof,
        ],
    );
}

#[test]
fn two_char_operators_win_over_prefixes() {
    use TokenKind::*;
    case(
        "== != <= >= = < >",
        vec![
            EqualEqual,
            ExclEqual,
            LAngleEqual,
            RAngleEqual,
            Equal,
            LAngle,
            RAngle,
            Eof,
        ],
    );
}

#[test]
fn literals() {
    use TokenKind::*;
    case(
        "\"hello world\" 'x' true false 7",
        vec![
            Text(format!("hello world")),
            Char('x'),
            True,
            False,
            Number(7),
            Eof,
        ],
    );
}

#[test]
fn keywords_and_identifiers() {
    use TokenKind::*;
    case(
        "struct P { public int x; } const enum asm extern auto printer",
        vec![
            KwStruct,
            Ident(format!("P")),
            LCurly,
            KwPublic,
            KwInt,
            Ident(format!("x")),
            Semicolon,
            RCurly,
            KwConst,
            KwEnum,
            KwAsm,
            KwExtern,
            KwAuto,
            Ident(format!("printer")),
            Eof,
        ],
    );
}

#[test]
fn unknown_character_keeps_tokenizing() {
    let (tokens, errors) = Lexer::new("int $ x;").tokenize();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("unknown character"));
    assert!(tokens
        .iter()
        .any(|t| matches!(t.kind, TokenKind::Unknown('$'))));
    assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn unclosed_string_is_reported() {
    let (tokens, errors) = Lexer::new("\"abc").tokenize();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("unclosed string"));
    assert!(tokens
        .iter()
        .any(|t| matches!(&t.kind, TokenKind::Text(s) if s == "abc")));
    assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
}

#[test]
fn unclosed_char_is_reported() {
    let (_, errors) = Lexer::new("'a").tokenize();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("character literal"));
}

#[test]
fn stream_terminates_with_eof() {
    for code in ["", "   ", "// only a comment", "int main() { return 0; }"] {
        let (tokens, _) = Lexer::new(code).tokenize();
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
    }
}

#[test]
fn positions_are_monotone() {
    let code = "int main() {\n  int x = 1;\n  print x;\n  return 0;\n}\n";
    let (tokens, _) = Lexer::new(code).tokenize();
    for pair in tokens.windows(2) {
        let a = (pair[0].pos.line, pair[0].pos.column);
        let b = (pair[1].pos.line, pair[1].pos.column);
        assert!(a <= b, "positions went backwards: {a:?} then {b:?}");
    }
}

#[test]
fn comments_and_whitespace_are_skipped() {
    use TokenKind::*;
    case(
        "// full line\nint x; // rest of line\n",
        vec![KwInt, Ident(format!("x")), Semicolon, Eof],
    );
}
