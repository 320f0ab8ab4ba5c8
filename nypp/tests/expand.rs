use std::path::Path;

use nypp::Preprocessor;

fn expand(source: &str) -> String {
    let mut preprocessor = Preprocessor::new();
    let mut out = String::new();
    preprocessor.process_source(source, Path::new("."), &mut out);
    out
}

#[test]
fn round_trip_without_directives() {
    let source = "int main() {\n    return 0;\n}\n";
    assert_eq!(expand(source), source);
}

#[test]
fn round_trip_adds_at_most_a_trailing_newline() {
    assert_eq!(expand("int x;"), "int x;\n");
}

#[test]
fn define_replaces_whole_words_only() {
    let out = expand("#define N 5\nint x = N;\nint NN = 1;\nint aN = N;\n");
    assert_eq!(out, "int x = 5;\nint NN = 1;\nint aN = 5;\n");
}

#[test]
fn define_with_multi_token_value() {
    let out = expand("#define GREETING \"hello world\"\nprint GREETING;\n");
    assert_eq!(out, "print \"hello world\";\n");
}

#[test]
fn ifndef_skips_when_defined() {
    let out = expand("#define A 1\n#ifndef A\nhidden\n#endif\nshown\n");
    assert!(!out.contains("hidden"));
    assert!(out.contains("shown"));
}

#[test]
fn ifndef_includes_when_not_defined() {
    let out = expand("#ifndef A\nkept\n#endif\n");
    assert!(out.contains("kept"));
}

#[test]
fn ifndef_nests() {
    let out = expand(
        "#define A 1\n\
         #ifndef A\n\
         #ifndef B\n\
         inner\n\
         #endif\n\
         outer\n\
         #endif\n\
         tail\n",
    );
    assert!(!out.contains("inner"));
    assert!(!out.contains("outer"));
    assert!(out.contains("tail"));
}

#[test]
fn defines_inside_skipped_regions_are_ignored() {
    let out = expand("#define A 1\n#ifndef A\n#define B 2\n#endif\nint x = B;\n");
    assert_eq!(out, "int x = B;\n");
}

#[test]
fn version_macro() {
    let out = expand("print __VERSION__;\n");
    assert_eq!(out, "print \"0.1 beta\";\n");
}

#[test]
fn system_macro_is_quoted_and_known() {
    let out = expand("print __SYSTEM__;\n");
    let value = out.trim_start_matches("print ").trim_end_matches(";\n");
    assert!(
        ["\"Linux\"", "\"Windows\"", "\"macOS\"", "\"Unknown\""].contains(&value),
        "unexpected system name: {value}"
    );
}

#[test]
fn date_macros_are_quoted() {
    for source in ["x __DATE__;\n", "x __TIME__;\n", "x __DATE_TIME__;\n"] {
        let out = expand(source);
        let value = out.trim_start_matches("x ").trim_end_matches(";\n");
        assert!(
            value.starts_with('"') && value.ends_with('"'),
            "macro did not expand to a quoted string: {out}"
        );
    }
}

#[test]
fn invalid_directives_pass_through() {
    let out = expand("#define\n");
    assert_eq!(out, "#define\n");
}

#[test]
fn includes_resolve_relative_to_the_including_file() {
    let dir = std::env::temp_dir().join(format!("nypp_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    std::fs::write(dir.join("lib.ny"), "int helper() { return 1; }\n").expect("write lib");
    std::fs::write(
        dir.join("main.ny"),
        "include \"lib.ny\"\nint main() { return helper(); }\n",
    )
    .expect("write main");

    let mut preprocessor = Preprocessor::new();
    let mut out = String::new();
    preprocessor
        .process_file(&dir.join("main.ny"), &mut out)
        .expect("preprocess");

    assert!(out.contains("int helper() { return 1; }"));
    assert!(out.contains("int main() { return helper(); }"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn included_files_are_expanded_recursively() {
    let dir = std::env::temp_dir().join(format!("nypp_guard_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    std::fs::write(
        dir.join("guarded.ny"),
        "#ifndef GUARD\n#define GUARD 1\nint once() { return 1; }\n#endif\n",
    )
    .expect("write header");
    std::fs::write(
        dir.join("main.ny"),
        "include \"guarded.ny\"\ninclude \"guarded.ny\"\nint main() { return once(); }\n",
    )
    .expect("write main");

    let mut preprocessor = Preprocessor::new();
    let mut out = String::new();
    preprocessor
        .process_file(&dir.join("main.ny"), &mut out)
        .expect("preprocess");

    assert_eq!(out.matches("int once()").count(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_include_is_a_warning_not_an_error() {
    let out = expand("include \"no_such_file.ny\"\nint main() { return 0; }\n");
    assert!(out.contains("int main()"));
}
