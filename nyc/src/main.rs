use std::path::Path;
use std::process::ExitCode;

use color_print::cprintln;

use nyc::error::Error;
use nyc::{CodeGen, Lexer, SemanticAnalyzer};

#[derive(Debug, clap::Parser)]
#[clap(version, about)]
struct Args {
    /// Input source file (.ny / .nyt)
    input: String,

    /// Directory the generated out.asm is written to
    #[clap(default_value = ".")]
    output_dir: String,

    /// Dump tokens and the resolved program before emitting
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    use clap::Parser;

    let args = Args::parse();

    let ext = Path::new(&args.input)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    if ext != "ny" && ext != "nyt" {
        cprintln!(
            "<red,bold>error</>: input file must have .ny or .nyt extension (found: .{})",
            ext
        );
        return ExitCode::from(3);
    }

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            cprintln!("<red,bold>error</>: IOError: {}: {}", args.input, err);
            return ExitCode::from(2);
        }
    };

    // 1. Tokenize. Lexical diagnostics are all reported before aborting.
    let (tokens, lex_errors) = Lexer::new(&source).tokenize();
    for err in &lex_errors {
        cprintln!("<red,bold>error</>: LexicalError: {}", err);
    }
    if !lex_errors.is_empty() {
        return ExitCode::from(1);
    }
    if args.verbose {
        nyc::display::print_tokens(&tokens);
    }

    // 2. Parse tokens into the tree and the symbol-table skeleton
    let (mut program, table) = match nyc::Parser::new(tokens).parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            cprintln!("<red,bold>error</>: {}", Error::from(err));
            return ExitCode::from(1);
        }
    };

    // 3. Resolve names, types, sizes and offsets
    let mut analyzer = SemanticAnalyzer::new(table);
    if let Err(err) = analyzer.analyze(&mut program) {
        cprintln!("<red,bold>error</>: {}", Error::from(err));
        return ExitCode::from(1);
    }
    let table = analyzer.into_table();
    if args.verbose {
        nyc::display::print_summary(&program, &table);
    }

    // 4. Emit assembly; the file is written only on success
    let asm = match CodeGen::new(&program, &table).generate() {
        Ok(asm) => asm,
        Err(err) => {
            cprintln!("<red,bold>error</>: {}", Error::from(err));
            return ExitCode::from(1);
        }
    };

    let out_path = Path::new(&args.output_dir).join("out.asm");
    if let Err(err) = std::fs::write(&out_path, asm) {
        cprintln!(
            "<red,bold>error</>: IOError: {}: {}",
            out_path.display(),
            err
        );
        return ExitCode::from(2);
    }

    println!(
        "Successfully generated assembly to '{}'",
        out_path.display()
    );
    ExitCode::SUCCESS
}
