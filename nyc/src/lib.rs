pub mod codegen;
pub mod display;
pub mod error;
pub mod grammar;
pub mod sema;
pub mod symbols;
pub mod types;

pub use codegen::CodeGen;
pub use error::Error;
pub use grammar::lexer::Lexer;
pub use grammar::parsercore::Parser;
pub use sema::SemanticAnalyzer;
pub use symbols::SymbolTable;

/// Run the whole pipeline on one source string and return the assembly
/// text. Lexical diagnostics abort with the first error; callers that want
/// all of them drive the stages themselves, the way the binary does.
pub fn compile(source: &str) -> Result<String, Error> {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    if let Some(err) = lex_errors.into_iter().next() {
        return Err(Error::Lex(err));
    }

    let (mut program, table) = Parser::new(tokens).parse()?;

    let mut analyzer = SemanticAnalyzer::new(table);
    analyzer.analyze(&mut program)?;
    let table = analyzer.into_table();

    let asm = CodeGen::new(&program, &table).generate()?;
    Ok(asm)
}
