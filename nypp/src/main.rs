use std::path::Path;
use std::process::ExitCode;

use color_print::ceprintln;

use nypp::Preprocessor;

#[derive(Debug, clap::Parser)]
#[clap(version, about)]
struct Args {
    /// Input source file; the expanded text goes to standard out
    input: String,
}

fn main() -> ExitCode {
    use clap::Parser;

    let args = Args::parse();

    let mut preprocessor = Preprocessor::new();
    let mut out = String::new();
    match preprocessor.process_file(Path::new(&args.input), &mut out) {
        Ok(()) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            ceprintln!("<red,bold>error</>: {}", err);
            ExitCode::FAILURE
        }
    }
}
