use std::io;
use std::path::Path;
use std::process::{Command, ExitCode, Stdio};

use color_print::{ceprintln, cprintln};

#[derive(Debug, clap::Parser)]
#[clap(version, about)]
struct Args {
    /// Input source file
    input: String,

    /// Name of the final executable under out/
    #[clap(short, long, default_value = "ny_bin")]
    output: String,

    /// Stop after assembling the object file
    #[clap(long = "obj")]
    obj_only: bool,
}

fn main() -> ExitCode {
    use clap::Parser;

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            ceprintln!("<red,bold>error</>: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> io::Result<ExitCode> {
    // The preprocessor and compiler live next to this binary.
    let exe = std::env::current_exe()?;
    let bin_dir = exe.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let nypp_bin = bin_dir.join("nypp");
    let nyc_bin = bin_dir.join("nyc");

    let out_dir = std::env::current_dir()?.join("out");
    std::fs::create_dir_all(&out_dir)?;

    let stem = Path::new(&args.input)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("main")
        .to_string();
    let pre_out = out_dir.join(format!("{stem}.pre.nyt"));
    let asm_file = out_dir.join("out.asm");
    let obj_file = out_dir.join(format!("{stem}.o"));
    let final_exe = out_dir.join(&args.output);

    cprintln!("<bold>--- Running preprocessor ---</>");
    let expanded = Command::new(&nypp_bin)
        .arg(&args.input)
        .stderr(Stdio::inherit())
        .output()?;
    if !expanded.status.success() {
        return Ok(ExitCode::FAILURE);
    }
    std::fs::write(&pre_out, &expanded.stdout)?;

    cprintln!("<bold>--- Running compiler ---</>");
    if !run_stage(Command::new(&nyc_bin).arg(&pre_out).arg(&out_dir))? {
        return Ok(ExitCode::FAILURE);
    }

    cprintln!("<bold>--- Assembling out.asm ---</>");
    if !run_stage(
        Command::new("nasm")
            .args(["-f", "elf64"])
            .arg(&asm_file)
            .arg("-o")
            .arg(&obj_file),
    )? {
        return Ok(ExitCode::FAILURE);
    }

    if args.obj_only {
        return Ok(ExitCode::SUCCESS);
    }

    cprintln!("<bold>--- Linking ---</>");
    if !run_stage(
        Command::new("ld")
            .arg("-o")
            .arg(&final_exe)
            .arg(&obj_file)
            .args(["-lc", "--dynamic-linker", "/usr/lib64/ld-linux-x86-64.so.2"]),
    )? {
        return Ok(ExitCode::FAILURE);
    }

    cprintln!("<bold>--- Running output program ---</>");
    let status = Command::new(&final_exe).status()?;
    match status.code() {
        Some(code) => println!("\nExit Code: {code}"),
        None => println!("\nterminated by signal"),
    }

    Ok(ExitCode::SUCCESS)
}

fn run_stage(command: &mut Command) -> io::Result<bool> {
    let status = command.status()?;
    Ok(status.success())
}
