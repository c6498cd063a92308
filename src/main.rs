//! # Whacky Compiler Executable
//!
//! The command-line entry point. Parses the arguments with `clap`, hands the
//! source file to the [`Compiler`] driver, and renders any error as a single
//! line on stderr with a non-zero exit.

use clap::error::ErrorKind;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::process;

use whacky::{CompileError, Compiler};

fn main() {
    let result = Command::new("whacky")
        .version("0.1.0")
        .about("Whacky compiler")
        .override_usage("whacky <input.wy>")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Whacky source file to compile"),
        )
        .arg(
            Arg::new("show-asm")
                .long("show-asm")
                .action(clap::ArgAction::SetTrue)
                .help("Print the generated assembly instead of assembling it"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(clap::ArgAction::SetTrue)
                .help("Show step-by-step compilation progress"),
        )
        .try_get_matches();

    let matches = match result {
        Ok(matches) => matches,
        Err(err)
            if err.kind() == ErrorKind::DisplayHelp || err.kind() == ErrorKind::DisplayVersion =>
        {
            err.exit();
        }
        Err(_) => {
            eprintln!("{}", CompileError::Usage);
            process::exit(1);
        }
    };

    let Some(file) = matches.get_one::<String>("file") else {
        eprintln!("{}", CompileError::Usage);
        process::exit(1);
    };

    let mut compiler = Compiler::new();
    compiler.source_path = PathBuf::from(file);
    compiler.show_asm = matches.get_flag("show-asm");
    compiler.verbose = matches.get_flag("verbose");

    if let Err(e) = compiler.build() {
        eprintln!("{}", e);
        process::exit(1);
    }
}
