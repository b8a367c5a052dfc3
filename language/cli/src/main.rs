use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;

use crate::arguments::Arguments;

pub mod arguments;

/// The CLI entry point (§6 "CLI"): validate the path, read the source,
/// run comment-stripping + parsing + the three-pass semantic analysis,
/// and report the result the way `original_source/wandle/main.py` does.
fn main() -> ExitCode {
    let arguments = Arguments::from_arguments(env::args());
    let path = &arguments.model_filename;

    if !path.exists() {
        println!("ERROR: {} does not exist.", path.display());
        return ExitCode::FAILURE;
    }
    if !path.is_file() {
        println!("ERROR: {} is not a file.", path.display());
        return ExitCode::FAILURE;
    }

    let source = match read_source(path) {
        Ok(source) => source,
        Err(error) => {
            println!("{}", format!("{:#}", error).bright_red());
            return ExitCode::FAILURE;
        }
    };

    let tree = match parser::parse(&source) {
        Ok(tree) => tree,
        Err(error) => {
            eprintln!("{}", error.to_string().bright_red());
            return ExitCode::FAILURE;
        }
    };

    match checker::build_model(&tree) {
        Ok(_) => {
            println!("Model is valid.");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            error.print();
            return ExitCode::FAILURE;
        }
    }
}

fn read_source(path: &std::path::Path) -> anyhow::Result<String> {
    return fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
}
