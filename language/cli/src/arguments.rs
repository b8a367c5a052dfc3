use std::env::Args;
use std::path::PathBuf;

/// The CLI's entire argument surface (§6 "CLI"): a single positional
/// path to the Wandle source file to check. No flags, no subcommands —
/// the original `main.py` takes exactly one `model_filename` argument
/// and so does this binary.
pub struct Arguments {
    pub model_filename: PathBuf,
}

impl Arguments {
    pub fn from_arguments(mut arguments: Args) -> Self {
        // Skip the first arg (running location).
        arguments.next();

        let model_filename = arguments.next().expect("Usage: cli <model_filename>");
        return Self { model_filename: PathBuf::from(model_filename) };
    }
}
