use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use bfi::cli_util::print_engine_error;
use bfi::Engine;

/// Where the program text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Positional arguments, already concatenated.
    Code(String),
    File(PathBuf),
    /// Everything piped into stdin.
    Stdin,
}

impl Source {
    fn read(&self, program: &str) -> Result<String, String> {
        match self {
            Source::Code(code) => Ok(code.clone()),
            Source::File(path) => fs::read_to_string(path)
                .map_err(|e| format!("{program}: failed to read code file as UTF-8: {e}")),
            Source::Stdin => {
                let mut code = String::new();
                io::stdin()
                    .read_to_string(&mut code)
                    .map_err(|e| format!("{program}: failed reading UTF-8 from stdin: {e}"))?;
                Ok(code)
            }
        }
    }
}

/// Run one program on `engine`. Returns the process exit code.
pub fn run(program: &str, engine: &mut Engine, source: &Source, debug: bool, newline: bool) -> i32 {
    let code = match source.read(program) {
        Ok(code) => code,
        Err(msg) => {
            eprintln!("{msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let result = if debug {
        engine.execute_debug(&code)
    } else {
        engine.execute(&code)
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(err) => {
            print_engine_error(Some(program), &code, &err);
            1
        }
    };

    if newline {
        println!();
    }
    let _ = io::stdout().flush();
    exit_code
}
