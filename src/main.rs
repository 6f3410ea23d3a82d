mod commands;

use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use bfi::cli_util;
use bfi::config::Settings;
use bfi::{BracketPolicy, Engine, EofPolicy};
use clap::Parser;
use tracing::debug;

use commands::run::Source;

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] "<code>"        # Run Brainfuck code (args are concatenated)
  {0} [OPTIONS] --file <PATH>   # Run Brainfuck code loaded from file
  {0} [OPTIONS] < program.bf    # Run Brainfuck code piped into stdin
  {0} [OPTIONS] [-i]            # Start the interactive shell

Options:
  --file,        -f <PATH>   Read Brainfuck code from PATH instead of positional "<code>"
  --memory,      -m <BYTES>  Tape size in cells (default 30000, must be > 0)
  --interactive, -i          Start the shell (after running "<code>" or --file, if given)
  --newline,     -n          Print a newline after each execution
  --debug,       -d          Print a step-by-step table of operations instead of doing I/O
  --brackets <strict|balanced>  Bracket check before running (default strict)
  --eof <zero|unchanged>        What `,` stores at end of input (default zero)
  --max-steps <N>               Abort after N instructions (default unlimited)
  --help,        -h          Show this help

Notes:
- The tape wraps around: `<` on cell 0 moves to the last cell and `>` on the last cell to cell 0.
- Characters outside of Brainfuck's ><+-.,[] are ignored.
- In the shell, lines starting with '$' are commands; type $h for the list.
- Settings are read from $XDG_CONFIG_HOME/bfi.toml (or BFI_CONFIG) and BFI_MEMORY,
  BFI_BRACKETS, BFI_EOF, BFI_MAX_STEPS; flags win. BFI_LOG sets the log filter.

Examples:
- Load Brainfuck code from a file:
    {0} --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfi", disable_help_flag = true)]
struct Cli {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "code")]
    file: Option<PathBuf>,

    /// Tape size in cells
    #[arg(short = 'm', long = "memory", value_name = "BYTES")]
    memory: Option<usize>,

    /// Start the interactive shell
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Print a newline after each execution
    #[arg(short = 'n', long = "newline")]
    newline: bool,

    /// Print a step-by-step table of operations instead of doing I/O
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Bracket check before running
    #[arg(long = "brackets", value_name = "POLICY")]
    brackets: Option<BracketPolicy>,

    /// What `,` stores at end of input
    #[arg(long = "eof", value_name = "POLICY")]
    eof: Option<EofPolicy>,

    /// Abort after N instructions
    #[arg(long = "max-steps", value_name = "N")]
    max_steps: Option<usize>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

impl Cli {
    /// Flags take precedence over the config file and environment.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(memory) = self.memory {
            settings.engine.memory = memory;
        }
        if let Some(brackets) = self.brackets {
            settings.engine.brackets = brackets;
        }
        if let Some(eof) = self.eof {
            settings.engine.eof = eof;
        }
        if self.max_steps.is_some() {
            settings.engine.max_steps = self.max_steps;
        }
        if self.newline {
            settings.shell.newlines = true;
        }
    }

    fn source(&self) -> Option<Source> {
        if let Some(path) = &self.file {
            Some(Source::File(path.clone()))
        } else if !self.code.is_empty() {
            Some(Source::Code(self.code.join("")))
        } else if !self.interactive && !io::stdin().is_terminal() {
            Some(Source::Stdin)
        } else {
            None
        }
    }
}

fn main() {
    // Program name for messages, without the directory part
    let argv0 = env::args().next().unwrap_or_else(|| String::from("bfi"));
    let program = Path::new(&argv0)
        .file_name()
        .map_or_else(|| argv0.clone(), |name| name.to_string_lossy().into_owned());

    let cli = Cli::parse();

    if cli.help {
        usage_and_exit(&program, 0);
    }

    cli_util::init_logging();

    let mut settings = Settings::load();
    cli.apply_to(&mut settings);
    debug!(engine = ?settings.engine, shell = ?settings.shell, "resolved settings");

    let mut engine = match Engine::with_settings(&settings.engine) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            std::process::exit(1);
        }
    };

    let source = cli.source();
    let mut code = 0;
    if let Some(source) = &source {
        code = commands::run::run(&program, &mut engine, source, cli.debug, cli.newline);
    }

    if cli.interactive || source.is_none() {
        code = commands::shell::run(&program, engine, &settings);
    }

    std::process::exit(code);
}
