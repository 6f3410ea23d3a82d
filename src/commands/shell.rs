use std::env;
use std::io::{self, IsTerminal, Write};

use bfi::config::Settings;
use bfi::shell::{run_bare, run_editor, select_mode, Shell, ShellMode};
use bfi::Engine;
use tracing::debug;

// Public entry point for the shell from main.rs
pub fn run(program: &str, engine: Engine, settings: &Settings) -> i32 {
    let env_mode = env::var("BFI_SHELL_MODE").ok();
    let mode = match select_mode(env_mode.as_deref(), io::stdin().is_terminal()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };
    debug!(?mode, "starting shell");

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut shell = Shell::new(engine, &settings.shell);

    let result = match mode {
        ShellMode::Editor => {
            // Print banners only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("Brainfuck shell ({} cells)", shell.engine().tape().len());
                eprintln!("Type $h for help, $q or Ctrl+d to exit");
                let _ = io::stderr().flush();
            }
            run_editor(&mut shell, &settings.shell.prompt, &settings.colors)
        }
        ShellMode::Bare => run_bare(&mut shell, |buf| io::stdin().read_line(buf), &mut io::stdout()),
    };

    if let Err(e) = result {
        eprintln!("{program}: shell error: {e}");
        let _ = io::stderr().flush();
        return 1;
    }
    0
}
