use bfi::{BracketPolicy, Engine};

fn main() {
    // Debug mode does no real I/O and prints a step-by-step table.
    // Program: move right, increment, loop it back to zero, move left and output (suppressed)
    let code = ">++[-]<.";

    let mut bf = match Engine::new(8) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to allocate tape: {err}");
            std::process::exit(1);
        }
    };
    bf.set_bracket_policy(BracketPolicy::Strict);

    if let Err(err) = bf.execute_debug(code) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }
}
