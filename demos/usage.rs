use std::sync::{Arc, Mutex};

use bfi::Engine;

fn main() {
    // Classic Brainfuck "Hello World!" program
    let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let mut bf = match Engine::new(30_000) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to allocate tape: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = bf.execute(code) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    // The tape survives between runs; capture the next run's output instead of printing it.
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    bf.set_output_sink(move |bytes: &[u8]| {
        if let Ok(mut buf) = sink.lock() {
            buf.extend_from_slice(bytes);
        }
    });

    if let Err(err) = bf.execute("<<<.") {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    let tape = bf.tape();
    println!(
        "cursor at {}, cell holds {}, captured {:?}",
        tape.cursor(),
        tape.current_value(),
        captured.lock().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default()
    );
}
