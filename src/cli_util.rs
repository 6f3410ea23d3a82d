use std::io::{self, Write};

use tracing_subscriber::{fmt, EnvFilter};

use crate::EngineError;

/// Environment variable holding the log filter, e.g. `BFI_LOG=debug`.
pub const LOG_ENV: &str = "BFI_LOG";

/// Initialize stderr logging. Only warnings are shown unless `BFI_LOG` says otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second initialization (e.g. from tests) is harmless.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Pretty-print an [`EngineError`] with caret positioning.
/// If `program` is `Some("bfi")`, messages are prefixed with "bfi: ...".
pub fn print_engine_error(program: Option<&str>, code: &str, err: &EngineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        EngineError::InvalidProgram { ip, kind } => {
            let msg = prefix_program(&format!("Parse error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *ip);
        }
        EngineError::TruncatedJump { ip, kind } => {
            let msg = prefix_program(&format!("Runtime error: no jump target for {kind}"));
            print_error_with_context(&msg, code, *ip);
        }
        EngineError::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            print_error_with_context(&msg, code, *ip);
        }
        EngineError::StepLimitExceeded { .. } => {
            eprintln!("{}", prefix_program(&err.to_string()));
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{}", render_error_with_context(prefix, code, pos));
    let _ = io::stderr().flush();
}

fn render_error_with_context(prefix: &str, code: &str, pos: usize) -> String {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    // Newlines in the source would break the caret alignment.
    let slice: String = code[start_byte..end_byte]
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let caret = " ".repeat(pos.saturating_sub(start_char));
    format!("{prefix} at instruction {pos}\n  {slice}\n  {caret}^")
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte_idx, _)| byte_idx)
}
