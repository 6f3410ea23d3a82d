//! A Brainfuck interpreter library with an interactive shell.
//!
//! The core is an [`Engine`] that owns a byte [`Tape`] and runs instruction
//! streams against it:
//! - The tape has a fixed number of cells (30,000 by default), all starting at 0.
//! - The cursor wraps around: `<` on cell 0 moves to the last cell, `>` on the
//!   last cell moves to cell 0.
//! - Cells are unsigned bytes; `+` and `-` wrap between 0 and 255.
//! - `.` writes the current cell as a raw byte; `,` reads one byte, storing 0
//!   at end of input unless [`EofPolicy::Unchanged`] is selected.
//! - Brackets are verified before anything runs. By default they must nest
//!   properly; [`BracketPolicy::Balanced`] only compares the counts.
//! - Characters outside `><+-.,[]` are ignored.
//! - The tape survives between executions until [`Engine::reset`].
//!
//! Quick start:
//!
//! ```no_run
//! use bfi::Engine;
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let mut bf = Engine::new(30_000).expect("tape should allocate");
//! bf.execute(code).expect("program should run");
//! ```

pub mod cli_util;
pub mod config;
pub mod engine;
pub mod program;
pub mod shell;
pub mod tape;
pub mod theme;

pub use engine::{Engine, EngineError, EofPolicy};
pub use program::{verify, BracketKind, BracketPolicy, Instruction, Program};
pub use tape::{AllocationError, Tape, DEFAULT_TAPE_SIZE};
