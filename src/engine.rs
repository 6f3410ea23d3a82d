//! The execution engine.
//!
//! An [`Engine`] owns a [`Tape`] and runs instruction streams against it. The
//! tape persists between calls to [`Engine::execute`] so an interactive session
//! can build on earlier input; only [`Engine::reset`] clears it.
//!
//! Loops are driven by a stack of return positions that lives only for the
//! duration of one execute call:
//! - `[` with a nonzero cell pushes the position just after itself.
//! - `[` with a zero cell skips forward past its matching `]`.
//! - `]` with a nonzero cell jumps back to the position on top of the stack.
//! - `]` with a zero cell pops the stack and falls through.
//!
//! Any character outside `><+-.,[]` is skipped.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use tracing::{debug, trace};

use crate::config::EngineSettings;
use crate::program::{BracketKind, BracketPolicy, Instruction, Program};
use crate::tape::{AllocationError, Tape};

/// Errors that can occur while running a program.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Verification rejected the brackets; nothing was executed.
    #[error("Invalid program: unmatched bracket {kind} at instruction {ip}")]
    InvalidProgram { ip: usize, kind: BracketKind },

    /// A jump had no target even though verification passed.
    #[error("Truncated jump: no target for {kind} at instruction {ip}")]
    TruncatedJump { ip: usize, kind: BracketKind },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// The configured instruction budget ran out.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },
}

/// What `,` stores when the input source is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Store 0 in the current cell.
    #[default]
    Zero,
    /// Leave the current cell as it was.
    Unchanged,
}

impl FromStr for EofPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(EofPolicy::Zero),
            "unchanged" => Ok(EofPolicy::Unchanged),
            other => Err(format!("invalid EOF policy: {other}, must be 'zero' or 'unchanged'")),
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EofPolicy::Zero => write!(f, "zero"),
            EofPolicy::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Runs programs against a persistent tape.
pub struct Engine {
    tape: Tape,
    brackets: BracketPolicy,
    eof: EofPolicy,
    step_limit: Option<usize>,
    // Optional hooks; stdout/stdin are used when unset.
    output_sink: Option<Box<dyn Fn(&[u8]) + Send + Sync>>,
    input_provider: Option<Box<dyn Fn() -> Option<u8> + Send + Sync>>,
}

impl Engine {
    /// Create an engine with a zeroed tape of `memory_size` cells and default policies.
    pub fn new(memory_size: usize) -> Result<Self, AllocationError> {
        Ok(Self {
            tape: Tape::new(memory_size)?,
            brackets: BracketPolicy::default(),
            eof: EofPolicy::default(),
            step_limit: None,
            output_sink: None,
            input_provider: None,
        })
    }

    /// Create an engine from resolved settings.
    pub fn with_settings(settings: &EngineSettings) -> Result<Self, AllocationError> {
        let mut engine = Self::new(settings.memory)?;
        engine.brackets = settings.brackets;
        engine.eof = settings.eof;
        engine.step_limit = settings.max_steps;
        Ok(engine)
    }

    pub fn set_bracket_policy(&mut self, policy: BracketPolicy) {
        self.brackets = policy;
    }

    pub fn set_eof_policy(&mut self, policy: EofPolicy) {
        self.eof = policy;
    }

    /// Abort any execute call after `limit` dispatched instructions. `None` means unlimited.
    pub fn set_step_limit(&mut self, limit: Option<usize>) {
        self.step_limit = limit;
    }

    /// Provide an output sink. When set, `.` sends bytes here instead of stdout.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Provide an input provider. When set, `,` reads from it instead of stdin.
    /// Returning `None` signals end of input.
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: Fn() -> Option<u8> + Send + Sync + 'static,
    {
        self.input_provider = Some(Box::new(provider));
    }

    pub fn bracket_policy(&self) -> BracketPolicy {
        self.brackets
    }

    pub fn eof_policy(&self) -> EofPolicy {
        self.eof
    }

    pub fn step_limit(&self) -> Option<usize> {
        self.step_limit
    }

    /// Read-only access to the tape for diagnostics.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Replace the tape with a zeroed one of `size` cells.
    pub fn allocate(&mut self, size: usize) -> Result<(), AllocationError> {
        self.tape.allocate(size)
    }

    /// Zero the tape and move the cursor to 0.
    pub fn reset(&mut self) {
        self.tape.reset();
    }

    /// Verify and run `source`.
    ///
    /// A program rejected by verification leaves the tape untouched. Errors
    /// raised mid-run keep every effect applied up to that point.
    pub fn execute(&mut self, source: &str) -> Result<(), EngineError> {
        self.run(source, false)
    }

    /// Run `source` printing a step-by-step table instead of performing I/O.
    ///
    /// The tape advances exactly as in a real run, but `.` prints nothing and
    /// `,` behaves as if input were exhausted.
    pub fn execute_debug(&mut self, source: &str) -> Result<(), EngineError> {
        self.run(source, true)
    }

    fn run(&mut self, source: &str, debug: bool) -> Result<(), EngineError> {
        let program = Program::load(source, self.brackets).inspect_err(|err| {
            debug!(%err, "program rejected");
        })?;
        trace!(
            len = program.len(),
            jump_table = program.has_jump_table(),
            "program loaded"
        );

        let outcome = self.dispatch(&program, debug);

        if self.output_sink.is_none() {
            if let Err(source) = io::stdout().flush() {
                return outcome.and(Err(EngineError::Io { ip: program.len(), source }));
            }
        }
        outcome
    }

    fn dispatch(&mut self, program: &Program, debug: bool) -> Result<(), EngineError> {
        let mut returns: Vec<usize> = Vec::new();
        let mut ip = 0;
        let mut step: usize = 0;

        if debug {
            println!("STEP | IP  | PTR | CELL | INSTR | ACTION");
            println!("-----+-----+-----+------+-------+------------------------------------------------");
        }

        while ip < program.len() {
            let Some(instr) = program.instruction_at(ip) else {
                ip += 1;
                continue;
            };

            if let Some(limit) = self.step_limit {
                if step >= limit {
                    return Err(EngineError::StepLimitExceeded { limit });
                }
            }

            let (ptr_before, cell_before) = (self.tape.cursor(), self.tape.current_value());
            let mut action: Option<String> = debug.then(String::new);
            let mut next = ip + 1;

            match instr {
                Instruction::Right | Instruction::Left => {
                    let delta = if instr == Instruction::Right { 1 } else { -1 };
                    self.tape.move_cursor(delta);
                    if let Some(a) = action.as_mut() { *a = format!("Moved cursor to index {}", self.tape.cursor()); }
                }
                Instruction::Increment => {
                    self.tape.increment();
                    if let Some(a) = action.as_mut() { *a = format!("Increment cell[{}] from {} to {}", ptr_before, cell_before, self.tape.current_value()); }
                }
                Instruction::Decrement => {
                    self.tape.decrement();
                    if let Some(a) = action.as_mut() { *a = format!("Decrement cell[{}] from {} to {}", ptr_before, cell_before, self.tape.current_value()); }
                }
                Instruction::Output => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {} (suppressed in debug)", cell_before);
                    } else {
                        self.emit(cell_before).map_err(|source| EngineError::Io { ip, source })?;
                    }
                }
                Instruction::Input => {
                    let byte = if debug {
                        None
                    } else {
                        self.read_input().map_err(|source| EngineError::Io { ip, source })?
                    };
                    match (byte, self.eof) {
                        (Some(b), _) => self.tape.write(b),
                        (None, EofPolicy::Zero) => self.tape.write(0),
                        (None, EofPolicy::Unchanged) => {}
                    }
                    if let Some(a) = action.as_mut() { *a = format!("Read byte -> simulated EOF ({}), cell is {}", self.eof, self.tape.current_value()); }
                }
                Instruction::LoopOpen => {
                    if cell_before != 0 {
                        returns.push(ip + 1);
                        if let Some(a) = action.as_mut() { *a = format!("Enter loop (cell != 0); push return IP {}", ip + 1); }
                    } else {
                        let close = program.matching_close(ip)?;
                        next = close + 1;
                        if let Some(a) = action.as_mut() { *a = format!("Cell is 0; skip past matching ']' at IP {}", close); }
                    }
                }
                Instruction::LoopClose => {
                    if cell_before != 0 {
                        let Some(&target) = returns.last() else {
                            return Err(EngineError::TruncatedJump { ip, kind: BracketKind::Close });
                        };
                        next = target;
                        if let Some(a) = action.as_mut() { *a = format!("Cell != 0; jump back to IP {}", target); }
                    } else {
                        returns.pop();
                        if let Some(a) = action.as_mut() { *a = "Exit loop (cell is 0); pop return IP".to_string(); }
                    }
                }
            }

            if let Some(a) = action {
                println!(
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    step,
                    ip,
                    ptr_before,
                    cell_before,
                    instr.symbol(),
                    a
                );
            }

            step += 1;
            ip = next;
        }

        Ok(())
    }

    fn emit(&self, byte: u8) -> io::Result<()> {
        match self.output_sink.as_ref() {
            Some(sink) => {
                (sink)(&[byte]);
                Ok(())
            }
            None => io::stdout().write_all(&[byte]),
        }
    }

    fn read_input(&self) -> io::Result<Option<u8>> {
        if let Some(provider) = self.input_provider.as_ref() {
            return Ok((provider)());
        }

        // Anything printed so far may be a prompt for this read.
        if self.output_sink.is_none() {
            io::stdout().flush()?;
        }

        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}
