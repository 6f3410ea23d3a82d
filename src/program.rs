//! Loading and verifying instruction streams.
//!
//! A [`Program`] is the source text split into characters plus, when the
//! brackets nest properly, a precomputed table of matching `[`/`]` positions.
//! Characters outside the eight-symbol instruction set stay in the program so
//! that instruction indices line up with the source; the engine skips them.

use std::fmt;
use std::str::FromStr;

use crate::engine::EngineError;

/// One of the eight instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
    LoopOpen,
    LoopClose,
}

impl Instruction {
    /// Decode a source character; anything outside `><+-.,[]` is inert.
    pub fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '>' => Instruction::Right,
            '<' => Instruction::Left,
            '+' => Instruction::Increment,
            '-' => Instruction::Decrement,
            '.' => Instruction::Output,
            ',' => Instruction::Input,
            '[' => Instruction::LoopOpen,
            ']' => Instruction::LoopClose,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Instruction::Right => '>',
            Instruction::Left => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Output => '.',
            Instruction::Input => ',',
            Instruction::LoopOpen => '[',
            Instruction::LoopClose => ']',
        }
    }
}

/// Which side of a loop a bracket error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// How strictly loop brackets are checked before a program runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BracketPolicy {
    /// Every `]` must close an earlier `[` and every `[` must be closed.
    #[default]
    Strict,
    /// Only the totals of `[` and `]` must agree; order is not checked.
    Balanced,
}

impl FromStr for BracketPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(BracketPolicy::Strict),
            "balanced" => Ok(BracketPolicy::Balanced),
            other => Err(format!("invalid bracket policy: {other}, must be 'strict' or 'balanced'")),
        }
    }
}

impl fmt::Display for BracketPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketPolicy::Strict => write!(f, "strict"),
            BracketPolicy::Balanced => write!(f, "balanced"),
        }
    }
}

/// Check whether `source` is well-formed under `policy`.
pub fn verify(source: &str, policy: BracketPolicy) -> bool {
    let code: Vec<char> = source.chars().collect();
    check(&code, policy).is_ok()
}

/// A verified instruction stream.
#[derive(Debug, Clone)]
pub struct Program {
    code: Vec<char>,
    // jumps[i] is the matching bracket for a bracket at i. Absent when the
    // brackets balance but do not nest, in which case jumps are found by scanning.
    jumps: Option<Vec<Option<usize>>>,
}

impl Program {
    /// Verify `source` and precompute jump targets where possible.
    pub fn load(source: &str, policy: BracketPolicy) -> Result<Self, EngineError> {
        let code: Vec<char> = source.chars().collect();
        let jumps = check(&code, policy)?;
        Ok(Self { code, jumps })
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The raw character at `ip`.
    pub fn char_at(&self, ip: usize) -> Option<char> {
        self.code.get(ip).copied()
    }

    /// The decoded instruction at `ip`, `None` for inert characters or past the end.
    pub fn instruction_at(&self, ip: usize) -> Option<Instruction> {
        self.char_at(ip).and_then(Instruction::from_char)
    }

    /// True when a jump table was built (the brackets nest properly).
    pub fn has_jump_table(&self) -> bool {
        self.jumps.is_some()
    }

    /// Index of the `]` matching the `[` at `open`.
    ///
    /// Scans forward counting nested loops when no jump table exists; running
    /// off the end of the stream is a [`EngineError::TruncatedJump`].
    pub fn matching_close(&self, open: usize) -> Result<usize, EngineError> {
        if let Some(target) = self.jumps.as_ref().and_then(|jumps| jumps[open]) {
            return Ok(target);
        }

        let mut skip = 0usize;
        for (ip, &ch) in self.code.iter().enumerate().skip(open + 1) {
            match ch {
                '[' => skip += 1,
                ']' if skip == 0 => return Ok(ip),
                ']' => skip -= 1,
                _ => {}
            }
        }

        Err(EngineError::TruncatedJump {
            ip: open,
            kind: BracketKind::Open,
        })
    }
}

/// Run the bracket check and build the jump table when the nesting allows it.
fn check(code: &[char], policy: BracketPolicy) -> Result<Option<Vec<Option<usize>>>, EngineError> {
    match (nesting(code), policy) {
        (Ok(jumps), _) => Ok(Some(jumps)),
        (Err(_), BracketPolicy::Balanced) if balance(code) == 0 => Ok(None),
        (Err((ip, kind)), _) => Err(EngineError::InvalidProgram { ip, kind }),
    }
}

/// Net count of `[` minus `]`.
fn balance(code: &[char]) -> isize {
    code.iter().fold(0, |open, &ch| match ch {
        '[' => open + 1,
        ']' => open - 1,
        _ => open,
    })
}

/// Pair up brackets with a stack, failing at the first `]` without an open
/// loop or at the innermost `[` left open at the end.
fn nesting(code: &[char]) -> Result<Vec<Option<usize>>, (usize, BracketKind)> {
    let mut jumps = vec![None; code.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, &ch) in code.iter().enumerate() {
        if ch == '[' {
            stack.push(i);
        } else if ch == ']' {
            let Some(open) = stack.pop() else {
                return Err((i, BracketKind::Close));
            };
            jumps[open] = Some(i);
            jumps[i] = Some(open);
        }
    }

    if let Some(&open) = stack.last() {
        return Err((open, BracketKind::Open));
    }

    Ok(jumps)
}
