//! The memory tape: a fixed-size run of byte cells and a single cursor.
//!
//! All cursor arithmetic goes through [`Tape::offset`], which wraps modulo the
//! tape length. Moving left from cell 0 lands on the last cell and moving right
//! from the last cell lands on cell 0, so the cursor can never leave the tape.

use std::collections::TryReserveError;

use tracing::debug;

/// Default number of cells on a freshly allocated tape.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Errors that can occur while sizing the tape.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// A tape must hold at least one cell.
    #[error("memory size must be greater than zero")]
    ZeroSize,

    /// The platform could not provide the requested buffer.
    #[error("cannot allocate {size} cells: {source}")]
    OutOfMemory {
        size: usize,
        #[source]
        source: TryReserveError,
    },
}

/// A zero-initialized byte tape with a wraparound cursor.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
}

impl Tape {
    /// Allocate a zeroed tape of `size` cells with the cursor at 0.
    pub fn new(size: usize) -> Result<Self, AllocationError> {
        let cells = zeroed(size)?;
        debug!(size, "tape allocated");
        Ok(Self { cells, cursor: 0 })
    }

    /// Replace the buffer with a freshly zeroed one of `size` cells.
    ///
    /// On failure the existing cells and cursor are left untouched.
    pub fn allocate(&mut self, size: usize) -> Result<(), AllocationError> {
        self.cells = zeroed(size)?;
        self.cursor = 0;
        debug!(size, "tape reallocated");
        Ok(())
    }

    /// Zero every cell and move the cursor back to 0.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.cursor = 0;
        debug!(size = self.cells.len(), "tape reset");
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a tape holds at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Read a cell without moving the cursor.
    ///
    /// `index` should come from [`Tape::offset`]; anything larger is wrapped.
    pub fn value_at(&self, index: usize) -> u8 {
        self.cells[index % self.cells.len()]
    }

    pub fn current_value(&self) -> u8 {
        self.cells[self.cursor]
    }

    /// The index `delta` cells away from the cursor, wrapping in both directions.
    pub fn offset(&self, delta: isize) -> usize {
        let len = self.cells.len();
        let step = delta.unsigned_abs() % len;
        if delta >= 0 {
            (self.cursor + step) % len
        } else {
            (self.cursor + len - step) % len
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = self.offset(delta);
    }

    pub fn write(&mut self, value: u8) {
        self.cells[self.cursor] = value;
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.cursor];
        *cell = cell.wrapping_sub(1);
    }

    /// Read-only view of every cell.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

fn zeroed(size: usize) -> Result<Vec<u8>, AllocationError> {
    if size == 0 {
        return Err(AllocationError::ZeroSize);
    }
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(size)
        .map_err(|source| AllocationError::OutOfMemory { size, source })?;
    cells.resize(size, 0);
    Ok(cells)
}
