use serde::{Deserialize, Serialize};

use crate::bytecode::chunk::CHUNK_MAX;

/// Largest number of local slots a program can address (slots are one byte).
pub const MAX_LOCALS: usize = 256;

pub const STACK_MAX: usize = 256;

/// Bounds of the heap region handed to the bump allocator.
///
/// Usable memory ends `reserve` bytes short of `base + size`; the margin
/// stands in for the call stack growing down towards the heap on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Address of the first heap byte. Must be nonzero and 4-aligned.
    pub base: u32,
    pub size: u32,
    pub reserve: u32,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            base: 0x1000,
            size: 1 << 20,
            reserve: 4096,
        }
    }
}

/// Fixed resource limits for one compile + run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub chunk_capacity: usize,
    pub max_locals: usize,
    pub stack_max: usize,
    pub heap: HeapConfig,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            chunk_capacity: CHUNK_MAX,
            max_locals: MAX_LOCALS,
            stack_max: STACK_MAX,
            heap: HeapConfig::default(),
        }
    }
}

impl Limits {
    /// Local slot count actually usable, capped at what a `u8` operand reaches.
    pub fn local_slots(&self) -> usize {
        self.max_locals.min(MAX_LOCALS)
    }
}
