use crate::bytecode::chunk::Chunk;

/// A finished, runnable bytecode program.
///
/// Only a compile that recorded no error produces one, which keeps partial
/// bytecode away from the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    chunk: Chunk,
    /// Number of local slots the program uses.
    locals: usize,
}

impl Program {
    pub(crate) fn new(chunk: Chunk, locals: usize) -> Self {
        Program { chunk, locals }
    }

    /// Wraps bytecode produced elsewhere (a saved image, a test).
    ///
    /// The VM does not trust such code any less than compiled code, but it
    /// still checks every read against the buffer end.
    pub fn from_raw(code: Vec<u8>, locals: usize) -> Self {
        Program {
            chunk: Chunk::from_bytes(code),
            locals,
        }
    }

    pub fn code(&self) -> &[u8] {
        self.chunk.as_bytes()
    }

    pub fn locals(&self) -> usize {
        self.locals
    }

    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }
}
