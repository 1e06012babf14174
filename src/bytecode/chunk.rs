use crate::runtime::fault::Fault;

/// Default capacity of a bytecode buffer, in bytes.
pub const CHUNK_MAX: usize = 4096;

/// Append-only bytecode buffer with a fixed capacity.
///
/// An emit that does not fit fails with [`Fault::BytecodeOverflow`] before
/// any of its bytes are written, so the buffer never holds a torn operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    code: Vec<u8>,
    capacity: usize,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    pub fn new() -> Self {
        Self::with_capacity(CHUNK_MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity.min(CHUNK_MAX)),
            capacity,
        }
    }

    /// Wraps an existing byte stream, e.g. one loaded from an image.
    pub fn from_bytes(code: Vec<u8>) -> Self {
        let capacity = code.len().max(CHUNK_MAX);
        Self { code, capacity }
    }

    pub fn clear(&mut self) {
        self.code.clear();
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }

    fn emit_all(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        if self.code.len() + bytes.len() > self.capacity {
            return Err(Fault::BytecodeOverflow {
                capacity: self.capacity,
            });
        }
        self.code.extend_from_slice(bytes);
        Ok(())
    }

    pub fn emit_byte(&mut self, byte: u8) -> Result<(), Fault> {
        self.emit_all(&[byte])
    }

    pub fn emit_u16(&mut self, value: u16) -> Result<(), Fault> {
        self.emit_all(&value.to_le_bytes())
    }

    pub fn emit_i32(&mut self, value: i32) -> Result<(), Fault> {
        self.emit_all(&value.to_le_bytes())
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        self.emit_all(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_encoding() {
        let mut chunk = Chunk::new();
        chunk.emit_byte(0xAB).unwrap();
        chunk.emit_u16(0x1234).unwrap();
        chunk.emit_i32(-2).unwrap();
        assert_eq!(
            chunk.as_bytes(),
            &[0xAB, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(chunk.len(), 7);
    }

    #[test]
    fn test_overflow_is_fault() {
        let mut chunk = Chunk::with_capacity(2);
        chunk.emit_byte(1).unwrap();
        chunk.emit_byte(2).unwrap();
        assert_eq!(
            chunk.emit_byte(3),
            Err(Fault::BytecodeOverflow { capacity: 2 })
        );
        assert_eq!(chunk.len(), 2);
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut chunk = Chunk::with_capacity(5);
        chunk.emit_u16(7).unwrap();
        // 4 more bytes would not fit in the remaining 3
        assert!(chunk.emit_i32(1).is_err());
        assert_eq!(chunk.as_bytes(), &[7, 0]);
        // a smaller write still fits afterwards
        chunk.emit_u16(9).unwrap();
        assert_eq!(chunk.len(), 4);
    }

    #[test]
    fn test_clear_resets_length() {
        let mut chunk = Chunk::new();
        chunk.emit_i32(5).unwrap();
        chunk.clear();
        assert!(chunk.is_empty());
        assert_eq!(chunk.capacity(), CHUNK_MAX);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut chunk = Chunk::with_capacity(usize::MAX);
        assert_eq!(chunk.capacity(), usize::MAX);
        chunk.emit_i32(1).unwrap();
        assert_eq!(chunk.len(), 4);
    }
}
