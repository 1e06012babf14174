use crate::config::HeapConfig;
use crate::lang::value::ObjRef;
use crate::runtime::fault::Fault;

/// Bump allocator over one fixed region.
///
/// The cursor only moves forward; nothing is ever freed or moved, so an
/// [`ObjRef`] stays valid for as long as the heap lives. Backing memory is
/// grown lazily up to the limit, it is never handed back.
#[derive(Debug)]
pub struct Heap {
    base: u32,
    cursor: u32,
    limit: u32,
    memory: Vec<u8>,
}

/// Rounds an allocation size up to the next multiple of 4.
fn align4(size: usize) -> usize {
    (size + 3) & !3
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        // A zero base would let an object alias nil; an odd one an integer.
        let base = config.base.max(4).saturating_add(3) & !3;
        let end = u64::from(config.base) + u64::from(config.size);
        let limit = end
            .saturating_sub(u64::from(config.reserve))
            .clamp(u64::from(base), u64::from(u32::MAX & !3)) as u32;

        log::debug!(
            "heap region 0x{:08x}..0x{:08x} ({} usable bytes)",
            base,
            limit,
            limit - base
        );

        Heap {
            base,
            cursor: base,
            limit,
            memory: Vec::new(),
        }
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        (self.cursor - self.base) as usize
    }

    pub fn available(&self) -> usize {
        (self.limit - self.cursor) as usize
    }

    /// Reserves `size` bytes (rounded up to 4) and returns their address.
    pub fn alloc(&mut self, size: usize) -> Result<ObjRef, Fault> {
        let rounded = align4(size);
        if rounded > self.available() {
            return Err(Fault::OutOfMemory {
                requested: rounded,
                available: self.available(),
            });
        }

        let addr = self.cursor;
        self.cursor += rounded as u32;
        self.memory.resize(self.used(), 0);

        log::trace!("alloc {} bytes at 0x{:08x}", rounded, addr);
        Ok(ObjRef::from_addr(addr))
    }

    fn offset(&self, addr: u32) -> usize {
        (addr - self.base) as usize
    }

    /// Bytes `start..start + len` of the allocation at `obj`.
    ///
    /// Returns `None` when the range is outside what has been allocated.
    pub fn bytes(&self, obj: ObjRef, start: usize, len: usize) -> Option<&[u8]> {
        if obj.addr() < self.base {
            return None;
        }
        let from = self.offset(obj.addr()).checked_add(start)?;
        self.memory.get(from..from.checked_add(len)?)
    }

    pub fn bytes_mut(&mut self, obj: ObjRef, start: usize, len: usize) -> Option<&mut [u8]> {
        if obj.addr() < self.base {
            return None;
        }
        let from = self.offset(obj.addr()).checked_add(start)?;
        let to = from.checked_add(len)?;
        self.memory.get_mut(from..to)
    }

    pub fn read_u32(&self, obj: ObjRef, start: usize) -> Option<u32> {
        let b = self.bytes(obj, start, 4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
