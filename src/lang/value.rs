//! Tagged 32-bit values.
//!
//! | Low bit | Word        | Meaning                                  |
//! |---------|-------------|------------------------------------------|
//! | 1       | `n << 1 \| 1` | small integer, 31 bits, arithmetic shift |
//! | 0       | `0`         | nil                                      |
//! | 0       | nonzero     | heap object address                      |
//!
//! Object addresses come from the bump heap, which never hands out zero and
//! always aligns to 4 bytes, so an object word is never confused with nil or
//! an integer.

use std::fmt;

const INT_TAG: u32 = 1;

/// Smallest integer a value can hold.
pub const INT_MIN: i32 = -(1 << 30);
/// Largest integer a value can hold.
pub const INT_MAX: i32 = (1 << 30) - 1;

/// Address of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    /// Wraps a heap address. Callers guarantee it is nonzero and even.
    pub(crate) fn from_addr(addr: u32) -> Self {
        debug_assert!(addr != 0 && addr & INT_TAG == 0);
        ObjRef(addr)
    }

    pub fn addr(self) -> u32 {
        self.0
    }
}

/// The closed set of things a value can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer(i32),
    Nil,
    Object(ObjRef),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value {
    bits: u32,
}

impl Value {
    pub const NIL: Value = Value { bits: 0 };

    /// Tags an integer. The top bit is shifted out, so values outside
    /// [`INT_MIN`]..=[`INT_MAX`] wrap.
    #[inline]
    pub const fn int(n: i32) -> Self {
        Value {
            bits: ((n as u32) << 1) | INT_TAG,
        }
    }

    #[inline]
    pub const fn object(obj: ObjRef) -> Self {
        Value { bits: obj.0 }
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.bits
    }

    #[inline]
    pub const fn is_int(self) -> bool {
        self.bits & INT_TAG != 0
    }

    #[inline]
    pub const fn is_nil(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub const fn is_object(self) -> bool {
        self.bits & INT_TAG == 0 && self.bits != 0
    }

    #[inline]
    pub const fn as_int(self) -> Option<i32> {
        if self.is_int() {
            Some((self.bits as i32) >> 1)
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_object(self) -> Option<ObjRef> {
        if self.is_object() {
            Some(ObjRef(self.bits))
        } else {
            None
        }
    }

    pub const fn kind(self) -> ValueKind {
        if self.is_int() {
            ValueKind::Integer((self.bits as i32) >> 1)
        } else if self.bits == 0 {
            ValueKind::Nil
        } else {
            ValueKind::Object(ObjRef(self.bits))
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::NIL
    }
}

impl From<ValueKind> for Value {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer(n) => Value::int(n),
            ValueKind::Nil => Value::NIL,
            ValueKind::Object(obj) => Value::object(obj),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ValueKind::Integer(n) => write!(f, "Int({})", n),
            ValueKind::Nil => write!(f, "Nil"),
            ValueKind::Object(obj) => write!(f, "Obj(0x{:08x})", obj.addr()),
        }
    }
}
