use crate::lang::heap::Heap;
use crate::lang::value::{ObjRef, Value, ValueKind};
use crate::runtime::fault::Fault;
use crate::runtime::sink::ByteSink;

/// Heap object type tags, stored in the first word of every object.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjType {
    String = 0,
}

impl ObjType {
    fn from_word(word: u32) -> Option<Self> {
        match word {
            0 => Some(ObjType::String),
            _ => None,
        }
    }
}

// String layout: [type: u32][length: u32][bytes...][0], one allocation.
const HEADER_SIZE: usize = 4;
const STRING_LEN_OFFSET: usize = HEADER_SIZE;
const STRING_DATA_OFFSET: usize = HEADER_SIZE + 4;

/// Allocates a String object holding a copy of `bytes`.
pub fn make_string(heap: &mut Heap, bytes: &[u8]) -> Result<Value, Fault> {
    let len = u32::try_from(bytes.len()).map_err(|_| Fault::OutOfMemory {
        requested: bytes.len(),
        available: heap.available(),
    })?;
    let size = STRING_DATA_OFFSET + bytes.len() + 1;
    let obj = heap.alloc(size)?;

    if let Some(mem) = heap.bytes_mut(obj, 0, size) {
        mem[..4].copy_from_slice(&(ObjType::String as u32).to_le_bytes());
        mem[STRING_LEN_OFFSET..STRING_DATA_OFFSET].copy_from_slice(&len.to_le_bytes());
        mem[STRING_DATA_OFFSET..size - 1].copy_from_slice(bytes);
        mem[size - 1] = 0;
    }

    Ok(Value::object(obj))
}

pub fn obj_type(heap: &Heap, obj: ObjRef) -> Option<ObjType> {
    heap.read_u32(obj, 0).and_then(ObjType::from_word)
}

/// The payload of a String object, or `None` if `obj` is not one.
pub fn string_bytes(heap: &Heap, obj: ObjRef) -> Option<&[u8]> {
    if obj_type(heap, obj)? != ObjType::String {
        return None;
    }
    let len = heap.read_u32(obj, STRING_LEN_OFFSET)? as usize;
    heap.bytes(obj, STRING_DATA_OFFSET, len)
}

/// Writes `n` in decimal.
pub fn print_int<S: ByteSink + ?Sized>(n: i32, sink: &mut S) {
    if n < 0 {
        sink.emit_byte(b'-');
    }
    // unsigned_abs keeps i32::MIN intact
    let mut digits = [0u8; 10];
    let mut rest = n.unsigned_abs();
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    sink.emit_bytes(&digits[i..]);
}

/// Writes the textual form of `value` followed by a newline.
pub fn print<S: ByteSink + ?Sized>(heap: &Heap, value: Value, sink: &mut S) {
    match value.kind() {
        ValueKind::Integer(n) => print_int(n, sink),
        ValueKind::Nil => sink.emit_bytes(b"nil"),
        ValueKind::Object(obj) => {
            // Unknown object kinds print as an empty line.
            if let Some(bytes) = string_bytes(heap, obj) {
                sink.emit_bytes(bytes);
            }
        }
    }
    sink.emit_byte(b'\n');
}

fn int_op(a: Value, b: Value, op: fn(i32, i32) -> i32) -> Value {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => Value::int(op(x, y)),
        // Not a fault: mixed or non-integer operands answer nil.
        _ => Value::NIL,
    }
}

/// Integer sum, wrapping in the tagged range; nil unless both are integers.
pub fn add(a: Value, b: Value) -> Value {
    int_op(a, b, i32::wrapping_add)
}

pub fn sub(a: Value, b: Value) -> Value {
    int_op(a, b, i32::wrapping_sub)
}

pub fn mul(a: Value, b: Value) -> Value {
    int_op(a, b, i32::wrapping_mul)
}
