use thiserror::Error;

/// An unrecoverable condition.
///
/// Faults mean a fixed resource ran out or the bytecode broke an invariant
/// the VM relies on. Nothing resumes after one: the run is over and the
/// caller reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("bytecode overflow (capacity {capacity} bytes)")]
    BytecodeOverflow { capacity: usize },

    #[error("stack overflow (max depth {max})")]
    StackOverflow { max: usize },

    #[error("stack underflow at ip={ip}")]
    StackUnderflow { ip: usize },

    #[error("out of memory (requested {requested} bytes, {available} available)")]
    OutOfMemory { requested: usize, available: usize },

    #[error("unknown opcode 0x{opcode:02x} at ip={ip}")]
    UnknownOpcode { opcode: u8, ip: usize },

    #[error("unknown {arity} selector {selector} at ip={ip}")]
    UnknownSelector {
        arity: &'static str,
        selector: u8,
        ip: usize,
    },

    #[error("truncated bytecode at ip={ip}")]
    TruncatedBytecode { ip: usize },

    #[error("local slot {slot} out of range at ip={ip}")]
    InvalidSlot { slot: u8, ip: usize },
}
