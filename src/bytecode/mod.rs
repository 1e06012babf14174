pub mod chunk;
pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod image;
pub mod locals;
pub mod op;
pub mod program;
pub mod stack_check;

pub use chunk::Chunk;
pub use compile::Compiler;
pub use compile_error::CompileError;
pub use op::{Instruction, Opcode, Selector};
pub use program::Program;
