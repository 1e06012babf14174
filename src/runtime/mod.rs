pub mod fault;
pub mod sink;
pub mod vm;

pub use fault::Fault;
pub use sink::{ByteSink, IoSink};
pub use vm::Vm;
