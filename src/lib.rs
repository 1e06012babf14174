//! A minimal message-passing language: a single-pass compiler from source
//! to a compact bytecode, and a stack VM that runs it over a tagged-word
//! value model with a bump-allocated heap.

pub mod bytecode;
pub mod config;
pub mod frontend;
pub mod lang;
pub mod pipeline;
pub mod runtime;
