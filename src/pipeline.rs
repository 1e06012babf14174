//! Execution pipeline: source → compile → VM.
//!
//! Every CLI mode goes through these functions, and so do the end-to-end
//! tests.

use thiserror::Error;

use crate::bytecode::compile::Compiler;
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::image::Image;
use crate::bytecode::program::Program;
use crate::bytecode::stack_check::{self, StackCheckError};
use crate::config::Limits;
use crate::runtime::fault::Fault;
use crate::runtime::sink::ByteSink;
use crate::runtime::vm::Vm;

/// Why a program did not run to `halt`.
///
/// A compile error means nothing was executed. A fault can happen while
/// compiling (bytecode overflow) or while running; in the latter case any
/// output already written stays written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Fault(#[from] Fault),

    #[error("{0}")]
    Check(#[from] StackCheckError),
}

// =============================================================================
// Phases
// =============================================================================

/// Compile source text into a runnable program.
pub fn compile(source: &str, limits: &Limits) -> Result<Program, RunError> {
    let mut compiler = Compiler::with_limits(source, limits);
    compiler.compile_program()?;
    Ok(compiler.finish()?)
}

/// Run an already compiled program to completion.
pub fn run_program<S: ByteSink>(
    program: &Program,
    sink: &mut S,
    limits: &Limits,
) -> Result<(), Fault> {
    let mut vm = Vm::with_config(program, sink, limits);
    vm.run()
}

/// Compile and run. Nothing executes unless the whole source compiled.
pub fn run_source<S: ByteSink>(source: &str, sink: &mut S, limits: &Limits) -> Result<(), RunError> {
    let program = compile(source, limits)?;
    run_program(&program, sink, limits)?;
    Ok(())
}

/// Verify and run a loaded image under its own limits.
pub fn run_image<S: ByteSink>(image: Image, sink: &mut S) -> Result<(), RunError> {
    let limits = image.limits;
    let report = stack_check::check_code(&image.code, &limits)?;
    log::debug!(
        "image verified: {} instructions, max depth {}",
        report.instructions,
        report.max_depth
    );
    let program = image.into_program();
    run_program(&program, sink, &limits)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
