use thiserror::Error;

use crate::bytecode::op::{Instruction, Selector};
use crate::config::Limits;
use crate::runtime::fault::Fault;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackCheckError {
    #[error("stack-check error: {0}")]
    Decode(#[from] Fault),

    #[error("stack-check error: stack underflow at ip={ip}, needed {needed} items")]
    Underflow { ip: usize, needed: usize },

    #[error("stack-check error: depth {depth} at ip={ip} exceeds stack max {max}")]
    TooDeep { ip: usize, depth: usize, max: usize },

    #[error("stack-check error: local slot {slot} at ip={ip} is out of range")]
    BadSlot { ip: usize, slot: u8 },

    #[error("stack-check error: selector {selector} at ip={ip} is not a {arity} message")]
    BadSelector {
        ip: usize,
        selector: u8,
        arity: &'static str,
    },

    #[error("stack-check error: code does not end with halt")]
    MissingHalt,

    #[error("stack-check error: {trailing} bytes after halt at ip={ip}")]
    TrailingBytes { ip: usize, trailing: usize },
}

/// Summary of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackReport {
    pub instructions: usize,
    pub max_depth: usize,
}

/// Check bytecode that did not come from this compiler run.
///
/// The code has no jumps, so one linear scan sees every instruction in the
/// order it executes and the stack height at each point is exact. A program
/// that passes cannot fault at run time except for running out of heap.
pub fn check_code(code: &[u8], limits: &Limits) -> Result<StackReport, StackCheckError> {
    let slots = limits.local_slots();
    let mut report = StackReport::default();
    let mut height: usize = 0;
    let mut ip = 0;

    while ip < code.len() {
        let (instruction, next) = Instruction::decode(code, ip)?;
        report.instructions += 1;

        match instruction {
            Instruction::Load(slot) | Instruction::Store(slot) => {
                if usize::from(slot) >= slots {
                    return Err(StackCheckError::BadSlot { ip, slot });
                }
            }
            Instruction::SendUnary(code) => {
                if !Selector::from_code(code).is_some_and(Selector::is_unary) {
                    return Err(StackCheckError::BadSelector {
                        ip,
                        selector: code,
                        arity: "unary",
                    });
                }
            }
            Instruction::SendBinary(code) => {
                if !Selector::from_code(code).is_some_and(|s| !s.is_unary()) {
                    return Err(StackCheckError::BadSelector {
                        ip,
                        selector: code,
                        arity: "binary",
                    });
                }
            }
            _ => {}
        }

        let (pops, pushes) = instruction.effect();
        height = height
            .checked_sub(pops)
            .ok_or(StackCheckError::Underflow { ip, needed: pops })?;
        height += pushes;
        if height > limits.stack_max {
            return Err(StackCheckError::TooDeep {
                ip,
                depth: height,
                max: limits.stack_max,
            });
        }
        report.max_depth = report.max_depth.max(height);

        if instruction == Instruction::Halt {
            if next < code.len() {
                return Err(StackCheckError::TrailingBytes {
                    ip: next,
                    trailing: code.len() - next,
                });
            }
            return Ok(report);
        }
        ip = next;
    }

    Err(StackCheckError::MissingHalt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::Compiler;

    fn compiled(source: &str) -> Vec<u8> {
        let mut compiler = Compiler::new(source);
        compiler.compile_program().unwrap();
        compiler.finish().unwrap().code().to_vec()
    }

    fn check(code: &[u8]) -> Result<StackReport, StackCheckError> {
        check_code(code, &Limits::default())
    }

    #[test]
    fn test_compiled_code_passes() {
        let code = compiled("x := 3 + 4.\nx print.\n'Hello!' print.\n");
        let report = check(&code).unwrap();
        assert_eq!(report.max_depth, 2);
    }

    #[test]
    fn test_statements_leave_stack_empty() {
        let code = compiled("(1 + (2 + (3 + 4))) print.");
        let report = check(&code).unwrap();
        assert_eq!(report.max_depth, 4);
    }

    #[test]
    fn test_underflow() {
        let result = check(&[0x04, 0xFF]);
        assert_eq!(result, Err(StackCheckError::Underflow { ip: 0, needed: 1 }));
        assert!(result.unwrap_err().to_string().contains("underflow"));
    }

    #[test]
    fn test_binary_needs_two() {
        assert!(matches!(
            check(&[0x03, 0x11, 0x01, 0xFF]),
            Err(StackCheckError::Underflow { ip: 1, needed: 2 })
        ));
    }

    #[test]
    fn test_too_deep() {
        let limits = Limits {
            stack_max: 2,
            ..Limits::default()
        };
        assert!(matches!(
            check_code(&[0x03, 0x03, 0x03, 0xFF], &limits),
            Err(StackCheckError::TooDeep { ip: 2, depth: 3, max: 2 })
        ));
    }

    #[test]
    fn test_bad_slot() {
        let limits = Limits {
            max_locals: 4,
            ..Limits::default()
        };
        assert_eq!(
            check_code(&[0x05, 0x04, 0xFF], &limits),
            Err(StackCheckError::BadSlot { ip: 0, slot: 4 })
        );
    }

    #[test]
    fn test_selector_arity() {
        // print sent as binary
        assert!(matches!(
            check(&[0x03, 0x03, 0x11, 0x00, 0xFF]),
            Err(StackCheckError::BadSelector { arity: "binary", .. })
        ));
        // + sent as unary
        assert!(matches!(
            check(&[0x03, 0x10, 0x01, 0xFF]),
            Err(StackCheckError::BadSelector { arity: "unary", .. })
        ));
    }

    #[test]
    fn test_missing_halt() {
        assert_eq!(check(&[0x03, 0x04]), Err(StackCheckError::MissingHalt));
        assert_eq!(check(&[]), Err(StackCheckError::MissingHalt));
    }

    #[test]
    fn test_trailing_bytes() {
        assert_eq!(
            check(&[0xFF, 0x03]),
            Err(StackCheckError::TrailingBytes { ip: 1, trailing: 1 })
        );
    }

    #[test]
    fn test_decode_fault_passes_through() {
        assert_eq!(
            check(&[0x01, 0x00]),
            Err(StackCheckError::Decode(Fault::TruncatedBytecode { ip: 0 }))
        );
    }
}
