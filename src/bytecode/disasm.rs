use std::fmt::Write;

use crate::bytecode::op::{Instruction, Selector};
use crate::bytecode::program::Program;
use crate::runtime::fault::Fault;

/// Print disassembly of a bytecode program
pub fn print_bc(program: &Program) {
    println!("=== BYTECODE PROGRAM ===\n");
    println!("════════════════════════════════════════");
    println!(" main");
    println!(" {} bytes, {} locals", program.len(), program.locals());
    println!("════════════════════════════════════════");
    match disassemble(program.code()) {
        Ok(listing) => print!("{}", listing),
        Err(fault) => {
            // print what decoded before the bad byte
            print!("{}", disassemble_lossy(program.code()));
            println!("      !! {}", fault);
        }
    }
    println!();
}

/// Disassemble bytecode into one line per instruction.
///
/// Stops at the first byte that does not decode.
pub fn disassemble(code: &[u8]) -> Result<String, Fault> {
    let mut out = String::new();
    let mut ip = 0;
    while ip < code.len() {
        let (instruction, next) = Instruction::decode(code, ip)?;
        format_instruction(&mut out, ip, &instruction);
        ip = next;
    }
    Ok(out)
}

fn disassemble_lossy(code: &[u8]) -> String {
    let mut out = String::new();
    let mut ip = 0;
    while let Ok((instruction, next)) = Instruction::decode(code, ip) {
        format_instruction(&mut out, ip, &instruction);
        ip = next;
        if ip >= code.len() {
            break;
        }
    }
    out
}

fn format_instruction(out: &mut String, ip: usize, instruction: &Instruction<'_>) {
    // Writing into a String cannot fail.
    let _ = match instruction {
        Instruction::PushInt(n) => writeln!(out, "{:04}   PUSH_INT    {}", ip, n),
        Instruction::PushStr(bytes) => writeln!(
            out,
            "{:04}   PUSH_STR    {:?}",
            ip,
            String::from_utf8_lossy(bytes)
        ),
        Instruction::PushNil => writeln!(out, "{:04}   PUSH_NIL", ip),
        Instruction::Pop => writeln!(out, "{:04}   POP", ip),
        Instruction::Load(slot) => writeln!(out, "{:04}   LOAD        {}", ip, slot),
        Instruction::Store(slot) => writeln!(out, "{:04}   STORE       {}", ip, slot),
        Instruction::SendUnary(code) => writeln!(
            out,
            "{:04}   SEND_UNARY  {}",
            ip,
            selector_label(*code)
        ),
        Instruction::SendBinary(code) => writeln!(
            out,
            "{:04}   SEND_BINARY {}",
            ip,
            selector_label(*code)
        ),
        Instruction::Halt => writeln!(out, "{:04}   HALT", ip),
    };
}

fn selector_label(code: u8) -> String {
    match Selector::from_code(code) {
        Some(selector) => format!("#{}", selector.name()),
        None => format!("?{}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::Compiler;

    fn listing(source: &str) -> String {
        let mut compiler = Compiler::new(source);
        compiler.compile_program().unwrap();
        let program = compiler.finish().unwrap();
        disassemble(program.code()).unwrap()
    }

    #[test]
    fn test_disassemble_assignment() {
        let text = listing("x := 3 + 4.");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0000   PUSH_INT    3",
                "0005   PUSH_INT    4",
                "0010   SEND_BINARY #+",
                "0012   STORE       0",
                "0014   HALT",
            ]
        );
    }

    #[test]
    fn test_disassemble_string_and_print() {
        let text = listing("'Hello!' print.");
        assert!(text.contains("PUSH_STR    \"Hello!\""));
        assert!(text.contains("SEND_UNARY  #print"));
        assert!(text.contains("POP"));
    }

    #[test]
    fn test_unknown_selector_shown_raw() {
        let text = disassemble(&[0x03, 0x10, 0x09, 0xFF]).unwrap();
        assert!(text.contains("SEND_UNARY  ?9"));
    }

    #[test]
    fn test_bad_opcode_is_fault() {
        assert_eq!(
            disassemble(&[0x03, 0x77]),
            Err(Fault::UnknownOpcode { opcode: 0x77, ip: 1 })
        );
    }

    #[test]
    fn test_lossy_keeps_prefix() {
        let text = disassemble_lossy(&[0x03, 0x04, 0x77]);
        assert_eq!(text.lines().count(), 2);
    }
}
