use crate::runtime::fault::Fault;

// =============================================================================
// OPCODES - one byte each, operands follow little-endian
// =============================================================================

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    PushInt = 0x01,    // i32
    PushStr = 0x02,    // u16 length + raw bytes
    PushNil = 0x03,
    Pop = 0x04,
    Load = 0x05,       // u8 slot
    Store = 0x06,      // u8 slot
    SendUnary = 0x10,  // u8 selector
    SendBinary = 0x11, // u8 selector
    Halt = 0xFF,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x01 => Opcode::PushInt,
            0x02 => Opcode::PushStr,
            0x03 => Opcode::PushNil,
            0x04 => Opcode::Pop,
            0x05 => Opcode::Load,
            0x06 => Opcode::Store,
            0x10 => Opcode::SendUnary,
            0x11 => Opcode::SendBinary,
            0xFF => Opcode::Halt,
            other => return Err(other),
        })
    }
}

// =============================================================================
// SELECTORS - the closed message table, resolved at compile time
// =============================================================================

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Print = 0,
    Plus = 1,
    Minus = 2,
    Times = 3,
}

impl Selector {
    /// Looks up a selector by its source spelling.
    pub fn resolve(name: &[u8]) -> Option<Self> {
        match name {
            b"print" => Some(Selector::Print),
            b"+" => Some(Selector::Plus),
            b"-" => Some(Selector::Minus),
            b"*" => Some(Selector::Times),
            _ => None,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Selector::Print),
            1 => Some(Selector::Plus),
            2 => Some(Selector::Minus),
            3 => Some(Selector::Times),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Selector::Print => "print",
            Selector::Plus => "+",
            Selector::Minus => "-",
            Selector::Times => "*",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Selector::Print)
    }
}

// =============================================================================
// INSTRUCTION - one decoded opcode with its operand
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    PushInt(i32),
    PushStr(&'a [u8]),
    PushNil,
    Pop,
    Load(u8),
    Store(u8),
    SendUnary(u8),
    SendBinary(u8),
    Halt,
}

impl<'a> Instruction<'a> {
    /// Decodes the instruction starting at `ip`.
    ///
    /// Returns the instruction and the offset of the next one. Reading past
    /// the end of `code` is a [`Fault::TruncatedBytecode`].
    pub fn decode(code: &'a [u8], ip: usize) -> Result<(Self, usize), Fault> {
        let truncated = Fault::TruncatedBytecode { ip };
        let byte = *code.get(ip).ok_or(truncated.clone())?;
        let opcode = Opcode::try_from(byte).map_err(|opcode| Fault::UnknownOpcode { opcode, ip })?;

        let operand = |width: usize| -> Result<&'a [u8], Fault> {
            code.get(ip + 1..ip + 1 + width).ok_or(truncated.clone())
        };

        Ok(match opcode {
            Opcode::PushInt => {
                let b = operand(4)?;
                let n = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                (Instruction::PushInt(n), ip + 5)
            }
            Opcode::PushStr => {
                let b = operand(2)?;
                let len = usize::from(u16::from_le_bytes([b[0], b[1]]));
                let data = code.get(ip + 3..ip + 3 + len).ok_or(truncated.clone())?;
                (Instruction::PushStr(data), ip + 3 + len)
            }
            Opcode::PushNil => (Instruction::PushNil, ip + 1),
            Opcode::Pop => (Instruction::Pop, ip + 1),
            Opcode::Load => (Instruction::Load(operand(1)?[0]), ip + 2),
            Opcode::Store => (Instruction::Store(operand(1)?[0]), ip + 2),
            Opcode::SendUnary => (Instruction::SendUnary(operand(1)?[0]), ip + 2),
            Opcode::SendBinary => (Instruction::SendBinary(operand(1)?[0]), ip + 2),
            Opcode::Halt => (Instruction::Halt, ip + 1),
        })
    }

    /// Stack effect as (pops, pushes).
    pub fn effect(&self) -> (usize, usize) {
        match self {
            Instruction::PushInt(_) | Instruction::PushStr(_) | Instruction::PushNil => (0, 1),
            Instruction::Load(_) => (0, 1),
            Instruction::Pop | Instruction::Store(_) => (1, 0),
            Instruction::SendUnary(_) => (1, 1),
            Instruction::SendBinary(_) => (2, 1),
            Instruction::Halt => (0, 0),
        }
    }
}
