use crate::bytecode::op::{Instruction, Selector};
use crate::bytecode::program::Program;
use crate::config::{Limits, MAX_LOCALS, STACK_MAX};
use crate::lang::heap::Heap;
use crate::lang::object;
use crate::lang::value::Value;
use crate::runtime::fault::Fault;
use crate::runtime::sink::ByteSink;

/// Stack machine executing one compiled [`Program`].
///
/// The operand stack and the local slots have fixed sizes taken from
/// [`Limits`]; running out of either is a [`Fault`], as is any malformed
/// instruction. There is no way to resume after a fault.
pub struct Vm<'p, S: ByteSink> {
    code: &'p [u8],
    ip: usize,
    stack: Vec<Value>,
    stack_max: usize,
    locals: Vec<Value>,
    heap: Heap,
    sink: S,
    halted: bool,
}

impl<'p, S: ByteSink> Vm<'p, S> {
    pub fn new(program: &'p Program, sink: S) -> Self {
        Self::with_config(program, sink, &Limits::default())
    }

    pub fn with_config(program: &'p Program, sink: S, limits: &Limits) -> Self {
        // Never fewer slots than the program was compiled for.
        let slots = limits.local_slots().max(program.locals().min(MAX_LOCALS));
        Vm {
            code: program.code(),
            ip: 0,
            stack: Vec::with_capacity(limits.stack_max.min(STACK_MAX)),
            stack_max: limits.stack_max,
            locals: vec![Value::NIL; slots],
            heap: Heap::new(limits.heap),
            sink,
            halted: false,
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn push(&mut self, value: Value) -> Result<(), Fault> {
        if self.stack.len() >= self.stack_max {
            return Err(Fault::StackOverflow {
                max: self.stack_max,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, ip: usize) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow { ip })
    }

    fn slot(&self, slot: u8, ip: usize) -> Result<usize, Fault> {
        let index = usize::from(slot);
        if index < self.locals.len() {
            Ok(index)
        } else {
            Err(Fault::InvalidSlot { slot, ip })
        }
    }

    /// Runs until `halt`. A VM runs its program once; calling again after a
    /// halt or a fault does nothing.
    pub fn run(&mut self) -> Result<(), Fault> {
        if self.halted {
            return Ok(());
        }
        let result = self.run_inner();
        self.halted = true;
        if let Err(fault) = &result {
            log::debug!("vm fault: {}", fault);
        }
        result
    }

    fn run_inner(&mut self) -> Result<(), Fault> {
        loop {
            let ip = self.ip;
            let (instruction, next) = Instruction::decode(self.code, ip)?;
            self.ip = next;

            log::trace!("{:04} {:?} stack={:?}", ip, instruction, self.stack);

            match instruction {
                Instruction::PushInt(n) => self.push(Value::int(n))?,

                Instruction::PushStr(bytes) => {
                    let s = object::make_string(&mut self.heap, bytes)?;
                    self.push(s)?;
                }

                Instruction::PushNil => self.push(Value::NIL)?,

                Instruction::Pop => {
                    self.pop(ip)?;
                }

                Instruction::Load(slot) => {
                    let index = self.slot(slot, ip)?;
                    self.push(self.locals[index])?;
                }

                Instruction::Store(slot) => {
                    let index = self.slot(slot, ip)?;
                    self.locals[index] = self.pop(ip)?;
                }

                Instruction::SendUnary(code) => {
                    let receiver = self.pop(ip)?;
                    match Selector::from_code(code) {
                        Some(Selector::Print) => {
                            object::print(&self.heap, receiver, &mut self.sink);
                            // messages answer their receiver by default
                            self.push(receiver)?;
                        }
                        _ => {
                            return Err(Fault::UnknownSelector {
                                arity: "unary",
                                selector: code,
                                ip,
                            });
                        }
                    }
                }

                Instruction::SendBinary(code) => {
                    let arg = self.pop(ip)?;
                    let receiver = self.pop(ip)?;
                    let result = match Selector::from_code(code) {
                        Some(Selector::Plus) => object::add(receiver, arg),
                        Some(Selector::Minus) => object::sub(receiver, arg),
                        Some(Selector::Times) => object::mul(receiver, arg),
                        _ => {
                            return Err(Fault::UnknownSelector {
                                arity: "binary",
                                selector: code,
                                ip,
                            });
                        }
                    };
                    self.push(result)?;
                }

                Instruction::Halt => return Ok(()),
            }
        }
    }
}
