use crate::bytecode::chunk::Chunk;
use crate::bytecode::compile_error::{CompileError, CompileErrorKind};
use crate::bytecode::locals::Locals;
use crate::bytecode::op::{Opcode, Selector};
use crate::bytecode::program::Program;
use crate::config::Limits;
use crate::frontend::lexer::{Lexer, Span};
use crate::frontend::token::{Token, TokenKind};
use crate::runtime::fault::Fault;

/// Deepest parenthesis nesting the compiler accepts.
pub const MAX_NESTING: usize = 256;

/// Single-pass compiler from source text straight to bytecode.
///
/// There is no syntax tree: every rule emits its instructions as soon as it
/// has recognised them.
///
/// ```text
/// program    := statement ('.' statement)* '.'? EOF
/// statement  := IDENT ':=' expression | expression
/// expression := operand unary* (BINOP operand unary*)*
/// operand    := INTEGER | STRING | IDENT | '(' expression ')'
/// unary      := IDENT
/// ```
///
/// Binary messages share one precedence and group left to right, so
/// `2 + 3 * 4` is `(2 + 3) * 4`.
///
/// Errors are sticky: the first one is kept and later ones are dropped, but
/// parsing carries on structurally until the statement loop sees the flag.
/// A full bytecode buffer is different: it is a [`Fault`] and aborts at once.
pub struct Compiler<'src> {
    lexer: Lexer<'src>,
    chunk: Chunk,
    locals: Locals<'src>,
    error: Option<CompileError>,
    depth: usize,
}

impl<'src> Compiler<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_limits(source, &Limits::default())
    }

    pub fn with_limits(source: &'src str, limits: &Limits) -> Self {
        Compiler {
            lexer: Lexer::new(source),
            chunk: Chunk::with_capacity(limits.chunk_capacity),
            locals: Locals::new(limits.local_slots()),
            error: None,
            depth: 0,
        }
    }

    pub fn had_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&CompileError> {
        self.error.as_ref()
    }

    /// Bytecode emitted so far. After an error this is not runnable.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn locals(&self) -> &Locals<'src> {
        &self.locals
    }

    /// Hands over the program, unless compilation recorded an error.
    pub fn finish(self) -> Result<Program, CompileError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Program::new(self.chunk, self.locals.len())),
        }
    }

    // Token helpers

    fn current(&self) -> Token<'src> {
        self.lexer.token()
    }

    fn advance(&mut self) {
        self.lexer.advance();
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is(kind)
    }

    fn error_at(&mut self, token: Token<'src>, kind: CompileErrorKind) {
        if let Some(first) = &self.error {
            log::debug!("suppressed compile error: {} (after {})", kind, first);
            return;
        }
        let span = Span::locate(self.lexer.source(), token.offset);
        log::debug!("compile error at {}: {}", span, kind);
        self.error = Some(CompileError::new(kind, span));
    }

    fn expect(&mut self, kind: TokenKind, err: CompileErrorKind) {
        if self.check(kind) {
            self.advance();
        } else {
            self.error_at(self.current(), err);
        }
    }

    // Emission

    fn emit_op(&mut self, op: Opcode) -> Result<(), Fault> {
        self.chunk.emit_byte(op as u8)
    }

    fn emit_op_u8(&mut self, op: Opcode, operand: u8) -> Result<(), Fault> {
        self.emit_op(op)?;
        self.chunk.emit_byte(operand)
    }

    // Name resolution

    fn resolve_selector(&mut self, token: Token<'src>) -> u8 {
        match Selector::resolve(token.text) {
            Some(sel) => sel.code(),
            None => {
                let name = token.lexeme().into_owned();
                self.error_at(token, CompileErrorKind::UnknownSelector(name));
                0
            }
        }
    }

    fn resolve_local(&mut self, token: Token<'src>) -> u8 {
        match self.locals.resolve(token.text) {
            Some(slot) => slot,
            None => {
                let name = token.lexeme().into_owned();
                self.error_at(token, CompileErrorKind::UndefinedVariable(name));
                0
            }
        }
    }

    fn declare_local(&mut self, token: Token<'src>) -> u8 {
        match self.locals.resolve_or_declare(token.text) {
            Some(slot) => slot,
            None => {
                let max = self.locals.max();
                self.error_at(token, CompileErrorKind::TooManyLocals { max });
                0
            }
        }
    }

    // Grammar

    /// Compiles the whole source, ending the bytecode with `halt`.
    pub fn compile_program(&mut self) -> Result<(), Fault> {
        while !self.check(TokenKind::Eof) && !self.had_error() {
            self.statement()?;
            if !self.check(TokenKind::Eof) {
                self.expect(TokenKind::Period, CompileErrorKind::ExpectedPeriod);
            }
        }
        self.emit_op(Opcode::Halt)?;

        log::debug!(
            "compiled {} bytes, {} locals{}",
            self.chunk.len(),
            self.locals.len(),
            if self.had_error() { " (with errors)" } else { "" }
        );
        Ok(())
    }

    fn statement(&mut self) -> Result<(), Fault> {
        if self.check(TokenKind::Identifier) {
            // One token past the identifier decides; rewind if it is not `:=`.
            let saved = self.lexer;
            let name = self.current();
            self.advance();

            if self.check(TokenKind::Assign) {
                // The slot exists before the right-hand side is compiled.
                let slot = self.declare_local(name);
                self.advance();
                self.expression()?;
                return self.emit_op_u8(Opcode::Store, slot);
            }

            self.lexer = saved;
        }

        self.expression()?;
        self.emit_op(Opcode::Pop)
    }

    fn expression(&mut self) -> Result<(), Fault> {
        self.operand()?;
        self.unary_messages()?;
        self.binary_messages()
    }

    fn operand(&mut self) -> Result<(), Fault> {
        let token = self.current();

        match token.kind {
            TokenKind::Integer => {
                self.emit_op(Opcode::PushInt)?;
                self.chunk.emit_i32(token.int_value)?;
                self.advance();
            }
            TokenKind::String => {
                let bytes = token.string_value();
                match u16::try_from(bytes.len()) {
                    Ok(len) => {
                        self.emit_op(Opcode::PushStr)?;
                        self.chunk.emit_u16(len)?;
                        self.chunk.emit_bytes(&bytes)?;
                    }
                    Err(_) => self.error_at(
                        token,
                        CompileErrorKind::StringTooLong {
                            len: bytes.len(),
                            max: usize::from(u16::MAX),
                        },
                    ),
                }
                self.advance();
            }
            TokenKind::Identifier => {
                let slot = self.resolve_local(token);
                self.emit_op_u8(Opcode::Load, slot)?;
                self.advance();
            }
            TokenKind::LParen => {
                if self.depth >= MAX_NESTING {
                    self.error_at(token, CompileErrorKind::NestingTooDeep { max: MAX_NESTING });
                    return Ok(());
                }
                self.depth += 1;
                self.advance();
                let result = self.expression();
                self.depth -= 1;
                result?;
                self.expect(TokenKind::RParen, CompileErrorKind::ExpectedRParen);
            }
            _ => self.error_at(token, CompileErrorKind::ExpectedExpression),
        }

        Ok(())
    }

    fn unary_messages(&mut self) -> Result<(), Fault> {
        while self.check(TokenKind::Identifier) {
            let token = self.current();
            let sel = self.resolve_selector(token);
            self.advance();
            self.emit_op_u8(Opcode::SendUnary, sel)?;
        }
        Ok(())
    }

    fn binary_messages(&mut self) -> Result<(), Fault> {
        while self.check(TokenKind::BinaryOp) {
            let op = self.current();
            self.advance();

            self.operand()?;
            self.unary_messages()?;

            let sel = self.resolve_selector(op);
            self.emit_op_u8(Opcode::SendBinary, sel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUSH_INT: u8 = Opcode::PushInt as u8;
    const PUSH_STR: u8 = Opcode::PushStr as u8;
    const POP: u8 = Opcode::Pop as u8;
    const LOAD: u8 = Opcode::Load as u8;
    const STORE: u8 = Opcode::Store as u8;
    const UNARY: u8 = Opcode::SendUnary as u8;
    const BINARY: u8 = Opcode::SendBinary as u8;
    const HALT: u8 = Opcode::Halt as u8;

    fn compile_ok(source: &str) -> Program {
        let mut compiler = Compiler::new(source);
        compiler.compile_program().expect("no fault");
        match compiler.finish() {
            Ok(program) => program,
            Err(e) => panic!("unexpected compile error: {}", e),
        }
    }

    fn compile_err(source: &str) -> CompileError {
        let mut compiler = Compiler::new(source);
        compiler.compile_program().expect("no fault");
        assert!(compiler.had_error());
        compiler.finish().expect_err("compile should fail")
    }

    fn int(n: i32) -> Vec<u8> {
        let mut v = vec![PUSH_INT];
        v.extend_from_slice(&n.to_le_bytes());
        v
    }

    #[test]
    fn test_empty_program_is_just_halt() {
        let program = compile_ok("");
        assert_eq!(program.code(), &[HALT]);
        assert_eq!(program.locals(), 0);
    }

    #[test]
    fn test_assignment_and_print() {
        let program = compile_ok("x := 3 + 4.\nx print.");
        let mut expected = Vec::new();
        expected.extend(int(3));
        expected.extend(int(4));
        expected.extend([BINARY, Selector::Plus.code(), STORE, 0]);
        expected.extend([LOAD, 0, UNARY, Selector::Print.code(), POP, HALT]);
        assert_eq!(program.code(), expected.as_slice());
        assert_eq!(program.locals(), 1);
    }

    #[test]
    fn test_binary_messages_are_left_to_right() {
        let program = compile_ok("2 + 3 * 4");
        let mut expected = Vec::new();
        expected.extend(int(2));
        expected.extend(int(3));
        expected.extend([BINARY, Selector::Plus.code()]);
        expected.extend(int(4));
        expected.extend([BINARY, Selector::Times.code(), POP, HALT]);
        assert_eq!(program.code(), expected.as_slice());
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        let program = compile_ok("x := 1. x + x print");
        let code = program.code();
        // ... load x, load x, send print, send +, pop
        assert_eq!(
            &code[code.len() - 10..],
            &[LOAD, 0, LOAD, 0, UNARY, 0, BINARY, 1, POP, HALT]
        );
    }

    #[test]
    fn test_parentheses_group() {
        let program = compile_ok("2 + (3 * 4)");
        let mut expected = Vec::new();
        expected.extend(int(2));
        expected.extend(int(3));
        expected.extend(int(4));
        expected.extend([BINARY, Selector::Times.code()]);
        expected.extend([BINARY, Selector::Plus.code(), POP, HALT]);
        assert_eq!(program.code(), expected.as_slice());
    }

    #[test]
    fn test_string_literal_is_unescaped() {
        let program = compile_ok("'it''s'");
        assert_eq!(
            program.code(),
            &[PUSH_STR, 4, 0, b'i', b't', b'\'', b's', POP, HALT]
        );
    }

    #[test]
    fn test_reassignment_reuses_slot() {
        let program = compile_ok("x := 1. x := 2. x print.");
        assert_eq!(program.locals(), 1);
        let stores: Vec<u8> = program
            .code()
            .windows(2)
            .filter(|w| w[0] == STORE)
            .map(|w| w[1])
            .collect();
        assert_eq!(stores, vec![0, 0]);
    }

    #[test]
    fn test_slots_follow_first_assignment() {
        let program = compile_ok("a := 1. b := 2. a := b.");
        assert_eq!(program.locals(), 2);
    }

    #[test]
    fn test_trailing_period_optional() {
        assert_eq!(compile_ok("1 print").code(), compile_ok("1 print.").code());
    }

    #[test]
    fn test_identifier_backtrack_reparses_expression() {
        // `x print` starts like an assignment; the compiler must rewind
        let program = compile_ok("x := 5. x print");
        let code = program.code();
        assert_eq!(
            &code[code.len() - 8..],
            &[STORE, 0, LOAD, 0, UNARY, 0, POP, HALT]
        );
    }

    #[test]
    fn test_unknown_selector() {
        let err = compile_err("x := 1. x foo.");
        assert_eq!(err.kind, CompileErrorKind::UnknownSelector("foo".to_string()));
        assert_eq!(err.span, Span { line: 1, col: 11 });
    }

    #[test]
    fn test_unknown_binary_selector() {
        let err = compile_err("1 / 2");
        assert_eq!(err.kind, CompileErrorKind::UnknownSelector("/".to_string()));
    }

    #[test]
    fn test_undefined_variable() {
        let err = compile_err("y print.");
        assert_eq!(err.kind, CompileErrorKind::UndefinedVariable("y".to_string()));
    }

    #[test]
    fn test_self_reference_on_first_assignment_compiles() {
        // the slot is declared before the right-hand side is compiled
        compile_ok("x := x + 1.");
    }

    #[test]
    fn test_missing_period() {
        let err = compile_err("1 print 2 print");
        // `2` is not a unary selector, so the statement ends there
        assert_eq!(err.kind, CompileErrorKind::ExpectedPeriod);
        assert_eq!(err.span, Span { line: 1, col: 9 });
    }

    #[test]
    fn test_missing_rparen() {
        let err = compile_err("(1 + 2 print");
        assert_eq!(err.kind, CompileErrorKind::ExpectedRParen);
    }

    #[test]
    fn test_expected_expression() {
        assert_eq!(compile_err("x := .").kind, CompileErrorKind::ExpectedExpression);
        assert_eq!(compile_err("1 print. . 2").kind, CompileErrorKind::ExpectedExpression);
        assert_eq!(compile_err("#").kind, CompileErrorKind::ExpectedExpression);
    }

    #[test]
    fn test_first_error_wins() {
        let err = compile_err("a foo. b bar.");
        // `a` is undefined and reported before the selector
        assert_eq!(err.kind, CompileErrorKind::UndefinedVariable("a".to_string()));
    }

    #[test]
    fn test_statement_loop_stops_after_error() {
        let mut compiler = Compiler::new("nope. 1 print. 2 print.");
        compiler.compile_program().unwrap();
        assert!(compiler.had_error());
        // no PRINT sends were compiled after the failing statement
        let code = compiler.chunk().as_bytes();
        assert!(!code.windows(2).any(|w| w == [UNARY, 0]));
        assert_eq!(code.last(), Some(&HALT));
    }

    #[test]
    fn test_too_many_locals() {
        let limits = Limits {
            max_locals: 2,
            ..Limits::default()
        };
        let mut compiler = Compiler::with_limits("a := 1. b := 2. c := 3.", &limits);
        compiler.compile_program().expect("locals overflow is not a fault");
        let err = compiler.finish().unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::TooManyLocals { max: 2 });
    }

    #[test]
    fn test_256_locals_fit() {
        let source: String = (0..256).map(|i| format!("v{} := {}. ", i, i)).collect();
        let program = compile_ok(&source);
        assert_eq!(program.locals(), 256);

        let source = format!("{} extra := 0.", source);
        let err = compile_err(&source);
        assert_eq!(err.kind, CompileErrorKind::TooManyLocals { max: 256 });
    }

    #[test]
    fn test_bytecode_overflow_is_fault() {
        let limits = Limits {
            chunk_capacity: 16,
            ..Limits::default()
        };
        let mut compiler = Compiler::with_limits("1. 2. 3. 4.", &limits);
        assert_eq!(
            compiler.compile_program(),
            Err(Fault::BytecodeOverflow { capacity: 16 })
        );
    }

    #[test]
    fn test_long_string_rejected() {
        let source = format!("'{}'", "a".repeat(70_000));
        let limits = Limits {
            chunk_capacity: 100_000,
            ..Limits::default()
        };
        let mut compiler = Compiler::with_limits(&source, &limits);
        compiler.compile_program().unwrap();
        let err = compiler.finish().unwrap_err();
        assert!(matches!(
            err.kind,
            CompileErrorKind::StringTooLong { len: 70_000, .. }
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{} print.", "(".repeat(n), ")".repeat(n));

        assert_eq!(compile_ok(&nested(MAX_NESTING)).code(), compile_ok("1 print.").code());

        let err = compile_err(&nested(MAX_NESTING + 1));
        assert_eq!(err.kind, CompileErrorKind::NestingTooDeep { max: MAX_NESTING });
        assert_eq!(err.span.col, MAX_NESTING + 1);

        let err = compile_err(&nested(5000));
        assert_eq!(err.kind, CompileErrorKind::NestingTooDeep { max: MAX_NESTING });
    }

    #[test]
    fn test_first_error_position_kept_with_many_errors() {
        let source = format!("{}.", "1 foo ".repeat(50));
        let err = compile_err(&source);
        assert_eq!(err.kind, CompileErrorKind::UnknownSelector("foo".to_string()));
        assert_eq!(err.span.col, 3);
    }

    #[test]
    fn test_comments_are_ignored() {
        assert_eq!(
            compile_ok("\"set up\" x := 1. \"show\" x print.").code(),
            compile_ok("x := 1. x print.").code()
        );
    }
}
