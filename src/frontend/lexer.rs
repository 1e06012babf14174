use crate::frontend::token::{Token, TokenKind};

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    /// Computes the line/column of a byte offset.
    ///
    /// Tokens only carry offsets; positions are worked out on demand, which
    /// only happens when a diagnostic is reported.
    pub fn locate(source: &[u8], offset: usize) -> Self {
        let end = offset.min(source.len());
        let mut line = 1;
        let mut col = 1;
        for &b in &source[..end] {
            if b == b'\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Span { line, col }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_binary_char(b: u8) -> bool {
    matches!(
        b,
        b'~' | b'!'
            | b'@'
            | b'%'
            | b'&'
            | b'*'
            | b'-'
            | b'+'
            | b'='
            | b'|'
            | b'\\'
            | b'<'
            | b'>'
            | b','
            | b'?'
            | b'/'
    )
}

/// Pull-based scanner with exactly one token of lookahead.
///
/// The whole scanner state is `Copy`: the compiler backtracks by keeping a
/// copy and assigning it back.
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    token: Token<'src>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer and primes the first token.
    pub fn new(source: &'src str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    pub fn from_bytes(source: &'src [u8]) -> Self {
        let mut lexer = Lexer {
            source,
            pos: 0,
            token: Token::new(TokenKind::Eof, &[], 0),
        };
        lexer.advance();
        lexer
    }

    pub fn source(&self) -> &'src [u8] {
        self.source
    }

    /// The current token.
    pub fn token(&self) -> Token<'src> {
        self.token
    }

    /// Byte at `pos`, with NUL standing in for end of input.
    fn byte_at(&self, pos: usize) -> u8 {
        self.source.get(pos).copied().unwrap_or(0)
    }

    fn current(&self) -> u8 {
        self.byte_at(self.pos)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'"' => {
                    // Comment runs to the next double quote, or to the end.
                    self.pos += 1;
                    while !matches!(self.current(), 0 | b'"') {
                        self.pos += 1;
                    }
                    if self.current() == b'"' {
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn make(&self, kind: TokenKind, start: usize, end: usize) -> Token<'src> {
        Token::new(kind, &self.source[start..end], start)
    }

    /// Discards the current token and scans the next one.
    pub fn advance(&mut self) {
        self.skip_whitespace_and_comments();

        let start = self.pos;
        let c = self.current();

        self.token = match c {
            0 => self.make(TokenKind::Eof, start, start),
            b'0'..=b'9' => self.read_integer(),
            b'\'' => self.read_string(),
            c if is_letter(c) || c == b'_' => self.read_identifier(),
            b':' if self.byte_at(start + 1) == b'=' => {
                self.pos += 2;
                self.make(TokenKind::Assign, start, self.pos)
            }
            b'.' => self.single(TokenKind::Period),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            c if is_binary_char(c) => {
                self.pos += 1;
                if is_binary_char(self.current()) {
                    self.pos += 1;
                }
                self.make(TokenKind::BinaryOp, start, self.pos)
            }
            _ => self.single(TokenKind::Error),
        };
    }

    fn single(&mut self, kind: TokenKind) -> Token<'src> {
        let start = self.pos;
        self.pos += 1;
        self.make(kind, start, self.pos)
    }

    fn read_integer(&mut self) -> Token<'src> {
        let start = self.pos;
        let mut value: i32 = 0;
        while self.current().is_ascii_digit() {
            // No overflow check: wraps like the machine word does.
            value = value
                .wrapping_mul(10)
                .wrapping_add(i32::from(self.current() - b'0'));
            self.pos += 1;
        }
        let mut token = self.make(TokenKind::Integer, start, self.pos);
        token.int_value = value;
        token
    }

    fn read_string(&mut self) -> Token<'src> {
        self.pos += 1; // opening quote
        let start = self.pos;
        loop {
            match self.current() {
                0 => break,
                b'\'' if self.byte_at(self.pos + 1) == b'\'' => self.pos += 2,
                b'\'' => break,
                _ => self.pos += 1,
            }
        }
        let token = self.make(TokenKind::String, start, self.pos);
        if self.current() == b'\'' {
            self.pos += 1; // closing quote
        }
        token
    }

    fn read_identifier(&mut self) -> Token<'src> {
        let start = self.pos;
        while self.current().is_ascii_alphanumeric() || self.current() == b'_' {
            self.pos += 1;
        }
        self.make(TokenKind::Identifier, start, self.pos)
    }

    /// Scans `source` to completion, yielding every token up to and
    /// including `Eof`.
    pub fn tokens(source: &'src str) -> Tokens<'src> {
        Tokens {
            lexer: Lexer::new(source),
            done: false,
        }
    }
}

/// Iterator over a whole token stream, used by the token dumper.
pub struct Tokens<'src> {
    lexer: Lexer<'src>,
    done: bool,
}

impl<'src> Iterator for Tokens<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.lexer.token();
        if token.is(TokenKind::Eof) {
            self.done = true;
        } else {
            self.lexer.advance();
        }
        Some(token)
    }
}
