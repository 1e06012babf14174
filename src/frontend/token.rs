use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Integer,
    String,

    // Names
    Identifier,

    // Punctuation
    Assign, // :=
    Period, // .
    LParen, // (
    RParen, // )

    // One or two binary-selector characters: + - * / < > = ...
    BinaryOp,

    // Special
    Eof,
    Error,
}

/// A single token borrowed from the source buffer.
///
/// Only the lexeme slice is kept; nothing is copied out of the source.
/// For string literals the slice is the raw text between the quotes, with
/// doubled quotes still in place (see [`Token::string_value`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src [u8],
    /// Byte offset of `text` within the source.
    pub offset: usize,
    /// Pre-decoded value, only meaningful for `TokenKind::Integer`.
    pub int_value: i32,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src [u8], offset: usize) -> Self {
        Token {
            kind,
            text,
            offset,
            int_value: 0,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Decodes a string literal, collapsing every `''` into a single quote.
    ///
    /// Borrows when the literal contains no escaped quote.
    pub fn string_value(&self) -> Cow<'src, [u8]> {
        if !self.text.windows(2).any(|w| w == b"''") {
            return Cow::Borrowed(self.text);
        }

        let mut out = Vec::with_capacity(self.text.len());
        let mut i = 0;
        while i < self.text.len() {
            let b = self.text[i];
            out.push(b);
            if b == b'\'' && self.text.get(i + 1) == Some(&b'\'') {
                i += 2;
            } else {
                i += 1;
            }
        }
        Cow::Owned(out)
    }

    /// Lossy UTF-8 rendering of the lexeme, for diagnostics.
    pub fn lexeme(&self) -> Cow<'src, str> {
        String::from_utf8_lossy(self.text)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Integer => write!(f, "integer"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Assign => write!(f, ":="),
            TokenKind::Period => write!(f, "."),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::BinaryOp => write!(f, "binary operator"),
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Integer => write!(f, "{}", self.int_value),
            TokenKind::String => write!(f, "'{}'", self.lexeme()),
            TokenKind::Eof => write!(f, "EOF"),
            _ => write!(f, "{}", self.lexeme()),
        }
    }
}
