use crate::frontend::lexer::{Lexer, Span};
use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, prints the decoded value for literals
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    pub fn dump(&self, source: &str) {
        print!("{}", self.render(source));
    }

    /// Renders one line per token, `[line:col] KIND value`.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for token in Lexer::tokens(source) {
            out.push_str(&self.render_one(source.as_bytes(), &token));
            out.push('\n');
        }
        out
    }

    fn render_one(&self, source: &[u8], token: &Token<'_>) -> String {
        let span = Span::locate(source, token.offset);
        let colr = if self.color { self.color(token.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };
        let kind = self.kind(token.kind);

        let shown = if self.show_debug_repr {
            format!("{:?}", token.lexeme())
        } else {
            match token.kind {
                TokenKind::String => {
                    format!("'{}'", String::from_utf8_lossy(&token.string_value()))
                }
                TokenKind::Eof => "EOF".to_string(),
                _ => token.to_string(),
            }
        };

        format!(
            "[{:02}:{:02}] {}{:<8} {}{}",
            span.line, span.col, colr, kind, shown, reset
        )
    }

    fn kind(&self, kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Integer => "INT",
            TokenKind::String => "STRING",
            TokenKind::Identifier => "IDENT",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Period => "PERIOD",
            TokenKind::LParen | TokenKind::RParen => "PAREN",
            TokenKind::BinaryOp => "OP",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "ERROR",
        }
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Eof | TokenKind::Period => Self::DIM,
            TokenKind::String => Self::GRN,
            TokenKind::Integer => Self::CYN,
            TokenKind::Identifier => Self::YEL,
            TokenKind::BinaryOp | TokenKind::Assign => Self::MAG,
            TokenKind::Error => Self::RED,
            _ => Self::RESET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let out = TokenDumper::new().no_color().pretty().render("x := 'a''b'.");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "[01:01] IDENT    x");
        assert_eq!(lines[1], "[01:03] ASSIGN   :=");
        assert_eq!(lines[2], "[01:07] STRING   'a'b'");
        assert_eq!(lines[3], "[01:12] PERIOD   .");
        assert_eq!(lines[4], "[01:13] EOF      EOF");
    }

    #[test]
    fn test_render_colored_contains_escape() {
        let out = TokenDumper::new().render("42");
        assert!(out.contains("\x1b[36m"));
        assert!(out.contains("INT"));
    }
}
