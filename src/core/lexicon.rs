// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for SCUMM script text.
//!
//! Source files are treated as Latin-1: every byte becomes one character,
//! so quoted strings can carry any byte value through to the bytecode.

use crate::core::error::ScummError;

/// Source position of a token. Columns are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    pub fn new(line: u32, col_start: usize, col_end: usize) -> Self {
        Self {
            line,
            col_start,
            col_end,
        }
    }

    /// Span covering both `self` and `other` when they share a line.
    pub fn to(self, other: Span) -> Span {
        if self.line == other.line {
            Span::new(self.line, self.col_start, other.col_end.max(self.col_end))
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Lt,
    Gt,
    Comma,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Bang,
    Dot,
    Hash,
    Colon,
    Question,
    Amp,
    Pipe,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    AmpAssign,
    PipeAssign,
    Increment,
    Decrement,
    Eq,
    Ne,
    Le,
    Ge,
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::LBrace => "{",
            Punct::RBrace => "}",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Assign => "=",
            Punct::Bang => "!",
            Punct::Dot => ".",
            Punct::Hash => "#",
            Punct::Colon => ":",
            Punct::Question => "?",
            Punct::Amp => "&",
            Punct::Pipe => "|",
            Punct::PlusAssign => "+=",
            Punct::MinusAssign => "-=",
            Punct::StarAssign => "*=",
            Punct::SlashAssign => "/=",
            Punct::AmpAssign => "&=",
            Punct::PipeAssign => "|=",
            Punct::Increment => "++",
            Punct::Decrement => "--",
            Punct::Eq => "==",
            Punct::Ne => "!=",
            Punct::Le => "<=",
            Punct::Ge => ">=",
        }
    }

    fn single(c: char) -> Option<Punct> {
        let punct = match c {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '<' => Punct::Lt,
            '>' => Punct::Gt,
            ',' => Punct::Comma,
            ';' => Punct::Semicolon,
            '+' => Punct::Plus,
            '-' => Punct::Minus,
            '*' => Punct::Star,
            '/' => Punct::Slash,
            '=' => Punct::Assign,
            '!' => Punct::Bang,
            '.' => Punct::Dot,
            '#' => Punct::Hash,
            ':' => Punct::Colon,
            '?' => Punct::Question,
            '&' => Punct::Amp,
            '|' => Punct::Pipe,
            _ => return None,
        };
        Some(punct)
    }

    fn compound(first: char, second: char) -> Option<Punct> {
        let punct = match (first, second) {
            ('+', '=') => Punct::PlusAssign,
            ('-', '=') => Punct::MinusAssign,
            ('*', '=') => Punct::StarAssign,
            ('/', '=') => Punct::SlashAssign,
            ('&', '=') => Punct::AmpAssign,
            ('|', '=') => Punct::PipeAssign,
            ('+', '+') => Punct::Increment,
            ('-', '-') => Punct::Decrement,
            ('=', '=') => Punct::Eq,
            ('!', '=') => Punct::Ne,
            ('<', '=') => Punct::Le,
            ('>', '=') => Punct::Ge,
            _ => return None,
        };
        Some(punct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, number, hex byte or label: `[A-Za-z0-9_]+`.
    Word(String),
    /// Quoted text with the quotes stripped; escapes are left unprocessed.
    /// `quote` is the delimiter the source used.
    Str { text: String, quote: char },
    Punct(Punct),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    pub fn is_word(&self, text: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w == text)
    }

    /// Quoted token text for error messages. Strings keep the quote
    /// character they were written with.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Word(text) => format!("'{text}'"),
            TokenKind::Str { text, quote } => format!("{quote}{text}{quote}"),
            TokenKind::Punct(p) => format!("'{}'", p.as_str()),
        }
    }

    /// True when `next` starts in the column right after this token ends.
    pub fn touches(&self, next: &Token) -> bool {
        self.span.line == next.span.line && next.span.col_start == self.span.col_end + 1
    }
}

/// Decode raw script bytes one byte per character.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split script text into tokens, dropping whitespace and `/* */` comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScummError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0usize;
    let mut line = 1u32;
    let mut col = 1usize;

    while idx < chars.len() {
        let c = chars[idx];
        if c == '\n' {
            idx += 1;
            line += 1;
            col = 1;
            continue;
        }
        if c.is_whitespace() {
            idx += 1;
            col += 1;
            continue;
        }

        if c == '/' && chars.get(idx + 1) == Some(&'*') {
            let start = Span::new(line, col, col + 1);
            idx += 2;
            col += 2;
            let mut closed = false;
            while idx < chars.len() {
                if chars[idx] == '*' && chars.get(idx + 1) == Some(&'/') {
                    idx += 2;
                    col += 2;
                    closed = true;
                    break;
                }
                if chars[idx] == '\n' {
                    line += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                idx += 1;
            }
            if !closed {
                return Err(ScummError::syntax("Unterminated comment").with_span(start));
            }
            continue;
        }

        let start_col = col;
        if is_word_char(c) {
            let mut text = String::new();
            while idx < chars.len() && is_word_char(chars[idx]) {
                text.push(chars[idx]);
                idx += 1;
                col += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word(text),
                span: Span::new(line, start_col, col - 1),
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let start_line = line;
            idx += 1;
            col += 1;
            let mut text = String::new();
            let mut closed = false;
            while idx < chars.len() {
                let ch = chars[idx];
                if ch == '\n' {
                    break;
                }
                if ch == '\\' {
                    text.push(ch);
                    idx += 1;
                    col += 1;
                    if let Some(&escaped) = chars.get(idx) {
                        if escaped == '\n' {
                            break;
                        }
                        text.push(escaped);
                        idx += 1;
                        col += 1;
                    }
                    continue;
                }
                idx += 1;
                col += 1;
                if ch == quote {
                    closed = true;
                    break;
                }
                text.push(ch);
            }
            if !closed {
                return Err(ScummError::syntax("Unterminated string literal")
                    .with_span(Span::new(start_line, start_col, start_col)));
            }
            tokens.push(Token {
                kind: TokenKind::Str { text, quote },
                span: Span::new(line, start_col, col - 1),
            });
            continue;
        }

        if let Some(next) = chars.get(idx + 1) {
            if let Some(punct) = Punct::compound(c, *next) {
                idx += 2;
                col += 2;
                tokens.push(Token {
                    kind: TokenKind::Punct(punct),
                    span: Span::new(line, start_col, start_col + 1),
                });
                continue;
            }
        }
        if let Some(punct) = Punct::single(c) {
            idx += 1;
            col += 1;
            tokens.push(Token {
                kind: TokenKind::Punct(punct),
                span: Span::new(line, start_col, start_col),
            });
            continue;
        }

        return Err(ScummError::syntax(format!("Unexpected character: {c}"))
            .with_span(Span::new(line, start_col, start_col)));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_descumm_line() {
        let tokens = tokenize("[0138] (05) drawObject(189,255,255);").expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Punct(Punct::LBracket));
        assert_eq!(tokens[1].kind, TokenKind::Word("0138".to_string()));
        assert_eq!(tokens[1].span, Span::new(1, 2, 5));
        assert_eq!(tokens[6].kind, TokenKind::Word("drawObject".to_string()));
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Punct(Punct::Semicolon)));
    }

    #[test]
    fn compound_operators_are_single_tokens() {
        assert_eq!(
            kinds("Local[0] += 7"),
            vec![
                TokenKind::Word("Local".to_string()),
                TokenKind::Punct(Punct::LBracket),
                TokenKind::Word("0".to_string()),
                TokenKind::Punct(Punct::RBracket),
                TokenKind::Punct(Punct::PlusAssign),
                TokenKind::Word("7".to_string()),
            ]
        );
        assert_eq!(
            kinds("a<=b != c--"),
            vec![
                TokenKind::Word("a".to_string()),
                TokenKind::Punct(Punct::Le),
                TokenKind::Word("b".to_string()),
                TokenKind::Punct(Punct::Ne),
                TokenKind::Word("c".to_string()),
                TokenKind::Punct(Punct::Decrement),
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_tracked() {
        let tokens = tokenize("/* header\n comment */\nbreakHere();").expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Word("breakHere".to_string()));
        assert_eq!(tokens[0].span.line, 3);
    }

    fn string(text: &str, quote: char) -> TokenKind {
        TokenKind::Str {
            text: text.to_string(),
            quote,
        }
    }

    #[test]
    fn strings_keep_escapes_raw() {
        assert_eq!(
            kinds(r#"Text("say \"hi\"\x20")"#)[2],
            string(r#"say \"hi\"\x20"#, '"')
        );
        assert_eq!(kinds("'single'")[0], string("single", '\''));
    }

    #[test]
    fn strings_are_described_with_their_own_quotes() {
        let tokens = tokenize("'y' \"z\" w").expect("tokenize");
        assert_eq!(tokens[0].describe(), "'y'");
        assert_eq!(tokens[1].describe(), "\"z\"");
        assert_eq!(tokens[2].describe(), "'w'");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("print(\"oops);\nbreakHere();").unwrap_err();
        assert_eq!(err.message(), "Unterminated string literal");
        assert_eq!(err.span().map(|s| s.col_start), Some(7));
    }

    #[test]
    fn unexpected_character_is_reported_with_column() {
        let err = tokenize("putActor(1, @2);").unwrap_err();
        assert_eq!(err.message(), "Unexpected character: @");
        assert_eq!(err.span(), Some(Span::new(1, 13, 13)));
    }

    #[test]
    fn latin1_bytes_round_trip() {
        let text = decode_latin1(&[b'"', 0xE9, 0xFE, b'"']);
        let tokens = tokenize(&text).expect("tokenize");
        assert_eq!(tokens[0].kind, string("\u{e9}\u{fe}", '"'));
    }

    #[test]
    fn touching_tokens_are_detected() {
        let tokens = tokenize("x-pos x -pos").expect("tokenize");
        assert!(tokens[0].touches(&tokens[1]));
        assert!(tokens[1].touches(&tokens[2]));
        assert!(!tokens[3].touches(&tokens[4]));
    }
}
