// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token cursor and the atomic recognizers shared by every construct:
//! names, numbers, variables, argument lists and strings.

use super::*;

use crate::core::encoding::{to_word, VarKind};
use crate::core::opcodes::{string_function, STRING_FUNCTION_START};

fn expected(what: &str, found: Option<&Token>) -> ScummError {
    match found {
        Some(tok) => ScummError::syntax(format!("Expected {what}, found {}", tok.describe()))
            .with_span(tok.span),
        None => ScummError::syntax(format!("Expected {what}, found end of file")),
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn parse_number(text: &str, span: Span) -> Result<i64, ScummError> {
    if !is_number(text) {
        return Err(ScummError::syntax(format!("Invalid number: {text}")).with_span(span));
    }
    text.parse::<i64>()
        .map_err(|_| ScummError::syntax(format!("Invalid number: {text}")).with_span(span))
}

impl<'a> Session<'a> {
    pub(super) fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(super) fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub(super) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the next token, or of the last one at end of input.
    pub(super) fn current_span(&self) -> Span {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|tok| tok.span)
            .unwrap_or(Span::new(1, 1, 1))
    }

    pub(super) fn check_punct(&self, punct: Punct) -> bool {
        self.peek().is_some_and(|tok| tok.is_punct(punct))
    }

    pub(super) fn check_punct_at(&self, offset: usize, punct: Punct) -> bool {
        self.peek_at(offset).is_some_and(|tok| tok.is_punct(punct))
    }

    pub(super) fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(super) fn expect_punct(&mut self, punct: Punct) -> Result<Span, ScummError> {
        match self.peek() {
            Some(tok) if tok.is_punct(punct) => {
                self.pos += 1;
                Ok(tok.span)
            }
            other => Err(expected(&format!("'{}'", punct.as_str()), other)),
        }
    }

    pub(super) fn check_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|tok| tok.is_word(word))
    }

    pub(super) fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(super) fn expect_word(&mut self, word: &str) -> Result<Span, ScummError> {
        match self.peek() {
            Some(tok) if tok.is_word(word) => {
                self.pos += 1;
                Ok(tok.span)
            }
            other => Err(expected(&format!("'{word}'"), other)),
        }
    }

    /// Accept either `;` or nothing.
    pub(super) fn eat_semicolon(&mut self) {
        self.eat_punct(Punct::Semicolon);
    }

    /// Scan a compound name starting at `start` without consuming it.
    ///
    /// Names glue adjacent pieces: a leading `#`, inner `-` or `.` followed
    /// by a word, and a trailing `?`, `#` or `:`. `dummy(A7)` is one name.
    fn scan_name(&self, start: usize) -> Option<(String, usize, Span)> {
        let mut idx = start;
        let mut name = String::new();
        let first = self.tokens.get(idx)?;
        let mut span = first.span;
        let mut last = first;

        if first.is_punct(Punct::Hash) {
            let word = self.tokens.get(idx + 1)?;
            if !first.touches(word) {
                return None;
            }
            name.push('#');
            idx += 1;
            last = word;
        }
        let head = self.tokens.get(idx)?;
        name.push_str(head.word()?);
        span = span.to(head.span);
        idx += 1;

        loop {
            let Some(sep) = self.tokens.get(idx) else {
                break;
            };
            if !last.touches(sep) {
                break;
            }
            if sep.is_punct(Punct::Minus) || sep.is_punct(Punct::Dot) {
                let Some(word) = self.tokens.get(idx + 1) else {
                    break;
                };
                let Some(text) = word.word() else {
                    break;
                };
                if !sep.touches(word) {
                    break;
                }
                if let TokenKind::Punct(p) = &sep.kind {
                    name.push_str(p.as_str());
                }
                name.push_str(text);
                span = span.to(word.span);
                last = word;
                idx += 2;
                continue;
            }
            if sep.is_punct(Punct::Question) || sep.is_punct(Punct::Hash) || sep.is_punct(Punct::Colon)
            {
                if let TokenKind::Punct(p) = &sep.kind {
                    name.push_str(p.as_str());
                }
                span = span.to(sep.span);
                idx += 1;
            }
            break;
        }

        if name == "dummy" {
            let glued = self.tokens.get(idx).is_some_and(|t| t.is_punct(Punct::LParen))
                && self.tokens.get(idx + 1).is_some_and(|t| t.is_word("A7"))
                && self.tokens.get(idx + 2).is_some_and(|t| t.is_punct(Punct::RParen));
            if glued {
                name.push_str("(A7)");
                if let Some(close) = self.tokens.get(idx + 2) {
                    span = span.to(close.span);
                }
                idx += 3;
            }
        }

        Some((name, idx, span))
    }

    /// The name at the cursor, if any, without consuming it.
    pub(super) fn peek_name(&self) -> Option<String> {
        self.scan_name(self.pos).map(|(name, _, _)| name)
    }

    /// Token offset just past the name at the cursor.
    pub(super) fn name_len(&self) -> Option<usize> {
        self.scan_name(self.pos).map(|(_, end, _)| end - self.pos)
    }

    pub(super) fn read_name(&mut self) -> Result<(String, Span), ScummError> {
        match self.scan_name(self.pos) {
            Some((name, end, span)) => {
                self.pos = end;
                Ok((name, span))
            }
            None => Err(expected("a name", self.peek())),
        }
    }

    /// Plain label word, as in `[0138]` or `goto done`.
    pub(super) fn read_label(&mut self) -> Result<(String, Span), ScummError> {
        match self.peek() {
            Some(tok) => match tok.word() {
                Some(word) => {
                    self.pos += 1;
                    Ok((word.to_string(), tok.span))
                }
                None => Err(expected("a label", Some(tok))),
            },
            None => Err(expected("a label", None)),
        }
    }

    /// `[-]digits`.
    pub(super) fn parse_integer(&mut self) -> Result<i64, ScummError> {
        let negative = match self.peek() {
            Some(minus) if minus.is_punct(Punct::Minus) => {
                match self.peek_at(1) {
                    Some(next) if minus.touches(next) && next.word().is_some_and(is_number) => {}
                    other => return Err(expected("a number", other)),
                }
                self.pos += 1;
                true
            }
            _ => false,
        };
        match self.peek() {
            Some(tok) => match tok.word() {
                Some(text) if is_number(text) => {
                    self.pos += 1;
                    let value = parse_number(text, tok.span)?;
                    Ok(if negative { -value } else { value })
                }
                _ => Err(expected("a number", Some(tok))),
            },
            None => Err(expected("a number", None)),
        }
    }

    fn starts_negative_number(&self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some(minus), Some(next)) => {
                minus.is_punct(Punct::Minus)
                    && minus.touches(next)
                    && next.word().is_some_and(is_number)
            }
            _ => false,
        }
    }

    /// True when the cursor is at `Local[`, `Bit[` or `Var[`.
    pub(super) fn at_var_keyword(&self) -> bool {
        self.peek()
            .and_then(|tok| tok.word())
            .is_some_and(|word| VarKind::from_keyword(word).is_some())
            && self.check_punct_at(1, Punct::LBracket)
    }

    /// True when the cursor is at something that reads as a variable.
    pub(super) fn at_variable(&self) -> bool {
        if self.at_var_keyword() {
            return true;
        }
        match self.peek_name() {
            Some(name) => {
                self.known_vars.index_of(&name).is_some()
                    || matches!(self.state.defines.get(&name), Some(Operand::Var(_)))
            }
            None => false,
        }
    }

    fn parse_var_keyword(&mut self) -> Result<VarRef, ScummError> {
        let (kind, kw_span) = match self.advance() {
            Some(tok) => match tok.word().and_then(VarKind::from_keyword) {
                Some(kind) => (kind, tok.span),
                None => return Err(expected("a variable", Some(tok))),
            },
            None => return Err(expected("a variable", None)),
        };
        self.expect_punct(Punct::LBracket)?;
        let index_tok = self.peek();
        let base = self.parse_integer().map_err(|err| err.with_span(kw_span))?;
        let base = u32::try_from(base).map_err(|_| {
            let span = index_tok.map(|t| t.span).unwrap_or(kw_span);
            ScummError::syntax(format!("Invalid variable index: {base}")).with_span(span)
        })?;
        if self.eat_punct(Punct::Plus) {
            let offset = self.parse_operand()?;
            self.expect_punct(Punct::RBracket)?;
            return Ok(VarRef::indirect(kind, base, offset));
        }
        self.expect_punct(Punct::RBracket)?;
        Ok(VarRef::direct(kind, base))
    }

    /// A literal, a variable, a well-known variable name or a `#define`d name.
    pub(super) fn parse_operand(&mut self) -> Result<Operand, ScummError> {
        if self.starts_negative_number() {
            return Ok(Operand::Literal(self.parse_integer()?));
        }
        let Some(tok) = self.peek() else {
            return Err(expected("a value", None));
        };
        match tok.word() {
            Some(text) if is_number(text) => {
                self.pos += 1;
                Ok(Operand::Literal(parse_number(text, tok.span)?))
            }
            Some(_) if self.at_var_keyword() => Ok(Operand::Var(self.parse_var_keyword()?)),
            Some(_) => {
                let (name, span) = self.read_name()?;
                if let Some(index) = self.known_vars.index_of(&name) {
                    return Ok(Operand::Var(VarRef::direct(VarKind::Global, index.into())));
                }
                if let Some(value) = self.state.defines.get(&name) {
                    return Ok(value.clone());
                }
                Err(ScummError::compile(format!("Unknown variable name: {name}")).with_span(span))
            }
            None => Err(expected("a value", Some(tok))),
        }
    }

    pub(super) fn parse_var(&mut self) -> Result<VarRef, ScummError> {
        let span = self.current_span();
        match self.parse_operand() {
            Ok(Operand::Var(var)) => Ok(var),
            Ok(Operand::Literal(_)) => {
                Err(ScummError::syntax("Expected a variable").with_span(span))
            }
            Err(err) => Err(err),
        }
    }

    /// A literal number or a name `#define`d as one.
    pub(super) fn parse_constant(&mut self) -> Result<i64, ScummError> {
        let span = self.current_span();
        match self.parse_operand() {
            Ok(Operand::Literal(value)) => Ok(value),
            Ok(Operand::Var(_)) => Err(ScummError::syntax("Expected a constant").with_span(span)),
            Err(err) => Err(err),
        }
    }

    /// `[a, b, ...]`; the list may be empty.
    pub(super) fn parse_list(&mut self) -> Result<Vec<Operand>, ScummError> {
        self.expect_punct(Punct::LBracket)?;
        let mut items = Vec::new();
        if self.eat_punct(Punct::RBracket) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_operand()?);
            if self.eat_punct(Punct::Comma) {
                continue;
            }
            self.expect_punct(Punct::RBracket)?;
            return Ok(items);
        }
    }

    /// True when the cursor starts a string particle.
    pub(super) fn at_string(&self) -> bool {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Str { .. },
                ..
            }) => true,
            Some(tok) => {
                tok.word().and_then(string_function).is_some()
                    && self.check_punct_at(1, Punct::LParen)
            }
            None => false,
        }
    }

    /// Quoted text and string functions joined by `+`. The result carries
    /// no terminator.
    pub(super) fn parse_string(&mut self) -> Result<Vec<u8>, ScummError> {
        let mut out = Vec::new();
        loop {
            self.parse_string_particle(&mut out)?;
            if !self.eat_punct(Punct::Plus) {
                return Ok(out);
            }
        }
    }

    fn parse_string_particle(&mut self, out: &mut Vec<u8>) -> Result<(), ScummError> {
        let Some(tok) = self.advance() else {
            return Err(expected("a string", None));
        };
        match &tok.kind {
            TokenKind::Str { text: raw, .. } => {
                let unescaped = if self.legacy {
                    unescape_legacy(raw)
                } else {
                    unescape(raw)
                };
                let text = unescaped.map_err(|err| err.with_span(tok.span))?;
                for ch in text.chars() {
                    let byte = u8::try_from(u32::from(ch)).map_err(|_| {
                        ScummError::compile(format!(
                            "Character cannot be stored in a single byte: {ch}"
                        ))
                        .with_span(tok.span)
                    })?;
                    out.push(byte);
                }
                Ok(())
            }
            TokenKind::Word(name) => {
                let Some(code) = string_function(name) else {
                    return Err(expected("a string", Some(tok)));
                };
                self.expect_punct(Punct::LParen)?;
                match name.as_str() {
                    "getInt" | "getVerb" | "getName" | "getString" => {
                        out.extend([STRING_FUNCTION_START, code]);
                        out.extend(self.parse_var()?.encode()?);
                    }
                    "startAnim" | "setColor" | "setFont" => {
                        out.extend([STRING_FUNCTION_START, code]);
                        let value = self.parse_constant()?;
                        out.extend_from_slice(&to_word(value)?);
                    }
                    "sound" => {
                        // Each 32-bit argument is split across two sound codes.
                        let first = self.parse_sound_value()?;
                        self.expect_punct(Punct::Comma)?;
                        let second = self.parse_sound_value()?;
                        for half in [first & 0xFFFF, first >> 16, second & 0xFFFF, second >> 16] {
                            out.extend([STRING_FUNCTION_START, code]);
                            out.extend_from_slice(&(half as u16).to_le_bytes());
                        }
                    }
                    _ => out.extend([STRING_FUNCTION_START, code]),
                }
                self.expect_punct(Punct::RParen)?;
                Ok(())
            }
            TokenKind::Punct(_) => Err(expected("a string", Some(tok))),
        }
    }

    /// Decimal or `0x` hexadecimal, 32 bits.
    fn parse_sound_value(&mut self) -> Result<u32, ScummError> {
        let Some(tok) = self.advance() else {
            return Err(expected("a sound value", None));
        };
        let Some(text) = tok.word() else {
            return Err(expected("a sound value", Some(tok)));
        };
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None if is_number(text) => text.parse::<u32>().ok(),
            None => None,
        };
        parsed.ok_or_else(|| {
            ScummError::syntax(format!("Invalid sound value: {text}")).with_span(tok.span)
        })
    }
}

/// `\xHH` gives byte HH; a backslash before any other character keeps that character.
pub(crate) fn unescape(raw: &str) -> Result<String, ScummError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                let value = if digits.len() == 2 {
                    u8::from_str_radix(&digits, 16).ok()
                } else {
                    None
                };
                match value {
                    Some(byte) => out.push(char::from(byte)),
                    None => {
                        return Err(ScummError::syntax(format!(
                            "Invalid hex escape: \\x{digits}"
                        )))
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Legacy `^NNN` decimal escapes. A `^` not followed by a digit is kept.
pub(crate) fn unescape_legacy(raw: &str) -> Result<String, ScummError> {
    fn flush(out: &mut String, digits: &mut Option<String>) -> Result<(), ScummError> {
        if let Some(code) = digits.take() {
            if code.is_empty() {
                out.push('^');
                return Ok(());
            }
            match code.parse::<u32>() {
                Ok(value) if value <= 255 => out.push(char::from(value as u8)),
                _ => {
                    return Err(ScummError::syntax(format!(
                        "Invalid escape character code: ^{code}"
                    )))
                }
            }
        }
        Ok(())
    }

    let mut out = String::with_capacity(raw.len());
    let mut digits: Option<String> = None;
    for c in raw.chars() {
        if let Some(code) = digits.as_mut() {
            if c.is_ascii_digit() {
                code.push(c);
                continue;
            }
            flush(&mut out, &mut digits)?;
        }
        if c == '^' {
            digits = Some(String::new());
        } else {
            out.push(c);
        }
    }
    flush(&mut out, &mut digits)?;
    Ok(out)
}
