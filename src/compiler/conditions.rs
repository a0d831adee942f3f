// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tests for conditional jumps. Each returns the test bytes only; the caller
//! appends the jump placeholder.

use super::*;

use crate::core::encoding::{encode_list, push_param};
use crate::core::opcodes::{comparison, unsupported, OP_EQUAL_ZERO, OP_NOT_EQUAL_ZERO};

use catalogue::Param;

fn comparison_punct(punct: &Punct) -> bool {
    matches!(
        punct,
        Punct::Eq | Punct::Ne | Punct::Lt | Punct::Le | Punct::Gt | Punct::Ge
    )
}

impl Session<'_> {
    pub(super) fn parse_condition(&mut self) -> Result<Vec<u8>, ScummError> {
        if self.eat_punct(Punct::Bang) {
            let var = self.parse_var()?;
            let mut out = vec![OP_EQUAL_ZERO];
            out.extend(var.encode()?);
            return Ok(out);
        }

        if self.check_punct_at(1, Punct::LParen) {
            match self.peek_name().as_deref() {
                Some("classOfIs") => return self.parse_class_of_is(),
                Some("isActorInBox") => return self.parse_actor_in_box(),
                Some("getState") => return self.parse_get_state(),
                _ => {}
            }
        }

        let var = self.parse_var()?;
        let Some(TokenKind::Punct(punct)) = self.peek().map(|tok| &tok.kind) else {
            let mut out = vec![OP_NOT_EQUAL_ZERO];
            out.extend(var.encode()?);
            return Ok(out);
        };
        if !comparison_punct(punct) {
            let mut out = vec![OP_NOT_EQUAL_ZERO];
            out.extend(var.encode()?);
            return Ok(out);
        }
        let Some(mut op) = comparison(punct.as_str()) else {
            return Err(ScummError::syntax(format!(
                "Unknown comparison: {}",
                punct.as_str()
            ))
            .with_span(self.current_span()));
        };
        self.pos += 1;

        let span = self.current_span();
        let arg = self.parse_operand()?;
        let mut out = Vec::new();
        out.extend(var.encode()?);
        push_param(&mut out, &mut op, 0x80, &arg, true).map_err(|err| err.with_span(span))?;
        let mut bytes = vec![op];
        bytes.extend(out);
        Ok(bytes)
    }

    /// `classOfIs(object, [classes])`.
    fn parse_class_of_is(&mut self) -> Result<Vec<u8>, ScummError> {
        let (name, span) = self.read_name()?;
        let mut op = self.opcodes.lookup(&name).map_err(|err| err.with_span(span))?;
        self.expect_punct(Punct::LParen)?;
        let mut out = Vec::new();
        self.encode_param(Param::P16, 0x80, &mut op, &mut out)?;
        self.expect_punct(Punct::Comma)?;
        let list_span = self.current_span();
        let classes = self.parse_list()?;
        out.extend(encode_list(&classes).map_err(|err| err.with_span(list_span))?);
        if self.legacy {
            // Older descumm drops this parenthesis; only take it when the
            // enclosing test still has its own.
            if self.check_punct(Punct::RParen) && self.check_punct_at(1, Punct::RParen) {
                self.pos += 1;
            }
        } else {
            self.expect_punct(Punct::RParen)?;
        }
        let mut bytes = vec![op];
        bytes.extend(out);
        Ok(bytes)
    }

    fn parse_actor_in_box(&mut self) -> Result<Vec<u8>, ScummError> {
        let (name, span) = self.read_name()?;
        let mut op = self.opcodes.lookup(&name).map_err(|err| err.with_span(span))?;
        self.expect_punct(Punct::LParen)?;
        let args = self.parse_args(&[Param::P8, Param::P8], &mut op)?;
        self.expect_punct(Punct::RParen)?;
        let mut bytes = vec![op];
        bytes.extend(args);
        Ok(bytes)
    }

    /// `getState(obj) == st`, or `getState(obj == st)` in dialect 3old.
    fn parse_get_state(&mut self) -> Result<Vec<u8>, ScummError> {
        let (name, span) = self.read_name()?;
        let (Some(if_state), Some(if_not_state)) =
            (self.opcodes.get("ifState"), self.opcodes.get("ifNotState"))
        else {
            return Err(unsupported(&name, self.dialect).with_span(span));
        };
        let inner = self.dialect == Dialect::V3Old;

        self.expect_punct(Punct::LParen)?;
        let obj_span = self.current_span();
        let object = self.parse_operand()?;
        if !inner {
            self.expect_punct(Punct::RParen)?;
        }
        let mut op = if self.eat_punct(Punct::Eq) {
            if_state
        } else if self.eat_punct(Punct::Ne) {
            if_not_state
        } else {
            return Err(ScummError::syntax(format!(
                "Expected '==' or '!=', found {}",
                self.peek()
                    .map_or_else(|| "end of file".to_string(), |tok| tok.describe())
            ))
            .with_span(self.current_span()));
        };
        let mut out = Vec::new();
        push_param(&mut out, &mut op, 0x80, &object, true).map_err(|err| err.with_span(obj_span))?;
        self.encode_param(Param::P8, 0x40, &mut op, &mut out)?;
        if inner {
            self.expect_punct(Punct::RParen)?;
        }
        let mut bytes = vec![op];
        bytes.extend(out);
        Ok(bytes)
    }
}
