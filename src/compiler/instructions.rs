// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Encoders for catalogue-driven instructions.
//!
//! The dominant shape is opcode, optional result variable, then arguments;
//! each variable argument in the first three byte/word positions sets a
//! presence bit in the opcode byte.

use super::*;

use crate::core::encoding::{encode_list, param_bit, push_param, to_byte, to_word};
use crate::core::opcodes::{unsupported, LIST_END};

use catalogue::{Form, Instruction, Lookup, Param, Shape, SubList};

impl Session<'_> {
    pub(super) fn lookup_instruction(
        &self,
        name: &str,
        span: Span,
    ) -> Result<Instruction, ScummError> {
        match self.catalogue.instruction(name) {
            Lookup::Found(instr) => Ok(*instr),
            Lookup::Unsupported => Err(unsupported(name, self.dialect).with_span(span)),
            Lookup::Unknown => {
                Err(ScummError::syntax(format!("Unknown instruction: {name}")).with_span(span))
            }
        }
    }

    /// Instruction call at the cursor. `target` is the result variable of
    /// `Var[n] = name(...)`.
    pub(super) fn parse_instruction(
        &mut self,
        target: Option<&VarRef>,
    ) -> Result<Vec<u8>, ScummError> {
        let (name, span) = self.read_name()?;
        let instr = self.lookup_instruction(&name, span)?;
        match (instr.has_target(), target) {
            (false, Some(_)) => {
                return Err(ScummError::compile(format!(
                    "Instruction does not return a value: {name}"
                ))
                .with_span(span))
            }
            (true, None) => {
                return Err(ScummError::syntax(format!(
                    "Instruction result must be assigned to a variable: {name}"
                ))
                .with_span(span))
            }
            _ => {}
        }
        tracing::trace!(instruction = instr.name, opcode = instr.opcode, "encoding");

        match instr.form {
            Form::Simple(shape) => {
                let mut op = instr.opcode;
                self.expect_punct(Punct::LParen)?;
                let args = self.parse_args(shape.params, &mut op)?;
                self.expect_punct(Punct::RParen)?;
                let mut out = vec![op];
                if let Some(var) = target {
                    out.extend(var.encode()?);
                }
                out.extend(args);
                Ok(out)
            }
            Form::Nested { shape, .. } => self.encode_nested(&instr, shape, target, span),
            Form::SubOps { list, leading } => self.encode_subops(instr.opcode, list, leading),
            Form::Special(special) => self.encode_special(special, &instr, span),
        }
    }

    fn encode_nested(
        &mut self,
        instr: &Instruction,
        shape: Shape,
        target: Option<&VarRef>,
        span: Span,
    ) -> Result<Vec<u8>, ScummError> {
        let Some(parent) = instr.parent_opcode else {
            return Err(unsupported(instr.name, self.dialect).with_span(span));
        };
        let mut sub = instr.opcode;
        self.expect_punct(Punct::LParen)?;
        let args = self.parse_args(shape.params, &mut sub)?;
        self.expect_punct(Punct::RParen)?;
        let mut out = vec![parent, sub];
        if let Some(var) = target {
            out.extend(var.encode()?);
        }
        out.extend(args);
        Ok(out)
    }

    /// Comma-separated arguments inside the call parentheses. Presence
    /// bits go into `op`.
    pub(super) fn parse_args(
        &mut self,
        params: &[Param],
        op: &mut u8,
    ) -> Result<Vec<u8>, ScummError> {
        let mut out = Vec::new();
        let mut bit_index = 0;
        for (idx, param) in params.iter().enumerate() {
            if idx > 0 {
                self.expect_punct(Punct::Comma)?;
            }
            let bit = if param.takes_bit() {
                let bit = param_bit(bit_index);
                bit_index += 1;
                bit
            } else {
                0
            };
            self.encode_param(*param, bit, op, &mut out)?;
        }
        Ok(out)
    }

    pub(super) fn encode_param(
        &mut self,
        param: Param,
        bit: u8,
        op: &mut u8,
        out: &mut Vec<u8>,
    ) -> Result<(), ScummError> {
        match param {
            Param::P8 | Param::P16 => {
                let span = self.current_span();
                let arg = self.parse_operand()?;
                push_param(out, op, bit, &arg, param == Param::P16)
                    .map_err(|err| err.with_span(span))?;
            }
            Param::Byte => {
                let span = self.current_span();
                let value = self.parse_constant()?;
                out.push(to_byte(value).map_err(|err| err.with_span(span))?);
            }
            Param::Word => {
                let span = self.current_span();
                let value = self.parse_constant()?;
                out.extend_from_slice(&to_word(value).map_err(|err| err.with_span(span))?);
            }
            Param::Var => out.extend(self.parse_var()?.encode()?),
            Param::List => {
                let span = self.current_span();
                let items = self.parse_list()?;
                out.extend(encode_list(&items).map_err(|err| err.with_span(span))?);
            }
            Param::Text => {
                out.extend(self.parse_string()?);
                out.push(0x00);
            }
            Param::OptText => {
                if self.at_string() {
                    out.extend(self.parse_string()?);
                }
                out.push(0x00);
            }
        }
        Ok(())
    }

    /// `name([leading,] [Sub(...), ...])`.
    fn encode_subops(
        &mut self,
        opcode: u8,
        list: SubList,
        leading: bool,
    ) -> Result<Vec<u8>, ScummError> {
        let mut op = opcode;
        let mut head = Vec::new();
        self.expect_punct(Punct::LParen)?;
        if leading {
            let span = self.current_span();
            let arg = self.parse_operand()?;
            push_param(&mut head, &mut op, 0x80, &arg, false).map_err(|err| err.with_span(span))?;
            self.expect_punct(Punct::Comma)?;
        }
        self.expect_punct(Punct::LBracket)?;

        let mut body = Vec::new();
        let mut last_was_text = false;
        if !self.check_punct(Punct::RBracket) && !self.check_punct(Punct::Semicolon) {
            loop {
                let (name, span) = self.read_name()?;
                let sub = match self.catalogue.subop(list, &name) {
                    Lookup::Found(sub) => *sub,
                    Lookup::Unsupported => {
                        let qualified = format!("{}.{}", list.label(), name);
                        return Err(unsupported(&qualified, self.dialect).with_span(span));
                    }
                    Lookup::Unknown => {
                        return Err(ScummError::syntax(format!(
                            "Unknown sub-operation for {}: {name}",
                            list.label()
                        ))
                        .with_span(span))
                    }
                };
                let mut code = sub.code;
                self.expect_punct(Punct::LParen)?;
                let args = self.parse_args(sub.params, &mut code)?;
                self.expect_punct(Punct::RParen)?;
                body.push(code);
                body.extend(args);
                last_was_text = list == SubList::Print && name == "Text";
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.eat_punct(Punct::Semicolon);
        self.expect_punct(Punct::RBracket)?;
        self.expect_punct(Punct::RParen)?;

        // Text already ends the print list.
        if !last_was_text {
            body.push(LIST_END);
        }
        let mut out = vec![op];
        out.extend(head);
        out.extend(body);
        Ok(out)
    }
}
