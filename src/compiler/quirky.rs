// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instructions whose encoding does not fit the argument-shape tables.

use super::*;

use crate::core::encoding::{encode_list, to_byte, to_word};
use crate::core::opcodes::unsupported;

use catalogue::{Instruction, Param, Special};

const MAX_DELAY: i64 = 0xFF_FFFF;
const SENTENCE_STOP: u8 = 0xFE;
const BOX_AUX: u8 = 0x05;
const PAL_COLOR_AUX: u8 = 0x04;
const RGB_INTENSITY_AUX: u8 = 0x0B;
const ROOM_AUX: u8 = 0x01;
const PSEUDO_ROOM_FLAG: u8 = 0x80;
const RECURSIVE_FLAG: u8 = 0x40;
const FREEZE_RESISTANT_FLAG: u8 = 0x20;

impl Session<'_> {
    pub(super) fn encode_special(
        &mut self,
        special: Special,
        instr: &Instruction,
        span: Span,
    ) -> Result<Vec<u8>, ScummError> {
        match special {
            Special::Delay => self.encode_delay(instr.opcode),
            Special::DoSentence => self.encode_do_sentence(instr.opcode),
            Special::DrawBox => self.encode_draw_box(instr.opcode),
            Special::DrawObject => self.encode_draw_object(instr.opcode),
            Special::OldRoomEffect | Special::Override | Special::RoomOp => {
                let Some(parent) = instr.parent_opcode else {
                    return Err(unsupported(instr.name, self.dialect).with_span(span));
                };
                match special {
                    Special::OldRoomEffect => {
                        let mut op = parent;
                        self.expect_punct(Punct::LParen)?;
                        let mut args = Vec::new();
                        self.encode_param(Param::P16, 0x80, &mut op, &mut args)?;
                        self.expect_punct(Punct::RParen)?;
                        let mut out = vec![op, instr.opcode];
                        out.extend(args);
                        Ok(out)
                    }
                    Special::Override => {
                        // Legacy descumm writes the override markers bare.
                        if !self.legacy || self.check_punct(Punct::LParen) {
                            self.expect_punct(Punct::LParen)?;
                            self.expect_punct(Punct::RParen)?;
                        }
                        Ok(vec![parent, instr.opcode])
                    }
                    _ => self.encode_room_op(parent, instr),
                }
            }
            Special::PseudoRoom => self.encode_pseudo_room(instr.opcode),
            Special::SaveLoadVars => self.encode_save_load_vars(instr.opcode),
            Special::SetVarRange => self.encode_set_var_range(instr.opcode),
            Special::StartScript => self.encode_start_script(instr.opcode),
            Special::StopObjectCode => {
                self.expect_punct(Punct::LParen)?;
                self.expect_punct(Punct::RParen)?;
                let op = if self.state.effective_script_type().uses_short_stop() {
                    self.opcodes.lookup("stopObjectCode-alt")?
                } else {
                    instr.opcode
                };
                Ok(vec![op])
            }
            Special::SystemOps => {
                self.expect_punct(Punct::LParen)?;
                let (word, word_span) = self.read_label()?;
                let sub = match word.as_str() {
                    "1" | "RESTART" => 0x01,
                    "2" | "PAUSE" => 0x02,
                    "3" | "QUIT" => 0x03,
                    _ => {
                        return Err(ScummError::syntax(format!(
                            "Unknown systemOps operation: {word}"
                        ))
                        .with_span(word_span))
                    }
                };
                self.expect_punct(Punct::RParen)?;
                Ok(vec![instr.opcode, sub])
            }
        }
    }

    /// 24-bit little-endian tick count.
    fn encode_delay(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let span = self.current_span();
        let value = self.parse_constant()?;
        if !(0..=MAX_DELAY).contains(&value) {
            return Err(ScummError::compile(format!(
                "Delay value should be between 0 and {MAX_DELAY}."
            ))
            .with_span(span));
        }
        self.expect_punct(Punct::RParen)?;
        let bytes = (value as u32).to_le_bytes();
        Ok(vec![opcode, bytes[0], bytes[1], bytes[2]])
    }

    fn encode_do_sentence(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        if self.eat_word("STOP") {
            self.expect_punct(Punct::RParen)?;
            return Ok(vec![opcode, SENTENCE_STOP]);
        }
        let mut op = opcode;
        let args = self.parse_args(&[Param::P8, Param::P16, Param::P16], &mut op)?;
        self.expect_punct(Punct::RParen)?;
        let mut out = vec![op];
        out.extend(args);
        Ok(out)
    }

    /// `drawBox(left, top, right, bottom, colour)`; the second corner and
    /// the colour go behind an auxiliary opcode.
    fn encode_draw_box(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        let mut op = opcode;
        let mut first = Vec::new();
        self.expect_punct(Punct::LParen)?;
        self.encode_param(Param::P16, 0x80, &mut op, &mut first)?;
        self.expect_punct(Punct::Comma)?;
        self.encode_param(Param::P16, 0x40, &mut op, &mut first)?;
        self.eat_punct(Punct::Semicolon);
        self.expect_punct(Punct::Comma)?;
        let mut aux = BOX_AUX;
        let second = self.parse_args(&[Param::P16, Param::P16, Param::P8], &mut aux)?;
        self.expect_punct(Punct::RParen)?;

        let mut out = vec![op];
        out.extend(first);
        out.push(aux);
        out.extend(second);
        Ok(out)
    }

    /// Dialect 5 form: `drawObject(obj [,] [setXY(x, y) | setImage(n)])`.
    fn encode_draw_object(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        let mut op = opcode;
        let mut out = Vec::new();
        self.expect_punct(Punct::LParen)?;
        self.encode_param(Param::P16, 0x80, &mut op, &mut out)?;
        self.eat_punct(Punct::Comma);

        let tail = if self.check_punct(Punct::RParen) {
            vec![self.opcodes.lookup("drawObject()")?]
        } else {
            let (name, span) = self.read_name()?;
            let params: &[Param] = match name.as_str() {
                "setXY" => &[Param::P16, Param::P16],
                "setImage" => &[Param::P16],
                _ => {
                    return Err(ScummError::syntax(format!(
                        "Unknown sub-operation for drawObject: {name}"
                    ))
                    .with_span(span))
                }
            };
            let mut sub = self.opcodes.lookup(&name).map_err(|err| err.with_span(span))?;
            self.expect_punct(Punct::LParen)?;
            let args = self.parse_args(params, &mut sub)?;
            self.expect_punct(Punct::RParen)?;
            let mut tail = vec![sub];
            tail.extend(args);
            tail
        };
        self.expect_punct(Punct::RParen)?;
        if self.legacy {
            self.eat_punct(Punct::RParen);
        }

        let mut bytes = vec![op];
        bytes.extend(out);
        bytes.extend(tail);
        Ok(bytes)
    }

    /// `PseudoRoom(val, a, b, IG, ...)`: every item is flagged with 0x80,
    /// `IG` stands for zero.
    fn encode_pseudo_room(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let span = self.current_span();
        let value = to_byte(self.parse_constant()?).map_err(|err| err.with_span(span))?;
        let mut out = vec![opcode, value];
        while self.eat_punct(Punct::Comma) {
            let item = if self.eat_word("IG") {
                0
            } else {
                let span = self.current_span();
                to_byte(self.parse_constant()?).map_err(|err| err.with_span(span))?
            };
            out.push(item | PSEUDO_ROOM_FLAG);
        }
        self.expect_punct(Punct::RParen)?;
        out.push(0x00);
        Ok(out)
    }

    /// `saveLoadVars(Save|Load, VarRange(a, b), StringRange(a, b), Open("f"), Append|Close)`.
    fn encode_save_load_vars(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let (mode, mode_span) = self.read_label()?;
        let mode_op = match mode.as_str() {
            "Save" | "Load" => self
                .opcodes
                .lookup(&format!("SLV_{mode}"))
                .map_err(|err| err.with_span(mode_span))?,
            _ => {
                return Err(ScummError::syntax(format!(
                    "Expected Save or Load, found '{mode}'"
                ))
                .with_span(mode_span))
            }
        };
        let mut out = vec![opcode, mode_op];
        let mut last = 0x00;

        while self.eat_punct(Punct::Comma) {
            let (name, span) = self.read_label()?;
            let sub = self
                .opcodes
                .lookup(&format!("SLV_{name}"))
                .map_err(|_| {
                    ScummError::syntax(format!("Unknown sub-operation for saveLoadVars: {name}"))
                        .with_span(span)
                })?;
            match name.as_str() {
                "VarRange" => {
                    self.expect_punct(Punct::LParen)?;
                    let first = self.parse_var()?;
                    self.expect_punct(Punct::Comma)?;
                    let second = self.parse_var()?;
                    self.expect_punct(Punct::RParen)?;
                    out.push(sub);
                    out.extend(first.encode()?);
                    out.extend(second.encode()?);
                }
                "StringRange" => {
                    let mut code = sub;
                    self.expect_punct(Punct::LParen)?;
                    let args = self.parse_args(&[Param::P8, Param::P8], &mut code)?;
                    self.expect_punct(Punct::RParen)?;
                    out.push(code);
                    out.extend(args);
                }
                "Open" => {
                    self.expect_punct(Punct::LParen)?;
                    let name = self.parse_string()?;
                    self.expect_punct(Punct::RParen)?;
                    out.push(sub);
                    out.extend(name);
                    out.push(0x00);
                }
                "Append" | "Close" => {
                    last = sub;
                    break;
                }
                _ => {
                    return Err(ScummError::syntax(format!(
                        "Unknown sub-operation for saveLoadVars: {name}"
                    ))
                    .with_span(span))
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        out.push(last);
        Ok(out)
    }

    /// `setVarRange(var, [count,] [values])`. Values switch to words when
    /// any of them does not fit a byte.
    fn encode_set_var_range(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let start = self.parse_var()?;
        self.eat_punct(Punct::Semicolon);
        self.expect_punct(Punct::Comma)?;
        let count = if self.check_punct(Punct::LBracket) {
            None
        } else {
            let span = self.current_span();
            let count = to_byte(self.parse_constant()?).map_err(|err| err.with_span(span))?;
            self.expect_punct(Punct::Comma)?;
            Some((count, span))
        };

        let list_span = self.current_span();
        self.expect_punct(Punct::LBracket)?;
        let mut values = vec![self.parse_constant()?];
        while self.eat_punct(Punct::Comma) {
            values.push(self.parse_constant()?);
        }
        self.expect_punct(Punct::RBracket)?;
        self.expect_punct(Punct::RParen)?;

        let count = match count {
            Some((count, span)) if usize::from(count) != values.len() => {
                return Err(ScummError::compile(
                    "setVarRange: the given number of values does not match the actual number of values.",
                )
                .with_span(span))
            }
            Some((count, _)) => count,
            None => u8::try_from(values.len()).map_err(|_| {
                ScummError::compile("setVarRange: too many values.").with_span(list_span)
            })?,
        };

        let wide = values.iter().any(|v| !(-128..=255).contains(v));
        let mut out = vec![if wide { opcode | 0x80 } else { opcode }];
        out.extend(start.encode()?);
        out.push(count);
        for value in values {
            if wide {
                out.extend_from_slice(&to_word(value).map_err(|err| err.with_span(list_span))?);
            } else {
                out.push(to_byte(value)?);
            }
        }
        Ok(out)
    }

    /// `startScript(script, [args] [, F] [, R])`. The flags of a descumm
    /// opcode annotation on the same line are kept.
    fn encode_start_script(&mut self, opcode: u8) -> Result<Vec<u8>, ScummError> {
        let mut op = opcode;
        let mut out = Vec::new();
        self.expect_punct(Punct::LParen)?;
        self.encode_param(Param::P8, 0x80, &mut op, &mut out)?;
        self.expect_punct(Punct::Comma)?;
        let list_span = self.current_span();
        let items = self.parse_list()?;
        out.extend(encode_list(&items).map_err(|err| err.with_span(list_span))?);
        while self.eat_punct(Punct::Comma) {
            let (flag, span) = self.read_label()?;
            match flag.as_str() {
                "F" => op |= FREEZE_RESISTANT_FLAG,
                "R" => op |= RECURSIVE_FLAG,
                _ => {
                    return Err(ScummError::syntax(format!(
                        "Unknown startScript flag: {flag}"
                    ))
                    .with_span(span))
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        if let Some(annotated) = self.annotation {
            op |= annotated & (RECURSIVE_FLAG | FREEZE_RESISTANT_FLAG);
        }
        let mut bytes = vec![op];
        bytes.extend(out);
        Ok(bytes)
    }

    fn encode_room_op(&mut self, parent: u8, instr: &Instruction) -> Result<Vec<u8>, ScummError> {
        let name = instr.name;
        let mut sub = instr.opcode;
        let mut op = parent;
        self.expect_punct(Punct::LParen)?;

        let out = if self.dialect.is_v5() {
            let mut args = Vec::new();
            match name {
                "SetPalColor" => {
                    let rgb = self.parse_args(&[Param::P16, Param::P16, Param::P16], &mut sub)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux = PAL_COLOR_AUX;
                    let index = self.parse_args(&[Param::P8], &mut aux)?;
                    args.extend(rgb);
                    args.push(aux);
                    args.extend(index);
                }
                "SetRoomScale" | "Unused" => {
                    let first = self.parse_args(&[Param::P8, Param::P8], &mut sub)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux1 = ROOM_AUX;
                    let second = self.parse_args(&[Param::P8, Param::P8], &mut aux1)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux2 = ROOM_AUX;
                    let slot = self.parse_args(&[Param::P8], &mut aux2)?;
                    self.expect_punct(Punct::Comma)?;
                    args.extend(first);
                    args.push(aux1);
                    args.extend(second);
                    args.push(aux2);
                    args.extend(slot);
                }
                "setRGBRoomIntensity" | "setRoomShadow" => {
                    let rgb = self.parse_args(&[Param::P16, Param::P16, Param::P16], &mut sub)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux = RGB_INTENSITY_AUX;
                    let range = self.parse_args(&[Param::P8, Param::P8], &mut aux)?;
                    args.extend(rgb);
                    args.push(aux);
                    args.extend(range);
                }
                "palManipulate" => {
                    let slot = self.parse_args(&[Param::P8], &mut sub)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux1 = ROOM_AUX;
                    let range = self.parse_args(&[Param::P8, Param::P8], &mut aux1)?;
                    self.expect_punct(Punct::Comma)?;
                    let mut aux2 = ROOM_AUX;
                    let time = self.parse_args(&[Param::P8], &mut aux2)?;
                    args.extend(slot);
                    args.push(aux1);
                    args.extend(range);
                    args.push(aux2);
                    args.extend(time);
                }
                _ => {
                    let params: &[Param] = match name {
                        "RoomScroll" | "SetScreen" => &[Param::P16, Param::P16],
                        "RoomIntensity" => &[Param::P8, Param::P8, Param::P8],
                        "saveLoad" | "saveLoad?" | "colorCycleDelay" => &[Param::P8, Param::P8],
                        "screenEffect" | "screenEffect?" => &[Param::P16],
                        "saveString" | "loadString" => &[Param::P8, Param::Text],
                        _ => &[],
                    };
                    args = self.parse_args(params, &mut sub)?;
                }
            }
            let mut out = vec![op, sub];
            out.extend(args);
            out
        } else {
            let shake = matches!(name, "ShakeOn" | "ShakeOff");
            let args = if shake {
                Vec::new()
            } else {
                self.parse_args(&[Param::P16, Param::P16], &mut op)?
            };
            let mut out = vec![op];
            if self.dialect.is_v3_family() {
                // Arguments come before the sub-opcode, padded for Shake.
                if shake {
                    out.extend([0x00; 4]);
                } else {
                    out.extend(args);
                }
                out.push(sub);
            } else {
                out.push(sub);
                out.extend(args);
            }
            out
        };

        self.expect_punct(Punct::RParen)?;
        if self.legacy {
            self.eat_punct(Punct::RParen);
        }
        Ok(out)
    }
}
