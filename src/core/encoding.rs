// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand values and their byte encodings.

use crate::core::error::ScummError;
use crate::core::opcodes::LIST_END;

const INDIRECT_FLAG: u16 = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Local,
    Bit,
    Global,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Local => "Local",
            VarKind::Bit => "Bit",
            VarKind::Global => "Var",
        }
    }

    pub fn from_keyword(word: &str) -> Option<VarKind> {
        match word {
            "Local" => Some(VarKind::Local),
            "Bit" => Some(VarKind::Bit),
            "Var" => Some(VarKind::Global),
            _ => None,
        }
    }

    /// Address word for index `n`; out-of-range bits are masked off.
    pub fn address(self, n: u32) -> u16 {
        match self {
            VarKind::Local => 0x4000 | (n & 0xFF) as u16,
            VarKind::Bit => 0x8000 | (n & 0x7FFF) as u16,
            VarKind::Global => (n & 0x1FFF) as u16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarIndex {
    Direct(u32),
    Indirect { base: u32, offset: Box<Operand> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub kind: VarKind,
    pub index: VarIndex,
}

impl VarRef {
    pub fn direct(kind: VarKind, n: u32) -> Self {
        Self {
            kind,
            index: VarIndex::Direct(n),
        }
    }

    pub fn indirect(kind: VarKind, base: u32, offset: Operand) -> Self {
        Self {
            kind,
            index: VarIndex::Indirect {
                base,
                offset: Box::new(offset),
            },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ScummError> {
        match &self.index {
            VarIndex::Direct(n) => Ok(self.kind.address(*n).to_le_bytes().to_vec()),
            VarIndex::Indirect { base, offset } => {
                let mut out = (self.kind.address(*base) | INDIRECT_FLAG)
                    .to_le_bytes()
                    .to_vec();
                match offset.as_ref() {
                    Operand::Literal(value) => out.extend_from_slice(&to_word(*value)?),
                    Operand::Var(var) => match &var.index {
                        VarIndex::Direct(n) => out.extend_from_slice(
                            &(var.kind.address(*n) | INDIRECT_FLAG).to_le_bytes(),
                        ),
                        VarIndex::Indirect { .. } => out.extend(var.encode()?),
                    },
                }
                Ok(out)
            }
        }
    }
}

/// A literal constant or a variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(i64),
    Var(VarRef),
}

pub fn to_byte(value: i64) -> Result<u8, ScummError> {
    if !(-128..=255).contains(&value) {
        return Err(ScummError::compile(
            "Byte value should be between -128 and 255.",
        ));
    }
    Ok((value & 0xFF) as u8)
}

pub fn to_word(value: i64) -> Result<[u8; 2], ScummError> {
    if !(-32768..=65535).contains(&value) {
        return Err(ScummError::compile(
            "Word value should be between -32768 and 65535.",
        ));
    }
    Ok(((value & 0xFFFF) as u16).to_le_bytes())
}

/// Append a byte or word parameter. A variable is written as its address
/// and sets `bit` in `op`; a literal leaves `op` untouched.
pub fn push_param(
    out: &mut Vec<u8>,
    op: &mut u8,
    bit: u8,
    arg: &Operand,
    wide: bool,
) -> Result<(), ScummError> {
    match arg {
        Operand::Var(var) => {
            *op |= bit;
            out.extend(var.encode()?);
        }
        Operand::Literal(value) if wide => out.extend_from_slice(&to_word(*value)?),
        Operand::Literal(value) => out.push(to_byte(*value)?),
    }
    Ok(())
}

/// Argument list: each item tagged `0x01` (word) or `0x81` (variable), closed by `0xFF`.
pub fn encode_list(items: &[Operand]) -> Result<Vec<u8>, ScummError> {
    let mut out = Vec::new();
    for item in items {
        let mut tag = 0x01;
        let mut body = Vec::new();
        push_param(&mut body, &mut tag, 0x80, item, true)?;
        out.push(tag);
        out.extend(body);
    }
    out.push(LIST_END);
    Ok(out)
}

/// Presence bit for the `n`th variable-capable parameter.
pub fn param_bit(n: usize) -> u8 {
    match n {
        0 => 0x80,
        1 => 0x40,
        2 => 0x20,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn direct_variables_encode_little_endian() {
        assert_eq!(VarRef::direct(VarKind::Local, 0).encode().unwrap(), vec![0x00, 0x40]);
        assert_eq!(VarRef::direct(VarKind::Bit, 0x123).encode().unwrap(), vec![0x23, 0x81]);
        assert_eq!(VarRef::direct(VarKind::Global, 228).encode().unwrap(), vec![0xE4, 0x00]);
    }

    #[test]
    fn indirect_variables_encode_offset() {
        let literal = VarRef::indirect(VarKind::Global, 100, Operand::Literal(2));
        assert_eq!(literal.encode().unwrap(), vec![0x64, 0x20, 0x02, 0x00]);

        let var = VarRef::indirect(
            VarKind::Global,
            100,
            Operand::Var(VarRef::direct(VarKind::Local, 3)),
        );
        assert_eq!(var.encode().unwrap(), vec![0x64, 0x20, 0x03, 0x60]);

        let bit = VarRef::indirect(VarKind::Bit, 5, Operand::Literal(1));
        assert_eq!(bit.encode().unwrap(), vec![0x05, 0xA0, 0x01, 0x00]);
    }

    #[test]
    fn literal_ranges_are_checked() {
        assert_eq!(to_byte(-1).unwrap(), 0xFF);
        assert_eq!(to_byte(255).unwrap(), 0xFF);
        assert_eq!(
            to_byte(256).unwrap_err().message(),
            "Byte value should be between -128 and 255."
        );
        assert_eq!(to_word(-2).unwrap(), [0xFE, 0xFF]);
        assert!(to_word(65536).is_err());
        assert!(to_word(-32769).is_err());
    }

    #[test]
    fn list_items_are_tagged() {
        let items = vec![
            Operand::Literal(5),
            Operand::Var(VarRef::direct(VarKind::Global, 1)),
        ];
        assert_eq!(
            encode_list(&items).unwrap(),
            vec![0x01, 0x05, 0x00, 0x81, 0x01, 0x00, 0xFF]
        );
        assert_eq!(encode_list(&[]).unwrap(), vec![0xFF]);
    }

    proptest! {
        #[test]
        fn variable_addresses_keep_kind_tags(n in any::<u32>()) {
            let local = VarKind::Local.address(n);
            let bit = VarKind::Bit.address(n);
            let global = VarKind::Global.address(n);
            prop_assert_eq!(local & 0xFF00, 0x4000);
            prop_assert_eq!(bit & 0x8000, 0x8000);
            prop_assert_eq!(global & 0xE000, 0);
        }

        #[test]
        fn push_param_sets_bit_only_for_variables(value in -128i64..=255, n in 0u32..0x1FFF) {
            let mut op = 0x01;
            let mut out = Vec::new();
            push_param(&mut out, &mut op, 0x40, &Operand::Literal(value), false).unwrap();
            prop_assert_eq!(op, 0x01);
            prop_assert_eq!(out.len(), 1);

            let var = Operand::Var(VarRef::direct(VarKind::Global, n));
            push_param(&mut out, &mut op, 0x40, &var, false).unwrap();
            prop_assert_eq!(op, 0x41);
            prop_assert_eq!(out.len(), 3);
        }

        #[test]
        fn words_round_trip_through_two_complement(value in -32768i64..=65535) {
            let bytes = to_word(value).unwrap();
            let decoded = u16::from_le_bytes(bytes) as i64;
            prop_assert!(decoded == value || decoded - 0x10000 == value);
        }
    }
}
