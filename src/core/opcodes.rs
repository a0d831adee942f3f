// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Mnemonic to opcode tables.
//!
//! The base table is the dialect 5 instruction set. Older dialects apply
//! override layers on top of it; an override either reassigns a mnemonic or
//! removes it, and a removed mnemonic reports as unsupported.
//!
//! Sub-opcodes live in the same table. Names that would collide between
//! groups carry a prefix (`AO_`, `VO_`, `PO_`, `SLV_`, `Resource.`).

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::core::dialect::Dialect;
use crate::core::error::{ScummError, ScummErrorKind};

pub const OP_JUMP: u8 = 0x18;
pub const OP_EXPRESSION: u8 = 0xAC;
pub const STRING_FUNCTION_START: u8 = 0xFF;
pub const LIST_END: u8 = 0xFF;

const BASE_TABLE: &[(&str, u8)] = &[
    ("actorFollowCamera", 0x52),
    ("actorFromPos", 0x15),
    ("ActorOps", 0x13),
    ("AO_Unknown", 0x00),
    ("AO_Costume", 0x01),
    ("AO_WalkSpeed", 0x02),
    ("AO_Sound", 0x03),
    ("AO_WalkAnimNr", 0x04),
    ("AO_TalkAnimNr", 0x05),
    ("AO_StandAnimNr", 0x06),
    ("AO_Nothing", 0x07),
    ("AO_Init", 0x08),
    ("AO_Elevation", 0x09),
    ("AO_DefaultAnims", 0x0A),
    ("AO_Palette", 0x0B),
    ("AO_TalkColor", 0x0C),
    ("AO_Name", 0x0D),
    ("AO_InitAnimNr", 0x0E),
    ("AO_Width", 0x10),
    ("AO_Scale", 0x11),
    ("AO_NeverZClip", 0x12),
    ("AO_SetZClip", 0x13),
    ("AO_IgnoreBoxes", 0x14),
    ("AO_FollowBoxes", 0x15),
    ("AO_AnimSpeed", 0x16),
    ("AO_ShadowMode", 0x17),
    ("setClass", 0x5D),
    ("animateCostume", 0x11),
    ("breakHere", 0x80),
    ("chainScript", 0x42),
    ("cursorCommand", 0x2C),
    ("CursorShow", 0x01),
    ("CursorHide", 0x02),
    ("UserputOn", 0x03),
    ("UserputOff", 0x04),
    ("CursorSoftOn", 0x05),
    ("CursorSoftOff", 0x06),
    ("UserputSoftOn", 0x07),
    ("UserputSoftOff", 0x08),
    ("SetCursorImg", 0x0A),
    ("setCursorHotspot", 0x0B),
    ("InitCursor", 0x0C),
    ("InitCharset", 0x0D),
    ("CursorCommand", 0x0E),
    ("classOfIs", 0x1D),
    ("cutscene", 0x40),
    ("debug", 0x6B),
    ("debug?", 0x6B),
    ("delay", 0x2E),
    ("delayVariable", 0x2B),
    ("doSentence", 0x19),
    ("drawBox", 0x3F),
    ("drawObject", 0x05),
    ("setXY", 0x01),
    ("setImage", 0x02),
    ("drawObject()", 0xFF),
    ("dummy(A7)", 0xA7),
    ("endCutscene", 0xC0),
    ("faceActor", 0x09),
    ("findInventory", 0x3D),
    ("findObject", 0x35),
    ("freezeScripts", 0x60),
    ("getActorCostume", 0x71),
    ("getActorElevation", 0x06),
    ("getActorFacing", 0x63),
    ("getActorMoving", 0x56),
    ("getActorRoom", 0x03),
    ("getActorScale", 0x3B),
    ("getActorWalkBox", 0x7B),
    ("getActorWidth", 0x6C),
    ("getActorX", 0x43),
    ("getActorY", 0x23),
    ("getAnimCounter", 0x22),
    ("getClosestObjActor", 0x66),
    ("getDist", 0x34),
    ("getInventoryCount", 0x31),
    ("getObjectOwner", 0x10),
    ("getObjectState", 0x0F),
    ("getRandomNr", 0x16),
    ("getStringWidth", 0x67),
    ("getVerbEntryPoint", 0x0B),
    ("isActorInBox", 0x1F),
    ("isScriptRunning", 0x68),
    ("isSoundRunning", 0x7C),
    ("lights", 0x70),
    ("loadRoom", 0x72),
    ("loadRoomWithEgo", 0x24),
    ("matrixOp", 0x30),
    ("setBoxFlags", 0x01),
    ("setBoxScale", 0x02),
    ("SetBoxSlot", 0x03),
    ("createBoxMatrix", 0x04),
    ("override", 0x58),
    ("beginOverride", 0x01),
    ("endOverride", 0x00),
    ("panCameraTo", 0x12),
    ("pickupObject", 0x25),
    ("print", 0x14),
    ("PO_Pos", 0x00),
    ("PO_Color", 0x01),
    ("PO_Clipped", 0x02),
    ("PO_RestoreBG", 0x03),
    ("PO_Center", 0x04),
    ("PO_Left", 0x06),
    ("PO_Overhead", 0x07),
    ("PO_PlayCDTrack", 0x08),
    ("PO_Text", 0x0F),
    ("printEgo", 0xD8),
    ("PseudoRoom", 0xCC),
    ("putActor", 0x01),
    ("putActorAtObject", 0x0E),
    ("putActorInRoom", 0x2D),
    ("Resource", 0x0C),
    ("Resource.loadScript", 0x01),
    ("Resource.loadSound", 0x02),
    ("Resource.loadCostume", 0x03),
    ("Resource.loadRoom", 0x04),
    ("Resource.nukeScript", 0x05),
    ("Resource.nukeSound", 0x06),
    ("Resource.nukeCostume", 0x07),
    ("Resource.nukeRoom", 0x08),
    ("Resource.lockScript", 0x09),
    ("Resource.lockSound", 0x0A),
    ("Resource.lockCostume", 0x0B),
    ("Resource.lockRoom", 0x0C),
    ("Resource.unlockScript", 0x0D),
    ("Resource.unlockSound", 0x0E),
    ("Resource.unlockCostume", 0x0F),
    ("Resource.unlockRoom", 0x10),
    ("Resource.clearHeap", 0x11),
    ("Resource.loadCharset", 0x12),
    ("Resource.nukeCharset", 0x13),
    ("Resource.loadFlObject", 0x14),
    ("roomOps", 0x33),
    ("RoomScroll", 0x01),
    ("SetScreen", 0x03),
    ("SetPalColor", 0x04),
    ("ShakeOn", 0x05),
    ("ShakeOff", 0x06),
    ("Unused", 0x07),
    ("SetRoomScale", 0x07),
    ("RoomIntensity", 0x08),
    ("saveLoad", 0x09),
    ("saveLoad?", 0x09),
    ("screenEffect", 0x0A),
    ("screenEffect?", 0x0A),
    ("setRGBRoomIntensity", 0x0B),
    ("setRoomShadow", 0x0C),
    ("saveString", 0x0D),
    ("loadString", 0x0E),
    ("palManipulate", 0x0F),
    ("colorCycleDelay", 0x10),
    ("saveRestoreVerbs", 0xAB),
    ("saveVerbs", 0x01),
    ("restoreVerbs", 0x02),
    ("deleteVerbs", 0x03),
    ("setCameraAt", 0x32),
    ("setObjectName", 0x54),
    ("setOwnerOf", 0x29),
    ("setState", 0x07),
    ("setVarRange", 0x26),
    ("soundKludge", 0x4C),
    ("startMusic", 0x02),
    ("startObject", 0x37),
    ("startSound", 0x1C),
    ("startScript", 0x0A),
    ("stopMusic", 0x20),
    ("stopObjectCode", 0xA0),
    ("stopObjectCode-alt", 0x00),
    ("stopObjectScript", 0x6E),
    ("stopScript", 0x62),
    ("stopSound", 0x3C),
    ("stringOps", 0x27),
    ("PutCodeInString", 0x01),
    ("CopyString", 0x02),
    ("SetStringChar", 0x03),
    ("GetStringChar", 0x04),
    ("CreateString", 0x05),
    ("systemOps", 0x98),
    ("VerbOps", 0x7A),
    ("VO_Image", 0x01),
    ("VO_Text", 0x02),
    ("VO_Color", 0x03),
    ("VO_HiColor", 0x04),
    ("VO_SetXY", 0x05),
    ("VO_On", 0x06),
    ("VO_Off", 0x07),
    ("VO_Delete", 0x08),
    ("VO_New", 0x09),
    ("VO_DimColor", 0x10),
    ("VO_Dim", 0x11),
    ("VO_Key", 0x12),
    ("VO_Center", 0x13),
    ("VO_SetToString", 0x14),
    ("VO_SetToObject", 0x16),
    ("VO_BackColor", 0x17),
    ("wait", 0xAE),
    ("WaitForActor", 0x01),
    ("WaitForMessage", 0x02),
    ("WaitForCamera", 0x03),
    ("WaitForSentence", 0x04),
    ("walkActorTo", 0x1E),
    ("walkActorToActor", 0x0D),
    ("walkActorToObject", 0x36),
];

/// Differences shared by every pre-5 dialect.
const V4_LAYER: &[(&str, Option<u8>)] = &[
    ("AO_Unknown", Some(0x00)),
    ("AO_Costume", Some(0x01)),
    ("AO_WalkSpeed", Some(0x04)),
    ("AO_Sound", Some(0x05)),
    ("AO_WalkAnimNr", Some(0x06)),
    ("AO_TalkAnimNr", Some(0x07)),
    ("AO_StandAnimNr", Some(0x08)),
    ("AO_Nothing", Some(0x09)),
    ("AO_Init", Some(0x0A)),
    ("AO_Elevation", Some(0x0B)),
    ("AO_DefaultAnims", Some(0x0C)),
    ("AO_Palette", Some(0x0D)),
    ("AO_TalkColor", Some(0x0E)),
    ("AO_Name", Some(0x0F)),
    ("AO_InitAnimNr", Some(0x10)),
    ("AO_Width", Some(0x12)),
    ("AO_Scale", Some(0x13)),
    ("AO_IgnoreBoxes", Some(0x14)),
    ("AO_NeverZClip", None),
    ("AO_SetZClip", None),
    ("AO_FollowBoxes", None),
    ("AO_AnimSpeed", None),
    ("AO_ShadowMode", None),
    ("pickupObject", Some(0x50)),
    ("getAnimCounter", None),
    ("getObjectState", None),
    ("ifState", Some(0x0F)),
    ("ifNotState", Some(0x2F)),
    ("saveLoadGame", Some(0x22)),
    ("dummy(A7)", None),
    ("saveLoadVars", Some(0xA7)),
    ("SLV_Load", Some(0x00)),
    ("SLV_Save", Some(0x01)),
    ("SLV_VarRange", Some(0x01)),
    ("SLV_StringRange", Some(0x02)),
    ("SLV_Open", Some(0x03)),
    ("SLV_Append", Some(0x04)),
    ("SLV_Close", Some(0x1F)),
    ("oldRoomEffect", Some(0x5C)),
    ("oldRoomEffect-fadein", Some(0x01)),
    ("oldRoomEffect-set", Some(0x03)),
    ("RoomColor", Some(0x02)),
    ("setXY", None),
    ("setImage", None),
    ("drawObject()", None),
    ("Unused", None),
    ("SetRoomScale", None),
    ("RoomIntensity", None),
    ("saveLoad", None),
    ("saveLoad?", None),
    ("screenEffect", None),
    ("screenEffect?", None),
    ("setRGBRoomIntensity", None),
    ("setRoomShadow", None),
    ("saveString", None),
    ("loadString", None),
    ("palManipulate", None),
    ("colorCycleDelay", None),
];

const V3_LAYER: &[(&str, Option<u8>)] = &[
    ("LoadCharset", Some(0x0E)),
    ("CursorCommand", None),
    ("matrixOp", None),
    ("setBoxFlags", Some(0x30)),
    ("setBoxScale", None),
    ("SetBoxSlot", None),
    ("createBoxMatrix", None),
    ("PO_Height", Some(0x06)),
    ("PO_Left", None),
    ("WaitForSentence", Some(0x4C)),
];

const V3OLD_LAYER: &[(&str, Option<u8>)] = &[
    ("WaitForActor", Some(0x3B)),
    ("WaitForMessage", Some(0xAE)),
    ("WaitForCamera", None),
    ("getActorScale", None),
];

/// Opcode assignments for one dialect.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    dialect: Dialect,
    entries: HashMap<&'static str, u8>,
}

impl OpcodeTable {
    fn build(dialect: Dialect) -> Self {
        let mut entries: HashMap<&'static str, u8> = BASE_TABLE.iter().copied().collect();
        let mut layers: Vec<&[(&'static str, Option<u8>)]> = Vec::new();
        if !dialect.is_v5() {
            layers.push(V4_LAYER);
        }
        if dialect.is_v3_family() {
            layers.push(V3_LAYER);
        }
        if dialect == Dialect::V3Old {
            layers.push(V3OLD_LAYER);
        }
        for layer in layers {
            for &(name, value) in layer {
                match value {
                    Some(op) => {
                        entries.insert(name, op);
                    }
                    None => {
                        entries.remove(name);
                    }
                }
            }
        }
        Self { dialect, entries }
    }

    /// Shared, lazily built table for `dialect`.
    pub fn for_dialect(dialect: Dialect) -> &'static OpcodeTable {
        static TABLES: OnceLock<[OpcodeTable; 4]> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Dialect::ALL.map(OpcodeTable::build));
        match dialect {
            Dialect::V3Old => &tables[0],
            Dialect::V3 => &tables[1],
            Dialect::V4 => &tables[2],
            Dialect::V5 => &tables[3],
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up `name`, reporting a miss as unsupported in this dialect.
    pub fn lookup(&self, name: &str) -> Result<u8, ScummError> {
        self.get(name).ok_or_else(|| unsupported(name, self.dialect))
    }
}

pub fn unsupported(name: &str, dialect: Dialect) -> ScummError {
    ScummError::new(
        ScummErrorKind::Unsupported,
        &format!("Instruction is not supported by {dialect}"),
        Some(name),
    )
}

/// Opcode for an inline arithmetic operator.
pub fn inline_operation(op: &str) -> Option<u8> {
    let code = match op {
        "=" => 0x1A,
        "+=" => 0x5A,
        "-=" => 0x3A,
        "*=" => 0x1B,
        "/=" => 0x5B,
        "&=" => 0x17,
        "|=" => 0x57,
        "++" => 0x46,
        "--" => 0xC6,
        _ => return None,
    };
    Some(code)
}

/// Comparison opcodes. These are the inverse tests because the jump is
/// taken when the condition fails.
pub fn comparison(op: &str) -> Option<u8> {
    let code = match op {
        "==" => 0x48,
        "<" => 0x78,
        "<=" => 0x04,
        ">" => 0x44,
        ">=" => 0x38,
        "!=" => 0x08,
        _ => return None,
    };
    Some(code)
}

pub const OP_EQUAL_ZERO: u8 = 0x28;
pub const OP_NOT_EQUAL_ZERO: u8 = 0xA8;

pub fn string_function(name: &str) -> Option<u8> {
    let code = match name {
        "newline" => 0x01,
        "keepText" => 0x02,
        "wait" => 0x03,
        "getInt" => 0x04,
        "getVerb" => 0x05,
        "getName" => 0x06,
        "getString" => 0x07,
        "startAnim" => 0x09,
        "sound" => 0x0A,
        "setColor" => 0x0C,
        "setFont" => 0x0E,
        _ => return None,
    };
    Some(code)
}

pub fn expression_operation(op: &str) -> Option<u8> {
    let code = match op {
        "+" => 0x02,
        "-" => 0x03,
        "*" => 0x04,
        "/" => 0x05,
        _ => return None,
    };
    Some(code)
}

pub const EXPR_VALUE: u8 = 0x01;
pub const EXPR_SUB_OPCODE: u8 = 0x06;
pub const EXPR_END: u8 = 0xFF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_ops_numbering_differs_between_families() {
        let v4 = OpcodeTable::for_dialect(Dialect::V4);
        let v5 = OpcodeTable::for_dialect(Dialect::V5);
        assert_eq!(v4.get("AO_Scale"), Some(0x13));
        assert_eq!(v5.get("AO_Scale"), Some(0x11));
        assert_eq!(v4.get("AO_WalkSpeed"), Some(0x04));
        assert_eq!(v5.get("AO_WalkSpeed"), Some(0x02));
        assert!(v4.get("AO_ShadowMode").is_none());
    }

    #[test]
    fn overrides_replace_and_remove_entries() {
        let v3 = OpcodeTable::for_dialect(Dialect::V3);
        let v3old = OpcodeTable::for_dialect(Dialect::V3Old);
        assert_eq!(v3.get("setBoxFlags"), Some(0x30));
        assert_eq!(v3.get("WaitForSentence"), Some(0x4C));
        assert!(!v3.contains("matrixOp"));
        assert_eq!(v3old.get("WaitForActor"), Some(0x3B));
        assert!(!v3old.contains("getActorScale"));
        assert_eq!(v3.get("getActorScale"), Some(0x3B));
        assert_eq!(OpcodeTable::for_dialect(Dialect::V5).get("pickupObject"), Some(0x25));
        assert_eq!(OpcodeTable::for_dialect(Dialect::V4).get("pickupObject"), Some(0x50));
    }

    #[test]
    fn missing_mnemonic_is_unsupported() {
        let err = OpcodeTable::for_dialect(Dialect::V5)
            .lookup("saveLoadVars")
            .unwrap_err();
        assert_eq!(err.kind(), ScummErrorKind::Unsupported);
        assert_eq!(
            err.message(),
            "Instruction is not supported by SCUMM V5: saveLoadVars"
        );
    }

    #[test]
    fn operator_tables() {
        assert_eq!(inline_operation("+="), Some(0x5A));
        assert_eq!(comparison("<="), Some(0x04));
        assert_eq!(string_function("sound"), Some(0x0A));
        assert_eq!(expression_operation("/"), Some(0x05));
        assert_eq!(inline_operation("%="), None);
    }
}
