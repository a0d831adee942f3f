// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-dialect instruction catalogue.
//!
//! Every instruction the compiler accepts is described here once, as an
//! argument shape or a dedicated encoder. The catalogue for a dialect is
//! assembled on first use and pairs each shape with the opcode from that
//! dialect's table. Names whose opcode the table lacks are recorded as
//! unsupported so the driver can say so instead of reporting a syntax error.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::core::dialect::Dialect;
use crate::core::opcodes::OpcodeTable;

/// Argument kinds accepted by table-driven instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Param {
    /// Variable or byte constant; presence bit when a variable.
    P8,
    /// Variable or word constant; presence bit when a variable.
    P16,
    Byte,
    Word,
    /// Variable only, no presence bit.
    Var,
    /// `[a, b, ...]` argument list.
    List,
    /// Null-terminated string.
    Text,
    /// Null-terminated string that may be left out.
    OptText,
}

impl Param {
    pub(crate) fn takes_bit(self) -> bool {
        matches!(self, Param::P8 | Param::P16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Shape {
    /// Instruction stores a result: `Var[n] = name(...)`.
    pub target: bool,
    pub params: &'static [Param],
}

/// Sub-operation lists written as `[Sub(...), ...]` inside the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SubList {
    Actor,
    Verb,
    Print,
}

impl SubList {
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            SubList::Actor => "AO_",
            SubList::Verb => "VO_",
            SubList::Print => "PO_",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SubList::Actor => "ActorOps",
            SubList::Verb => "VerbOps",
            SubList::Print => "print",
        }
    }

    fn names(self) -> &'static [&'static str] {
        match self {
            SubList::Actor => &[
                "Unknown",
                "Costume",
                "WalkSpeed",
                "Sound",
                "WalkAnimNr",
                "TalkAnimNr",
                "StandAnimNr",
                "Nothing",
                "Init",
                "Elevation",
                "DefaultAnims",
                "Palette",
                "TalkColor",
                "Name",
                "InitAnimNr",
                "Width",
                "Scale",
                "NeverZClip",
                "SetZClip",
                "IgnoreBoxes",
                "FollowBoxes",
                "AnimSpeed",
                "ShadowMode",
            ],
            SubList::Verb => &[
                "Image",
                "Text",
                "Color",
                "HiColor",
                "SetXY",
                "On",
                "Off",
                "Delete",
                "New",
                "DimColor",
                "Dim",
                "Key",
                "Center",
                "SetToString",
                "SetToObject",
                "BackColor",
            ],
            SubList::Print => &[
                "Pos",
                "Color",
                "Clipped",
                "RestoreBG",
                "Center",
                "Left",
                "Height",
                "Overhead",
                "PlayCDTrack",
                "Text",
            ],
        }
    }
}

/// Instructions with an encoding of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Special {
    Delay,
    DoSentence,
    DrawBox,
    DrawObject,
    OldRoomEffect,
    Override,
    PseudoRoom,
    RoomOp,
    SaveLoadVars,
    SetVarRange,
    StartScript,
    StopObjectCode,
    SystemOps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// Opcode, optional target, arguments.
    Simple(Shape),
    /// Parent opcode, then the sub-opcode carrying the presence bits.
    Nested { parent: &'static str, shape: Shape },
    /// Optional leading byte parameter followed by a sub-operation list.
    SubOps { list: SubList, leading: bool },
    Special(Special),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Instruction {
    pub name: &'static str,
    pub opcode: u8,
    pub parent_opcode: Option<u8>,
    pub form: Form,
}

impl Instruction {
    pub(crate) fn has_target(&self) -> bool {
        match self.form {
            Form::Simple(shape) | Form::Nested { shape, .. } => shape.target,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SubOp {
    pub code: u8,
    pub params: &'static [Param],
}

pub(crate) enum Lookup<'a, T> {
    Found(&'a T),
    Unsupported,
    Unknown,
}

const INSTRUCTION_NAMES: &[&str] = &[
    "actorFollowCamera",
    "actorFromPos",
    "ActorOps",
    "setClass",
    "animateCostume",
    "breakHere",
    "chainScript",
    "CursorShow",
    "CursorHide",
    "UserputOn",
    "UserputOff",
    "CursorSoftOn",
    "CursorSoftOff",
    "UserputSoftOn",
    "UserputSoftOff",
    "SetCursorImg",
    "setCursorHotspot",
    "InitCursor",
    "InitCharset",
    "CursorCommand",
    "LoadCharset",
    "cutscene",
    "debug",
    "debug?",
    "delay",
    "delayVariable",
    "doSentence",
    "drawBox",
    "drawObject",
    "dummy(A7)",
    "endCutscene",
    "faceActor",
    "findInventory",
    "findObject",
    "freezeScripts",
    "getActorCostume",
    "getActorElevation",
    "getActorFacing",
    "getActorMoving",
    "getActorRoom",
    "getActorScale",
    "getActorWalkBox",
    "getActorWidth",
    "getActorX",
    "getActorY",
    "getAnimCounter",
    "getClosestObjActor",
    "getDist",
    "getInventoryCount",
    "getObjectOwner",
    "getObjectState",
    "getRandomNr",
    "getStringWidth",
    "getVerbEntryPoint",
    "isScriptRunning",
    "isSoundRunning",
    "lights",
    "loadRoom",
    "loadRoomWithEgo",
    "setBoxFlags",
    "setBoxScale",
    "SetBoxSlot",
    "createBoxMatrix",
    "oldRoomEffect-set",
    "oldRoomEffect-fadein",
    "beginOverride",
    "endOverride",
    "panCameraTo",
    "pickupObject",
    "print",
    "printEgo",
    "PseudoRoom",
    "putActor",
    "putActorAtObject",
    "putActorInRoom",
    "Resource.loadScript",
    "Resource.loadSound",
    "Resource.loadCostume",
    "Resource.loadRoom",
    "Resource.nukeScript",
    "Resource.nukeSound",
    "Resource.nukeCostume",
    "Resource.nukeRoom",
    "Resource.lockScript",
    "Resource.lockSound",
    "Resource.lockCostume",
    "Resource.lockRoom",
    "Resource.unlockScript",
    "Resource.unlockSound",
    "Resource.unlockCostume",
    "Resource.unlockRoom",
    "Resource.clearHeap",
    "Resource.loadCharset",
    "Resource.nukeCharset",
    "Resource.loadFlObject",
    "RoomScroll",
    "RoomColor",
    "SetScreen",
    "SetPalColor",
    "ShakeOn",
    "ShakeOff",
    "Unused",
    "SetRoomScale",
    "RoomIntensity",
    "saveLoad",
    "saveLoad?",
    "screenEffect",
    "screenEffect?",
    "setRGBRoomIntensity",
    "setRoomShadow",
    "saveString",
    "loadString",
    "palManipulate",
    "colorCycleDelay",
    "saveLoadGame",
    "saveLoadVars",
    "saveVerbs",
    "restoreVerbs",
    "deleteVerbs",
    "setCameraAt",
    "setObjectName",
    "setOwnerOf",
    "setState",
    "setVarRange",
    "soundKludge",
    "startMusic",
    "startObject",
    "startSound",
    "startScript",
    "stopMusic",
    "stopObjectCode",
    "stopObjectScript",
    "stopScript",
    "stopSound",
    "PutCodeInString",
    "CopyString",
    "SetStringChar",
    "GetStringChar",
    "CreateString",
    "systemOps",
    "VerbOps",
    "WaitForActor",
    "WaitForMessage",
    "WaitForCamera",
    "WaitForSentence",
    "walkActorTo",
    "walkActorToActor",
    "walkActorToObject",
];

const fn simple(params: &'static [Param]) -> Form {
    Form::Simple(Shape {
        target: false,
        params,
    })
}

const fn getter(params: &'static [Param]) -> Form {
    Form::Simple(Shape {
        target: true,
        params,
    })
}

const fn nested(parent: &'static str, params: &'static [Param]) -> Form {
    Form::Nested {
        parent,
        shape: Shape {
            target: false,
            params,
        },
    }
}

/// Shape of `name` in `dialect`, or `None` when the compiler has never heard of it.
fn form_for(dialect: Dialect, name: &str) -> Option<Form> {
    use Param::*;

    let v3 = dialect.is_v3_family();
    let v5 = dialect.is_v5();
    let old = dialect == Dialect::V3Old;

    let form = match name {
        "actorFollowCamera" => simple(&[P8]),
        "actorFromPos" => getter(&[P16, P16]),
        "ActorOps" => Form::SubOps {
            list: SubList::Actor,
            leading: true,
        },
        "setClass" => simple(&[P16, List]),
        "animateCostume" => simple(&[P8, P8]),
        "breakHere" | "endCutscene" | "stopMusic" | "dummy(A7)" => simple(&[]),
        "chainScript" => simple(&[P8, List]),
        "CursorShow" | "CursorHide" | "UserputOn" | "UserputOff" | "CursorSoftOn"
        | "CursorSoftOff" | "UserputSoftOn" | "UserputSoftOff" => nested("cursorCommand", &[]),
        "SetCursorImg" | "LoadCharset" => nested("cursorCommand", &[P8, P8]),
        "setCursorHotspot" => nested("cursorCommand", &[P8, P8, P8]),
        "InitCursor" | "InitCharset" => nested("cursorCommand", &[P8]),
        "CursorCommand" => nested("cursorCommand", &[List]),
        "cutscene" | "soundKludge" => simple(&[List]),
        "debug" | "debug?" => simple(&[P16]),
        "delay" => Form::Special(Special::Delay),
        "delayVariable" => simple(&[Var]),
        "doSentence" => Form::Special(Special::DoSentence),
        "drawBox" => Form::Special(Special::DrawBox),
        "drawObject" if v5 => Form::Special(Special::DrawObject),
        "drawObject" => simple(&[P16, P16, P16]),
        "faceActor" => simple(&[P8, P16]),
        "findInventory" | "findObject" => getter(&[P8, P8]),
        "freezeScripts" | "loadRoom" | "startMusic" | "startSound" | "stopScript"
        | "stopSound" => simple(&[P8]),
        "getActorCostume" | "getActorElevation" | "getActorFacing" | "getActorMoving"
        | "getActorRoom" | "getActorScale" | "getActorWalkBox" | "getActorWidth"
        | "getAnimCounter" | "getInventoryCount" | "getRandomNr" | "getStringWidth"
        | "isScriptRunning" | "isSoundRunning" | "saveLoadGame" => getter(&[P8]),
        "getActorX" | "getActorY" if old => getter(&[P8]),
        "getActorX" | "getActorY" | "getClosestObjActor" | "getObjectOwner"
        | "getObjectState" => getter(&[P16]),
        "getDist" | "getVerbEntryPoint" => getter(&[P16, P16]),
        "lights" => simple(&[P8, Byte, Byte]),
        "loadRoomWithEgo" => simple(&[P16, P8, Word, Word]),
        "setBoxFlags" if v3 => simple(&[P8, Byte]),
        "setBoxFlags" | "setBoxScale" | "SetBoxSlot" => nested("matrixOp", &[P8, P8]),
        "createBoxMatrix" => nested("matrixOp", &[]),
        "oldRoomEffect-set" | "oldRoomEffect-fadein" => Form::Special(Special::OldRoomEffect),
        "beginOverride" | "endOverride" => Form::Special(Special::Override),
        "panCameraTo" | "setCameraAt" | "stopObjectScript" => simple(&[P16]),
        "pickupObject" if v5 => simple(&[P16, P8]),
        "pickupObject" => simple(&[P16]),
        "print" => Form::SubOps {
            list: SubList::Print,
            leading: true,
        },
        "printEgo" => Form::SubOps {
            list: SubList::Print,
            leading: false,
        },
        "PseudoRoom" => Form::Special(Special::PseudoRoom),
        "putActor" | "walkActorTo" => simple(&[P8, P16, P16]),
        "putActorAtObject" | "walkActorToObject" => simple(&[P8, P16]),
        "putActorInRoom" => simple(&[P8, P8]),
        "Resource.clearHeap" => nested("Resource", &[]),
        "Resource.loadFlObject" => nested("Resource", &[P8, P16]),
        resource if resource.starts_with("Resource.") => nested("Resource", &[P8]),
        "RoomScroll" | "RoomColor" | "SetScreen" | "SetPalColor" | "ShakeOn" | "ShakeOff"
        | "Unused" | "SetRoomScale" | "RoomIntensity" | "saveLoad" | "saveLoad?"
        | "screenEffect" | "screenEffect?" | "setRGBRoomIntensity" | "setRoomShadow"
        | "saveString" | "loadString" | "palManipulate" | "colorCycleDelay" => {
            Form::Special(Special::RoomOp)
        }
        "saveLoadVars" => Form::Special(Special::SaveLoadVars),
        "saveVerbs" | "restoreVerbs" | "deleteVerbs" => {
            nested("saveRestoreVerbs", &[P8, P8, P8])
        }
        "setObjectName" => simple(&[P16, Text]),
        "setOwnerOf" | "setState" => simple(&[P16, P8]),
        "setVarRange" => Form::Special(Special::SetVarRange),
        "startObject" => simple(&[P16, P8, List]),
        "startScript" => Form::Special(Special::StartScript),
        "stopObjectCode" => Form::Special(Special::StopObjectCode),
        "PutCodeInString" => nested("stringOps", &[P8, OptText]),
        "CopyString" | "CreateString" => nested("stringOps", &[P8, P8]),
        "SetStringChar" => nested("stringOps", &[P8, P8, P8]),
        "GetStringChar" => Form::Nested {
            parent: "stringOps",
            shape: Shape {
                target: true,
                params: &[P8, P8],
            },
        },
        "systemOps" => Form::Special(Special::SystemOps),
        "VerbOps" => Form::SubOps {
            list: SubList::Verb,
            leading: true,
        },
        "WaitForActor" if old => simple(&[P8]),
        "WaitForMessage" if old => simple(&[]),
        "WaitForSentence" if v3 => simple(&[]),
        "WaitForActor" => nested("wait", &[P8]),
        "WaitForMessage" | "WaitForCamera" | "WaitForSentence" => nested("wait", &[]),
        "walkActorToActor" => simple(&[P8, P8, Byte]),
        _ => return None,
    };
    Some(form)
}

fn sub_params(list: SubList, dialect: Dialect, name: &str) -> Option<&'static [Param]> {
    use Param::*;

    let params: &'static [Param] = match (list, name) {
        (SubList::Actor, "Scale") if dialect.is_v5() => &[P8, P8],
        (SubList::Actor, "WalkSpeed" | "TalkAnimNr" | "Palette") => &[P8, P8],
        (SubList::Actor, "Nothing") => &[P8, P8, P8],
        (SubList::Actor, "Init" | "DefaultAnims" | "NeverZClip" | "IgnoreBoxes" | "FollowBoxes") => {
            &[]
        }
        (SubList::Actor, "Elevation") => &[P16],
        (SubList::Actor, "Name") => &[Text],
        (SubList::Actor, _) => &[P8],
        (SubList::Verb, "Image" | "SetToString") => &[P16],
        (SubList::Verb, "Text") => &[Text],
        (SubList::Verb, "SetXY") => &[P16, P16],
        (SubList::Verb, "On" | "Off" | "Delete" | "New" | "Dim" | "Center") => &[],
        (SubList::Verb, "SetToObject") => &[P16, P8],
        (SubList::Verb, _) => &[P8],
        (SubList::Print, "Pos" | "RestoreBG" | "PlayCDTrack") => &[P16, P16],
        (SubList::Print, "Color") => &[P8],
        (SubList::Print, "Clipped" | "Height") => &[P16],
        (SubList::Print, "Center" | "Left" | "Overhead") => &[],
        (SubList::Print, "Text") => &[Text],
        _ => return None,
    };
    Some(params)
}

/// Instruction shapes for one dialect.
pub(crate) struct Catalogue {
    instructions: HashMap<&'static str, Instruction>,
    unsupported: HashSet<&'static str>,
    subops: HashMap<SubList, HashMap<&'static str, SubOp>>,
    unsupported_subops: HashMap<SubList, HashSet<&'static str>>,
}

impl Catalogue {
    fn build(dialect: Dialect) -> Self {
        let table = OpcodeTable::for_dialect(dialect);
        let mut instructions = HashMap::new();
        let mut unsupported = HashSet::new();

        for &name in INSTRUCTION_NAMES {
            let Some(form) = form_for(dialect, name) else {
                continue;
            };
            let parent_opcode = match form {
                Form::Nested { parent, .. } => match table.get(parent) {
                    Some(op) => Some(op),
                    None => {
                        unsupported.insert(name);
                        continue;
                    }
                },
                Form::Special(Special::OldRoomEffect) => table.get("oldRoomEffect"),
                Form::Special(Special::Override) => table.get("override"),
                Form::Special(Special::RoomOp) => table.get("roomOps"),
                _ => None,
            };
            match table.get(name) {
                Some(opcode) => {
                    instructions.insert(
                        name,
                        Instruction {
                            name,
                            opcode,
                            parent_opcode,
                            form,
                        },
                    );
                }
                None => {
                    unsupported.insert(name);
                }
            }
        }

        let mut subops: HashMap<SubList, HashMap<&'static str, SubOp>> = HashMap::new();
        let mut unsupported_subops: HashMap<SubList, HashSet<&'static str>> = HashMap::new();
        for list in [SubList::Actor, SubList::Verb, SubList::Print] {
            for &name in list.names() {
                let code = table.get(&format!("{}{}", list.prefix(), name));
                match (code, sub_params(list, dialect, name)) {
                    (Some(code), Some(params)) => {
                        subops
                            .entry(list)
                            .or_default()
                            .insert(name, SubOp { code, params });
                    }
                    _ => {
                        unsupported_subops.entry(list).or_default().insert(name);
                    }
                }
            }
        }

        tracing::debug!(
            dialect = dialect.name(),
            instructions = instructions.len(),
            unsupported = unsupported.len(),
            "assembled instruction catalogue"
        );

        Self {
            instructions,
            unsupported,
            subops,
            unsupported_subops,
        }
    }

    pub(crate) fn for_dialect(dialect: Dialect) -> &'static Catalogue {
        static CATALOGUES: OnceLock<[Catalogue; 4]> = OnceLock::new();
        let catalogues = CATALOGUES.get_or_init(|| Dialect::ALL.map(Catalogue::build));
        match dialect {
            Dialect::V3Old => &catalogues[0],
            Dialect::V3 => &catalogues[1],
            Dialect::V4 => &catalogues[2],
            Dialect::V5 => &catalogues[3],
        }
    }

    pub(crate) fn instruction(&self, name: &str) -> Lookup<'_, Instruction> {
        if let Some(instr) = self.instructions.get(name) {
            Lookup::Found(instr)
        } else if self.unsupported.contains(name) {
            Lookup::Unsupported
        } else {
            Lookup::Unknown
        }
    }

    pub(crate) fn subop(&self, list: SubList, name: &str) -> Lookup<'_, SubOp> {
        if let Some(sub) = self.subops.get(&list).and_then(|subs| subs.get(name)) {
            Lookup::Found(sub)
        } else if self
            .unsupported_subops
            .get(&list)
            .is_some_and(|names| names.contains(name))
        {
            Lookup::Unsupported
        } else {
            Lookup::Unknown
        }
    }
}
