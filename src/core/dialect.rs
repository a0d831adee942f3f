// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Script dialects and script types.

use std::fmt;

use clap::ValueEnum;

/// SCUMM instruction-set and block-layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Dialect {
    #[value(name = "3old")]
    V3Old,
    #[value(name = "3")]
    V3,
    #[value(name = "4")]
    V4,
    #[default]
    #[value(name = "5")]
    V5,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Dialect::V3Old, Dialect::V3, Dialect::V4, Dialect::V5];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::V3Old => "3old",
            Dialect::V3 => "3",
            Dialect::V4 => "4",
            Dialect::V5 => "5",
        }
    }

    pub fn parse(name: &str) -> Option<Dialect> {
        Dialect::ALL
            .into_iter()
            .find(|dialect| dialect.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Dialects 3old and 3 share the small-header conventions.
    pub fn is_v3_family(self) -> bool {
        matches!(self, Dialect::V3Old | Dialect::V3)
    }

    pub fn is_v5(self) -> bool {
        self == Dialect::V5
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SCUMM V{}", self.name())
    }
}

/// Kind of script block being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptType {
    #[default]
    Global,
    Local,
    /// Object and verb scripts share one block type.
    Verb,
    Entry,
    Exit,
}

impl ScriptType {
    /// Parse a `#script-type` keyword.
    pub fn parse(name: &str) -> Option<ScriptType> {
        match name {
            "global" => Some(ScriptType::Global),
            "local" => Some(ScriptType::Local),
            "object" | "verb" => Some(ScriptType::Verb),
            "entry" => Some(ScriptType::Entry),
            "exit" => Some(ScriptType::Exit),
            _ => None,
        }
    }

    /// Block tag written in the header, which is also the output file extension.
    pub fn block_name(self, dialect: Dialect) -> &'static str {
        if dialect.is_v5() {
            match self {
                ScriptType::Global => "SCRP",
                ScriptType::Local => "LSCR",
                ScriptType::Verb => "VERB",
                ScriptType::Entry => "ENCD",
                ScriptType::Exit => "EXCD",
            }
        } else {
            match self {
                ScriptType::Global => "SC",
                ScriptType::Local => "LS",
                ScriptType::Verb => "OC",
                ScriptType::Entry => "EN",
                ScriptType::Exit => "EX",
            }
        }
    }

    /// Object, verb, entry and exit scripts end with the short stop opcode.
    pub fn uses_short_stop(self) -> bool {
        matches!(self, ScriptType::Verb | ScriptType::Entry | ScriptType::Exit)
    }
}
