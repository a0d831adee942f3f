// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Well-known global variable names per dialect.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::core::dialect::Dialect;

const V3_NAMES: &[Option<&str>] = &[
    Some("VAR_RESULT"),
    Some("VAR_EGO"),
    Some("VAR_CAMERA_POS_X"),
    Some("VAR_HAVE_MSG"),
    Some("VAR_ROOM"),
    Some("VAR_OVERRIDE"),
    Some("VAR_MACHINE_SPEED"),
    Some("VAR_ME"),
    Some("VAR_NUM_ACTOR"),
    Some("VAR_CURRENT_LIGHTS"),
    Some("VAR_CURRENTDRIVE"),
    Some("VAR_TMR_1"),
    Some("VAR_TMR_2"),
    Some("VAR_TMR_3"),
    Some("VAR_MUSIC_TIMER"),
    Some("VAR_ACTOR_RANGE_MIN"),
    Some("VAR_ACTOR_RANGE_MAX"),
    Some("VAR_CAMERA_MIN_X"),
    Some("VAR_CAMERA_MAX_X"),
    Some("VAR_TIMER_NEXT"),
    Some("VAR_VIRT_MOUSE_X"),
    Some("VAR_VIRT_MOUSE_Y"),
    Some("VAR_ROOM_RESOURCE"),
    Some("VAR_LAST_SOUND"),
    Some("VAR_CUTSCENEEXIT_KEY"),
    Some("VAR_TALK_ACTOR"),
    Some("VAR_CAMERA_FAST_X"),
    Some("VAR_SENTENCE_OBJECT1"),
    Some("VAR_ENTRY_SCRIPT"),
    Some("VAR_ENTRY_SCRIPT2"),
    Some("VAR_EXIT_SCRIPT"),
    Some("VAR_EXIT_SCRIPT2"),
    Some("VAR_VERB_SCRIPT"),
    Some("VAR_SENTENCE_SCRIPT"),
    Some("VAR_INVENTORY_SCRIPT"),
    Some("VAR_CUTSCENE_START_SCRIPT"),
    Some("VAR_CUTSCENE_END_SCRIPT"),
    Some("VAR_CHARINC"),
    Some("VAR_WALKTO_OBJ"),
    Some("VAR_KEYPRESS"),
    Some("VAR_CUTSCENEEXIT_KEY"),
    Some("VAR_TALK_ACTOR"),
    Some("VAR_RESTART_KEY"),
    Some("VAR_PAUSE_KEY"),
    Some("VAR_MOUSE_X"),
    Some("VAR_MOUSE_Y"),
    Some("VAR_TIMER"),
    Some("VAR_TMR_4"),
    Some("VAR_SOUNDCARD"),
    Some("VAR_VIDEOMODE"),
];

/// Dialect 4 entries that differ from or extend the dialect 3 table.
const V4_CHANGES: &[(usize, Option<&str>)] = &[
    (27, Some("VAR_SCROLL_SCRIPT")),
    (39, Some("VAR_DEBUGMODE")),
    (40, Some("VAR_HEAPSPACE")),
    (50, Some("VAR_MAINMENU_KEY")),
    (51, Some("VAR_FIXEDDISK")),
    (52, Some("VAR_CURSORSTATE")),
    (53, Some("VAR_USERPUT")),
    (54, Some("VAR_V5_TALK_STRING_Y")),
    (60, Some("VAR_NOSUBTITLES")),
    (64, Some("VAR_SOUNDPARAM")),
    (65, Some("VAR_SOUNDPARAM2")),
    (66, Some("VAR_SOUNDPARAM3")),
];

const V5_CHANGES: &[(usize, Option<&str>)] = &[
    (56, Some("VAR_SOUNDRESULT")),
    (57, Some("VAR_TALKSTOP_KEY")),
    (59, Some("VAR_FADE_DELAY")),
    (67, Some("VAR_INPUTMODE")),
    (68, Some("VAR_MEMORY_PERFORMANCE")),
    (69, Some("VAR_VIDEO_PERFORMANCE")),
    (70, Some("VAR_ROOM_FLAG")),
    (71, Some("VAR_GAME_LOADED")),
    (72, Some("VAR_NEW_ROOM")),
];

fn build_list(dialect: Dialect) -> Vec<Option<&'static str>> {
    let mut list: Vec<Option<&'static str>> = V3_NAMES.to_vec();
    let mut layers: Vec<&[(usize, Option<&'static str>)]> = Vec::new();
    if !dialect.is_v3_family() {
        layers.push(V4_CHANGES);
    }
    if dialect.is_v5() {
        layers.push(V5_CHANGES);
    }
    for layer in layers {
        for &(index, name) in layer {
            if list.len() <= index {
                list.resize(index + 1, None);
            }
            list[index] = name;
        }
    }
    list
}

/// Name to `Var[n]` index map for one dialect.
#[derive(Debug, Clone)]
pub struct KnownVars {
    names: HashMap<&'static str, u16>,
}

impl KnownVars {
    fn build(dialect: Dialect) -> Self {
        let mut names = HashMap::new();
        // Later indices overwrite earlier ones for repeated names.
        for (index, name) in build_list(dialect).into_iter().enumerate() {
            if let Some(name) = name {
                names.insert(name, index as u16);
            }
        }
        Self { names }
    }

    pub fn for_dialect(dialect: Dialect) -> &'static KnownVars {
        static TABLES: OnceLock<[KnownVars; 4]> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Dialect::ALL.map(KnownVars::build));
        match dialect {
            Dialect::V3Old => &tables[0],
            Dialect::V3 => &tables[1],
            Dialect::V4 => &tables[2],
            Dialect::V5 => &tables[3],
        }
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
