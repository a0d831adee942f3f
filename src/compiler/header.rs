// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Block headers.
//!
//! Dialects 3old, 3 and 4 write a little-endian size followed by a two-letter
//! tag; dialect 5 writes a four-letter tag followed by a big-endian size. In
//! both cases the size covers the whole block, header included.

use super::*;

use crate::core::encoding::{to_byte, to_word};

use resolver::EventEntry;
use state::{ObjectKey, ObjectValue};

const OLD_BLOCK_HEADER: usize = 6;
const V5_BLOCK_HEADER: usize = 8;
/// Old object header up to and including the name offset byte.
const OLD_OBJECT_FIXED: usize = 19;
const EVENT_ENTRY: usize = 3;

pub(crate) fn generate(
    dialect: Dialect,
    state: &CompileState,
    events: &[EventEntry],
    body_len: usize,
) -> Result<Vec<u8>, ScummError> {
    let script_type = state.effective_script_type();
    let block_name = script_type.block_name(dialect);

    let mut rest = Vec::new();
    match script_type {
        ScriptType::Local => {
            let Some(number) = state.script_num else {
                return Err(ScummError::compile(
                    "A local script must declare its number with Script#.",
                ));
            };
            rest.push(number);
        }
        ScriptType::Verb if dialect.is_v5() => {
            let code_offset = V5_BLOCK_HEADER + EVENT_ENTRY * events.len() + 1;
            push_event_table(&mut rest, events, code_offset)?;
        }
        ScriptType::Verb => rest = old_object_header(state, events)?,
        _ => {}
    }

    let header_len = if dialect.is_v5() {
        V5_BLOCK_HEADER
    } else {
        OLD_BLOCK_HEADER
    } + rest.len();
    let size = u32::try_from(header_len + body_len)
        .map_err(|_| ScummError::compile("Script is too large for a block header"))?;
    tracing::debug!(block = block_name, size, "block header");

    let mut out = Vec::with_capacity(header_len);
    if dialect.is_v5() {
        out.extend_from_slice(block_name.as_bytes());
        out.extend_from_slice(&size.to_be_bytes());
    } else {
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(block_name.as_bytes());
    }
    out.extend(rest);
    Ok(out)
}

/// Event entries (key, word offset from block start) closed by a zero byte.
fn push_event_table(
    out: &mut Vec<u8>,
    events: &[EventEntry],
    code_offset: usize,
) -> Result<(), ScummError> {
    for &(key, offset) in events {
        let target = i64::try_from(offset + code_offset).unwrap_or(i64::MAX);
        let word = to_word(target).map_err(|_| {
            ScummError::compile(format!(
                "Verb action \"{key:02X}\" is too far from the block start: {target}"
            ))
        })?;
        out.push(key);
        out.extend_from_slice(&word);
    }
    out.push(0x00);
    Ok(())
}

fn number(state: &CompileState, key: ObjectKey) -> Result<i64, ScummError> {
    match state.object_data.get(&key) {
        Some((ObjectValue::Number(value), _)) => Ok(*value),
        None if key == ObjectKey::Unknown => Ok(0),
        _ => Err(missing_object_data()),
    }
}

fn missing_object_data() -> ScummError {
    ScummError::compile(
        "Object/Verb scripts for SCUMM V3 or V4 requires the #object-data information.",
    )
}

/// Object metadata, event table and name of a pre-5 object block, without
/// the size and tag.
fn old_object_header(state: &CompileState, events: &[EventEntry]) -> Result<Vec<u8>, ScummError> {
    if state.object_data.is_empty() {
        return Err(missing_object_data());
    }
    let Some((ObjectValue::Text(name), _)) = state.object_data.get(&ObjectKey::Name) else {
        return Err(missing_object_data());
    };
    let name_offset = OLD_OBJECT_FIXED + 1 + EVENT_ENTRY * events.len();
    let code_offset = name_offset + name.len() + 1;
    let byte = |key| number(state, key).and_then(to_byte);
    let word = |key| number(state, key).and_then(to_word);

    let mut out = Vec::with_capacity(code_offset - OLD_BLOCK_HEADER);
    out.extend_from_slice(&word(ObjectKey::Id)?);
    out.push(byte(ObjectKey::Unknown)?);
    out.push(byte(ObjectKey::XPos)?);
    out.push((byte(ObjectKey::YPos)? & 0x7F) | (byte(ObjectKey::ParentState)? << 7));
    out.push(byte(ObjectKey::Width)?);
    out.push(byte(ObjectKey::Parent)?);
    out.extend_from_slice(&word(ObjectKey::WalkX)?);
    out.extend_from_slice(&word(ObjectKey::WalkY)?);
    out.push((byte(ObjectKey::Height)? & 0xF8) | (byte(ObjectKey::ActorDir)? & 0x07));
    out.push(to_byte(name_offset as i64).map_err(|_| {
        ScummError::compile("Too many events for an object header")
    })?);
    push_event_table(&mut out, events, code_offset)?;
    out.extend_from_slice(name);
    out.push(0x00);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_state() -> CompileState {
        let mut state = CompileState {
            script_type: Some(ScriptType::Verb),
            ..CompileState::default()
        };
        let numbers = [
            (ObjectKey::Id, 0x0190),
            (ObjectKey::XPos, 10),
            (ObjectKey::YPos, 20),
            (ObjectKey::ParentState, 1),
            (ObjectKey::Width, 8),
            (ObjectKey::Parent, 2),
            (ObjectKey::WalkX, 30),
            (ObjectKey::WalkY, 40),
            (ObjectKey::Height, 17),
            (ObjectKey::ActorDir, 3),
        ];
        for (key, value) in numbers {
            state
                .object_data
                .insert(key, (ObjectValue::Number(value), value.to_string()));
        }
        state.object_data.insert(
            ObjectKey::Name,
            (ObjectValue::Text(b"key".to_vec()), "key".to_string()),
        );
        state
    }

    #[test]
    fn global_headers() {
        let state = CompileState::default();
        assert_eq!(
            generate(Dialect::V5, &state, &[], 2).unwrap(),
            vec![b'S', b'C', b'R', b'P', 0, 0, 0, 10]
        );
        assert_eq!(
            generate(Dialect::V4, &state, &[], 2).unwrap(),
            vec![8, 0, 0, 0, b'S', b'C']
        );
    }

    #[test]
    fn local_headers_carry_the_number() {
        let state = CompileState {
            script_type: Some(ScriptType::Local),
            script_num: Some(201),
            ..CompileState::default()
        };
        assert_eq!(
            generate(Dialect::V5, &state, &[], 1).unwrap(),
            vec![b'L', b'S', b'C', b'R', 0, 0, 0, 10, 201]
        );
        assert_eq!(
            generate(Dialect::V3, &state, &[], 1).unwrap(),
            vec![8, 0, 0, 0, b'L', b'S', 201]
        );
    }

    #[test]
    fn v5_verb_header() {
        let state = CompileState {
            script_type: Some(ScriptType::Verb),
            ..CompileState::default()
        };
        let header = generate(Dialect::V5, &state, &[(0x0E, 0), (0x0F, 3)], 4).unwrap();
        // code offset 8 + 2 * 3 + 1 = 15
        assert_eq!(
            header,
            vec![b'V', b'E', b'R', b'B', 0, 0, 0, 19, 0x0E, 15, 0, 0x0F, 18, 0, 0]
        );
    }

    #[test]
    fn old_object_header_layout() {
        let state = object_state();
        let header = generate(Dialect::V4, &state, &[(0x0A, 2)], 5).unwrap();
        // name offset 20 + 3, code offset 23 + 4
        assert_eq!(
            header,
            vec![
                32, 0, 0, 0, b'O', b'C', 0x90, 0x01, 0x00, 10, 0x80 | 20, 8, 2, 30, 0, 40, 0,
                0x10 | 3, 23, 0x0A, 29, 0, 0, b'k', b'e', b'y', 0
            ]
        );
        assert_eq!(header.len(), 27);
    }

    #[test]
    fn old_object_header_needs_object_data() {
        let state = CompileState {
            script_type: Some(ScriptType::Verb),
            ..CompileState::default()
        };
        let err = generate(Dialect::V3, &state, &[(0x0A, 0)], 1).unwrap_err();
        assert_eq!(
            err.message(),
            "Object/Verb scripts for SCUMM V3 or V4 requires the #object-data information."
        );
    }
}
