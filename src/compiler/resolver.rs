// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Second pass: jump offsets and event table entries.
//!
//! A jump offset is relative to the byte after the jump instruction, which
//! is always the end of the jump's own fragment.

use super::*;

/// Resolved event: verb key and byte offset of its handler in the body.
pub(crate) type EventEntry = (u8, usize);

fn fragment_bytes(fragments: &[Vec<u8>]) -> usize {
    fragments.iter().map(Vec::len).sum()
}

/// Signed distance from the end of fragment `jump` to the start of fragment
/// `label`.
fn jump_offset(fragments: &[Vec<u8>], jump: usize, label: usize) -> i64 {
    if label <= jump {
        -(fragment_bytes(&fragments[label..=jump]) as i64)
    } else {
        fragment_bytes(&fragments[jump + 1..label]) as i64
    }
}

/// Patch every jump placeholder with its offset.
pub(crate) fn resolve_jumps(state: &mut CompileState) -> Result<(), ScummError> {
    for jump in &state.jumps {
        let Some(site) = state.labels.get(&jump.label) else {
            return Err(
                ScummError::compile(format!("Label does not exist: {}", jump.label))
                    .with_span(jump.span),
            );
        };
        let offset = jump_offset(&state.fragments, jump.line, site.line);
        if !(-0x7FFF..=0x7FFF).contains(&offset) {
            return Err(ScummError::compile(format!(
                "Jump is too large: {offset} (meaningful line: {})",
                jump.line
            ))
            .with_span(jump.span));
        }
        tracing::trace!(label = jump.label.as_str(), line = jump.line, offset, "jump resolved");

        let Some(fragment) = state.fragments.get_mut(jump.line) else {
            return Err(ScummError::new(
                ScummErrorKind::Internal,
                "Jump refers to a missing fragment",
                Some(&jump.line.to_string()),
            ));
        };
        let len = fragment.len();
        if len < 2 {
            return Err(ScummError::new(
                ScummErrorKind::Internal,
                "Jump fragment has no placeholder",
                Some(&jump.line.to_string()),
            ));
        }
        fragment[len - 2..].copy_from_slice(&(offset as i16).to_le_bytes());
    }
    tracing::debug!(jumps = state.jumps.len(), "resolved jumps");
    Ok(())
}

/// Map each event to the body offset of its label, ordered by key.
pub(crate) fn resolve_events(state: &CompileState) -> Result<Vec<EventEntry>, ScummError> {
    if state.events.is_empty() {
        return Err(ScummError::compile(
            "An object/verb script must have an event table.",
        ));
    }
    state
        .events
        .iter()
        .map(|(&key, (label, span))| match state.labels.get(label) {
            Some(site) => Ok((key, fragment_bytes(&state.fragments[..site.line]))),
            None => Err(ScummError::compile(format!(
                "Verb action \"{key:02X}\" cannot be mapped; label \"{label}\" not found."
            ))
            .with_span(*span)),
        })
        .collect()
}
