// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-file compile state.
//!
//! Fragments are the unit of jump arithmetic: every construct that emits
//! bytes or takes part in control flow gets its own fragment, and labels and
//! jumps refer to fragments by index.

use std::collections::{BTreeMap, HashMap};

use crate::core::dialect::ScriptType;
use crate::core::encoding::Operand;
use crate::core::error::{Diagnostic, ScummError};
use crate::core::lexicon::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LabelSite {
    pub line: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JumpSite {
    pub label: String,
    pub line: usize,
    pub span: Span,
}

/// Open `if` / `else if` chain. `branches` holds the exit jumps of finished
/// branches, all of which land after the chain.
#[derive(Debug, Clone)]
pub(crate) struct IfChain {
    pub id: usize,
    pub branches: Vec<String>,
    counter: usize,
}

impl IfChain {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            branches: Vec::new(),
            counter: 0,
        }
    }

    pub fn next_label(&mut self) -> String {
        let label = format!("$i{}b{}", self.id, self.counter);
        self.counter += 1;
        label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopKind {
    While,
    DoWhile,
    For,
}

impl LoopKind {
    fn tag(self) -> char {
        match self {
            LoopKind::While => 'w',
            LoopKind::DoWhile => 'd',
            LoopKind::For => 'f',
        }
    }
}

/// Open loop. `start` is the fragment the loop-back jump returns to.
#[derive(Debug, Clone)]
pub(crate) struct LoopFrame {
    pub kind: LoopKind,
    pub start: usize,
    /// Deferred increment of a `for` loop.
    pub increment: Option<Vec<u8>>,
}

impl LoopFrame {
    pub fn entry_label(&self) -> String {
        format!("${}{}b0", self.kind.tag(), self.start)
    }

    pub fn exit_label(&self) -> String {
        format!("${}{}b1", self.kind.tag(), self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ObjectKey {
    Id,
    Unknown,
    XPos,
    YPos,
    ParentState,
    Width,
    Parent,
    WalkX,
    WalkY,
    Height,
    ActorDir,
    Name,
}

impl ObjectKey {
    pub const ALL: [ObjectKey; 12] = [
        ObjectKey::Id,
        ObjectKey::Unknown,
        ObjectKey::XPos,
        ObjectKey::YPos,
        ObjectKey::ParentState,
        ObjectKey::Width,
        ObjectKey::Parent,
        ObjectKey::WalkX,
        ObjectKey::WalkY,
        ObjectKey::Height,
        ObjectKey::ActorDir,
        ObjectKey::Name,
    ];

    pub fn parse(key: &str) -> Option<ObjectKey> {
        ObjectKey::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKey::Id => "id",
            ObjectKey::Unknown => "unknown",
            ObjectKey::XPos => "x-pos",
            ObjectKey::YPos => "y-pos",
            ObjectKey::ParentState => "parent-state",
            ObjectKey::Width => "width",
            ObjectKey::Parent => "parent",
            ObjectKey::WalkX => "walk-x",
            ObjectKey::WalkY => "walk-y",
            ObjectKey::Height => "height",
            ObjectKey::ActorDir => "actor-dir",
            ObjectKey::Name => "name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ObjectValue {
    Number(i64),
    Text(Vec<u8>),
}

/// Everything collected while compiling one file.
#[derive(Debug, Default)]
pub(crate) struct CompileState {
    pub fragments: Vec<Vec<u8>>,
    pub labels: HashMap<String, LabelSite>,
    pub jumps: Vec<JumpSite>,
    pub events: BTreeMap<u8, (String, Span)>,
    pub object_data: BTreeMap<ObjectKey, (ObjectValue, String)>,
    pub defines: HashMap<String, Operand>,
    pub script_type: Option<ScriptType>,
    pub script_num: Option<u8>,
    /// Non-fatal findings, reported alongside the compiled block.
    pub warnings: Vec<Diagnostic>,
}

impl CompileState {
    /// Index the next fragment will get.
    pub fn current_line(&self) -> usize {
        self.fragments.len()
    }

    pub fn push_fragment(&mut self, bytes: Vec<u8>) -> usize {
        self.fragments.push(bytes);
        self.fragments.len() - 1
    }

    /// Declare a source label at the next fragment. Re-declaring a label at
    /// the line it already names is accepted.
    pub fn register_label(&mut self, name: &str, span: Span) -> Result<(), ScummError> {
        let line = self.current_line();
        if let Some(existing) = self.labels.get(name) {
            if existing.line == line {
                return Ok(());
            }
            return Err(ScummError::compile(format!(
                "Duplicate label declaration on line {line}: {name}"
            ))
            .with_span(span));
        }
        tracing::trace!(label = name, line, "label declared");
        self.labels.insert(name.to_string(), LabelSite { line, span });
        Ok(())
    }

    /// Place a compiler-generated label.
    pub fn define_label_at(&mut self, name: String, line: usize, span: Span) {
        self.labels.insert(name, LabelSite { line, span });
    }

    pub fn register_jump(&mut self, label: impl Into<String>, line: usize, span: Span) {
        self.jumps.push(JumpSite {
            label: label.into(),
            line,
            span,
        });
    }

    /// Record the script type, rejecting a second, different declaration.
    pub fn set_script_type(
        &mut self,
        script_type: ScriptType,
        block_name: impl Fn(ScriptType) -> &'static str,
    ) -> Result<(), ScummError> {
        match self.script_type {
            Some(current) if current != script_type => Err(ScummError::compile(format!(
                "Conflicting script type info: old type = {}, new type = {}",
                block_name(current),
                block_name(script_type)
            ))),
            _ => {
                self.script_type = Some(script_type);
                Ok(())
            }
        }
    }

    pub fn effective_script_type(&self) -> ScriptType {
        self.script_type.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(1, 1, 1)
    }

    #[test]
    fn duplicate_label_on_same_line_is_tolerated() {
        let mut state = CompileState::default();
        state.register_label("0038", span()).unwrap();
        state.register_label("0038", span()).unwrap();
        state.push_fragment(vec![0x80]);
        let err = state.register_label("0038", span()).unwrap_err();
        assert_eq!(err.message(), "Duplicate label declaration on line 1: 0038");
    }

    #[test]
    fn conflicting_script_types_are_rejected() {
        let mut state = CompileState::default();
        let names = |t: ScriptType| match t {
            ScriptType::Local => "LS",
            ScriptType::Verb => "OC",
            _ => "SC",
        };
        state.set_script_type(ScriptType::Local, names).unwrap();
        state.set_script_type(ScriptType::Local, names).unwrap();
        let err = state.set_script_type(ScriptType::Verb, names).unwrap_err();
        assert_eq!(
            err.message(),
            "Conflicting script type info: old type = LS, new type = OC"
        );
    }

    #[test]
    fn synthetic_labels_are_unique_per_construct() {
        let mut chain = IfChain::new(4);
        assert_eq!(chain.next_label(), "$i4b0");
        assert_eq!(chain.next_label(), "$i4b1");
        let frame = LoopFrame {
            kind: LoopKind::For,
            start: 9,
            increment: None,
        };
        assert_eq!(frame.entry_label(), "$f9b0");
        assert_eq!(frame.exit_label(), "$f9b1");
    }

    #[test]
    fn object_keys_parse_by_name() {
        assert_eq!(ObjectKey::parse("walk-x"), Some(ObjectKey::WalkX));
        assert_eq!(ObjectKey::parse("colour"), None);
    }
}
