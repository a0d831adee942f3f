// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! SCUMM script compiler - main entry point.
//!
//! A compile runs in three steps over one source file: the statement parser
//! walks the token stream and emits one byte fragment per construct, the
//! resolver patches jump placeholders and event offsets, and the header
//! generator prefixes the block header for the dialect and script type.

mod catalogue;
pub mod cli;
mod conditions;
mod expression;
mod header;
mod instructions;
mod parser;
mod passes;
mod quirky;
mod resolver;
mod state;
mod statements;
#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::dialect::{Dialect, ScriptType};
use crate::core::encoding::{Operand, VarRef};
use crate::core::error::{Diagnostic, RunError, RunReport, ScummError, ScummErrorKind, Severity};
use crate::core::lexicon::{decode_latin1, tokenize, Punct, Span, Token, TokenKind};
use crate::core::opcodes::OpcodeTable;
use crate::core::vars::KnownVars;

use catalogue::Catalogue;
use cli::CliConfig;
use state::CompileState;

/// Per-run switches that change how source text is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Accept the quirks of older descumm output.
    pub legacy_descumm: bool,
}

/// Diagnostic code for an `Events:` key given twice.
const DUPLICATE_EVENT_CODE: &str = "scm301";

/// Header and body of one compiled script block.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    script_type: ScriptType,
    block_name: &'static str,
    header: Vec<u8>,
    body: Vec<u8>,
    warnings: Vec<Diagnostic>,
}

impl CompiledScript {
    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    /// Block tag, also used as the output file extension.
    pub fn block_name(&self) -> &'static str {
        self.block_name
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + self.body.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.body);
        out
    }
}

/// Compiler for one dialect. Every call starts from empty state, so one
/// instance can compile any number of files.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    dialect: Dialect,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(dialect: Dialect, options: CompileOptions) -> Self {
        Self { dialect, options }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn compile_source(&self, source: &str) -> Result<CompiledScript, Diagnostic> {
        self.compile(source).map_err(|err| {
            let unsupported = err.kind() == ScummErrorKind::Unsupported;
            let diag = Diagnostic::from_error(err);
            if unsupported {
                diag.with_help("select the SCUMM version the script was written for with -v")
            } else {
                diag
            }
        })
    }

    /// Compile raw file contents; every byte is one source character.
    pub fn compile_bytes(&self, bytes: &[u8]) -> Result<CompiledScript, Diagnostic> {
        self.compile_source(&decode_latin1(bytes))
    }

    fn compile(&self, source: &str) -> Result<CompiledScript, ScummError> {
        let tokens = tokenize(source)?;
        tracing::debug!(
            dialect = self.dialect.name(),
            tokens = tokens.len(),
            legacy = self.options.legacy_descumm,
            "compiling script"
        );

        let mut session = Session::new(&tokens, self.dialect, self.options.legacy_descumm);
        session.parse_script()?;
        let mut state = session.into_state();

        let script_type = state.effective_script_type();
        if script_type == ScriptType::Local && state.script_num.is_none() {
            return Err(ScummError::compile(
                "A local script must declare its number with Script#.",
            ));
        }

        resolver::resolve_jumps(&mut state)?;
        let events = if script_type == ScriptType::Verb {
            resolver::resolve_events(&state)?
        } else {
            Vec::new()
        };

        let body: Vec<u8> = state.fragments.concat();
        let header = header::generate(self.dialect, &state, &events, body.len())?;
        let block_name = script_type.block_name(self.dialect);
        tracing::debug!(
            block = block_name,
            header = header.len(),
            body = body.len(),
            warnings = state.warnings.len(),
            "generated script block"
        );

        Ok(CompiledScript {
            script_type,
            block_name,
            header,
            body,
            warnings: std::mem::take(&mut state.warnings),
        })
    }
}

/// Outcome of a command-line run: one entry per input file.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<Result<RunReport, RunError>>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[Result<RunReport, RunError>] {
        &self.outcomes
    }

    /// Worst status over all files.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                Ok(_) => 0,
                Err(err) => err.exit_code(),
            })
            .max()
            .unwrap_or(0)
    }
}

/// Compile every input of a validated command line.
pub fn run_with_cli(config: &CliConfig) -> BatchReport {
    passes::run_batch(config)
}

/// Parser cursor plus the state it fills in.
pub(crate) struct Session<'a> {
    tokens: &'a [Token],
    pos: usize,
    state: CompileState,
    dialect: Dialect,
    legacy: bool,
    opcodes: &'static OpcodeTable,
    catalogue: &'static Catalogue,
    known_vars: &'static KnownVars,
    /// Opcode byte from a descumm `(XX)` annotation on the current line.
    annotation: Option<u8>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(tokens: &'a [Token], dialect: Dialect, legacy: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            state: CompileState::default(),
            dialect,
            legacy,
            opcodes: OpcodeTable::for_dialect(dialect),
            catalogue: Catalogue::for_dialect(dialect),
            known_vars: KnownVars::for_dialect(dialect),
            annotation: None,
        }
    }

    pub(crate) fn into_state(self) -> CompileState {
        self.state
    }
}
