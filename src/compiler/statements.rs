// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Statement driver: pragmas, line prefixes, blocks and control flow.
//!
//! Every construct that emits bytes becomes one fragment. Conditional and
//! unconditional jumps carry a two-byte placeholder that the resolver
//! patches once every label has a fragment index.

use super::*;

use crate::core::encoding::{push_param, to_byte, to_word};
use crate::core::opcodes::{inline_operation, OP_JUMP};

use state::{IfChain, LoopFrame, LoopKind, ObjectKey, ObjectValue};

const JUMP_PLACEHOLDER: [u8; 2] = [0x00, 0x00];
const MIN_LOCAL_SCRIPT: i64 = 200;
const PRAGMAS: &[&str] = &["Script#", "#script-type", "#define", "Events:", "#object-data"];

fn latin1_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn with_placeholder(mut test: Vec<u8>) -> Vec<u8> {
    test.extend(JUMP_PLACEHOLDER);
    test
}

impl Session<'_> {
    /// Whole source file: pragmas, statements, optional `END`.
    pub(super) fn parse_script(&mut self) -> Result<(), ScummError> {
        self.parse_pragmas()?;
        loop {
            self.parse_line_prefix()?;
            if self.at_end() {
                break;
            }
            if self.eat_word("END") {
                if let Some(tok) = self.peek() {
                    return Err(ScummError::syntax(format!(
                        "Expected end of file after END, found {}",
                        tok.describe()
                    ))
                    .with_span(tok.span));
                }
                break;
            }
            if self.check_punct(Punct::RBrace) {
                return Err(ScummError::syntax("Unmatched '}'").with_span(self.current_span()));
            }
            self.parse_statement()?;
        }
        tracing::debug!(
            fragments = self.state.fragments.len(),
            labels = self.state.labels.len(),
            jumps = self.state.jumps.len(),
            "parsed script"
        );
        Ok(())
    }

    fn parse_pragmas(&mut self) -> Result<(), ScummError> {
        while let Some(name) = self.peek_name() {
            if !PRAGMAS.contains(&name.as_str()) {
                break;
            }
            let (_, span) = self.read_name()?;
            tracing::debug!(pragma = name.as_str(), line = span.line, "pragma");
            match name.as_str() {
                "Script#" => self.parse_script_number(span)?,
                "#script-type" => {
                    let (word, word_span) = self.read_label()?;
                    let Some(script_type) = ScriptType::parse(&word) else {
                        return Err(ScummError::syntax(format!("Unknown script type: {word}"))
                            .with_span(word_span));
                    };
                    self.declare_script_type(script_type, span)?;
                }
                "#define" => {
                    let (define, _) = self.read_label()?;
                    self.eat_punct(Punct::Assign);
                    let value = self.parse_operand()?;
                    self.state.defines.insert(define, value);
                }
                "Events:" => self.parse_event_table(span)?,
                _ => self.parse_object_data(span)?,
            }
        }
        Ok(())
    }

    fn declare_script_type(&mut self, script_type: ScriptType, span: Span) -> Result<(), ScummError> {
        let dialect = self.dialect;
        self.state
            .set_script_type(script_type, |t| t.block_name(dialect))
            .map_err(|err| err.with_span(span))
    }

    fn parse_script_number(&mut self, span: Span) -> Result<(), ScummError> {
        self.declare_script_type(ScriptType::Local, span)?;
        let num_span = self.current_span();
        let number = self.parse_integer()?;
        if number < MIN_LOCAL_SCRIPT {
            return Err(
                ScummError::compile("Local script number must be greater than 200.")
                    .with_span(num_span),
            );
        }
        let number = u8::try_from(number).map_err(|_| {
            ScummError::compile("Byte value should be between -128 and 255.").with_span(num_span)
        })?;
        self.state.script_num = Some(number);
        Ok(())
    }

    /// `Events: 0E - label 0F - label ...`
    fn parse_event_table(&mut self, span: Span) -> Result<(), ScummError> {
        self.declare_script_type(ScriptType::Verb, span)?;
        let mut count = 0;
        while let Some(key) = self.peek().and_then(|tok| tok.word()) {
            let is_key = key.len() <= 2 && key.bytes().all(|b| b.is_ascii_hexdigit());
            if !is_key || !self.check_punct_at(1, Punct::Minus) {
                break;
            }
            let (key, key_span) = self.read_label()?;
            let code = u8::from_str_radix(&key, 16).map_err(|_| {
                ScummError::syntax(format!("Invalid event key: {key}")).with_span(key_span)
            })?;
            self.expect_punct(Punct::Minus)?;
            let (label, label_span) = self.read_label()?;
            if let Some((previous, previous_span)) = self.state.events.get(&code) {
                tracing::debug!(
                    event = key.as_str(),
                    previous = previous.as_str(),
                    label = label.as_str(),
                    "event declared twice"
                );
                let warning = Diagnostic::new(
                    key_span.line,
                    Severity::Warning,
                    ScummError::compile(format!(
                        "Event {code:02X} is declared twice; using label {label}"
                    )),
                )
                .with_column(Some(key_span.col_start))
                .with_col_end(Some(key_span.col_end))
                .with_code(DUPLICATE_EVENT_CODE)
                .with_note(format!(
                    "line {} maps it to {previous}",
                    previous_span.line
                ));
                self.state.warnings.push(warning);
            }
            self.state.events.insert(code, (label, label_span));
            count += 1;
        }
        if count == 0 {
            return Err(ScummError::syntax("Expected at least one event entry").with_span(span));
        }
        Ok(())
    }

    /// `#object-data [key value, ...]`; the brackets are optional.
    fn parse_object_data(&mut self, span: Span) -> Result<(), ScummError> {
        if self.dialect.is_v5() {
            return Err(
                ScummError::compile("Object data is not necessary in V5 scripts.").with_span(span),
            );
        }
        self.declare_script_type(ScriptType::Verb, span)?;
        let bracketed = self.eat_punct(Punct::LBracket);
        loop {
            let (name, key_span) = self.read_name()?;
            let Some(key) = ObjectKey::parse(&name) else {
                return Err(ScummError::syntax(format!("Unknown object data item: {name}"))
                    .with_span(key_span));
            };
            let value_span = self.current_span();
            let value = match key {
                ObjectKey::Name => ObjectValue::Text(self.parse_string()?),
                ObjectKey::ParentState => {
                    let value = self.parse_integer()?;
                    if value != 0 && value != 1 {
                        return Err(ScummError::compile("parent-state must be 0 or 1.")
                            .with_span(value_span));
                    }
                    ObjectValue::Number(value)
                }
                ObjectKey::Id | ObjectKey::WalkX | ObjectKey::WalkY => {
                    let value = self.parse_integer()?;
                    to_word(value).map_err(|err| err.with_span(value_span))?;
                    ObjectValue::Number(value)
                }
                _ => {
                    let value = self.parse_integer()?;
                    to_byte(value).map_err(|err| err.with_span(value_span))?;
                    ObjectValue::Number(value)
                }
            };
            let text = match &value {
                ObjectValue::Number(n) => n.to_string(),
                ObjectValue::Text(bytes) => latin1_text(bytes),
            };
            if let Some((_, previous)) = self.state.object_data.get(&key) {
                return Err(ScummError::compile(format!(
                    "Duplicate object data definition for {}; {previous} vs. {text}",
                    key.as_str()
                ))
                .with_span(key_span));
            }
            self.state.object_data.insert(key, (value, text));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        if bracketed {
            self.expect_punct(Punct::RBracket)?;
        }

        let data = &self.state.object_data;
        let mandatory = ObjectKey::ALL.len() - 1;
        if data.len() < mandatory
            || (data.len() == mandatory && data.contains_key(&ObjectKey::Unknown))
        {
            return Err(ScummError::compile(
                "Insufficient arguments in #object-data directive. All items except \"unknown\" are mandatory.",
            )
            .with_span(span));
        }
        Ok(())
    }

    /// `[label]` and a descumm `(XX)` annotation, both optional.
    fn parse_line_prefix(&mut self) -> Result<(), ScummError> {
        self.annotation = None;
        if self.eat_punct(Punct::LBracket) {
            let (label, span) = self.read_label()?;
            self.expect_punct(Punct::RBracket)?;
            self.state.register_label(&label, span)?;
        }
        if self.eat_punct(Punct::LParen) {
            match self.advance() {
                Some(tok) if tok.is_punct(Punct::Star) => {
                    self.expect_punct(Punct::Star)?;
                }
                Some(tok) => match tok.word() {
                    Some(word) if word.len() == 2 => {
                        self.annotation = u8::from_str_radix(word, 16).ok();
                    }
                    Some(_) => {}
                    None => {
                        return Err(ScummError::syntax(format!(
                            "Expected an opcode annotation, found {}",
                            tok.describe()
                        ))
                        .with_span(tok.span))
                    }
                },
                None => {
                    return Err(ScummError::syntax(
                        "Expected an opcode annotation, found end of file",
                    ))
                }
            }
            self.expect_punct(Punct::RParen)?;
        }
        Ok(())
    }

    /// Statements up to, not including, the closing `}`.
    fn parse_block_body(&mut self) -> Result<(), ScummError> {
        loop {
            self.parse_line_prefix()?;
            if self.check_punct(Punct::RBrace) {
                return Ok(());
            }
            if self.at_end() {
                return Err(ScummError::syntax("Expected '}', found end of file")
                    .with_span(self.current_span()));
            }
            self.parse_statement()?;
        }
    }

    fn parse_statement(&mut self) -> Result<(), ScummError> {
        let span = self.current_span();
        if self.check_punct_at(1, Punct::LParen) {
            if self.check_word("if") {
                return self.parse_if();
            }
            if self.check_word("while") {
                return self.parse_while();
            }
            if self.check_word("for") {
                return self.parse_for();
            }
            if self.check_word("unless") {
                self.pos += 1;
                let test = self.parse_paren_condition()?;
                self.expect_word("goto")?;
                return self.finish_jump(with_placeholder(test), span);
            }
        }
        if self.check_word("do") && self.check_punct_at(1, Punct::LBrace) {
            return self.parse_do();
        }
        if self.eat_word("goto") {
            return self.finish_jump(vec![OP_JUMP, 0x00, 0x00], span);
        }
        if let Some(name) = self.peek_name() {
            if PRAGMAS.contains(&name.as_str()) {
                return Err(ScummError::syntax(format!(
                    "Pragmas must come before the first statement: {name}"
                ))
                .with_span(span));
            }
        }

        let start_script = self.check_word("startScript");
        let bytes = self.parse_simple_construct()?;
        self.state.push_fragment(bytes);
        if start_script && !self.legacy {
            self.expect_punct(Punct::Semicolon)?;
        } else {
            self.eat_semicolon();
        }
        Ok(())
    }

    /// Label after `goto`; `bytes` ends in the jump placeholder.
    fn finish_jump(&mut self, bytes: Vec<u8>, span: Span) -> Result<(), ScummError> {
        let (label, label_span) = self.read_label()?;
        let line = self.state.push_fragment(bytes);
        self.state.register_jump(label, line, span.to(label_span));
        self.eat_semicolon();
        Ok(())
    }

    /// A single-line construct: increment, inline arithmetic, a call with or
    /// without a result variable, or an expression.
    pub(super) fn parse_simple_construct(&mut self) -> Result<Vec<u8>, ScummError> {
        if self.check_word("Exprmode") {
            return self.parse_expression_mode();
        }
        if !self.at_variable() {
            return self.parse_instruction(None);
        }

        let target = self.parse_var()?;
        let op_span = self.current_span();
        let Some(TokenKind::Punct(punct)) = self.advance().map(|tok| &tok.kind) else {
            return Err(ScummError::syntax("Expected an assignment operator").with_span(op_span));
        };
        let punct = *punct;
        if matches!(punct, Punct::Increment | Punct::Decrement) {
            let Some(op) = inline_operation(punct.as_str()) else {
                return Err(ScummError::syntax("Expected an assignment operator").with_span(op_span));
            };
            let mut out = vec![op];
            out.extend(target.encode()?);
            return Ok(out);
        }
        if punct == Punct::Assign {
            if let Some(len) = self.name_len() {
                if self.check_punct_at(len, Punct::LParen) {
                    return self.parse_instruction(Some(&target));
                }
            }
        }
        let Some(mut op) = inline_operation(punct.as_str()) else {
            return Err(ScummError::syntax(format!(
                "Expected an assignment operator, found '{}'",
                punct.as_str()
            ))
            .with_span(op_span));
        };
        let value_span = self.current_span();
        let value = self.parse_operand()?;
        let mut args = Vec::new();
        push_param(&mut args, &mut op, 0x80, &value, true).map_err(|err| err.with_span(value_span))?;
        let mut out = vec![op];
        out.extend(target.encode()?);
        out.extend(args);
        Ok(out)
    }

    fn parse_paren_condition(&mut self) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_condition()?;
        self.expect_punct(Punct::RParen)?;
        Ok(test)
    }

    /// Emit a conditional test whose jump lands on `label`.
    fn push_test(&mut self, test: Vec<u8>, label: String, span: Span) -> usize {
        let line = self.state.push_fragment(with_placeholder(test));
        self.state.register_jump(label, line, span);
        line
    }

    fn parse_if(&mut self) -> Result<(), ScummError> {
        let span = self.expect_word("if")?;
        let mut chain = IfChain::new(self.state.current_line());
        let test = self.parse_paren_condition()?;
        self.expect_punct(Punct::LBrace)?;
        let label = chain.next_label();
        self.push_test(test, label.clone(), span);
        let mut pending = Some(label);

        loop {
            self.parse_block_body()?;
            let close = self.expect_punct(Punct::RBrace)?;
            if !self.check_word("else") {
                break;
            }
            let Some(test_label) = pending.take() else {
                return Err(ScummError::syntax("'else' after a final 'else' branch")
                    .with_span(self.current_span()));
            };
            self.pos += 1;

            let exit = chain.next_label();
            let jump = self.state.push_fragment(vec![OP_JUMP, 0x00, 0x00]);
            self.state.register_jump(exit.clone(), jump, close);
            chain.branches.push(exit);
            let here = self.state.current_line();
            self.state.define_label_at(test_label, here, close);

            if self.check_word("if") {
                let span = self.expect_word("if")?;
                let test = self.parse_paren_condition()?;
                let label = chain.next_label();
                self.push_test(test, label.clone(), span);
                pending = Some(label);
            }
            self.expect_punct(Punct::LBrace)?;
        }

        let end = self.state.current_line();
        for label in pending.into_iter().chain(chain.branches) {
            self.state.define_label_at(label, end, span);
        }
        Ok(())
    }

    fn parse_while(&mut self) -> Result<(), ScummError> {
        let span = self.expect_word("while")?;
        let frame = LoopFrame {
            kind: LoopKind::While,
            start: self.state.current_line(),
            increment: None,
        };
        let test = self.parse_paren_condition()?;
        self.expect_punct(Punct::LBrace)?;
        self.push_test(test, frame.exit_label(), span);
        self.state.define_label_at(frame.entry_label(), frame.start, span);

        self.parse_block_body()?;
        let close = self.expect_punct(Punct::RBrace)?;
        self.close_loop(&frame, close);
        Ok(())
    }

    fn parse_do(&mut self) -> Result<(), ScummError> {
        let span = self.expect_word("do")?;
        self.expect_punct(Punct::LBrace)?;
        let frame = LoopFrame {
            kind: LoopKind::DoWhile,
            start: self.state.current_line(),
            increment: None,
        };
        self.state.define_label_at(frame.entry_label(), frame.start, span);

        self.parse_block_body()?;
        self.expect_punct(Punct::RBrace)?;
        let while_span = self.expect_word("while")?;
        let test = self.parse_paren_condition()?;
        self.push_test(test, frame.entry_label(), while_span);
        self.eat_semicolon();
        Ok(())
    }

    /// `for (init; test; increment) { ... }`; init and increment may be empty.
    fn parse_for(&mut self) -> Result<(), ScummError> {
        let span = self.expect_word("for")?;
        self.expect_punct(Punct::LParen)?;
        if !self.check_punct(Punct::Semicolon) {
            let init = self.parse_simple_construct()?;
            self.state.push_fragment(init);
        }
        self.expect_punct(Punct::Semicolon)?;

        let start = self.state.current_line();
        let test = self.parse_condition()?;
        self.expect_punct(Punct::Semicolon)?;
        let increment = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(self.parse_simple_construct()?)
        };
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;

        let mut frame = LoopFrame {
            kind: LoopKind::For,
            start,
            increment,
        };
        self.push_test(test, frame.exit_label(), span);
        self.state.define_label_at(frame.entry_label(), start, span);

        self.parse_block_body()?;
        let close = self.expect_punct(Punct::RBrace)?;
        if let Some(increment) = frame.increment.take() {
            self.state.push_fragment(increment);
        }
        self.close_loop(&frame, close);
        Ok(())
    }

    /// Jump back to the loop head; the exit lands just after it.
    fn close_loop(&mut self, frame: &LoopFrame, span: Span) {
        let jump = self.state.push_fragment(vec![OP_JUMP, 0x00, 0x00]);
        self.state.register_jump(frame.entry_label(), jump, span);
        self.state.define_label_at(frame.exit_label(), jump + 1, span);
    }
}
