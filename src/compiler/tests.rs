// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;
use proptest::prelude::*;

fn compile(dialect: Dialect, source: &str) -> CompiledScript {
    Compiler::new(dialect, CompileOptions::default())
        .compile_source(source)
        .unwrap_or_else(|diag| panic!("compile failed: {}", diag.message()))
}

fn body(dialect: Dialect, source: &str) -> Vec<u8> {
    compile(dialect, source).body().to_vec()
}

fn compile_err(dialect: Dialect, source: &str) -> Diagnostic {
    Compiler::new(dialect, CompileOptions::default())
        .compile_source(source)
        .expect_err("compile should fail")
}

#[test]
fn reference_vectors() {
    assert_eq!(
        body(Dialect::V4, "[0138] (05) drawObject(189,255,255);"),
        b"\x05\xBD\x00\xFF\x00\xFF\x00"
    );
    assert_eq!(
        body(Dialect::V4, "[0000] (27) PutCodeInString(24, );"),
        b"\x27\x01\x18\x00"
    );
    assert_eq!(body(Dialect::V4, "[0000] (6B) debug(1);"), b"\x6B\x01\x00");
    assert_eq!(
        body(Dialect::V5, "Local[0] += 7"),
        vec![0x5A, 0x00, 0x40, 0x07, 0x00]
    );
}

#[test]
fn global_script_block() {
    let script = compile(Dialect::V5, "[0000] (80) breakHere();\n[0001] (A0) stopObjectCode();\n");
    assert_eq!(script.script_type(), ScriptType::Global);
    assert_eq!(script.block_name(), "SCRP");
    assert_eq!(
        script.to_bytes(),
        vec![b'S', b'C', b'R', b'P', 0, 0, 0, 10, 0x80, 0xA0]
    );

    let script = compile(Dialect::V3Old, "breakHere()\nstopObjectCode()\n");
    assert_eq!(script.to_bytes(), vec![8, 0, 0, 0, b'S', b'C', 0x80, 0xA0]);
}

#[test]
fn entry_and_exit_scripts_use_the_short_stop() {
    let script = compile(Dialect::V5, "#script-type entry\nstopObjectCode()\n");
    assert_eq!(script.block_name(), "ENCD");
    assert_eq!(script.body(), &[0x00]);

    let script = compile(Dialect::V4, "#script-type exit\nstopObjectCode()\n");
    assert_eq!(script.block_name(), "EX");
    assert_eq!(script.body(), &[0x00]);
}

#[test]
fn backward_jump_lands_on_label() {
    assert_eq!(
        body(Dialect::V5, "[top] breakHere()\ngoto top\n"),
        vec![0x80, 0x18, 0xFC, 0xFF]
    );
}

#[test]
fn while_loop_end_to_end() {
    // test(7) body(3) jump(3): exit skips the body and the back jump
    assert_eq!(
        body(Dialect::V5, "while (Var[1] < 5) {\n Var[1]++\n}\n"),
        vec![
            0x78, 0x01, 0x00, 0x05, 0x00, 0x06, 0x00, 0x46, 0x01, 0x00, 0x18, 0xF3, 0xFF
        ]
    );
}

#[test]
fn v5_verb_script_maps_events_to_code_offsets() {
    let source = "Events:\n  0E - look\n  0F - use\n[look] (80) breakHere()\n(00) stopObjectCode()\n[use] (00) stopObjectCode()\n";
    let script = compile(Dialect::V5, source);
    assert_eq!(script.block_name(), "VERB");
    // header 8 + 2 entries + terminator = 15
    assert_eq!(
        script.header(),
        &[b'V', b'E', b'R', b'B', 0, 0, 0, 18, 0x0E, 15, 0, 0x0F, 17, 0, 0]
    );
    assert_eq!(script.body(), &[0x80, 0x00, 0x00]);
}

#[test]
fn v4_object_script_carries_object_data() {
    let source = r#"#object-data [id 400, x-pos 10, y-pos 20, parent-state 1, width 8,
        parent 2, walk-x 30, walk-y 40, height 17, actor-dir 3, name "key"]
        Events: 0A - use
        [use] breakHere()
        stopObjectCode()"#;
    let script = compile(Dialect::V4, source);
    assert_eq!(script.block_name(), "OC");
    assert_eq!(
        script.to_bytes(),
        vec![
            29, 0, 0, 0, b'O', b'C', 0x90, 0x01, 0x00, 10, 0x80 | 20, 8, 2, 30, 0, 40, 0,
            0x10 | 3, 23, 0x0A, 27, 0, 0, b'k', b'e', b'y', 0, 0x80, 0x00
        ]
    );
}

#[test]
fn local_script_block() {
    let script = compile(Dialect::V3, "Script# 205\nbreakHere()\n");
    assert_eq!(script.block_name(), "LS");
    assert_eq!(script.to_bytes(), vec![8, 0, 0, 0, b'L', b'S', 205, 0x80]);
}

#[test]
fn verb_script_without_events_is_rejected() {
    let diag = compile_err(Dialect::V5, "#script-type verb\nstopObjectCode()\n");
    assert_eq!(diag.message(), "An object/verb script must have an event table.");
    assert_eq!(diag.kind(), ScummErrorKind::Compile);
}

#[test]
fn diagnostics_point_at_the_offending_token() {
    let diag = compile_err(Dialect::V5, "breakHere()\ngoto missing\n");
    assert_eq!(diag.message(), "Label does not exist: missing");
    assert_eq!(diag.line(), 2);
    assert_eq!(diag.column(), Some(1));

    let diag = compile_err(Dialect::V5, "[a] breakHere()\n[a] breakHere()\n");
    assert_eq!(diag.message(), "Duplicate label declaration on line 1: a");
    assert_eq!(diag.line(), 2);

    let diag = compile_err(Dialect::V4, "Var[1] = getObjectState(3)\n");
    assert_eq!(diag.kind(), ScummErrorKind::Unsupported);
    assert_eq!(diag.code(), "scm202");
    assert_eq!(diag.help().len(), 1);
}

#[test]
fn duplicate_event_keeps_the_later_label_and_warns() {
    let source = "Events:\n  0E - look\n  0E - use\n[look] (80) breakHere()\n[use] (00) stopObjectCode()\n";
    let script = compile(Dialect::V5, source);
    assert_eq!(
        script.header(),
        &[b'V', b'E', b'R', b'B', 0, 0, 0, 14, 0x0E, 13, 0, 0]
    );

    let warnings = script.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity(), Severity::Warning);
    assert_eq!(warnings[0].line(), 3);
    assert_eq!(warnings[0].column(), Some(3));
    assert_eq!(warnings[0].message(), "Event 0E is declared twice; using label use");

    assert!(compile(Dialect::V5, "Events: 0E - look\n[look] breakHere()\n")
        .warnings()
        .is_empty());
}

#[test]
fn loop_body_beyond_jump_range_is_rejected() {
    // 6554 five-byte assignments plus the 3-byte back jump
    let mut source = String::from("while (Var[1] < 5) {\n");
    for _ in 0..6554 {
        source.push_str("Var[2] = 1000\n");
    }
    source.push_str("}\n");

    let diag = compile_err(Dialect::V5, &source);
    assert_eq!(diag.kind(), ScummErrorKind::Compile);
    assert!(diag.message().starts_with("Jump is too large: 32773"));
    assert_eq!(diag.line(), 1);
    assert_eq!(diag.column(), Some(1));
}

#[test]
fn string_tokens_are_echoed_with_their_quotes() {
    let diag = compile_err(Dialect::V5, "Var[1] = 'y'\n");
    assert_eq!(diag.message(), "Expected a value, found 'y'");

    let diag = compile_err(Dialect::V5, "Var[1] = \"y\"\n");
    assert_eq!(diag.message(), "Expected a value, found \"y\"");
}

#[test]
fn compile_bytes_keeps_high_bytes_in_strings() {
    let script = Compiler::new(Dialect::V5, CompileOptions::default())
        .compile_bytes(b"setObjectName(1, \"\xE9t\xE9\")\n")
        .expect("compiles");
    assert_eq!(script.body(), &[0x54, 0x01, 0x00, 0xE9, b't', 0xE9, 0x00]);
}

#[test]
fn legacy_mode_accepts_old_descumm_quirks() {
    let legacy = Compiler::new(
        Dialect::V5,
        CompileOptions {
            legacy_descumm: true,
        },
    );
    let script = legacy
        .compile_source("beginOverride\nstartScript(5, [])\nendOverride\n")
        .expect("legacy compiles");
    assert_eq!(script.body(), &[0x58, 0x01, 0x0A, 0x05, 0xFF, 0x58, 0x00]);

    let diag = compile_err(Dialect::V5, "beginOverride\n");
    assert_eq!(diag.kind(), ScummErrorKind::Syntax);
}

fn var_source(kind: usize, n: u32) -> (String, u16) {
    match kind {
        0 => (format!("Var[{n}]"), (n & 0x1FFF) as u16),
        1 => (format!("Local[{n}]"), 0x4000 | (n & 0xFF) as u16),
        _ => (format!("Bit[{n}]"), 0x8000 | (n & 0x7FFF) as u16),
    }
}

proptest! {
    #[test]
    fn presence_bits_mark_variable_arguments(
        args in prop::collection::vec((any::<bool>(), 0u32..200), 3),
    ) {
        let mut expected_op = 0x01u8;
        let mut expected_args = Vec::new();
        let mut text = Vec::new();
        for (idx, (is_var, value)) in args.iter().enumerate() {
            let bit = 0x80u8 >> idx;
            if *is_var {
                expected_op |= bit;
                text.push(format!("Var[{value}]"));
                expected_args.extend_from_slice(&(*value as u16).to_le_bytes());
            } else {
                text.push(value.to_string());
                if idx == 0 {
                    expected_args.push(*value as u8);
                } else {
                    expected_args.extend_from_slice(&(*value as u16).to_le_bytes());
                }
            }
        }
        let source = format!("putActor({})", text.join(", "));
        let bytes = body(Dialect::V5, &source);
        prop_assert_eq!(bytes[0], expected_op);
        prop_assert_eq!(&bytes[1..], expected_args.as_slice());
    }

    #[test]
    fn variable_addresses_encode_little_endian(kind in 0usize..3, n in 0u32..0x2000) {
        let (name, address) = var_source(kind, n);
        let bytes = body(Dialect::V5, &format!("Var[1] = {name}"));
        let mut expected = vec![0x9A, 0x01, 0x00];
        expected.extend_from_slice(&address.to_le_bytes());
        prop_assert_eq!(bytes, expected);
    }

    #[test]
    fn word_literals_cover_the_signed_and_unsigned_range(value in -32768i64..=65535) {
        let bytes = body(Dialect::V5, &format!("Var[1] = {value}"));
        let word = (value as i32 as u32 & 0xFFFF) as u16;
        let mut expected = vec![0x1A, 0x01, 0x00];
        expected.extend_from_slice(&word.to_le_bytes());
        prop_assert_eq!(bytes, expected);
    }
}
