// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use scummbler::compiler::cli::{validate_cli, Cli};
use scummbler::compiler::{run_with_cli, BatchReport};
use scummbler::core::error::ScummErrorKind;

fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join(format!("it-{label}-{}-{nanos}", process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn run(args: &[&str]) -> BatchReport {
    let cli = Cli::parse_from(args);
    let config = validate_cli(&cli).expect("valid invocation");
    run_with_cli(&config)
}

#[test]
fn directory_batch_names_outputs_by_block() {
    let dir = unique_temp_dir("batch");
    fs::write(
        dir.join("global.txt"),
        "[0000] (80) breakHere();\n[0001] (A0) stopObjectCode();\n",
    )
    .expect("write global");
    fs::write(dir.join("local.txt"), "Script# 210\n[0000] (80) breakHere();\n")
        .expect("write local");
    fs::write(dir.join("readme.md"), "not a script").expect("write readme");

    let dir_arg = arg(&dir);
    let report = run(&["scummbler", "-v", "4", "--format", "text", dir_arg.as_str()]);
    assert_eq!(report.outcomes().len(), 2);
    assert_eq!(report.exit_code(), 0);

    assert_eq!(
        fs::read(dir.join("global.SC")).expect("global output"),
        vec![8, 0, 0, 0, b'S', b'C', 0x80, 0xA0]
    );
    assert_eq!(
        fs::read(dir.join("local.LS")).expect("local output"),
        vec![8, 0, 0, 0, b'L', b'S', 210, 0x80]
    );
    assert!(!dir.join("readme.SC").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn explicit_output_name_and_failed_file() {
    let dir = unique_temp_dir("single");
    let input = dir.join("room.txt");
    let output = dir.join("custom.bin");
    fs::write(&input, "#script-type entry\nstopObjectCode()\n").expect("write input");

    let (output_arg, input_arg) = (arg(&output), arg(&input));
    let report = run(&["scummbler", "-o", output_arg.as_str(), input_arg.as_str()]);
    let written = report.outcomes()[0].as_ref().expect("compiles");
    assert_eq!(written.block_name(), "ENCD");
    assert_eq!(
        fs::read(&output).expect("custom output"),
        vec![b'E', b'N', b'C', b'D', 0, 0, 0, 9, 0x00]
    );

    let broken = dir.join("broken.txt");
    fs::write(&broken, "breakHere()\n}\n").expect("write broken");
    let broken_arg = arg(&broken);
    let report = run(&["scummbler", "-v", "5", broken_arg.as_str(), input_arg.as_str()]);
    let failed = report.outcomes()[0].as_ref().expect_err("broken fails");
    assert_eq!(failed.kind(), ScummErrorKind::Syntax);
    assert_eq!(failed.diagnostics()[0].line(), 2);
    assert_eq!(failed.source_lines(), ["breakHere()", "}"]);
    assert!(!dir.join("broken.SCRP").exists());
    assert!(report.outcomes()[1].is_ok());
    assert_eq!(report.exit_code(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn output_name_conflicts_with_multiple_inputs() {
    let cli = Cli::parse_from(["scummbler", "-o", "out.bin", "a.txt", "b.txt"]);
    let err = validate_cli(&cli).expect_err("invalid invocation");
    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        err.to_string(),
        "You cannot specify an output file name when you have multiple input files."
    );
}
