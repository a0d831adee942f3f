// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for scummbler.

use std::io;

use clap::Parser;

use scummbler::compiler::cli::{error_format, validate_cli, Cli, OutputFormat};
use scummbler::core::error::{Diagnostic, RunError, ScummError, Severity};
use scummbler::core::report::diagnostic_json;

fn format_diagnostic_line(
    diag: &Diagnostic,
    source_lines: Option<&[String]>,
    use_color: bool,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => diagnostic_json(diag).to_string(),
        OutputFormat::Text => diag.format_with_context(source_lines, use_color),
    }
}

/// Errors without a source position (bad file name, unreadable input)
/// still get one diagnostic so JSON consumers see every failure.
fn fallback_diagnostic(err: &RunError) -> Diagnostic {
    Diagnostic::new(
        0,
        Severity::Error,
        ScummError::new(err.kind(), err.message(), None),
    )
}

/// Lines to print on stderr for a failed file or invocation.
fn error_lines(err: &RunError, use_color: bool, format: OutputFormat) -> Vec<String> {
    if err.diagnostics().is_empty() {
        return match format {
            OutputFormat::Json => vec![format_diagnostic_line(
                &fallback_diagnostic(err),
                None,
                use_color,
                format,
            )],
            OutputFormat::Text => vec![err.to_string()],
        };
    }
    err.diagnostics()
        .iter()
        .map(|diag| format_diagnostic_line(diag, Some(err.source_lines()), use_color, format))
        .collect()
}

fn emit_error(err: &RunError, use_color: bool, format: OutputFormat) {
    for line in error_lines(err, use_color, format) {
        eprintln!("{line}");
    }
}

fn main() {
    let cli = Cli::parse();
    let use_color = std::env::var("NO_COLOR").is_err();
    let cli_config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            emit_error(&err, use_color, error_format(&cli));
            std::process::exit(err.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(cli_config.log_level)
        .with_writer(io::stderr)
        .init();

    let batch = scummbler::compiler::run_with_cli(&cli_config);
    for outcome in batch.outcomes() {
        match outcome {
            Ok(report) => {
                for diag in report.diagnostics() {
                    eprintln!(
                        "{}",
                        format_diagnostic_line(
                            diag,
                            Some(report.source_lines()),
                            use_color,
                            cli_config.output_format,
                        )
                    );
                }
            }
            Err(err) => emit_error(err, use_color, cli_config.output_format),
        }
    }
    std::process::exit(batch.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use scummbler::core::error::ScummErrorKind;

    #[test]
    fn format_diagnostic_line_json_has_expected_keys_with_nulls() {
        let diag = Diagnostic::new(
            7,
            Severity::Error,
            ScummError::new(ScummErrorKind::Compile, "boom", None),
        )
        .with_code("scm999");
        let line = format_diagnostic_line(&diag, None, false, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["code"], "scm999");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "boom");
        assert_eq!(value["line"], 7);
        assert!(value["file"].is_null());
        assert!(value["col_start"].is_null());
        assert!(value["col_end"].is_null());
        assert!(value["notes"].is_array());
        assert!(value["help"].is_array());
    }

    #[test]
    fn fallback_diagnostic_keeps_kind_and_message() {
        let err = RunError::new(
            ScummError::new(ScummErrorKind::Cli, "Invalid filename", Some("nope.txt")),
            Vec::new(),
            Vec::new(),
        );
        let diag = fallback_diagnostic(&err);
        assert_eq!(diag.message(), "Invalid filename: nope.txt");
        assert_eq!(diag.kind(), ScummErrorKind::Cli);
        assert_eq!(diag.line(), 0);
    }

    #[test]
    fn invocation_errors_follow_the_requested_format() {
        let cli = Cli::parse_from([
            "scummbler", "--format", "json", "-o", "x.bin", "a.txt", "b.txt",
        ]);
        let err = validate_cli(&cli).expect_err("conflicting output name");

        let lines = error_lines(&err, false, error_format(&cli));
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).expect("valid json");
        assert_eq!(value["code"], "scm101");
        assert_eq!(value["severity"], "error");
        assert_eq!(
            value["message"],
            "You cannot specify an output file name when you have multiple input files."
        );

        let lines = error_lines(&err, false, OutputFormat::Text);
        assert_eq!(
            lines,
            ["You cannot specify an output file name when you have multiple input files."]
        );
    }
}
