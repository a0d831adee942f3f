// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Batch driver: reads each input file, compiles it and writes the block.

use super::*;

use std::sync::Arc;

/// Compile each input in order. A failed file does not stop the batch.
pub(super) fn run_batch(config: &CliConfig) -> BatchReport {
    let compiler = Compiler::new(
        config.dialect,
        CompileOptions {
            legacy_descumm: config.legacy_descumm,
        },
    );
    tracing::info!(
        dialect = config.dialect.name(),
        legacy = config.legacy_descumm,
        files = config.input_paths.len(),
        "starting batch"
    );

    let mut report = BatchReport::default();
    for input in &config.input_paths {
        let outcome = run_one(&compiler, input, config);
        if let Err(err) = &outcome {
            tracing::debug!(input = %input.display(), error = %err, "compile failed");
        }
        report.outcomes.push(outcome);
    }
    report
}

fn io_error(msg: &str, path: &Path, err: &std::io::Error) -> RunError {
    RunError::new(
        ScummError::new(
            ScummErrorKind::Io,
            &format!("{msg} {}", path.display()),
            Some(&err.to_string()),
        ),
        Vec::new(),
        Vec::new(),
    )
}

/// Output path: the explicit `-o` name, or the input with its extension
/// swapped for the block name.
fn output_path(input: &Path, explicit: Option<&Path>, block_name: &str) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input.with_extension(block_name),
    }
}

/// Tie a compiler diagnostic to its file and the source line it points at.
fn locate(diag: Diagnostic, input_name: &str, source_lines: &[String]) -> Diagnostic {
    let line_text = (diag.line() as usize)
        .checked_sub(1)
        .and_then(|idx| source_lines.get(idx))
        .cloned();
    diag.with_file(Some(input_name.to_string()))
        .with_source(line_text)
}

fn run_one(compiler: &Compiler, input: &Path, config: &CliConfig) -> Result<RunReport, RunError> {
    let input_name = input.display().to_string();
    if !input.is_file() {
        return Err(RunError::new(
            ScummError::new(ScummErrorKind::Cli, "Invalid filename", Some(&input_name)),
            Vec::new(),
            Vec::new(),
        ));
    }

    let bytes = fs::read(input).map_err(|err| io_error("Cannot read", input, &err))?;
    let source = decode_latin1(&bytes);
    let source_lines: Arc<Vec<String>> = Arc::new(source.lines().map(str::to_string).collect());

    let script = match compiler.compile_source(&source) {
        Ok(script) => script,
        Err(diag) => {
            let error = diag.error.clone();
            let diag = locate(diag, &input_name, &source_lines);
            return Err(RunError::new(error, vec![diag], source_lines));
        }
    };
    let warnings: Vec<Diagnostic> = script
        .warnings()
        .iter()
        .cloned()
        .map(|diag| locate(diag, &input_name, &source_lines))
        .collect();

    let output = output_path(input, config.output.as_deref(), script.block_name());
    let bytes = script.to_bytes();
    fs::write(&output, &bytes).map_err(|err| io_error("Cannot write", &output, &err))?;
    tracing::info!(
        input = input_name.as_str(),
        output = %output.display(),
        block = script.block_name(),
        size = bytes.len(),
        warnings = warnings.len(),
        "wrote script block"
    );

    Ok(RunReport::new(
        input_name,
        output.display().to_string(),
        script.block_name(),
        bytes.len(),
        warnings,
        source_lines,
    ))
}
