// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

use crate::core::dialect::Dialect;
use crate::core::error::{RunError, ScummError, ScummErrorKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Compiler for SCUMM V3old, V3, V4 and V5 scripts.

Each INPUT is a script in the text format written by descumm. A directory
INPUT compiles every .txt file inside it. Output files take the input name
with the extension replaced by the script block name (SCRP, LSCR, VERB, ENCD,
EXCD for V5; SC, LS, OC, EN, EX for older versions) unless -o is given.

Environment defaults: SCUMMBLER_SCRIPT_VERSION, SCUMMBLER_LEGACY_DESCUMM,
SCUMMBLER_FORMAT and SCUMMBLER_LOG_LEVEL. Explicit flags win.";

const SCRIPT_EXTENSION: &str = "txt";

#[derive(Parser, Debug)]
#[command(
    name = "scummbler",
    version = VERSION,
    about = "SCUMM script compiler (V3old/V3/V4/V5)",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'v',
        long = "script-version",
        value_enum,
        value_name = "VERSION",
        long_help = "Target SCUMM version of the scripts: 3old, 3, 4 or 5. Defaults to 5."
    )]
    pub script_version: Option<Dialect>,
    #[arg(
        short = 'l',
        long = "legacy-descumm",
        action = ArgAction::SetTrue,
        long_help = "Accept the output of older descumm releases: optional override parentheses, a missing classOfIs parenthesis, extra closing parentheses and ^NNN string escapes."
    )]
    pub legacy_descumm: bool,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        long_help = "Output file name. Only valid with a single input file."
    )]
    pub output: Option<PathBuf>,
    #[arg(
        long = "format",
        value_enum,
        long_help = "Select diagnostic output format. text is default; json writes one object per diagnostic."
    )]
    pub format: Option<OutputFormat>,
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        long_help = "Tracing verbosity on stderr: error, warn, info, debug or trace. Defaults to warn."
    )]
    pub log_level: Option<String>,
    #[arg(value_name = "INPUT", long_help = "Script files or directories to compile.")]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn cli_error(message: impl Into<String>) -> RunError {
    RunError::new(
        ScummError::new(ScummErrorKind::Cli, &message.into(), None),
        Vec::new(),
        Vec::new(),
    )
}

fn parse_env_bool(var_name: &str) -> Result<Option<bool>, RunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    let parsed = match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            return Err(cli_error(format!(
                "Invalid boolean value for {var_name}: {value}"
            )))
        }
    };
    Ok(parsed)
}

fn parse_env_string(var_name: &str) -> Result<Option<String>, RunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

fn parse_env_dialect(var_name: &str) -> Result<Option<Dialect>, RunError> {
    let Some(value) = parse_env_string(var_name)? else {
        return Ok(None);
    };
    Dialect::parse(&value)
        .map(Some)
        .ok_or_else(|| cli_error(format!("Invalid script version for {var_name}: {value}")))
}

fn parse_env_format(var_name: &str) -> Result<Option<OutputFormat>, RunError> {
    let Some(value) = parse_env_string(var_name)? else {
        return Ok(None);
    };
    OutputFormat::from_str(&value, true)
        .map(Some)
        .map_err(|_| cli_error(format!("Invalid output format for {var_name}: {value}")))
}

fn parse_level(value: &str) -> Result<Level, RunError> {
    value
        .parse::<Level>()
        .map_err(|_| cli_error(format!("Invalid log level: {value}")))
}

/// Script files inside `dir`, sorted by name.
fn scripts_in_dir(dir: &Path) -> Result<Vec<PathBuf>, RunError> {
    let entries = fs::read_dir(dir).map_err(|err| {
        RunError::new(
            ScummError::new(
                ScummErrorKind::Io,
                &format!("Cannot read directory {}", dir.display()),
                Some(&err.to_string()),
            ),
            Vec::new(),
            Vec::new(),
        )
    })?;
    let mut scripts: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SCRIPT_EXTENSION))
        })
        .collect();
    scripts.sort();
    Ok(scripts)
}

/// Validate CLI arguments and return parsed configuration.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, RunError> {
    let env_version = parse_env_dialect("SCUMMBLER_SCRIPT_VERSION")?;
    let env_legacy = parse_env_bool("SCUMMBLER_LEGACY_DESCUMM")?;
    let env_format = parse_env_format("SCUMMBLER_FORMAT")?;
    let env_log_level = parse_env_string("SCUMMBLER_LOG_LEVEL")?;

    let dialect = cli.script_version.or(env_version).unwrap_or_default();
    let legacy_descumm = if cli.legacy_descumm {
        true
    } else {
        env_legacy.unwrap_or(false)
    };
    let output_format = cli.format.or(env_format).unwrap_or_default();
    let log_level = match cli.log_level.as_deref().or(env_log_level.as_deref()) {
        Some(value) => parse_level(value)?,
        None => Level::WARN,
    };

    if cli.inputs.is_empty() {
        return Err(cli_error("No input files specified."));
    }
    let mut input_paths = Vec::new();
    let mut expanded_dir = false;
    for input in &cli.inputs {
        if input.is_dir() {
            expanded_dir = true;
            input_paths.extend(scripts_in_dir(input)?);
        } else {
            input_paths.push(input.clone());
        }
    }
    if cli.output.is_some() && (cli.inputs.len() > 1 || expanded_dir) {
        return Err(cli_error(
            "You cannot specify an output file name when you have multiple input files.",
        ));
    }

    Ok(CliConfig {
        input_paths,
        dialect,
        legacy_descumm,
        output: cli.output.clone(),
        output_format,
        log_level,
    })
}

/// Output format for reporting a failed validation. An unreadable
/// SCUMMBLER_FORMAT falls back to text.
pub fn error_format(cli: &Cli) -> OutputFormat {
    cli.format
        .or_else(|| parse_env_format("SCUMMBLER_FORMAT").ok().flatten())
        .unwrap_or_default()
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub input_paths: Vec<PathBuf>,
    pub dialect: Dialect,
    pub legacy_descumm: bool,
    pub output: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub log_level: Level,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::env;
    use std::ffi::OsString;
    use std::fs;
    use std::process;
    use std::sync::{Mutex, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    const ENV_VARS: [&str; 4] = [
        "SCUMMBLER_SCRIPT_VERSION",
        "SCUMMBLER_LEGACY_DESCUMM",
        "SCUMMBLER_FORMAT",
        "SCUMMBLER_LOG_LEVEL",
    ];

    fn with_env_vars(vars: &[(&str, Option<&str>)], test: impl FnOnce()) {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("lock env mutex");

        let saved: Vec<(String, Option<OsString>)> = vars
            .iter()
            .map(|(key, _)| (key.to_string(), env::var_os(key)))
            .collect();

        for (key, value) in vars {
            match value {
                Some(value) => {
                    // SAFETY: tests serialize env access via ENV_LOCK.
                    unsafe { env::set_var(key, value) }
                }
                None => {
                    // SAFETY: tests serialize env access via ENV_LOCK.
                    unsafe { env::remove_var(key) }
                }
            }
        }

        test();

        for (key, value) in saved {
            match value {
                Some(value) => {
                    // SAFETY: tests serialize env access via ENV_LOCK.
                    unsafe { env::set_var(key, value) }
                }
                None => {
                    // SAFETY: tests serialize env access via ENV_LOCK.
                    unsafe { env::remove_var(key) }
                }
            }
        }
    }

    /// Run `test` with every SCUMMBLER_* variable cleared except `vars`.
    fn with_clean_env(vars: &[(&str, &str)], test: impl FnOnce()) {
        let mut settings: Vec<(&str, Option<&str>)> =
            ENV_VARS.iter().map(|name| (*name, None)).collect();
        for (name, value) in vars {
            if let Some(slot) = settings.iter_mut().find(|(key, _)| key == name) {
                slot.1 = Some(value);
            }
        }
        with_env_vars(&settings, test);
    }

    fn create_temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("target")
            .join(format!("test-{label}-{}-{nanos}", process::id()));
        fs::create_dir_all(&dir).expect("Create temp dir");
        dir
    }

    #[test]
    fn cli_parses_flags_and_inputs() {
        let cli = Cli::parse_from([
            "scummbler",
            "-v",
            "3old",
            "-l",
            "-o",
            "out.SC",
            "--format",
            "json",
            "--log-level",
            "debug",
            "script.txt",
        ]);
        assert_eq!(cli.script_version, Some(Dialect::V3Old));
        assert!(cli.legacy_descumm);
        assert_eq!(cli.output, Some(PathBuf::from("out.SC")));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.inputs, vec![PathBuf::from("script.txt")]);
    }

    #[test]
    fn validate_cli_uses_defaults() {
        with_clean_env(&[], || {
            let cli = Cli::parse_from(["scummbler", "script.txt"]);
            let config = validate_cli(&cli).expect("validate cli");
            assert_eq!(config.dialect, Dialect::V5);
            assert!(!config.legacy_descumm);
            assert_eq!(config.output_format, OutputFormat::Text);
            assert_eq!(config.log_level, Level::WARN);
            assert_eq!(config.input_paths, vec![PathBuf::from("script.txt")]);
        });
    }

    #[test]
    fn validate_cli_rejects_missing_inputs() {
        with_clean_env(&[], || {
            let cli = Cli::parse_from(["scummbler"]);
            let err = validate_cli(&cli).unwrap_err();
            assert_eq!(err.to_string(), "No input files specified.");
            assert_eq!(err.exit_code(), 1);
        });
    }

    #[test]
    fn validate_cli_rejects_output_with_multiple_inputs() {
        with_clean_env(&[], || {
            let cli = Cli::parse_from(["scummbler", "-o", "x.SCRP", "a.txt", "b.txt"]);
            let err = validate_cli(&cli).unwrap_err();
            assert_eq!(
                err.to_string(),
                "You cannot specify an output file name when you have multiple input files."
            );
        });
    }

    #[test]
    fn validate_cli_applies_env_defaults_when_cli_not_set() {
        with_clean_env(
            &[
                ("SCUMMBLER_SCRIPT_VERSION", "4"),
                ("SCUMMBLER_LEGACY_DESCUMM", "yes"),
                ("SCUMMBLER_FORMAT", "json"),
                ("SCUMMBLER_LOG_LEVEL", "info"),
            ],
            || {
                let cli = Cli::parse_from(["scummbler", "script.txt"]);
                let config = validate_cli(&cli).expect("validate cli");
                assert_eq!(config.dialect, Dialect::V4);
                assert!(config.legacy_descumm);
                assert_eq!(config.output_format, OutputFormat::Json);
                assert_eq!(config.log_level, Level::INFO);
            },
        );
    }

    #[test]
    fn validate_cli_cli_values_override_env_values() {
        with_clean_env(
            &[
                ("SCUMMBLER_SCRIPT_VERSION", "4"),
                ("SCUMMBLER_FORMAT", "json"),
                ("SCUMMBLER_LOG_LEVEL", "info"),
            ],
            || {
                let cli = Cli::parse_from([
                    "scummbler",
                    "-v",
                    "3",
                    "--format",
                    "text",
                    "--log-level",
                    "trace",
                    "script.txt",
                ]);
                let config = validate_cli(&cli).expect("validate cli");
                assert_eq!(config.dialect, Dialect::V3);
                assert_eq!(config.output_format, OutputFormat::Text);
                assert_eq!(config.log_level, Level::TRACE);
            },
        );
    }

    #[test]
    fn error_format_follows_flag_then_env() {
        with_clean_env(&[("SCUMMBLER_FORMAT", "json")], || {
            let cli = Cli::parse_from(["scummbler"]);
            assert_eq!(error_format(&cli), OutputFormat::Json);
            let cli = Cli::parse_from(["scummbler", "--format", "text"]);
            assert_eq!(error_format(&cli), OutputFormat::Text);
        });
        with_clean_env(&[("SCUMMBLER_FORMAT", "yaml")], || {
            let cli = Cli::parse_from(["scummbler", "a.txt"]);
            assert_eq!(error_format(&cli), OutputFormat::Text);
            assert!(validate_cli(&cli).is_err());
        });
    }

    #[test]
    fn validate_cli_rejects_invalid_env_values() {
        with_clean_env(&[("SCUMMBLER_LEGACY_DESCUMM", "maybe")], || {
            let cli = Cli::parse_from(["scummbler", "script.txt"]);
            let err = validate_cli(&cli).expect_err("invalid env bool should fail");
            assert_eq!(
                err.to_string(),
                "Invalid boolean value for SCUMMBLER_LEGACY_DESCUMM: maybe"
            );
        });
        with_clean_env(&[("SCUMMBLER_SCRIPT_VERSION", "6")], || {
            let cli = Cli::parse_from(["scummbler", "script.txt"]);
            let err = validate_cli(&cli).expect_err("invalid env version should fail");
            assert!(err.to_string().contains("SCUMMBLER_SCRIPT_VERSION"));
        });
        with_clean_env(&[], || {
            let cli = Cli::parse_from(["scummbler", "--log-level", "loud", "script.txt"]);
            let err = validate_cli(&cli).expect_err("invalid level should fail");
            assert_eq!(err.to_string(), "Invalid log level: loud");
        });
    }

    #[test]
    fn directory_input_expands_to_sorted_scripts() {
        let dir = create_temp_dir("cli-dir");
        for name in ["b.txt", "a.TXT", "notes.md"] {
            fs::write(dir.join(name), "breakHere()\n").expect("write script");
        }
        with_clean_env(&[], || {
            let dir_arg = dir.to_string_lossy().to_string();
            let cli = Cli::parse_from(["scummbler", dir_arg.as_str()]);
            let config = validate_cli(&cli).expect("validate cli");
            assert_eq!(config.input_paths, vec![dir.join("a.TXT"), dir.join("b.txt")]);

            let cli = Cli::parse_from(["scummbler", "-o", "x.SCRP", dir_arg.as_str()]);
            assert!(validate_cli(&cli).is_err());
        });
        let _ = fs::remove_dir_all(&dir);
    }
}
