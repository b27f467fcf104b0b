//! CLI: validate documents against a schema, or inspect a compiled schema.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::debug;

use crate::prep::{documents_from_source, parse_with_path, PrepOptions};
use crate::schema::Schema;
use crate::validate::validate;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a draft-4 schema
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate documents and emit a JSON report per document
    Validate(ValidateArgs),
    /// compile a schema and print the condensed view the compiler understood
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq pre-process filter for each document
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct CommonSettings {
    /// Debugging: print CLI invocation settings and then terminate
    #[arg(long)]
    no_op: bool,

    /// Debugging: track elapsed time and then print to stderr
    #[arg(long)]
    track_time: bool,

    /// Debugging: disable parallelization
    #[arg(long)]
    no_parallel: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// schema file
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json report file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    common_settings: CommonSettings,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// schema file
    #[arg(long, short)]
    schema: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn prep_options(&self) -> PrepOptions {
        PrepOptions {
            ndjson: self.ndjson,
            json_pointer: self.json_pointer.clone(),
            jq_expr: self.jq_expr.clone(),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        let start = std::time::Instant::now();
        let mut print_elapsed_time = false;

        let code = match &self.cmd {
            Command::Validate(target) => {
                // - DEBUG PATH -
                if target.common_settings.no_op {
                    let sources = resolve_file_path_patterns(&target.input_settings.input)?;
                    eprintln!("{self:#?}");
                    eprintln!("RESOLVED SOURCES:");
                    for source in sources {
                        eprintln!("\t- {}", source.to_string_lossy());
                    }
                    return Ok(ExitCode::SUCCESS);
                }
                if target.common_settings.track_time {
                    print_elapsed_time = true;
                }
                run_validate(target)?
            }
            Command::Inspect(target) => {
                let schema = load_schema(&target.schema)?;
                let condensed = serde_json::to_string_pretty(&schema.condensed())?;
                write_output(target.out.as_deref(), &condensed)?;
                ExitCode::SUCCESS
            }
        };

        if print_elapsed_time {
            let elapsed = start.elapsed();
            eprintln!("validation took {}", format_duration(elapsed));
        }
        Ok(code)
    }
}

fn run_validate(target: &ValidateArgs) -> Result<ExitCode> {
    let schema = load_schema(&target.schema)?;
    let sources = resolve_file_path_patterns(&target.input_settings.input)?;
    let opts = target.input_settings.prep_options();

    // MAP: one entry list per source file; the compiled schema is shared
    // read-only across workers
    let per_source: Vec<Result<Vec<Value>>> = if target.common_settings.no_parallel {
        sources.iter().map(|path| validate_source(&schema, path, &opts)).collect()
    } else {
        sources.par_iter().map(|path| validate_source(&schema, path, &opts)).collect()
    };

    // REDUCE: flatten, surface the first load failure
    let mut entries = Vec::new();
    for result in per_source {
        entries.extend(result?);
    }

    let mut all_valid = true;
    for entry in &entries {
        if entry["valid"] != true {
            all_valid = false;
            if let Some(lines) = entry["messages"].as_array() {
                for line in lines {
                    if let Some(line) = line.as_str() {
                        eprintln!("{}: {line}", entry["source"].as_str().unwrap_or("?"));
                    }
                }
            }
        }
    }

    let report = serde_json::to_string_pretty(&Value::Array(entries))?;
    write_output(target.out.as_deref(), &report)?;

    Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn validate_source(schema: &Schema, path: &Path, opts: &PrepOptions) -> Result<Vec<Value>> {
    let path_str = path.to_string_lossy().to_string();
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file {path_str}"))?;
    let documents = documents_from_source(&src, &path_str, opts)?;
    debug!(source = %path_str, documents = documents.len(), "validating");

    let mut entries = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let report = validate(schema, document);
        let messages: Vec<Value> =
            report.errors().iter().map(|e| Value::from(e.to_string())).collect();
        entries.push(json!({
            "source": path_str,
            "index": index,
            "valid": report.valid(),
            "errors": report.to_json(),
            "messages": messages,
        }));
    }
    Ok(entries)
}

fn load_schema(path: &Path) -> Result<Schema> {
    let path_str = path.to_string_lossy().to_string();
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {path_str}"))?;
    let doc: Value = parse_with_path(&src)
        .map_err(|e| anyhow::anyhow!("failed to parse schema file ({path_str}): {e}"))?;
    Schema::compile(&doc).with_context(|| format!("failed to compile schema {path_str}"))
}

fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, content)?;
        }
        None => println!("{content}"),
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
