//! Document pre-processing for the CLI.
//!
//! One source file can yield many documents: NDJSON splits by line, a jq
//! filter may emit a stream, and a JSON pointer that selects an array is
//! expanded element-wise. Order is jq first, pointer second, so the pointer
//! addresses the filter's output.

use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct PrepOptions {
    /// Treat input as newline-delimited JSON.
    pub ndjson: bool,
    /// JSON pointer selecting a subnode of each document; arrays expand.
    pub json_pointer: Option<String>,
    /// jq filter applied to each document before pointer selection.
    pub jq_expr: Option<String>,
}

/// Parse one source file into the documents to validate.
pub fn documents_from_source(src: &str, source_name: &str, opts: &PrepOptions) -> Result<Vec<Value>> {
    let mut parsed = Vec::new();
    if opts.ndjson {
        for (i, line) in src.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)
                .with_context(|| format!("NDJSON parse error {source_name}:{}", i + 1))?;
            parsed.push(value);
        }
    } else {
        let value: Value = parse_with_path(src)
            .map_err(|e| anyhow!("JSON parse error ({source_name}): {e}"))?;
        parsed.push(value);
    }

    let mut out = Vec::new();
    for value in parsed {
        let filtered = match opts.jq_expr.as_deref() {
            None => vec![value],
            Some(expr) => apply_filter(expr, &value)
                .with_context(|| format!("jq filter failed ({source_name})"))?,
        };
        for item in filtered {
            match opts.json_pointer.as_deref() {
                None => out.push(item),
                Some(ptr) => match item.pointer(ptr) {
                    // nothing at this pointer in this document
                    None => {}
                    Some(Value::Array(elements)) => out.extend(elements.iter().cloned()),
                    Some(other) => out.push(other.clone()),
                },
            }
        }
    }
    Ok(out)
}

/// Deserialize with JSON-path context in error messages.
pub fn parse_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path}: {}", err.into_inner()))
        }
    }
}

/// Run a jq filter over one document, yielding its output stream as values.
pub(crate) fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let mut out = Vec::new();
    for item in filter.run((Ctx::new([], &inputs), Val::from(input.clone()))) {
        let val = item.map_err(|e| anyhow!(format!("{e:?}")))?;
        // Val: Display -> JSON text
        let value: Value = serde_json::from_str(&format!("{val}"))
            .map_err(|e| anyhow!("filter output is not JSON: {e}"))?;
        out.push(value);
    }
    Ok(out)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}
