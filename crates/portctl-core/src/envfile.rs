//! Lenient `KEY=VALUE` parsing for `.env` files and the ports artifact.
//!
//! Lines without `=` are skipped silently. Strict checking of the artifact
//! lives in [`crate::validator::check_syntax`].

use crate::error::Result;
use crate::io;
use std::collections::BTreeMap;
use std::path::Path;

/// A single `KEY=VALUE` line, with the value unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
    /// 1-based line number in the source text.
    pub line: usize,
}

/// Parse `KEY=VALUE` lines. Comments, blank lines and lines without `=` are
/// skipped. An optional `export ` prefix is accepted. A quoted value keeps
/// only the text between its quotes; an unquoted value ends at a ` #` comment.
pub fn parse_assignments(content: &str) -> Vec<Assignment> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some(Assignment {
                key: key.to_string(),
                value: clean_value(value).to_string(),
                line: idx + 1,
            })
        })
        .collect()
}

fn clean_value(value: &str) -> &str {
    let value = value.trim();
    if let Some(q) = value.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        if let Some(end) = value[1..].find(q) {
            return &value[1..1 + end];
        }
    }
    // `#` starts a comment only after whitespace, as in the shell.
    let bytes = value.as_bytes();
    match (1..bytes.len()).find(|&i| bytes[i] == b'#' && bytes[i - 1].is_ascii_whitespace()) {
        Some(i) => value[..i].trim_end(),
        None => value,
    }
}

/// Fold assignments into a map. Later keys overwrite earlier ones.
pub fn to_map(assignments: Vec<Assignment>) -> BTreeMap<String, String> {
    assignments.into_iter().map(|a| (a.key, a.value)).collect()
}

/// Load a project `.env`, keeping only keys whose name contains `PORT`.
/// A missing file yields an empty map.
pub fn load_dotenv(path: &Path) -> Result<BTreeMap<String, String>> {
    let Some(content) = io::read_optional(path)? else {
        return Ok(BTreeMap::new());
    };
    Ok(to_map(
        parse_assignments(&content)
            .into_iter()
            .filter(|a| a.key.contains("PORT"))
            .collect(),
    ))
}

/// Load the ports artifact. A missing file yields an empty map.
pub fn load_artifact(path: &Path) -> Result<BTreeMap<String, String>> {
    let Some(content) = io::read_optional(path)? else {
        return Ok(BTreeMap::new());
    };
    Ok(to_map(parse_assignments(&content)))
}
