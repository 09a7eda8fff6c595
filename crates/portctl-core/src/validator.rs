//! Static and conflict validation.
//!
//! `check_syntax` makes sure the artifact is plain `KEY=VALUE` assignments that
//! a shell can source without evaluating anything. `check_conflicts` looks at
//! the resolved mapping for out-of-range values, ports shared by several
//! variables and ports that something is already listening on.

use crate::envfile::{self, Assignment};
use crate::error::{PortsError, Result};
use crate::probe::PortProbe;
use crate::registry::{in_operating_range, MAX_PORT, MIN_PORT};
use crate::resolve::ResolvedPorts;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Static validation
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Check the artifact at `path`. Returns the parsed assignments on success.
/// A missing file is a filesystem error.
pub fn check_syntax(path: &Path) -> Result<Vec<Assignment>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| PortsError::filesystem(path, e))?;
    check_syntax_str(path, &content)
}

/// Same as [`check_syntax`] for content already in memory. `path` is only
/// used for error reporting.
pub fn check_syntax_str(path: &Path, content: &str) -> Result<Vec<Assignment>> {
    for (idx, raw) in content.lines().enumerate() {
        if let Err(message) = check_line(raw) {
            return Err(PortsError::ConfigSyntax {
                path: path.to_path_buf(),
                line: idx + 1,
                message,
            });
        }
    }
    Ok(envfile::parse_assignments(content))
}

fn check_line(raw: &str) -> std::result::Result<(), String> {
    let line = raw.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let Some((key, value)) = line.split_once('=') else {
        return Err("expected KEY=VALUE".to_string());
    };
    if !key_re().is_match(key) {
        return Err(format!("invalid key '{key}'"));
    }
    check_value(value)
}

/// Walk the value the way a POSIX shell would tokenise it, rejecting anything
/// that would be evaluated rather than assigned.
fn check_value(value: &str) -> std::result::Result<(), String> {
    if value.starts_with([' ', '\t']) {
        return Err("unexpected whitespace after '='".to_string());
    }

    let mut single = false;
    let mut double = false;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if single {
            if c == '\'' {
                single = false;
            }
            continue;
        }
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return Err("trailing backslash".to_string());
                }
            }
            '\'' if !double => single = true,
            '"' => double = !double,
            '$' => return Err("variable expansion is not supported".to_string()),
            '`' => return Err("command substitution is not supported".to_string()),
            ';' | '&' | '|' | '<' | '>' | '(' | ')' if !double => {
                return Err(format!("unsupported shell construct '{c}'"));
            }
            ' ' | '\t' if !double => {
                // Trailing comment is fine; a second word would run a command.
                while chars.next_if(|n| *n == ' ' || *n == '\t').is_some() {}
                return match chars.peek() {
                    None | Some('#') => Ok(()),
                    Some(_) => Err("unquoted whitespace in value".to_string()),
                };
            }
            _ => {}
        }
    }

    if single || double {
        return Err("unmatched quote".to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Conflict validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    OutOfRange,
    Duplicate,
    InUse,
}

impl ConflictKind {
    /// In-use conflicts are advisory; the others fail validation.
    pub fn is_failure(self) -> bool {
        !matches!(self, ConflictKind::InUse)
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::OutOfRange => write!(f, "out-of-range"),
            ConflictKind::Duplicate => write!(f, "duplicate"),
            ConflictKind::InUse => write!(f, "in-use"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    /// Affected variables. Duplicates list every variable sharing the port.
    pub variables: Vec<String>,
    pub port: u32,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    /// False when no probe was given or the probe could not answer.
    pub in_use_checked: bool,
}

impl ConflictReport {
    pub fn is_pass(&self) -> bool {
        !self.conflicts.iter().any(|c| c.kind.is_failure())
    }

    pub fn of_kind(&self, kind: ConflictKind) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }
}

fn out_of_range(variables: Vec<String>, port: u32) -> Conflict {
    Conflict {
        kind: ConflictKind::OutOfRange,
        variables,
        port,
        detail: format!("port {port} is outside {MIN_PORT}-{MAX_PORT}"),
    }
}

fn in_use(variables: Vec<String>, port: u32, probe: &str) -> Conflict {
    Conflict {
        kind: ConflictKind::InUse,
        variables,
        port,
        detail: format!("port {port} is already in use ({probe})"),
    }
}

/// Check the resolved mapping. Pass `None` for `probe` to skip the in-use check.
pub fn check_conflicts(resolved: &ResolvedPorts, probe: Option<&dyn PortProbe>) -> ConflictReport {
    let mut conflicts = Vec::new();

    for p in resolved.iter() {
        if !in_operating_range(p.port) {
            conflicts.push(out_of_range(vec![p.name.clone()], p.port));
        }
    }

    let mut by_port: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for p in resolved.iter() {
        by_port.entry(p.port).or_default().push(p.name.clone());
    }
    for (port, names) in by_port.iter().filter(|(_, names)| names.len() > 1) {
        conflicts.push(Conflict {
            kind: ConflictKind::Duplicate,
            variables: names.clone(),
            port: *port,
            detail: format!("port {port} is assigned to {}", names.join(", ")),
        });
    }

    let mut in_use_checked = false;
    if let Some(probe) = probe {
        for (port, names) in &by_port {
            let Ok(port16) = u16::try_from(*port) else {
                continue;
            };
            if !in_operating_range(*port) {
                continue;
            }
            match probe.in_use(port16) {
                Some(true) => {
                    in_use_checked = true;
                    conflicts.push(in_use(names.clone(), *port, probe.name()));
                }
                Some(false) => in_use_checked = true,
                None => {}
            }
        }
        if !in_use_checked {
            tracing::warn!(probe = probe.name(), "in-use check skipped: probe could not inspect sockets");
        }
    }

    ConflictReport {
        conflicts,
        in_use_checked,
    }
}

/// Range and in-use check for a single port.
pub fn check_port(port: u32, probe: Option<&dyn PortProbe>) -> ConflictReport {
    let mut report = ConflictReport::default();
    if !in_operating_range(port) {
        report.conflicts.push(out_of_range(vec![], port));
        return report;
    }
    if let (Some(probe), Ok(port16)) = (probe, u16::try_from(port)) {
        match probe.in_use(port16) {
            Some(true) => {
                report.in_use_checked = true;
                report.conflicts.push(in_use(vec![], port, probe.name()));
            }
            Some(false) => report.in_use_checked = true,
            None => {}
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
