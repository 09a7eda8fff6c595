//! Discovery of hardcoded ports in a project tree.
//!
//! The scanner walks the tree, looks at files that usually carry network
//! addresses (scripts, env/config files, build files, manifests, JS/TS
//! sources) and reports every `:NNNN` literal that has not already been moved
//! behind a `PORT` variable. It never writes.

use crate::error::{PortsError, Result};
use crate::paths;
use crate::registry::{PortBinding, MAX_PORT};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into.
pub const DENIED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".turbo",
    "target",
    ".devops",
];

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static CANDIDATE_RE: OnceLock<Regex> = OnceLock::new();
static LITERAL_RE: OnceLock<Regex> = OnceLock::new();
static MIGRATED_RE: OnceLock<Regex> = OnceLock::new();
static FRONTEND_HINT_RE: OnceLock<Regex> = OnceLock::new();
static BACKEND_HINT_RE: OnceLock<Regex> = OnceLock::new();
static AUTOMATION_HINT_RE: OnceLock<Regex> = OnceLock::new();

fn candidate_re() -> &'static Regex {
    CANDIDATE_RE.get_or_init(|| {
        Regex::new(
            r"^(?:.+\.(?:sh|bash|env|conf|config|ini|ya?ml|toml|js|cjs|mjs|ts|jsx|tsx)|\.env(?:\..+)?|Dockerfile.*|docker-compose.*|Makefile|Procfile|package\.json)$",
        )
        .unwrap()
    })
}

fn literal_re() -> &'static Regex {
    LITERAL_RE.get_or_init(|| Regex::new(r":([0-9]+)").unwrap())
}

fn migrated_re() -> &'static Regex {
    MIGRATED_RE.get_or_init(|| Regex::new(r"\$\{?[A-Za-z0-9_]*PORT|PORT=").unwrap())
}

fn frontend_hint_re() -> &'static Regex {
    FRONTEND_HINT_RE.get_or_init(|| Regex::new(r"(?i)frontend|client").unwrap())
}

fn backend_hint_re() -> &'static Regex {
    BACKEND_HINT_RE.get_or_init(|| Regex::new(r"(?i)backend|server").unwrap())
}

fn automation_hint_re() -> &'static Regex {
    AUTOMATION_HINT_RE.get_or_init(|| Regex::new(r"(?i)automation|workflow").unwrap())
}

/// Whether a file name is one the scanner examines.
pub fn is_candidate(file_name: &str) -> bool {
    !paths::OWN_SCRIPTS.contains(&file_name) && candidate_re().is_match(file_name)
}

fn is_denied_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| DENIED_DIRS.contains(&name))
}

/// Port literals on a single line. Lines that already reference a port
/// variable (`$API_PORT`, `${PORT}`, `PORT=...`) yield nothing.
pub fn scan_line(line: &str) -> Vec<u32> {
    if migrated_re().is_match(line) {
        return Vec::new();
    }
    literal_re()
        .captures_iter(line)
        .filter_map(|c| {
            let digits = c.get(1)?.as_str();
            if !(4..=5).contains(&digits.len()) {
                return None;
            }
            digits
                .parse::<u32>()
                .ok()
                .filter(|p| (1..=MAX_PORT).contains(p))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How a variable name was chosen for a literal port. Strategies are tried in
/// [`Strategy::ORDER`]; the first that yields a name wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    WellKnown,
    KeywordHint,
    Synthesized,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [
        Strategy::WellKnown,
        Strategy::KeywordHint,
        Strategy::Synthesized,
    ];

    pub fn apply(self, port: u32, line: &str) -> Option<String> {
        match self {
            Strategy::WellKnown => well_known(port).map(str::to_string),
            Strategy::KeywordHint => keyword_hint(line).map(str::to_string),
            Strategy::Synthesized => Some(format!("PORT_{port}")),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::WellKnown => write!(f, "well-known"),
            Strategy::KeywordHint => write!(f, "keyword"),
            Strategy::Synthesized => write!(f, "synthesized"),
        }
    }
}

fn well_known(port: u32) -> Option<&'static str> {
    match port {
        3000 | 3001 => Some("FRONTEND_PORT"),
        3030 | 8000 | 8080 => Some("BACKEND_PORT"),
        7070 => Some("AUTOMATION_PORT"),
        9090 | 9091 => Some("METRICS_PORT"),
        3100 => Some("LOKI_PORT"),
        3200 => Some("TEMPO_PORT"),
        4318 => Some("OTEL_PORT"),
        _ => None,
    }
}

/// Split `line` into lowercase words. `_`, punctuation and lower-to-upper
/// case changes all start a new word, so `VITE_UI_HOST` and `apiUrl` yield
/// `ui` and `api` while `build` stays a single word.
fn words(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in line.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn keyword_hint(line: &str) -> Option<&'static str> {
    let words = words(line);
    let has_word = |w: &str| words.iter().any(|x| x == w);

    if frontend_hint_re().is_match(line) || has_word("ui") {
        Some("FRONTEND_PORT")
    } else if backend_hint_re().is_match(line) || has_word("api") {
        Some("BACKEND_PORT")
    } else if automation_hint_re().is_match(line) {
        Some("AUTOMATION_PORT")
    } else {
        None
    }
}

/// Pick a variable name for `port` found on `line`.
pub fn classify(port: u32, line: &str) -> (String, Strategy) {
    for strategy in Strategy::ORDER {
        if let Some(name) = strategy.apply(port, line) {
            return (name, strategy);
        }
    }
    // Synthesized always yields a name.
    (format!("PORT_{port}"), Strategy::Synthesized)
}

// ---------------------------------------------------------------------------
// Scan results
// ---------------------------------------------------------------------------

/// One literal port found in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub port: u32,
    /// Path relative to the scan root.
    pub file: PathBuf,
    /// 1-based.
    pub line_no: usize,
    pub line: String,
}

/// A proposed binding plus the strategy that named it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(flatten)]
    pub binding: PortBinding,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// One finding per distinct port, ordered by port.
    pub findings: Vec<Finding>,
    /// Every file with at least one occurrence.
    pub files: BTreeSet<PathBuf>,
    pub occurrences: usize,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// `(variable, port)` pairs for the generator.
    pub fn bindings(&self) -> Vec<PortBinding> {
        self.findings.iter().map(|f| f.binding.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(PortsError::RootNotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Candidate files under the root, in a stable (name-sorted) walk order.
    pub fn candidate_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_denied_dir(e))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_str().is_some_and(is_candidate))
            .map(DirEntry::into_path)
    }

    /// Lazily yield every port literal. Each call starts a fresh walk.
    pub fn occurrences(&self) -> impl Iterator<Item = Occurrence> + '_ {
        self.candidate_files()
            .flat_map(move |path| self.file_occurrences(&path))
    }

    fn file_occurrences(&self, path: &Path) -> Vec<Occurrence> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping unreadable file");
                return Vec::new();
            }
        };
        let rel = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        content
            .lines()
            .enumerate()
            .flat_map(|(idx, line)| {
                scan_line(line).into_iter().map(move |port| (idx, line, port))
            })
            .map(|(idx, line, port)| Occurrence {
                port,
                file: rel.clone(),
                line_no: idx + 1,
                line: line.to_string(),
            })
            .collect()
    }

    /// Walk the tree and fold occurrences into a report. The first occurrence
    /// of each port names it; every occurrence contributes its file.
    pub fn scan(&self) -> ScanReport {
        let mut by_port: BTreeMap<u32, Finding> = BTreeMap::new();
        let mut files = BTreeSet::new();
        let mut occurrences = 0;

        for occ in self.occurrences() {
            occurrences += 1;
            files.insert(occ.file.clone());
            by_port.entry(occ.port).or_insert_with(|| {
                let (name, strategy) = classify(occ.port, &occ.line);
                tracing::debug!(port = occ.port, %name, %strategy, file = %occ.file.display(), "discovered port");
                Finding {
                    binding: PortBinding::new(name, occ.port).at(occ.file, occ.line_no),
                    strategy,
                }
            });
        }

        ScanReport {
            findings: by_port.into_values().collect(),
            files,
            occurrences,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
