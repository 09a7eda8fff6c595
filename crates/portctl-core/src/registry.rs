//! Canonical port variables and their built-in defaults.
//!
//! The registry is the last tier of the resolution chain (see [`crate::resolve`]).
//! It is static data: nothing in the crate mutates it at run time.

use crate::error::{PortsError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Lowest port the validator accepts. Privileged ports are disallowed.
pub const MIN_PORT: u32 = 1024;
pub const MAX_PORT: u32 = 65535;

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: &'static str,
    pub default: u32,
    /// Legacy or platform-provided variable consulted after `name` in each tier.
    pub alias: Option<&'static str>,
}

const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        name: "FRONTEND_PORT",
        default: 3000,
        alias: None,
    },
    RegistryEntry {
        name: "BACKEND_PORT",
        default: 3030,
        alias: Some("PORT"),
    },
    RegistryEntry {
        name: "AUTOMATION_PORT",
        default: 7070,
        alias: None,
    },
    RegistryEntry {
        name: "METRICS_PORT",
        default: 9091,
        alias: Some("BACKEND_METRICS_PORT"),
    },
    RegistryEntry {
        name: "GRAFANA_PORT",
        default: 3001,
        alias: None,
    },
    RegistryEntry {
        name: "PROMETHEUS_PORT",
        default: 9090,
        alias: None,
    },
    RegistryEntry {
        name: "LOKI_PORT",
        default: 3100,
        alias: None,
    },
    RegistryEntry {
        name: "TEMPO_PORT",
        default: 3200,
        alias: None,
    },
    RegistryEntry {
        name: "OTEL_PORT",
        default: 4318,
        alias: None,
    },
];

/// All registry entries in canonical order.
pub fn entries() -> &'static [RegistryEntry] {
    REGISTRY
}

/// Registry defaults as bindings, in canonical order.
pub fn default_bindings() -> Vec<PortBinding> {
    REGISTRY
        .iter()
        .map(|e| PortBinding::new(e.name, e.default))
        .collect()
}

// ---------------------------------------------------------------------------
// PortBinding
// ---------------------------------------------------------------------------

/// An association between a variable name and a concrete port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub variable_name: String,
    pub port: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<usize>,
}

impl PortBinding {
    pub fn new(variable_name: impl Into<String>, port: u32) -> Self {
        Self {
            variable_name: variable_name.into(),
            port,
            source_file: None,
            source_line: None,
        }
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: usize) -> Self {
        self.source_file = Some(file.into());
        self.source_line = Some(line);
        self
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

static VAR_RE: OnceLock<Regex> = OnceLock::new();

fn var_re() -> &'static Regex {
    VAR_RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9_]*)?PORT(_[0-9]+)?$").unwrap())
}

pub fn validate_variable_name(name: &str) -> Result<()> {
    if !var_re().is_match(name) {
        return Err(PortsError::InvalidVariableName(name.to_string()));
    }
    Ok(())
}

/// Parse a literal port number. Surrounding whitespace is ignored; anything
/// else (signs, expressions, empty strings) is rejected.
pub fn parse_port(value: &str) -> Result<u32> {
    let v = value.trim();
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortsError::InvalidPort(value.to_string()));
    }
    v.parse::<u32>()
        .map_err(|_| PortsError::InvalidPort(value.to_string()))
}

pub fn in_operating_range(port: u32) -> bool {
    (MIN_PORT..=MAX_PORT).contains(&port)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_nine_unique_entries() {
        let names: std::collections::HashSet<_> = entries().iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn registry_defaults_do_not_collide() {
        let ports: std::collections::HashSet<_> = entries().iter().map(|e| e.default).collect();
        assert_eq!(ports.len(), entries().len());
    }

    #[test]
    fn only_backend_and_metrics_have_aliases() {
        let aliased: Vec<_> = entries()
            .iter()
            .filter_map(|e| e.alias.map(|a| (e.name, a)))
            .collect();
        assert_eq!(
            aliased,
            vec![("BACKEND_PORT", "PORT"), ("METRICS_PORT", "BACKEND_METRICS_PORT")]
        );
    }

    #[test]
    fn valid_variable_names() {
        for name in ["FRONTEND_PORT", "OTEL_PORT", "PORT_5432", "API2_PORT"] {
            validate_variable_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_variable_names() {
        for name in ["", "frontend_port", "FRONTEND", "PORT_", "_PORT", "MY PORT"] {
            assert!(
                validate_variable_name(name).is_err(),
                "expected invalid: {name}"
            );
        }
    }

    #[test]
    fn parse_port_accepts_plain_integers_only() {
        assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
        assert_eq!(parse_port("80").unwrap(), 80);
        assert_eq!(parse_port("70000").unwrap(), 70000);
        assert!(parse_port("").is_err());
        assert!(parse_port("-1").is_err());
        assert!(parse_port("30$X").is_err());
        assert!(parse_port("3000 # web").is_err());
    }

    #[test]
    fn operating_range_bounds() {
        assert!(!in_operating_range(80));
        assert!(!in_operating_range(1023));
        assert!(in_operating_range(1024));
        assert!(in_operating_range(8080));
        assert!(in_operating_range(65535));
        assert!(!in_operating_range(65536));
    }
}
