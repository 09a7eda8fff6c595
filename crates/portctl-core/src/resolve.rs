//! Port resolution: environment > `.env` > artifact > registry default.

use crate::envfile;
use crate::error::Result;
use crate::paths;
use crate::registry::{self, RegistryEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a resolved value came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Environment,
    DotEnv,
    Artifact,
    Default,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Environment => write!(f, "environment"),
            Source::DotEnv => write!(f, ".env"),
            Source::Artifact => write!(f, "ports.conf"),
            Source::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPort {
    pub name: String,
    pub port: u32,
    pub source: Source,
    /// The key that supplied the value when it differs from `name` (an alias).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

/// The fully resolved mapping. Always holds every registry entry, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPorts {
    pub ports: Vec<ResolvedPort>,
}

impl ResolvedPorts {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.ports.iter().find(|p| p.name == name).map(|p| p.port)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPort> {
        self.ports.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, u32> {
        self.ports.iter().map(|p| (p.name.clone(), p.port)).collect()
    }
}

/// Inputs to [`resolve`], one map per tier.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    pub env: BTreeMap<String, String>,
    pub dotenv: BTreeMap<String, String>,
    pub artifact: BTreeMap<String, String>,
}

impl Layers {
    /// Read the `.env` and artifact tiers from `root`, pairing them with `env`.
    pub fn load(root: &Path, env: BTreeMap<String, String>) -> Result<Self> {
        Ok(Self {
            env,
            dotenv: envfile::load_dotenv(&paths::dotenv_path(root))?,
            artifact: envfile::load_artifact(&paths::ports_conf_path(root))?,
        })
    }
}

/// Snapshot of the current process environment, restricted to `PORT` keys.
pub fn process_env() -> BTreeMap<String, String> {
    std::env::vars().filter(|(k, _)| k.contains("PORT")).collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve every registry entry against `layers`. Pure: no ambient state is read.
pub fn resolve(layers: &Layers) -> ResolvedPorts {
    let ports = registry::entries()
        .iter()
        .map(|entry| resolve_entry(entry, layers))
        .collect();
    ResolvedPorts { ports }
}

fn resolve_entry(entry: &RegistryEntry, layers: &Layers) -> ResolvedPort {
    let tiers = [
        (Source::Environment, &layers.env),
        (Source::DotEnv, &layers.dotenv),
        (Source::Artifact, &layers.artifact),
    ];
    let keys = std::iter::once(entry.name).chain(entry.alias);

    for (source, map) in tiers {
        for key in keys.clone() {
            let Some(raw) = map.get(key) else {
                continue;
            };
            match registry::parse_port(raw) {
                Ok(port) => {
                    tracing::debug!(name = entry.name, key, port, %source, "resolved");
                    return ResolvedPort {
                        name: entry.name.to_string(),
                        port,
                        source,
                        via: (key != entry.name).then(|| key.to_string()),
                    };
                }
                Err(_) => {
                    tracing::warn!(key, value = raw.as_str(), %source, "ignoring non-numeric port value");
                }
            }
        }
    }

    ResolvedPort {
        name: entry.name.to_string(),
        port: entry.default,
        source: Source::Default,
        via: None,
    }
}

/// Convenience: load all tiers for `root` from disk and the live environment.
pub fn resolve_project(root: &Path) -> Result<ResolvedPorts> {
    Ok(resolve(&Layers::load(root, process_env())?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_layers_yield_defaults() {
        let resolved = resolve(&Layers::default());
        assert_eq!(resolved.ports.len(), 9);
        assert!(resolved.iter().all(|p| p.source == Source::Default));
        assert_eq!(resolved.get("FRONTEND_PORT"), Some(3000));
        assert_eq!(resolved.get("OTEL_PORT"), Some(4318));
    }

    #[test]
    fn environment_beats_artifact() {
        let layers = Layers {
            env: map(&[("FRONTEND_PORT", "4000")]),
            artifact: map(&[("FRONTEND_PORT", "5000")]),
            ..Default::default()
        };
        let resolved = resolve(&layers);
        assert_eq!(resolved.get("FRONTEND_PORT"), Some(4000));
    }

    #[test]
    fn full_precedence_chain() {
        let layers = Layers {
            env: map(&[("FRONTEND_PORT", "4001")]),
            dotenv: map(&[("FRONTEND_PORT", "4002"), ("AUTOMATION_PORT", "4003")]),
            artifact: map(&[
                ("FRONTEND_PORT", "4004"),
                ("AUTOMATION_PORT", "4005"),
                ("LOKI_PORT", "4006"),
            ]),
        };
        let resolved = resolve(&layers);
        assert_eq!(resolved.get("FRONTEND_PORT"), Some(4001));
        assert_eq!(resolved.get("AUTOMATION_PORT"), Some(4003));
        assert_eq!(resolved.get("LOKI_PORT"), Some(4006));
        assert_eq!(resolved.get("TEMPO_PORT"), Some(3200));
        let sources: Vec<_> = resolved.iter().map(|p| p.source).collect();
        assert_eq!(sources[0], Source::Environment);
        assert_eq!(sources[2], Source::DotEnv);
    }

    #[test]
    fn backend_falls_back_to_generic_port() {
        let layers = Layers {
            env: map(&[("PORT", "8080")]),
            artifact: map(&[("BACKEND_PORT", "3030")]),
            ..Default::default()
        };
        let resolved = resolve(&layers);
        let backend = resolved.iter().find(|p| p.name == "BACKEND_PORT").unwrap();
        assert_eq!(backend.port, 8080);
        assert_eq!(backend.via.as_deref(), Some("PORT"));
    }

    #[test]
    fn canonical_name_beats_alias_in_same_tier() {
        let layers = Layers {
            env: map(&[("PORT", "8080"), ("BACKEND_PORT", "9000")]),
            ..Default::default()
        };
        assert_eq!(resolve(&layers).get("BACKEND_PORT"), Some(9000));
    }

    #[test]
    fn metrics_falls_back_to_legacy_alias() {
        let layers = Layers {
            dotenv: map(&[("BACKEND_METRICS_PORT", "9100")]),
            ..Default::default()
        };
        assert_eq!(resolve(&layers).get("METRICS_PORT"), Some(9100));
    }

    #[test]
    fn non_numeric_value_falls_through() {
        let layers = Layers {
            env: map(&[("FRONTEND_PORT", "abc")]),
            artifact: map(&[("FRONTEND_PORT", "5000")]),
            ..Default::default()
        };
        assert_eq!(resolve(&layers).get("FRONTEND_PORT"), Some(5000));
    }

    #[test]
    fn load_reads_dotenv_and_artifact_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "GRAFANA_PORT=\"3333\"\nNAME=x\n").unwrap();
        std::fs::create_dir_all(dir.path().join(".devops")).unwrap();
        std::fs::write(
            dir.path().join(".devops/ports.conf"),
            "# ports\nGRAFANA_PORT=4444\nTEMPO_PORT=3201\n",
        )
        .unwrap();
        let layers = Layers::load(dir.path(), BTreeMap::new()).unwrap();
        let resolved = resolve(&layers);
        assert_eq!(resolved.get("GRAFANA_PORT"), Some(3333));
        assert_eq!(resolved.get("TEMPO_PORT"), Some(3201));
        assert!(!layers.dotenv.contains_key("NAME"));
    }

    #[test]
    fn non_utf8_dotenv_still_resolves() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            b"GREETING=caf\xe9\nFRONTEND_PORT=4000\n".as_slice(),
        )
        .unwrap();
        let layers = Layers::load(dir.path(), BTreeMap::new()).unwrap();
        let resolved = resolve(&layers);
        assert_eq!(resolved.get("FRONTEND_PORT"), Some(4000));
        let frontend = resolved.iter().find(|p| p.name == "FRONTEND_PORT").unwrap();
        assert_eq!(frontend.source, Source::DotEnv);
    }
}
