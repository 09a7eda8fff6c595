use crate::error::Result;
use crate::io::atomic_write;
use crate::registry::{self, PortBinding};
use std::collections::BTreeSet;
use std::path::Path;

/// Fixed header. Deliberately free of timestamps so output is reproducible.
pub const HEADER: &str = "\
# Port configuration
# Generated by portctl. One KEY=VALUE per line, literal integers only.
# Precedence: environment > .env > this file > built-in defaults.
";

/// Render the artifact for `bindings`. Pairs are deduplicated and sorted by
/// variable name, then port.
pub fn render(bindings: &[PortBinding]) -> String {
    let pairs: BTreeSet<(&str, u32)> = bindings
        .iter()
        .map(|b| (b.variable_name.as_str(), b.port))
        .collect();

    let mut out = String::from(HEADER);
    out.push('\n');
    let mut last: Option<&str> = None;
    for (name, port) in pairs {
        if last == Some(name) {
            tracing::warn!(
                variable = name,
                port,
                "variable bound to more than one port; the last line wins when read"
            );
        }
        out.push_str(&format!("{name}={port}\n"));
        last = Some(name);
    }
    out
}

/// Render and atomically write the artifact to `path`. Every variable name
/// is validated before anything touches the disk.
pub fn write(path: &Path, bindings: &[PortBinding]) -> Result<()> {
    for b in bindings {
        registry::validate_variable_name(&b.variable_name)?;
    }
    let content = render(bindings);
    atomic_write(path, content.as_bytes())?;
    tracing::info!(path = %path.display(), entries = bindings.len(), "wrote port configuration");
    Ok(())
}

/// Write the registry defaults to `path`. An existing file is left alone
/// unless `force` is set. Returns true if the file was written.
pub fn write_defaults(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    write(path, &registry::default_bindings())?;
    Ok(true)
}
