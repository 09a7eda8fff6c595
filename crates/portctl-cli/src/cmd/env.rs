use anyhow::Context;
use portctl_core::resolve;
use std::path::Path;

/// Emit shell `export` lines so callers can `eval "$(portctl env)"`.
pub fn run(root: &Path) -> anyhow::Result<()> {
    let resolved = resolve::resolve_project(root).context("failed to resolve ports")?;
    for p in resolved.iter() {
        println!("export {}={}", p.name, p.port);
    }
    Ok(())
}
