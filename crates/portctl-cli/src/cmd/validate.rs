use crate::output::print_json;
use anyhow::Context;
use portctl_core::probe;
use portctl_core::validator::{self, ConflictKind};
use portctl_core::{paths, resolve};
use std::path::Path;

pub fn run(root: &Path, skip_in_use: bool, strict: bool, json: bool) -> anyhow::Result<()> {
    // Static check first: a broken artifact makes the resolved view meaningless.
    let artifact = paths::ports_conf_path(root);
    let syntax_checked = artifact.exists();
    if syntax_checked {
        validator::check_syntax(&artifact).context("configuration syntax check failed")?;
    } else {
        tracing::debug!(path = %artifact.display(), "no ports configuration; skipping syntax check");
    }

    let resolved = resolve::resolve_project(root).context("failed to resolve ports")?;
    let probe = (!skip_in_use).then(probe::default_probe);
    let report = validator::check_conflicts(&resolved, probe.as_deref());

    let failed = !report.is_pass()
        || (strict && report.of_kind(ConflictKind::InUse).next().is_some());

    if json {
        print_json(&serde_json::json!({
            "pass": !failed,
            "syntax_checked": syntax_checked,
            "in_use_checked": report.in_use_checked,
            "conflicts": report.conflicts,
            "ports": resolved.to_map(),
        }))?;
    } else {
        for c in &report.conflicts {
            let level = if c.kind.is_failure() || strict {
                "error"
            } else {
                "warning"
            };
            println!("[{level}] {}: {}", c.kind, c.detail);
        }
        if !skip_in_use && !report.in_use_checked {
            println!("[note] in-use check skipped: no way to inspect sockets on this host");
        }
        if report.conflicts.is_empty() {
            println!("Port configuration is valid. No conflicts.");
        }
    }

    if failed {
        anyhow::bail!("port validation found conflicts");
    }
    Ok(())
}

