use crate::output::{print_json, print_table};
use anyhow::Context;
use portctl_core::resolve;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let resolved = resolve::resolve_project(root).context("failed to resolve ports")?;

    if json {
        return print_json(&resolved);
    }

    let rows: Vec<Vec<String>> = resolved
        .iter()
        .map(|p| {
            let source = match &p.via {
                Some(alias) => format!("{} (via {alias})", p.source),
                None => p.source.to_string(),
            };
            vec![p.name.clone(), p.port.to_string(), source]
        })
        .collect();
    print_table(&["VARIABLE", "PORT", "SOURCE"], &rows);
    Ok(())
}
