use crate::output::print_json;
use anyhow::Context;
use portctl_core::{generator, paths};
use std::path::Path;

pub fn run(root: &Path, output: Option<&Path>, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::output_path(root, output);
    let written = generator::write_defaults(&path, force)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "path": path,
            "written": written,
        }));
    }

    if written {
        println!("Wrote default ports to {}", path.display());
    } else {
        println!(
            "{} already exists; pass --force to overwrite.",
            path.display()
        );
    }
    Ok(())
}
