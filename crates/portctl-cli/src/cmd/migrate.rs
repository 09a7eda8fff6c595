use crate::output::{plural, print_json, print_table};
use anyhow::Context;
use portctl_core::migrate::{self, MigrateOptions};
use portctl_core::paths;
use std::path::Path;

pub fn run(
    root: &Path,
    dry_run: bool,
    backup: bool,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let opts = MigrateOptions {
        dry_run,
        backup,
        output: paths::output_path(root, output),
    };
    let outcome = migrate::migrate(root, &opts)
        .with_context(|| format!("failed to migrate ports in {}", root.display()))?;

    if json {
        return print_json(&outcome);
    }

    let report = &outcome.report;
    if report.is_empty() {
        println!("No hardcoded ports found.");
        return Ok(());
    }

    println!(
        "Found {} in {}:",
        plural(report.findings.len(), "port"),
        plural(report.files.len(), "file")
    );
    let rows: Vec<Vec<String>> = report
        .findings
        .iter()
        .map(|f| {
            let location = match (&f.binding.source_file, f.binding.source_line) {
                (Some(file), Some(line)) => format!("{}:{line}", file.display()),
                (Some(file), None) => file.display().to_string(),
                _ => String::new(),
            };
            vec![
                f.binding.port.to_string(),
                f.binding.variable_name.clone(),
                f.strategy.to_string(),
                location,
            ]
        })
        .collect();
    print_table(&["PORT", "VARIABLE", "MATCHED BY", "FIRST SEEN"], &rows);

    println!();
    println!("Files to update:");
    for file in &report.files {
        println!("  {}", file.display());
    }

    println!();
    match &outcome.written {
        Some(path) => println!("Wrote {}", path.display()),
        None if outcome.dry_run => println!("Dry run: no files written."),
        None => {}
    }
    Ok(())
}
