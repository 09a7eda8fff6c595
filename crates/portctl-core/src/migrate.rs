use crate::error::Result;
use crate::generator;
use crate::scanner::{ScanReport, Scanner};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Report only; never touch the filesystem.
    pub dry_run: bool,
    /// Accepted for compatibility. Source files are not rewritten, so there is
    /// nothing to back up.
    pub backup: bool,
    /// Where to write the artifact.
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrateOutcome {
    #[serde(flatten)]
    pub report: ScanReport,
    /// Artifact path, when one was written.
    pub written: Option<PathBuf>,
    pub dry_run: bool,
}

/// Scan `root` and, unless this is a dry run, write the discovered bindings
/// to `opts.output`. Nothing is written when no ports were found.
pub fn migrate(root: &Path, opts: &MigrateOptions) -> Result<MigrateOutcome> {
    let report = Scanner::new(root)?.scan();
    tracing::info!(
        ports = report.findings.len(),
        files = report.files.len(),
        occurrences = report.occurrences,
        "scan complete"
    );

    if opts.backup {
        tracing::warn!("--backup has no effect: source files are reported, not rewritten");
    }

    let written = if opts.dry_run || report.is_empty() {
        None
    } else {
        generator::write(&opts.output, &report.bindings())?;
        Some(opts.output.clone())
    };

    Ok(MigrateOutcome {
        report,
        written,
        dry_run: opts.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envfile;
    use crate::paths;
    use tempfile::TempDir;

    fn opts(root: &Path, dry_run: bool) -> MigrateOptions {
        MigrateOptions {
            dry_run,
            backup: false,
            output: paths::ports_conf_path(root),
        }
    }

    fn file_count(root: &Path) -> usize {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }

    #[test]
    fn listen_8080_becomes_backend_port() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("server.js"), "app.listen(\":8080\")\n").unwrap();

        let outcome = migrate(dir.path(), &opts(dir.path(), false)).unwrap();
        let path = outcome.written.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let port_lines: Vec<_> = content
            .lines()
            .filter(|l| !l.starts_with('#') && l.contains("PORT"))
            .collect();
        assert_eq!(port_lines, vec!["BACKEND_PORT=8080"]);
    }

    #[test]
    fn dry_run_reports_the_same_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dev.sh"), "open http://localhost:3000\n").unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "ports: [\"x:7070\"]\n").unwrap();
        let before = file_count(dir.path());

        let dry = migrate(dir.path(), &opts(dir.path(), true)).unwrap();
        assert!(dry.written.is_none());
        assert_eq!(file_count(dir.path()), before);
        assert!(!dir.path().join(paths::DEVOPS_DIR).exists());

        let real = migrate(dir.path(), &opts(dir.path(), false)).unwrap();
        assert_eq!(dry.report, real.report);
        assert!(real.written.is_some());
    }

    #[test]
    fn rescan_after_generation_is_stable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.sh"), "curl localhost:9090 localhost:5432\n").unwrap();
        let first = migrate(dir.path(), &opts(dir.path(), false)).unwrap();
        let second = migrate(dir.path(), &opts(dir.path(), false)).unwrap();
        assert_eq!(first.report, second.report);
        let map = envfile::load_artifact(&paths::ports_conf_path(dir.path())).unwrap();
        assert_eq!(map["METRICS_PORT"], "9090");
        assert_eq!(map["PORT_5432"], "5432");
    }

    #[test]
    fn nothing_found_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.sh"), "echo hello\n").unwrap();
        let outcome = migrate(dir.path(), &opts(dir.path(), false)).unwrap();
        assert!(outcome.written.is_none());
        assert!(!paths::ports_conf_path(dir.path()).exists());
    }

    #[test]
    fn backup_flag_is_accepted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.sh"), ":3000\n").unwrap();
        let mut o = opts(dir.path(), false);
        o.backup = true;
        let outcome = migrate(dir.path(), &o).unwrap();
        assert!(outcome.written.is_some());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.sh")).unwrap(),
            ":3000\n"
        );
    }
}
