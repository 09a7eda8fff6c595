use portctl_core::paths::DEVOPS_DIR;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `PORTCTL_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.devops/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, DEVOPS_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_devops_dir_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".devops")).unwrap();
        let subdir = dir.path().join("apps/web/src");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_upward(&subdir, ".devops").as_deref(), Some(dir.path()));
    }

    #[test]
    fn devops_marker_is_preferred_over_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let pkg = dir.path().join("packages/api");
        std::fs::create_dir_all(pkg.join(".devops")).unwrap();
        assert_eq!(find_upward(&pkg, ".devops").as_deref(), Some(pkg.as_path()));
        assert_eq!(find_upward(&pkg, ".git").as_deref(), Some(dir.path()));
    }
}
