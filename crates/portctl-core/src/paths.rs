use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEVOPS_DIR: &str = ".devops";
pub const PORTS_CONF: &str = ".devops/ports.conf";
pub const DOTENV_FILE: &str = ".env";

/// Scripts that ship with the toolkit itself. They mention every well-known
/// port, so scanning them would only produce noise.
pub const OWN_SCRIPTS: &[&str] = &["port-config.sh", "port-validation.sh", "migrate-ports.sh"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn ports_conf_path(root: &Path) -> PathBuf {
    root.join(PORTS_CONF)
}

pub fn dotenv_path(root: &Path) -> PathBuf {
    root.join(DOTENV_FILE)
}

/// Resolve a user-supplied `--output` path against the project root.
pub fn output_path(root: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => ports_conf_path(root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_ports_conf() {
        let root = Path::new("/project");
        assert_eq!(
            output_path(root, None),
            PathBuf::from("/project/.devops/ports.conf")
        );
    }

    #[test]
    fn relative_output_joins_root() {
        let root = Path::new("/project");
        assert_eq!(
            output_path(root, Some(Path::new("config/ports.env"))),
            PathBuf::from("/project/config/ports.env")
        );
    }

    #[test]
    fn absolute_output_is_kept() {
        let root = Path::new("/project");
        assert_eq!(
            output_path(root, Some(Path::new("/tmp/ports.conf"))),
            PathBuf::from("/tmp/ports.conf")
        );
    }
}
