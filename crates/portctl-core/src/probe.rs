//! Best-effort "is anything listening on this port?" checks.
//!
//! A probe answers `Some(true)` / `Some(false)` when it can tell and `None`
//! when it cannot. Callers treat `None` as "skip", never as a conflict.

use std::net::{Ipv4Addr, TcpListener};
use std::path::PathBuf;
use std::process::Command;

pub trait PortProbe {
    fn name(&self) -> &'static str;
    fn in_use(&self, port: u16) -> Option<bool>;
}

// ---------------------------------------------------------------------------
// lsof
// ---------------------------------------------------------------------------

/// Asks `lsof` for TCP listeners on the port.
pub struct LsofProbe {
    bin: PathBuf,
}

impl LsofProbe {
    /// `None` when `lsof` is not on `PATH`.
    pub fn detect() -> Option<Self> {
        which::which("lsof").ok().map(|bin| Self { bin })
    }
}

impl PortProbe for LsofProbe {
    fn name(&self) -> &'static str {
        "lsof"
    }

    fn in_use(&self, port: u16) -> Option<bool> {
        let filter = format!("-iTCP:{port}");
        let output = Command::new(&self.bin)
            .args(["-nP", filter.as_str(), "-sTCP:LISTEN", "-t"])
            .output()
            .ok()?;
        if output.status.success() {
            return Some(!output.stdout.is_empty());
        }
        // lsof exits 1 with no output when nothing matched; anything else is unknown.
        match (output.status.code(), output.stdout.is_empty()) {
            (Some(1), true) => Some(false),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

/// Tries to bind the port on loopback and releases it immediately.
pub struct BindProbe;

impl PortProbe for BindProbe {
    fn name(&self) -> &'static str {
        "bind"
    }

    fn in_use(&self, port: u16) -> Option<bool> {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
            Ok(_) => Some(false),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => Some(true),
            Err(e) => {
                tracing::debug!(port, error = %e, "bind probe inconclusive");
                None
            }
        }
    }
}

/// `lsof` when installed, otherwise the bind probe.
pub fn default_probe() -> Box<dyn PortProbe> {
    match LsofProbe::detect() {
        Some(p) => Box::new(p),
        None => Box::new(BindProbe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_probe_sees_a_held_port() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(BindProbe.in_use(port), Some(true));
    }

    #[test]
    fn bind_probe_sees_a_released_port() {
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        assert_eq!(BindProbe.in_use(port), Some(false));
    }
}
