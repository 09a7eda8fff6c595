use crate::output::print_json;
use portctl_core::probe;
use portctl_core::validator::{self, ConflictKind};

pub fn run(port: u32, json: bool) -> anyhow::Result<()> {
    let probe = probe::default_probe();
    let report = validator::check_port(port, Some(probe.as_ref()));
    let busy = report.of_kind(ConflictKind::InUse).next().is_some();

    if json {
        print_json(&serde_json::json!({
            "port": port,
            "conflicts": report.conflicts,
            "in_use_checked": report.in_use_checked,
        }))?;
    } else if !report.is_pass() {
        for c in &report.conflicts {
            println!("[{}] {}", c.kind, c.detail);
        }
    } else if busy {
        println!("Port {port} is in use.");
    } else if report.in_use_checked {
        println!("Port {port} is available.");
    } else {
        println!("Port {port} is in range; could not determine whether it is in use.");
    }

    if !report.is_pass() || busy {
        anyhow::bail!("port {port} is not available");
    }
    Ok(())
}
