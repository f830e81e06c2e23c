use anyhow::Result;

use btrsnap::pipeline::{remote_side, scan_local};
use btrsnap::snapset::SnapshotSet;

use crate::cli::Setup;
use crate::util::load_runs;

/// Список снапшотов local/remote. Только сканирование: политика хранения не проверяется.
pub fn exec(setup: Setup, json: bool) -> Result<()> {
    let runs = load_runs(&setup)?;
    let mut sets: Vec<(Option<String>, SnapshotSet, Option<SnapshotSet>)> = Vec::new();
    for cfg in &runs {
        let local = scan_local(cfg)?;
        let remote = remote_side(cfg)?.set().cloned();
        sets.push((cfg.section.clone(), local, remote));
    }

    if json {
        let v: Vec<serde_json::Value> = sets
            .iter()
            .map(|(section, local, remote)| {
                serde_json::json!({
                    "section": section,
                    "local": local.base_names(),
                    "remote": remote.as_ref().map(|r| r.base_names()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    for (section, local, remote) in &sets {
        if let Some(s) = section {
            println!("[{s}]");
        }
        print_set(local);
        match remote {
            Some(r) => print_set(r),
            None => println!("remote: (unavailable)"),
        }
    }
    Ok(())
}

fn print_set(set: &SnapshotSet) {
    println!("{} {} ({}):", set.location(), set.dir().display(), set.len());
    if set.is_empty() {
        println!("  (no snapshots)");
    }
    for s in set {
        println!("  {}", s.base_name);
    }
}
