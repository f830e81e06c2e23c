use anyhow::Result;

use btrsnap::exec::CommandRunner;
use btrsnap::pipeline::run_sections;

use crate::cli::Setup;
use crate::util::load_runs;

/// Полный прогон по всем секциям (или один прогон без конфиг-файла).
pub fn exec(setup: Setup, json: bool) -> Result<()> {
    let runs = load_runs(&setup)?;
    let reports = run_sections(&runs, |_| CommandRunner::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for r in &reports {
        let tag = r.section.as_deref().map(|s| format!("[{s}] ")).unwrap_or_default();
        println!(
            "{}{}{}: {} (deleted local={}, remote={})",
            tag,
            r.snapshot,
            if r.dry_run { " (dry-run)" } else { "" },
            r.plan,
            r.deleted_local.len(),
            r.deleted_remote.len()
        );
    }
    Ok(())
}
