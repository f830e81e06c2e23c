use anyhow::Result;

use btrsnap::pipeline::{preview, Preview};

use crate::cli::Setup;
use crate::util::load_runs;

/// План передачи и кандидаты на удаление, без исполнения.
pub fn exec(setup: Setup, json: bool) -> Result<()> {
    let runs = load_runs(&setup)?;
    let previews = runs.iter().map(preview).collect::<Result<Vec<Preview>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&previews)?);
        return Ok(());
    }
    for p in &previews {
        if let Some(s) = p.section.as_deref() {
            println!("[{s}]");
        }
        match (&p.current, &p.plan) {
            (Some(cur), Some(plan)) => {
                println!("  current     = {}", cur);
                println!("  plan        = {}", plan);
            }
            _ => println!("  (no local snapshots)"),
        }
        print_names("  prune local ", &p.would_delete_local);
        print_names("  prune remote", &p.would_delete_remote);
    }
    Ok(())
}

fn print_names(title: &str, names: &[String]) {
    if names.is_empty() {
        println!("{} = (none)", title);
        return;
    }
    println!("{} = {}", title, names.len());
    for n in names {
        println!("    - {}", n);
    }
}
