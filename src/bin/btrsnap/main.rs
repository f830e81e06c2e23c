use anyhow::Result;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_run;
mod cmd_plan;
mod cmd_list;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — info.
    // Пример: RUST_LOG=debug btrsnap run -d
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Run { setup, json } =>
            cmd_run::exec(setup, json),

        cli::Cmd::Plan { setup, json } =>
            cmd_plan::exec(setup, json),

        cli::Cmd::List { setup, json } =>
            cmd_list::exec(setup, json),
    }
}
