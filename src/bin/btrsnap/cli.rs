use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use btrsnap::Overrides;

/// btrfs snapshot rotation + send/receive backups
#[derive(Parser, Debug)]
#[command(name = "btrsnap", version, about = "btrfs snapshots with incremental backups")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a snapshot, send it to the backup dir, prune both sides, sync.
    ///
    /// Примеры:
    ///   btrsnap run -B home -b /home/ -R /mnt/backup/snapshots/
    ///   btrsnap run -c /etc/btrsnap.toml --section root -d
    Run {
        #[command(flatten)]
        setup: Setup,
        /// JSON output (array of run reports)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show the transfer plan and prune candidates for the newest local snapshot.
    ///
    /// Ничего не создаёт и не удаляет.
    Plan {
        #[command(flatten)]
        setup: Setup,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List local and remote snapshots
    List {
        #[command(flatten)]
        setup: Setup,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Общие параметры (повторяют ключи конфиг-файла; CLI побеждает файл).
#[derive(Args, Debug, Clone, Default)]
pub struct Setup {
    /// Config file (TOML). Default: /etc/btrsnap.toml if present.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Ignore the default config file
    #[arg(long, default_value_t = false)]
    pub no_config: bool,
    /// Run only this config section
    #[arg(long)]
    pub section: Option<String>,

    /// Host name (snapshot name prefix)
    #[arg(short = 'H', long = "host")]
    pub host_name: Option<String>,
    /// Short name of the backup (label)
    #[arg(short = 'B', long = "label")]
    pub backup_name: Option<String>,
    /// Source subvolume to snapshot
    #[arg(short = 'b', long = "source")]
    pub backup_dir: Option<PathBuf>,
    /// Local snapshot directory
    #[arg(short = 'S', long = "snapshot-dir")]
    pub snapshot_dir: Option<PathBuf>,
    /// Remote (backup) snapshot directory
    #[arg(short = 'R', long = "remote-dir")]
    pub remote_snapshot_dir: Option<PathBuf>,
    /// Local snapshots to keep
    #[arg(short = 's', long = "keep")]
    pub keep: Option<u32>,
    /// Remote snapshots to keep
    #[arg(short = 'r', long = "keep-remote")]
    pub keep_remote: Option<u32>,
    /// Skip transfer (local rotation only)
    #[arg(short = 'T', long, default_value_t = false)]
    pub no_transfer: bool,
    /// Do not create a snapshot, work with the newest existing one
    #[arg(short = 'C', long, default_value_t = false)]
    pub no_create: bool,
    /// Dry run: only print commands
    #[arg(short = 'd', long, default_value_t = false)]
    pub dry_run: bool,
    /// Command to execute before snapshotting
    #[arg(short = 'P', long = "pre")]
    pub pre_command: Option<String>,
    /// Command to execute afterwards (%SNAPSHOT% = snapshot name)
    #[arg(short = 'x', long = "post")]
    pub post_command: Option<String>,
}

impl Setup {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host_name: self.host_name.clone(),
            backup_name: self.backup_name.clone(),
            backup_dir: self.backup_dir.clone(),
            snapshot_dir: self.snapshot_dir.clone(),
            remote_snapshot_dir: self.remote_snapshot_dir.clone(),
            keep_snapshots_num: self.keep,
            keep_remote_snapshots_num: self.keep_remote,
            dry_run: self.dry_run,
            no_transfer: self.no_transfer,
            no_create: self.no_create,
            pre_command: self.pre_command.clone(),
            post_command: self.post_command.clone(),
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}
