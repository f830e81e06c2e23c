mod common;

use anyhow::Result;

use btrsnap::pipeline::{remote_side, scan_local};
use btrsnap::{preview, SkipReason, TransferPlan};

use common::{snap, Env, D1, D2, D3};

#[test]
fn preview_plans_without_touching_disk() -> Result<()> {
    let env = Env::new("preview")?;
    env.seed_local(&[D1, D2, D3])?;
    env.seed_remote(&[D1, D2])?;

    let cfg = env.config().with_keep_snapshots(2).with_keep_remote_snapshots(1);
    let p = preview(&cfg)?;

    assert_eq!(p.current.as_deref(), Some(snap(D3).as_str()));
    assert_eq!(
        p.plan,
        Some(TransferPlan::Incremental {
            base: snap(D2),
            target: snap(D3)
        })
    );
    assert_eq!(p.would_delete_local, vec![snap(D1)]);
    // D3 будет передан, поэтому на remote останется только он
    assert_eq!(p.would_delete_remote, vec![snap(D1), snap(D2)]);
    assert_eq!(p.remote.as_ref().map(|r| r.len()), Some(2));
    assert_eq!(env.local_names().len(), 3);
    assert_eq!(env.remote_names().len(), 2);
    Ok(())
}

#[test]
fn preview_with_transfer_disabled_and_empty_local() -> Result<()> {
    let env = Env::new("preview-empty")?;
    let p = preview(&env.config().with_transfer(false))?;
    assert!(p.local.is_empty());
    assert!(p.remote.is_none());
    assert_eq!(p.current, None);
    assert_eq!(p.plan, None);

    env.seed_local(&[D1])?;
    let p = preview(&env.config().with_transfer(false))?;
    assert_eq!(
        p.plan,
        Some(TransferPlan::Skip {
            reason: SkipReason::TransferDisabled
        })
    );
    Ok(())
}

#[test]
fn listing_ignores_invalid_retention() -> Result<()> {
    let env = Env::new("list-keep0")?;
    env.seed_local(&[D1, D2])?;
    env.seed_remote(&[D1])?;
    let cfg = env.config().with_keep_snapshots(0);

    // plan проверяет политику, а простой список — нет
    assert!(preview(&cfg).is_err());
    let local = scan_local(&cfg)?;
    let remote = remote_side(&cfg)?;
    assert_eq!(local.base_names(), vec![snap(D1), snap(D2)]);
    assert_eq!(remote.set().map(|r| r.base_names()), Some(vec![snap(D1).as_str()]));
    Ok(())
}
