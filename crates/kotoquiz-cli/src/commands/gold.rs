//! The `kotoquiz gold` command.

use std::path::PathBuf;

use anyhow::Result;

use kotoquiz_core::ledger::CurrencyLedger;
use kotoquiz_storage::config::load_config_from;

pub fn execute(set: Option<i64>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut ledger = CurrencyLedger::load(config.open_store()?, config.gold_cap);

    if let Some(amount) = set {
        ledger.set(amount);
        if i64::from(ledger.get()) != amount {
            eprintln!("Clamped {amount} to {} (cap {}).", ledger.get(), ledger.cap());
        }
    }

    println!("Gold: {}", ledger.get());
    Ok(())
}
