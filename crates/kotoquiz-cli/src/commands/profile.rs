//! The `kotoquiz profile` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use comfy_table::{Cell, Table};

use kotoquiz_core::ledger::CurrencyLedger;
use kotoquiz_core::save::SaveStore;
use kotoquiz_core::session::format_clock;
use kotoquiz_storage::config::load_config_from;

pub fn execute(words: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = config.open_store()?;
    let ledger = CurrencyLedger::load(store.clone(), config.gold_cap);
    let data = SaveStore::new(store).handle_login(Local::now().date_naive());

    let fastest = if data.has_record() {
        format_clock(data.fastest_record)
    } else {
        "-".to_string()
    };
    let accuracy = data
        .accuracy()
        .map(|a| format!("{:.1}%", a * 100.0))
        .unwrap_or_else(|| "-".to_string());

    let mut table = Table::new();
    table.set_header(vec!["Profile", config.profile.as_str()]);
    let rows: Vec<(&str, String)> = vec![
        ("Gold", ledger.get().to_string()),
        ("Logins", data.login_times.to_string()),
        ("Login streak", data.login_streak.to_string()),
        ("Last login", data.last_login_date.clone()),
        ("Wins", data.win_count.to_string()),
        ("Losses", data.lose_count.to_string()),
        ("Fastest", fastest),
        ("Accuracy", accuracy),
        ("Learned words", data.learned_words.len().to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");

    if words {
        if data.learned_words.is_empty() {
            println!("No learned words yet.");
        } else {
            println!("{}", data.learned_words.join(" "));
        }
    }

    Ok(())
}
