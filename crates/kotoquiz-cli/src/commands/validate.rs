//! The `kotoquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use kotoquiz_storage::config::load_config_from;
use kotoquiz_storage::DirectorySource;

pub async fn execute(questions: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let root = questions.unwrap_or_else(|| config.questions_dir.clone());
    if !root.is_dir() {
        anyhow::bail!("question directory not found: {}", root.display());
    }

    let source = DirectorySource::new(&root);
    let reports = source.survey(&config.levels).await;

    let mut total_records = 0;
    let mut problems = 0;
    for report in &reports {
        match &report.result {
            Ok(count) => {
                total_records += count;
                println!("  {}: {count} records", report.partition.file_stem());
            }
            Err(e) => {
                problems += 1;
                println!("  {}: {e}", report.partition.file_stem());
            }
        }
    }

    if total_records == 0 {
        anyhow::bail!("no usable question partitions in {}", root.display());
    }
    if problems == 0 {
        println!("All {} partitions valid ({total_records} records).", reports.len());
    } else {
        println!("\n{problems} partition(s) missing or unreadable, {total_records} records usable.");
    }

    Ok(())
}
