use std::sync::Arc;

use tokio::sync::mpsc;

use bw_core::ListName;
use bw_updater::{spawn_refresh, Notice, ReqwestClient, UpdateReport, Updater};

pub fn cmd_refresh(updater: Updater<ReqwestClient>, url: Option<String>, force: bool) -> Result<(), String> {
    let url = match url {
        Some(url) => url,
        None => updater
            .record(ListName::Displayed)
            .url()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "No blocklist URL given and none recorded".to_string())?,
    };

    if updater.is_reloading().map_err(|e| e.to_string())? && !force {
        return Err("A blocklist update is already in progress (use --force to override)".to_string());
    }

    updater
        .stage_candidate(&url)
        .and_then(|_| updater.settings().set_use_custom_blocklist(true))
        .map_err(|e| format!("Failed to record blocklist URL: {}", e))?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    let updater = Arc::new(updater);
    let report = runtime.block_on(run_in_background(updater.clone(), url))?;

    if let (Some(file_type), Some(count)) = (report.file_type, report.entry_count) {
        println!("  Type:     {}", file_type);
        println!("  Entries:  {}", count);
    }

    if report.status.is_failure() {
        updater
            .fall_back_to_preloaded()
            .map_err(|e| format!("Failed to fall back to the bundled list: {}", e))?;
        return Err(format!("{} Using the bundled blocklist instead.", report.status));
    }

    println!("{}", report.status);
    Ok(())
}

async fn run_in_background(updater: Arc<Updater<ReqwestClient>>, url: String) -> Result<UpdateReport, String> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_refresh(updater, url, tx);

    let mut report = None;
    while let Some(notice) = rx.recv().await {
        match notice {
            Notice::Started { url } => println!("Reloading blocklist from {}", url),
            Notice::Finished(finished) => report = Some(finished),
        }
    }

    if let Err(e) = handle.await {
        log::error!("Refresh task failed: {}", e);
    }

    report.ok_or_else(|| "Refresh ended without a result".to_string())
}
