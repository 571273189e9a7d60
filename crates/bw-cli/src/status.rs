use serde::Serialize;

use bw_core::{BlocklistDescriptor, ListName};
use bw_updater::{ReqwestClient, Updater};

#[derive(Serialize)]
struct StatusReport {
    lists: Vec<BlocklistDescriptor>,
    use_custom_blocklist: bool,
    block_subdomains: bool,
    reloading: bool,
    downloaded_list_type: String,
    active_rule_file: Option<String>,
}

pub fn cmd_status(updater: &Updater<ReqwestClient>, json: bool) -> Result<(), String> {
    let report = collect(updater).map_err(|e| format!("Failed to read metadata: {}", e))?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Data directory: {}", updater.layout().dir().display());
    println!("  Custom list:  {}", on_off(report.use_custom_blocklist));
    println!("  Subdomains:   {}", on_off(report.block_subdomains));
    println!("  Reloading:    {}", report.reloading);
    if let Some(file) = &report.active_rule_file {
        println!("  Rule file:    {}", file);
    }
    println!();

    for list in &report.lists {
        println!("{}:", list.name);
        println!("  URL:          {}", list.url.as_deref().unwrap_or("-"));
        println!(
            "  Type:         {}",
            list.file_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
        );
        println!(
            "  Entries:      {}",
            list.entry_count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
        );
        println!("  ETag:         {}", list.etag.as_deref().unwrap_or("-"));
    }

    Ok(())
}

fn collect(updater: &Updater<ReqwestClient>) -> Result<StatusReport, bw_core::StoreError> {
    let lists = ListName::ALL
        .iter()
        .map(|name| updater.record(*name).descriptor())
        .collect::<Result<Vec<_>, _>>()?;

    let settings = updater.settings();
    let use_custom_blocklist = settings.use_custom_blocklist()?;
    let block_subdomains = settings.block_subdomains()?;

    let active_rule_file = use_custom_blocklist.then(|| {
        updater
            .layout()
            .active_rule_file(block_subdomains)
            .display()
            .to_string()
    });

    Ok(StatusReport {
        lists,
        use_custom_blocklist,
        block_subdomains,
        reloading: settings.is_reloading()?,
        downloaded_list_type: settings.downloaded_list_type()?,
        active_rule_file,
    })
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
