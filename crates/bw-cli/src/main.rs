//! Blockwright CLI
//!
//! Command line front-end for fetching, compiling and managing blocklists.

mod refresh;
mod status;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bw_compiler::{compile_artifact, read_rule_list, RuleFilePaths};
use bw_core::{BlocklistDescriptor, FileType, JsonFileStore, ListName, MetadataStore};
use bw_updater::{CommandReload, LogReload, ReloadSignal, ReqwestClient, StorageLayout, Updater};

#[derive(Parser)]
#[command(name = "bw-cli")]
#[command(about = "Blockwright blocklist fetcher and rule list compiler")]
struct Cli {
    /// Directory holding rule files and metadata
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Command run to make the content filter reload its rules
    #[arg(long, global = true)]
    reload_command: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a remote blocklist and compile it if it changed
    Refresh {
        /// HTTPS URL of a hosts file or JSON rule list (defaults to the displayed list)
        #[arg(short, long)]
        url: Option<String>,

        /// Run even if the reloading flag says another update is in flight
        #[arg(long)]
        force: bool,
    },

    /// Compile a local hosts file or JSON rule list
    Compile {
        /// Input list file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the rule files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Show blocklist metadata and settings
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record metadata for the bundled default list
    Seed {
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "built-in")]
        file_type: String,

        #[arg(long)]
        entry_count: Option<u64>,

        #[arg(long)]
        etag: Option<String>,
    },

    /// Stop using the custom list and fall back to the bundled one
    Disable,

    /// Reset all lists and settings to their defaults
    RestoreDefaults,

    /// Turn wildcard (subdomain) blocking on or off
    Subdomains {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Compile { input, output_dir } => cmd_compile(input, output_dir),
        Commands::Refresh { url, force } => refresh::cmd_refresh(open_updater(cli)?, url.clone(), *force),
        Commands::Status { json } => status::cmd_status(&open_updater(cli)?, *json),
        Commands::Seed {
            url,
            file_type,
            entry_count,
            etag,
        } => cmd_seed(&open_updater(cli)?, url, file_type, *entry_count, etag.clone()),
        Commands::Disable => {
            open_updater(cli)?
                .fall_back_to_preloaded()
                .map_err(|e| format!("Failed to fall back to the bundled list: {}", e))?;
            println!("Using the bundled blocklist");
            Ok(())
        }
        Commands::RestoreDefaults => {
            open_updater(cli)?
                .restore_defaults()
                .map_err(|e| format!("Failed to restore defaults: {}", e))?;
            println!("Restored default settings");
            Ok(())
        }
        Commands::Subdomains { state } => {
            let enabled = open_updater(cli)?
                .set_block_subdomains(matches!(state, Toggle::On))
                .map_err(|e| format!("Failed to update setting: {}", e))?;
            println!("Subdomain blocking: {}", if enabled { "on" } else { "off" });
            Ok(())
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "blockwright", "blockwright")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".blockwright"))
}

fn open_updater(cli: &Cli) -> Result<Updater<ReqwestClient>, String> {
    let layout = StorageLayout::new(cli.data_dir.clone().unwrap_or_else(default_data_dir));
    fs::create_dir_all(layout.dir())
        .map_err(|e| format!("Failed to create '{}': {}", layout.dir().display(), e))?;

    let store: Arc<dyn MetadataStore> = Arc::new(
        JsonFileStore::open(layout.metadata_path()).map_err(|e| format!("Failed to open metadata: {}", e))?,
    );

    let reload: Arc<dyn ReloadSignal> = match cli.reload_command.as_deref() {
        Some(command) => Arc::new(
            CommandReload::parse(command).ok_or_else(|| "Reload command is empty".to_string())?,
        ),
        None => Arc::new(LogReload),
    };

    let client = ReqwestClient::new().map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    Ok(Updater::new(client, store, reload, layout))
}

fn cmd_compile(input: &Path, output_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create '{}': {}", output_dir.display(), e))?;

    let layout = StorageLayout::new(output_dir);
    let staging = layout.download_path();
    fs::copy(input, &staging)
        .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;

    let paths: RuleFilePaths = layout.rule_files();
    let report = compile_artifact(&staging, &paths).map_err(|e| e.to_string())?;

    let rules = read_rule_list(&paths.exact)
        .map_err(|e| format!("Generated rule list failed validation: {}", e))?;

    println!("Compiled '{}' into '{}'", input.display(), output_dir.display());
    println!("  Type:     {}", report.file_type);
    println!("  Entries:  {}", report.entry_count);
    println!("  Rules:    {}", rules.len());
    if report.file_type == FileType::Hosts {
        println!("  Wildcard: {}", paths.wildcard.display());
    }
    println!("  Status:   {}", report.status);

    Ok(())
}

fn cmd_seed(
    updater: &Updater<ReqwestClient>,
    url: &str,
    file_type: &str,
    entry_count: Option<u64>,
    etag: Option<String>,
) -> Result<(), String> {
    let file_type: FileType = file_type.parse()?;
    let descriptor = BlocklistDescriptor {
        name: "preloaded",
        url: Some(url.to_string()),
        file_type: Some(file_type),
        entry_count,
        etag,
    };
    updater
        .seed_preloaded(&descriptor)
        .map_err(|e| format!("Failed to seed bundled list: {}", e))?;

    if updater
        .record(ListName::Current)
        .url()
        .map_err(|e| e.to_string())?
        .is_none()
    {
        updater
            .restore_defaults()
            .map_err(|e| format!("Failed to restore defaults: {}", e))?;
    }

    println!("Recorded bundled list '{}'", url);
    Ok(())
}
