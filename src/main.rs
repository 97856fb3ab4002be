use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lumen_bridge::config::{SETTING_BASE_URL, SETTING_PASSWORD, SETTING_USERNAME};
use lumen_bridge::{Bridge, Daemon, DeviceHost, HttpRemoteHub, MemoryHost, SettingsStore};

/// Lumen bridge - import devices from a remote Lumen hub
#[derive(Parser)]
#[command(name = "lumen", version, about)]
struct Cli {
    /// Path to the settings file (defaults to the platform config dir)
    #[arg(long, env = "LUMEN_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Store remote hub credentials
    Login {
        /// Base URL of the remote hub (e.g. <https://hub.local:9443>)
        #[arg(long, env = "LUMEN_HUB_URL")]
        base_url: String,

        /// Login username
        #[arg(long, env = "LUMEN_HUB_USERNAME")]
        username: String,

        /// Login password
        #[arg(long, env = "LUMEN_HUB_PASSWORD")]
        password: String,
    },
    /// Show stored settings (password masked)
    Show,
    /// Connect to the hub once and report what would be imported
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,lumen_bridge=info",
        1 => "info,lumen_bridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = SettingsStore::load(cli.config)?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Login {
                base_url,
                username,
                password,
            } => cmd_login(&settings, &base_url, &username, &password).await,
            Command::Show => cmd_show(&settings).await,
            Command::Check => cmd_check(&settings).await,
        };
    }

    tracing::info!("starting lumen bridge");

    let host = Arc::new(MemoryHost::new());
    let bridge = Arc::new(Bridge::new(Arc::new(HttpRemoteHub::new()), host));

    Daemon::new(bridge, Arc::new(settings)).run().await?;
    Ok(())
}

async fn cmd_login(
    settings: &SettingsStore,
    base_url: &str,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    settings.put_setting(SETTING_BASE_URL, base_url).await?;
    settings.put_setting(SETTING_USERNAME, username).await?;
    settings.put_setting(SETTING_PASSWORD, password).await?;

    println!("credentials stored for {username}@{base_url}");
    Ok(())
}

async fn cmd_show(settings: &SettingsStore) -> anyhow::Result<()> {
    for setting in settings.get_settings().await {
        println!("{} = {}", setting.key, setting.value);
    }
    Ok(())
}

async fn cmd_check(settings: &SettingsStore) -> anyhow::Result<()> {
    let host = Arc::new(MemoryHost::new());
    let bridge = Bridge::new(
        Arc::new(HttpRemoteHub::new()),
        Arc::clone(&host) as Arc<dyn DeviceHost>,
    );

    let credentials = settings.credentials().await;
    let imported = bridge.refresh(&credentials).await?;
    let status = bridge.status().await;

    println!(
        "hub version: {}",
        status.hub_version.as_deref().unwrap_or("(unknown)")
    );
    println!("state: {}", status.state);
    println!("importable devices: {imported}");

    if let Some(batch) = host.last_batch().await {
        for descriptor in batch {
            let tags: Vec<String> = descriptor
                .capabilities
                .iter()
                .map(ToString::to_string)
                .collect();
            println!(
                "  {} ({}) [{}]",
                descriptor.name,
                descriptor.native_id,
                tags.join(", ")
            );
        }
    }

    Ok(())
}
