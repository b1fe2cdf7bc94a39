use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waystone::{ClientConfig, Notifier};
use waystone_client::{
    BackendClient, DeviceIdentity, HostnameIdentity, JsonFilePreferences, StaticIdentity,
};
use waystone_tls::TlsConfig;

#[derive(Parser)]
#[command(name = "waystone", version, about = "Reach whichever backend endpoint is up")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding waystone.json and the preferences file
    #[arg(long, env = "WAYSTONE_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,
    /// Comma-separated endpoint list, overrides the config file
    #[arg(long, value_delimiter = ',')]
    endpoints: Vec<String>,
    #[arg(long, env = "WAYSTONE_DEVICE_ID")]
    device_id: Option<String>,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    base_delay_ms: Option<u64>,
    /// Preferences file, relative to --config-dir
    #[arg(long, env = "WAYSTONE_PREFS_FILE", default_value = "preferences.json")]
    prefs_file: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch this device's link
    FetchLink,
    /// Check that this device is registered and store its account id
    CheckRegistration,
    /// Turn the device flag on or off
    SetFlag {
        #[arg(value_parser = parse_toggle, action = clap::ArgAction::Set)]
        state: bool,
    },
    /// Print the effective configuration and exit
    ShowConfig,
}

fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on|off, got '{}'", other)),
    }
}

/// Prints the notice where a terminal user will see it.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

fn resolve_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::load_or_default(&cli.config_dir);
    if !cli.endpoints.is_empty() {
        config.endpoints = cli
            .endpoints
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }
    if let Some(n) = cli.max_attempts {
        config.retry.max_attempts = n;
    }
    if let Some(n) = cli.timeout_ms {
        config.retry.timeout_ms = n;
    }
    if let Some(n) = cli.base_delay_ms {
        config.retry.base_delay_ms = n;
    }
    config
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli);
    let tls = TlsConfig::from_env()?;
    tracing::debug!(
        "Resolved config: endpoints={:?}, retry={:?}, trust={:?}",
        config.endpoints,
        config.retry,
        tls.trust
    );

    if let Command::ShowConfig = cli.command {
        let view = serde_json::json!({
            "endpoints": config.endpoints,
            "retry": config.retry,
            "trust": tls.trust,
            "user_agent": tls.user_agent,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let identity: Arc<dyn DeviceIdentity> = match &cli.device_id {
        Some(id) => Arc::new(StaticIdentity::new(id.clone())),
        None => Arc::new(HostnameIdentity),
    };
    let prefs = Arc::new(JsonFilePreferences::open(
        cli.config_dir.join(&cli.prefs_file),
    ));
    let client = BackendClient::new(&config, &tls, identity, prefs, Arc::new(StderrNotifier))?;

    match cli.command {
        Command::FetchLink => {
            println!("{}", client.fetch_link().await?);
        }
        Command::CheckRegistration => {
            let reg = client.check_registration().await?;
            let view = serde_json::json!({
                "device_id": reg.device_id,
                "account_id": reg.account_id,
            });
            println!("{}", view);
        }
        Command::SetFlag { state } => {
            client.set_flag(state).await?;
            println!("flag {}", if state { "on" } else { "off" });
        }
        Command::ShowConfig => {}
    }

    Ok(())
}
