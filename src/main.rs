use anyhow::Result;
use clap::Parser;
use hive_exporter::config::{log_directive, Config, ProductMapping};
use hive_exporter::error::ExporterError;
use hive_exporter::hive::HiveClient;
use hive_exporter::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Hive account e-mail (overrides config)
    #[arg(long, env = "HIVE_USERNAME")]
    hive_username: Option<String>,

    /// Hive account password (overrides config)
    #[arg(long, env = "HIVE_PASSWORD", hide_env_values = true)]
    hive_password: Option<String>,

    /// Hive API base URL (overrides config)
    #[arg(long, env = "HIVE_API_BASE_URL")]
    hive_api_base_url: Option<String>,

    /// Timeout for each Hive API and Cognito request, in seconds
    #[arg(long, env = "HIVE_REQUEST_TIMEOUT_SECONDS")]
    request_timeout_seconds: Option<u64>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Seconds between polls of the Hive API
    #[arg(long, env = "POLLING_INTERVAL_SECONDS")]
    polling_interval_seconds: Option<u64>,

    /// Which product mapping to export
    #[arg(long, env = "PRODUCT_MAPPING", value_enum)]
    product_mapping: Option<ProductMapping>,

    /// Also export `hive_action_enabled` for every home's actions
    #[arg(long, env = "COLLECT_ACTIONS")]
    collect_actions: Option<bool>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_directive(&args.log_level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Hive Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(username) = args.hive_username {
        config.hive.username = Some(username);
    }
    if let Some(password) = args.hive_password {
        config.hive.password = Some(secrecy::SecretString::from(password));
    }
    if let Some(base_url) = args.hive_api_base_url {
        config.hive.api_base_url = base_url;
    }
    if let Some(timeout) = args.request_timeout_seconds {
        config.hive.request_timeout_seconds = timeout;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(interval) = args.polling_interval_seconds {
        config.polling.interval_seconds = interval;
    }
    if let Some(mapping) = args.product_mapping {
        config.polling.product_mapping = mapping;
    }
    if let Some(collect_actions) = args.collect_actions {
        config.polling.collect_actions = collect_actions;
    }

    let credentials = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!(
        "Polling every {}s with {:?} product mapping",
        config.polling.interval_seconds, config.polling.product_mapping
    );

    let client = match HiveClient::login(&config.hive, &credentials).await {
        Ok(client) => client,
        Err(ExporterError::TwoFactorRequired) => {
            error!("2FA not supported");
            std::process::exit(1);
        }
        Err(e) => {
            error!("authentication unsuccessful: {}", e);
            std::process::exit(1);
        }
    };

    // Start the metrics server
    if let Err(e) = server::start(config, client).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
