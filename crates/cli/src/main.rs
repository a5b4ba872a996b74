use std::sync::Arc;

use {
    clap::Parser,
    tracing::info,
    tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
};

use {
    aosd_gateway::{start_server, GatewayState},
    aosd_ssh::SshExecutor,
    aosd_tools::ToolService,
};

#[derive(Parser)]
#[command(name = "aosd", about = "aosd — OmniSwitch tool gateway")]
struct Cli {
    /// Address to bind to (overrides config value).
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long)]
    port: Option<u16>,

    /// Config file path (overrides AOS_CONFIG_FILE).
    #[arg(long, env = "AOS_CONFIG_FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "aosd starting");

    let config = match cli.config {
        Some(ref path) => aosd_config::load_config(std::path::Path::new(path))?,
        None => aosd_config::load_from_env()?,
    };

    let executor = SshExecutor::from_config(&config)
        .map_err(|e| anyhow::anyhow!("ssh setup failed: {e}"))?;
    let service = ToolService::new(&config, Arc::new(executor))?;
    let state = Arc::new(GatewayState::new(&config, service)?);

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);

    start_server(&bind, port, state).await
}
