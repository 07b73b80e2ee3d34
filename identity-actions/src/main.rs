use clap::Parser;
use identity_actions::{AppState, Args, Error, start_server};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "info,identity_actions=debug,pwned_range=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    init_tracing();

    info!(
        listen = %args.listen,
        range_api_url = %args.range_api_url,
        range_timeout_secs = args.range_timeout_secs,
        blocked_countries = ?args.blocked_countries,
        geoip_db = ?args.geoip_db,
        profile_api_key = args.api_key.is_some(),
        "Configuration loaded"
    );

    let state = AppState::from_args(&args).await?;
    start_server(state, args.listen).await?;

    info!("Identity actions service shutdown complete");
    Ok(())
}

/// Initializes tracing; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
