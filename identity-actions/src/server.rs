//! HTTP server setup and routing.
//!
//! All action routes share one [`AppState`]: the password checker, the token
//! issuance policy and the profile update policy, each built once at startup
//! with its outbound clients injected.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use pwned_range::{HibpClient, PasswordExposureChecker, RangeClient};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Args;
use crate::error::Error;
use crate::geo::{CountryResolver, GeoIpDatabase, ResolverChain, StaticCountryTable};
use crate::handlers;
use crate::profile::{LogNotifier, ProfileUpdatePolicy};
use crate::reputation::AbuseIpDbClient;
use crate::token::TokenIssuancePolicy;

/// Maximum accepted request body (100 KiB).
pub const BODY_LIMIT: usize = 100 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub checker: PasswordExposureChecker<Arc<dyn RangeClient>>,
    pub token: Arc<TokenIssuancePolicy>,
    pub profile: Arc<ProfileUpdatePolicy>,
}

impl AppState {
    pub fn new(
        range: Arc<dyn RangeClient>,
        token: TokenIssuancePolicy,
        profile: ProfileUpdatePolicy,
    ) -> Self {
        Self {
            checker: PasswordExposureChecker::new(range),
            token: Arc::new(token),
            profile: Arc::new(profile),
        }
    }

    /// Builds every client and policy from the command line / environment.
    pub async fn from_args(args: &Args) -> Result<Self, Error> {
        let range = HibpClient::new(args.range_client_config())?;

        let countries = country_resolver(args).await?;

        if args.abuseipdb_api_key.is_none() {
            warn!("ABUSEIPDB_API_KEY not set, token issuance risk checks will fail");
        }
        let reputation = AbuseIpDbClient::new(
            args.abuseipdb_url.clone(),
            args.abuseipdb_api_key.clone(),
            args.abuseipdb_timeout(),
        )?;

        let token = TokenIssuancePolicy::new(countries, Arc::new(reputation), args.token_rules());
        let profile = ProfileUpdatePolicy::new(args.departments(), Arc::new(LogNotifier))
            .with_api_key(args.api_key.clone());

        Ok(Self::new(Arc::new(range), token, profile))
    }
}

/// Chains the override table in front of the GeoIP database. Refuses to run
/// a country block list with nothing to resolve countries.
async fn country_resolver(args: &Args) -> Result<Arc<dyn CountryResolver>, Error> {
    let mut chain = ResolverChain::new();

    if let Some(path) = &args.geo_table {
        let table = StaticCountryTable::load(path).await?;
        info!(path = %path.display(), entries = table.len(), "Geo table loaded");
        chain = chain.with(table);
    }
    if let Some(path) = &args.geoip_db {
        let database = GeoIpDatabase::load(path).await?;
        info!(
            path = %path.display(),
            database_type = database.database_type(),
            "GeoIP database loaded"
        );
        chain = chain.with(database);
    }

    if chain.is_empty() {
        let blocked = args.token_rules().blocked_countries.len();
        if blocked > 0 {
            return Err(Error::NoCountryResolver { blocked });
        }
        warn!("No country resolver configured, every client resolves to UNKNOWN");
    }

    Ok(Arc::new(chain))
}

/// Creates the router with all action routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/passwordcheck", post(handlers::password_check))
        .route("/pre-issue-access-token", post(handlers::token_issuance))
        .route("/validate-user-profile-update", post(handlers::profile_update))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), Error> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Identity actions service listening");

    axum::serve(listener, create_router(state)).with_graceful_shutdown(shutdown).await?;

    info!("Server stopped");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received CTRL+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
