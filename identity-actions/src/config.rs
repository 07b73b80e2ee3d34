use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pwned_range::RangeClientConfig;
use pwned_range::client::{DEFAULT_USER_AGENT, HIBP_RANGE_URL};

use crate::reputation::ABUSEIPDB_CHECK_URL;
use crate::token::TokenRules;

#[derive(Parser, Debug, Clone)]
#[command(name = "identity-actions")]
#[command(about = "Webhook service for identity platform password, token and profile actions")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Pwned Passwords range endpoint; the hash prefix is appended
    #[arg(long, env = "RANGE_API_URL", default_value = HIBP_RANGE_URL)]
    pub range_api_url: String,

    /// Timeout for a range lookup, in seconds
    #[arg(long, env = "RANGE_LOOKUP_TIMEOUT_SECS", default_value_t = 3)]
    pub range_timeout_secs: u64,

    /// User-Agent sent to the range API
    #[arg(long, env = "RANGE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub range_user_agent: String,

    /// Don't ask the range API for padded responses
    #[arg(long, env = "RANGE_NO_PADDING")]
    pub range_no_padding: bool,

    /// AbuseIPDB API key used for token issuance risk checks
    #[arg(long, env = "ABUSEIPDB_API_KEY", hide_env_values = true)]
    pub abuseipdb_api_key: Option<String>,

    /// AbuseIPDB check endpoint
    #[arg(long, env = "ABUSEIPDB_URL", default_value = ABUSEIPDB_CHECK_URL)]
    pub abuseipdb_url: String,

    /// Timeout for a reputation lookup, in seconds
    #[arg(long, env = "ABUSEIPDB_TIMEOUT_SECS", default_value_t = 5)]
    pub abuseipdb_timeout_secs: u64,

    /// Country codes denied access tokens
    #[arg(long, env = "BLOCKED_COUNTRIES", value_delimiter = ',', default_value = "KP,IR,RU,SY,CN")]
    pub blocked_countries: Vec<String>,

    /// MaxMind country database (`.mmdb`, e.g. GeoLite2-Country) used to resolve client countries
    #[arg(long, env = "GEOIP_DB")]
    pub geoip_db: Option<PathBuf>,

    /// JSON file mapping client addresses to country codes, consulted before the GeoIP database
    #[arg(long, env = "GEO_TABLE")]
    pub geo_table: Option<PathBuf>,

    /// Departments accepted on profile updates
    #[arg(
        long,
        env = "VALID_DEPARTMENTS",
        value_delimiter = ',',
        default_value = "Engineering,HR,Sales,Finance"
    )]
    pub valid_departments: Vec<String>,

    /// Shared secret required in the `api-key` header of profile update calls
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Args {
    pub fn range_client_config(&self) -> RangeClientConfig {
        RangeClientConfig::default()
            .api_url(self.range_api_url.clone())
            .timeout(Duration::from_secs(self.range_timeout_secs))
            .user_agent(self.range_user_agent.clone())
            .add_padding(!self.range_no_padding)
    }

    pub fn token_rules(&self) -> TokenRules {
        TokenRules::default().blocked_countries(&self.blocked_countries)
    }

    pub fn abuseipdb_timeout(&self) -> Duration {
        Duration::from_secs(self.abuseipdb_timeout_secs)
    }

    pub fn departments(&self) -> Vec<String> {
        self.valid_departments
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect()
    }
}
