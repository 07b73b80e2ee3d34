//! Client IP to country resolution.
//!
//! Production lookups go through a MaxMind country database (GeoLite2-Country
//! or GeoIP2-Country). A JSON address table can sit in front of it to pin
//! specific addresses, and doubles as the resolver in tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::{MaxMindDBError, Reader, geoip2};
use tokio::fs;

/// Country reported when an address can't be resolved.
pub const UNKNOWN_COUNTRY: &str = "UNKNOWN";

/// Resolves an address to an ISO 3166-1 alpha-2 country code.
pub trait CountryResolver: Send + Sync {
    fn country(&self, ip: IpAddr) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeoTableError {
    #[error("failed to read geo table '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("geo table is not a JSON object of address to country code: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid address '{0}' in geo table")]
    InvalidAddress(String),

    #[error("'{path}' is not a MaxMind database: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: MaxMindDBError,
    },
}

/// Fixed address to country mapping, loaded from a JSON object such as
/// `{"203.0.113.7": "KP", "2001:db8::1": "LK"}`.
///
/// An empty table resolves nothing, which makes every caller `UNKNOWN`.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryTable {
    entries: HashMap<IpAddr, String>,
}

impl StaticCountryTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(mut self, ip: IpAddr, country: impl AsRef<str>) -> Self {
        self.entries.insert(ip, country.as_ref().trim().to_ascii_uppercase());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, GeoTableError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;

        raw.into_iter().try_fold(Self::new(), |table, (addr, country)| -> Result<Self, GeoTableError> {
            let ip: IpAddr =
                addr.trim().parse().map_err(|_| GeoTableError::InvalidAddress(addr.clone()))?;
            Ok(table.with_entry(ip, country))
        })
    }

    pub async fn load(path: &Path) -> Result<Self, GeoTableError> {
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| GeoTableError::Read { path: path.to_path_buf(), source: e })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CountryResolver for StaticCountryTable {
    fn country(&self, ip: IpAddr) -> Option<String> {
        self.entries.get(&ip).cloned()
    }
}

/// Country lookups against a MaxMind `.mmdb` database held in memory.
pub struct GeoIpDatabase {
    reader: Reader<Vec<u8>>,
}

impl GeoIpDatabase {
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self, GeoTableError> {
        let reader = Reader::from_source(bytes)
            .map_err(|e| GeoTableError::Database { path: path.to_path_buf(), source: e })?;
        Ok(Self { reader })
    }

    pub async fn load(path: &Path) -> Result<Self, GeoTableError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| GeoTableError::Read { path: path.to_path_buf(), source: e })?;
        Self::from_bytes(path, bytes)
    }

    /// Database flavour from the metadata, e.g. `GeoLite2-Country`.
    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }
}

impl CountryResolver for GeoIpDatabase {
    fn country(&self, ip: IpAddr) -> Option<String> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => record.country.and_then(|c| c.iso_code).map(str::to_ascii_uppercase),
            Err(MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                tracing::warn!(target: "identity_actions.geo", %ip, error = %e, "GeoIP lookup failed");
                None
            }
        }
    }
}

/// Asks each resolver in turn and keeps the first answer.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn CountryResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resolver: impl CountryResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl CountryResolver for ResolverChain {
    fn country(&self, ip: IpAddr) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.country(ip))
    }
}
