use crate::geo::GeoTableError;
use crate::reputation::ReputationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("range client setup failed: {0}")]
    RangeClient(#[from] pwned_range::LookupError),

    #[error("reputation client setup failed: {0}")]
    Reputation(#[from] ReputationError),

    #[error(transparent)]
    GeoTable(#[from] GeoTableError),

    #[error(
        "no country resolver configured while {blocked} countries are blocked; set GEOIP_DB or GEO_TABLE, or clear BLOCKED_COUNTRIES"
    )]
    NoCountryResolver { blocked: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
