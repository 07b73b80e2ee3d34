//! Adaptive access token issuance.
//!
//! Each request is resolved in three steps: the client address is read from
//! the forwarded headers, mapped to a country, then scored for abuse. Blocked
//! countries and high-risk addresses are denied, medium-risk callers get a
//! shortened token lifetime depending on the time of day.

use std::net::IpAddr;
use std::ops::Range;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Timelike, Utc};
use serde_json::{Value, json};

use crate::geo::{CountryResolver, UNKNOWN_COUNTRY};
use crate::reputation::ReputationClient;
use crate::response::{ActionReply, ActionResponse, Operation};

/// Header the platform forwards the caller's address in.
pub const CLIENT_IP_HEADER: &str = "x-client-source-ip";

const EXPIRES_IN_PATH: &str = "/accessToken/claims/expires_in";
const CLAIMS_APPEND_PATH: &str = "/accessToken/claims/-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientIpError {
    #[error("no client IP address provided")]
    Missing,

    #[error("invalid client IP address '{0}'")]
    Invalid(String),
}

/// Reads the caller's address from `event.request.additionalHeaders`.
///
/// Header names match case-insensitively; the first value wins.
pub fn client_ip(payload: &Value) -> Result<IpAddr, ClientIpError> {
    let raw = payload
        .pointer("/event/request/additionalHeaders")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|header| {
            header
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.eq_ignore_ascii_case(CLIENT_IP_HEADER))
        })
        .and_then(|header| header.pointer("/value/0"))
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ClientIpError::Missing)?;

    raw.trim().parse().map_err(|_| ClientIpError::Invalid(raw.to_string()))
}

/// Thresholds and lifetimes for the issuance decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRules {
    /// Uppercase country codes that are always denied.
    pub blocked_countries: Vec<String>,
    /// Scores strictly above this are denied (default: 75).
    pub deny_above: u32,
    /// Scores strictly below this pass unmodified (default: 25).
    pub allow_below: u32,
    /// UTC hours treated as working hours (default: 9..17).
    pub working_hours_utc: Range<u32>,
    /// Token lifetime in seconds during working hours (default: 900).
    pub working_hours_expiry: u32,
    /// Token lifetime in seconds outside working hours (default: 300).
    pub off_hours_expiry: u32,
}

impl Default for TokenRules {
    fn default() -> Self {
        Self {
            blocked_countries: ["KP", "IR", "RU", "SY", "CN"].map(String::from).to_vec(),
            deny_above: 75,
            allow_below: 25,
            working_hours_utc: 9..17,
            working_hours_expiry: 900,
            off_hours_expiry: 300,
        }
    }
}

impl TokenRules {
    #[must_use]
    pub fn blocked_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_countries = countries
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    pub fn is_blocked(&self, country: &str) -> bool {
        self.blocked_countries.iter().any(|c| c.eq_ignore_ascii_case(country))
    }

    /// Decides on a caller from an allowed country given its abuse score.
    pub fn decide(&self, country: String, score: u32, now: DateTime<Utc>) -> TokenDecision {
        if score > self.deny_above {
            return TokenDecision::Deny(
                "Access token issuance is blocked due to high IP risk.".to_string(),
            );
        }
        if score < self.allow_below {
            return TokenDecision::Allow { country };
        }

        let expires_in = if self.working_hours_utc.contains(&now.hour()) {
            self.working_hours_expiry
        } else {
            self.off_hours_expiry
        };
        TokenDecision::AllowWithExpiry { country, expires_in }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenDecision {
    Deny(String),
    /// Issue as requested, tagging the token with the caller's country.
    Allow { country: String },
    /// Issue with a shortened lifetime.
    AllowWithExpiry { country: String, expires_in: u32 },
    /// The reputation lookup failed; no decision could be made.
    LookupFailed,
}

impl TokenDecision {
    pub fn into_reply(self) -> ActionReply {
        match self {
            TokenDecision::Deny(reason) => {
                ActionResponse::failed("access_denied", reason).into_reply(StatusCode::OK)
            }
            TokenDecision::Allow { country } => ActionResponse::success()
                .with_operations(vec![country_claim(&country)])
                .into_reply(StatusCode::OK),
            TokenDecision::AllowWithExpiry { country, expires_in } => ActionResponse::success()
                .with_operations(vec![
                    Operation::replace(EXPIRES_IN_PATH, json!(expires_in.to_string())),
                    country_claim(&country),
                ])
                .into_reply(StatusCode::OK),
            TokenDecision::LookupFailed => ActionResponse::server_error(
                "An error occurred while checking the IP address risk.",
            )
            .into_reply(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

fn country_claim(country: &str) -> Operation {
    Operation::add(CLAIMS_APPEND_PATH, json!({"name": "country", "value": country}))
}

/// Issuance policy with its lookups injected.
#[derive(Clone)]
pub struct TokenIssuancePolicy {
    countries: Arc<dyn CountryResolver>,
    reputation: Arc<dyn ReputationClient>,
    rules: TokenRules,
}

impl TokenIssuancePolicy {
    pub fn new(
        countries: Arc<dyn CountryResolver>,
        reputation: Arc<dyn ReputationClient>,
        rules: TokenRules,
    ) -> Self {
        Self { countries, reputation, rules }
    }

    pub fn rules(&self) -> &TokenRules {
        &self.rules
    }

    pub async fn evaluate(&self, payload: &Value, now: DateTime<Utc>) -> TokenDecision {
        let ip = match client_ip(payload) {
            Ok(ip) => ip,
            Err(ClientIpError::Missing) => {
                tracing::warn!(
                    target: "identity_actions.token.no_client_ip",
                    "No client IP address found, denying by default"
                );
                return TokenDecision::Deny(
                    "Request denied: No client IP address provided.".to_string(),
                );
            }
            Err(e @ ClientIpError::Invalid(_)) => {
                tracing::warn!(target: "identity_actions.token.invalid_client_ip", error = %e);
                return TokenDecision::Deny(
                    "Request denied: Invalid client IP address.".to_string(),
                );
            }
        };

        let country = self.countries.country(ip).unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());
        tracing::info!(target: "identity_actions.token", %ip, %country, "Resolved client country");

        if self.rules.is_blocked(&country) {
            tracing::info!(
                target: "identity_actions.token.blocked_country",
                %ip,
                %country,
                "Token issuance denied for restricted country"
            );
            return TokenDecision::Deny(format!(
                "Access token issuance is blocked from your region ({country})."
            ));
        }

        let score = match self.reputation.abuse_confidence_score(ip).await {
            Ok(score) => score,
            Err(e) => {
                tracing::error!(
                    target: "identity_actions.token.reputation_failed",
                    %ip,
                    error = %e,
                    "IP reputation lookup failed"
                );
                return TokenDecision::LookupFailed;
            }
        };

        let decision = self.rules.decide(country, score, now);
        tracing::info!(
            target: "identity_actions.token",
            %ip,
            score,
            decision = ?decision,
            "Token issuance decided"
        );
        decision
    }
}
