use crate::client::RangeClient;
use crate::credential::{CredentialInput, InvalidInput};
use crate::digest::PasswordDigest;
use crate::error::LookupError;
use crate::range::find_occurrences;

/// Status reported when the range API could not be reached at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// Status the range API uses to signal rate limiting.
pub const RATE_LIMITED_STATUS: u16 = 429;

const RATE_LIMITED_MESSAGE: &str = "External HIBP rate limit hit, try again in a few seconds.";

/// Classification of a single password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The password appears in the breach corpus `occurrences` times (always > 0).
    Compromised { occurrences: u64 },
    Clean,
    InvalidInput(InvalidInput),
    /// The range lookup failed. `status` is the upstream HTTP status, or 500
    /// when the request never got an answer.
    UpstreamError { status: u16, message: String },
}

impl Outcome {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Outcome::UpstreamError { status: RATE_LIMITED_STATUS, .. })
    }

    fn from_lookup_error(error: &LookupError) -> Self {
        match error.status() {
            Some(RATE_LIMITED_STATUS) => Outcome::UpstreamError {
                status: RATE_LIMITED_STATUS,
                message: RATE_LIMITED_MESSAGE.to_string(),
            },
            Some(status) => Outcome::UpstreamError { status, message: error.to_string() },
            None => Outcome::UpstreamError {
                status: TRANSPORT_FAILURE_STATUS,
                message: error.to_string(),
            },
        }
    }
}

/// Checks credentials against a k-anonymity range service.
///
/// Only the 5-character prefix of the SHA-1 digest is sent upstream; the
/// suffix is matched locally against the (padded) response. Each call makes
/// exactly one lookup and never retries, so a 429 is surfaced to the caller.
///
/// # Example
///
/// ```rust,no_run
/// use pwned_range::{CredentialInput, HibpClient, Outcome, PasswordExposureChecker, RangeClientConfig};
///
/// # async fn run() -> Result<(), pwned_range::LookupError> {
/// let checker = PasswordExposureChecker::new(HibpClient::new(RangeClientConfig::default())?);
///
/// match checker.check(Some(&CredentialInput::plain("password123"))).await {
///     Outcome::Compromised { occurrences } => println!("seen {occurrences} times"),
///     Outcome::Clean => println!("not found"),
///     other => println!("could not check: {other:?}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PasswordExposureChecker<C> {
    client: C,
}

impl<C: RangeClient> PasswordExposureChecker<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Classifies the credential from a credential-update event.
    ///
    /// An absent credential, a non-`PASSWORD` type or a missing value yields
    /// `InvalidInput::NoPasswordCredential`; a `HASH` value that is not
    /// base64-encoded UTF-8 yields `InvalidInput::BadEncoding`.
    pub async fn check(&self, credential: Option<&CredentialInput>) -> Outcome {
        let plaintext = match credential
            .ok_or(InvalidInput::NoPasswordCredential)
            .and_then(CredentialInput::plaintext)
        {
            Ok(plaintext) => plaintext,
            Err(invalid) => return Outcome::InvalidInput(invalid),
        };

        self.check_password(&plaintext).await
    }

    /// Classifies a plaintext password.
    pub async fn check_password(&self, plaintext: &str) -> Outcome {
        let digest = PasswordDigest::of(plaintext);

        let body = match self.client.fetch_range(digest.prefix()).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    target: "pwned_range.lookup_failed",
                    prefix = digest.prefix(),
                    status = e.status(),
                    error = %e,
                    "Range lookup failed"
                );
                return Outcome::from_lookup_error(&e);
            }
        };

        match find_occurrences(&body, digest.suffix()) {
            Some(occurrences) if occurrences > 0 => Outcome::Compromised { occurrences },
            _ => Outcome::Clean,
        }
    }
}
