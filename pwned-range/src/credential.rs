use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;

/// Credential type the checker accepts.
pub const PASSWORD_CREDENTIAL_TYPE: &str = "PASSWORD";

// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How the credential value is carried in the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CredentialFormat {
    /// Base64 of the plaintext. Not a cryptographic hash, despite the name.
    #[serde(rename = "HASH")]
    Hash,
    /// Plaintext value. Any format string other than `HASH` lands here.
    #[default]
    #[serde(other)]
    Plain,
}

/// The credential being updated, as sent by the identity platform.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub format: CredentialFormat,
    #[serde(default)]
    pub value: Option<String>,
}

impl std::fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialInput")
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialInput {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            kind: PASSWORD_CREDENTIAL_TYPE.to_string(),
            format: CredentialFormat::Plain,
            value: Some(value.into()),
        }
    }

    /// A password credential carrying base64-encoded plaintext.
    pub fn hashed(encoded: impl Into<String>) -> Self {
        Self {
            kind: PASSWORD_CREDENTIAL_TYPE.to_string(),
            format: CredentialFormat::Hash,
            value: Some(encoded.into()),
        }
    }

    /// Returns the UTF-8 plaintext this credential carries.
    pub fn plaintext(&self) -> Result<String, InvalidInput> {
        if self.kind != PASSWORD_CREDENTIAL_TYPE {
            return Err(InvalidInput::NoPasswordCredential);
        }
        let value = self.value.as_deref().ok_or(InvalidInput::NoPasswordCredential)?;

        match self.format {
            CredentialFormat::Plain => Ok(value.to_string()),
            CredentialFormat::Hash => {
                let bytes =
                    LENIENT_BASE64.decode(value.trim()).map_err(|_| InvalidInput::BadEncoding)?;
                String::from_utf8(bytes).map_err(|_| InvalidInput::BadEncoding)
            }
        }
    }
}

/// Caller-side problems with the submitted credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("no password credential found")]
    NoPasswordCredential,

    #[error("credential value is not base64-encoded UTF-8")]
    BadEncoding,
}

impl InvalidInput {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            InvalidInput::NoPasswordCredential => "no_password_credential",
            InvalidInput::BadEncoding => "bad_encoding",
        }
    }
}
