use std::fmt;

use chrono::{DateTime, FixedOffset};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::Error;

/// Expiry timestamps come with a fixed numeric offset (`2025-03-01T14:05:00+0100`),
/// which is not RFC 3339.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Short-lived credential passed as `?btoken=` on mutating calls.
///
/// Immutable once published; a refresh publishes a new one.
#[derive(Clone)]
pub struct BearerToken {
    token: SecretString,
    expires: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>, expires: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires: expires.into(),
        }
    }

    /// The raw token value, for the `btoken` query parameter.
    pub fn expose_token(&self) -> &str {
        self.token.expose_secret()
    }

    /// The expiry exactly as the router sent it.
    pub fn expires(&self) -> &str {
        &self.expires
    }

    /// Parse the expiry in the router's timestamp format.
    pub fn expires_at(&self) -> Result<DateTime<FixedOffset>, Error> {
        DateTime::parse_from_str(&self.expires, EXPIRY_FORMAT).map_err(|e| {
            Error::protocol(
                format!("unparseable token expiry {:?}: {e}", self.expires),
                &self.expires,
            )
        })
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

/// `{"device": {"token": ..., "expires": ...}}` from `GET /device/token`.
#[derive(Debug, Deserialize)]
pub struct DeviceTokenEnvelope {
    pub device: DeviceToken,
}

#[derive(Debug, Deserialize)]
pub struct DeviceToken {
    pub token: String,
    pub expires: String,
}

impl TryFrom<DeviceToken> for BearerToken {
    type Error = Error;

    fn try_from(raw: DeviceToken) -> Result<Self, Error> {
        if raw.token.is_empty() {
            return Err(Error::protocol("device token envelope has an empty token", ""));
        }
        Ok(Self::new(raw.token, raw.expires))
    }
}
