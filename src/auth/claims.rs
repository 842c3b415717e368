/// JWT Claims structure
///
/// The payload carried by every token this service issues. Access and
/// refresh tokens share one shape and are told apart by `typ`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which slot of a session a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Lifetime policy of a refresh token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTerm {
    Standard,
    Long,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (normalized user email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Unique token id, keeps two tokens minted in the same second apart
    pub jti: String,
    pub typ: TokenKind,
    /// Only present on refresh tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<RefreshTerm>,
}

/// A signed token together with the claims it encodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub encoded: String,
    pub claims: Claims,
}

impl Token {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn kind(&self) -> TokenKind {
        self.claims.typ
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_datetime(self.claims.exp)
    }

    /// A token is expired from its `exp` second onwards
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.claims.exp <= now.timestamp()
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
