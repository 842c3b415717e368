/// JWT Token Generation and Decoding
///
/// Mints signed access and refresh tokens and turns token strings back into
/// claims. Decoding checks signature, structure and issuer only; expiry is
/// judged by the caller against its own clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, RefreshTerm, Token, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AuthError, DecodeError};

/// Signs and verifies tokens with the process-wide secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    long_refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_token_expiry),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry),
            long_refresh_ttl: Duration::seconds(config.long_refresh_token_expiry),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn mint_access(&self, subject: &str, now: DateTime<Utc>) -> Result<Token, AuthError> {
        self.mint(subject, now, self.access_ttl, TokenKind::Access, None)
    }

    /// Refresh token with the standard 7-day style lifetime
    pub fn mint_refresh(&self, subject: &str, now: DateTime<Utc>) -> Result<Token, AuthError> {
        self.mint(
            subject,
            now,
            self.refresh_ttl,
            TokenKind::Refresh,
            Some(RefreshTerm::Standard),
        )
    }

    /// Refresh token with the long 90-day style lifetime
    pub fn mint_long_refresh(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<Token, AuthError> {
        self.mint(
            subject,
            now,
            self.long_refresh_ttl,
            TokenKind::Refresh,
            Some(RefreshTerm::Long),
        )
    }

    pub fn mint_refresh_with_term(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        term: RefreshTerm,
    ) -> Result<Token, AuthError> {
        match term {
            RefreshTerm::Standard => self.mint_refresh(subject, now),
            RefreshTerm::Long => self.mint_long_refresh(subject, now),
        }
    }

    fn mint(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        ttl: Duration,
        kind: TokenKind,
        term: Option<RefreshTerm>,
    ) -> Result<Token, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
            term,
        };

        let encoded = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(Token { encoded, claims })
    }

    /// Verify signature and structure, returning the token even if expired
    pub fn decode(&self, encoded: &str) -> Result<Token, DecodeError> {
        decode::<Claims>(encoded, &self.decoding_key, &self.validation)
            .map(|data| Token {
                encoded: encoded.to_string(),
                claims: data.claims,
            })
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::InvalidSignature => DecodeError::BadSignature,
                    _ => DecodeError::Malformed,
                };
                tracing::debug!(error = %e, "Token decode failed");
                err
            })
    }
}

/// Expiration check against an explicit instant
pub fn is_expired(token: &Token, now: DateTime<Utc>) -> bool {
    token.is_expired(now)
}

pub fn kind_of(token: &Token) -> TokenKind {
    token.kind()
}
