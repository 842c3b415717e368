/// Authentication Service
///
/// Drives the per-user session lifecycle: signup, login, refresh with
/// rotation, validation and logout. Identity checks (store lookups and
/// bcrypt) always finish before the session registry is touched, so no
/// registry lock is ever held across slow work.

use std::sync::Arc;

use crate::auth::claims::{RefreshTerm, Token, TokenKind};
use crate::auth::jwt::TokenCodec;
use crate::auth::password::{meets_policy, CredentialVerifier};
use crate::auth::session::SessionRegistry;
use crate::clock::{Clock, SystemClock};
use crate::configuration::{JwtSettings, PasswordSettings};
use crate::error::AuthError;
use crate::store::{NewUser, User, UserStore};

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Signup input, already shape-checked by the caller
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub password: String,
}

/// Minimal user details handed back on login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Tokens issued by a successful signup, login or refresh
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: Token,
    /// Absent after signup, which only opens an access slot
    pub refresh_token: Option<Token>,
    /// Present after signup and login
    pub user: Option<UserInfo>,
}

/// Lower-case and trim an email so it can key the store and the registry
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
    verifier: CredentialVerifier,
    registry: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
    // Hash checked against when the email is unknown, so both login
    // failures cost one bcrypt verification
    decoy_hash: Option<String>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: &JwtSettings, password: &PasswordSettings) -> Self {
        let verifier = CredentialVerifier::new(password.hash_cost);
        let decoy_hash = match verifier.hash(DECOY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::error!(error = %e, cost = password.hash_cost, "Failed to prepare decoy hash");
                None
            }
        };

        Self {
            store,
            codec: TokenCodec::new(jwt),
            verifier,
            registry: Arc::new(SessionRegistry::new()),
            clock: Arc::new(SystemClock),
            decoy_hash,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Access token lifetime in seconds, reported to clients as `expires_in`
    pub fn access_token_ttl(&self) -> i64 {
        self.codec.access_ttl().num_seconds()
    }

    /// Register a user and sign them straight in with an access token
    ///
    /// # Errors
    /// - `PolicyViolation` if the password is too weak
    /// - `AlreadyRegistered` if the email is taken
    /// - `StorageFailure` if the user could not be persisted
    pub async fn signup(&self, registration: Registration) -> Result<IssuedTokens, AuthError> {
        if !meets_policy(&registration.password) {
            return Err(AuthError::PolicyViolation);
        }

        let email = normalize_email(&registration.email);
        if self.store.exists_by_email(&email).await? {
            tracing::info!(user = %email, "Signup rejected, email already registered");
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = self.verifier.hash(&registration.password)?;
        let user = self
            .store
            .save(NewUser {
                name: registration.name.trim().to_string(),
                contact_number: registration.contact_number.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        let access_token = self.codec.mint_access(&user.email, self.clock.now())?;
        self.registry.set_access(&user.email, access_token.as_str());

        tracing::info!(user_id = user.id, user = %user.email, "User registered");

        Ok(IssuedTokens {
            access_token,
            refresh_token: None,
            user: Some(UserInfo::from(&user)),
        })
    }

    /// Check credentials and open a fresh session, retiring any earlier one
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<IssuedTokens, AuthError> {
        let email = normalize_email(email);
        let user = self.store.find_by_email(&email).await?;

        let user = match user {
            Some(user) if self.verifier.verify(password, &user.password_hash) => user,
            Some(_) => {
                tracing::warn!(user = %email, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                if let Some(decoy) = &self.decoy_hash {
                    let _ = self.verifier.verify(password, decoy);
                }
                tracing::warn!(user = %email, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = self.clock.now();
        let term = if remember_me {
            RefreshTerm::Long
        } else {
            RefreshTerm::Standard
        };
        let access_token = self.codec.mint_access(&user.email, now)?;
        let refresh_token = self.codec.mint_refresh_with_term(&user.email, now, term)?;

        self.registry.open(
            &user.email,
            access_token.as_str(),
            Some(refresh_token.as_str()),
        );

        tracing::info!(user_id = user.id, user = %user.email, ?term, "User logged in");

        Ok(IssuedTokens {
            access_token,
            refresh_token: Some(refresh_token),
            user: Some(UserInfo::from(&user)),
        })
    }

    /// Trade the current refresh token for a new access/refresh pair.
    /// The presented refresh token is retired and cannot be used again.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        let presented = refresh_token.trim();
        if presented.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let now = self.clock.now();
        let token = self.codec.decode(presented).map_err(|e| {
            tracing::debug!(error = %e, "Refresh rejected");
            AuthError::InvalidToken
        })?;

        if token.kind() != TokenKind::Refresh {
            tracing::debug!(kind = ?token.kind(), "Refresh rejected, wrong token kind");
            return Err(AuthError::InvalidToken);
        }
        if token.is_expired(now) {
            tracing::debug!(user = %token.subject(), "Refresh rejected, token expired");
            return Err(AuthError::InvalidToken);
        }

        let user = token.subject();
        let term = token.claims.term.unwrap_or(RefreshTerm::Standard);
        let access_token = self.codec.mint_access(user, now)?;
        let new_refresh = self.codec.mint_refresh_with_term(user, now, term)?;

        if !self
            .registry
            .rotate(user, presented, access_token.as_str(), new_refresh.as_str())
        {
            tracing::warn!(user = %user, "Refresh rejected, token is not current");
            return Err(AuthError::InvalidToken);
        }

        tracing::info!(user = %user, "Tokens refreshed");

        Ok(IssuedTokens {
            access_token,
            refresh_token: Some(new_refresh),
            user: None,
        })
    }

    /// Decoded access token if it is authentic, unexpired and still the
    /// one the registry honours for its user
    pub fn authenticate(&self, access_token: &str) -> Option<Token> {
        let token = self.codec.decode(access_token).ok()?;

        if token.kind() != TokenKind::Access || token.is_expired(self.clock.now()) {
            return None;
        }
        if !self
            .registry
            .is_current_access(token.subject(), token.as_str())
        {
            return None;
        }

        Some(token)
    }

    pub fn validate(&self, access_token: &str) -> bool {
        self.authenticate(access_token).is_some()
    }

    /// Subject of a decodable, unexpired token; the registry is not consulted
    pub fn identify(&self, token: &str) -> Option<String> {
        let token = self.codec.decode(token).ok()?;
        if token.is_expired(self.clock.now()) {
            return None;
        }
        Some(token.claims.sub)
    }

    /// End the session the token belongs to. Always succeeds, whether or
    /// not a session existed.
    pub fn logout(&self, access_token: &str) {
        if let Some(user) = self.identify(access_token) {
            self.registry.clear(&user);
            tracing::info!(user = %user, "User logged out");
        }
    }

    pub async fn find_user(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_by_email(&normalize_email(email)).await?)
    }
}
