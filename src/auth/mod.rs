/// Authentication module
///
/// Token codec, password hashing, the session registry and the service
/// that ties them into the login lifecycle.

mod claims;
mod jwt;
mod password;
mod service;
mod session;

pub use claims::{Claims, RefreshTerm, Token, TokenKind};
pub use jwt::{is_expired, kind_of, TokenCodec};
pub use password::{meets_policy, CredentialVerifier};
pub use service::{normalize_email, AuthService, IssuedTokens, Registration, UserInfo};
pub use session::SessionRegistry;
