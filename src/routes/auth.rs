/// Authentication Routes
///
/// Signup, login, token refresh, logout and the caller's profile.
/// Every success is an `AuthResponse` (or `ProfileResponse`); every failure
/// goes through `AppError` and renders the shared error body.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{normalize_email, AuthService, Claims, IssuedTokens, Registration, UserInfo};
use crate::error::{AppError, AuthError};
use crate::middleware::extract_bearer_token;
use crate::validators::{
    is_present_password, is_valid_contact_number, is_valid_email, is_valid_name,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserInfoResponse {
    pub email: String,
    pub name: String,
}

impl From<UserInfo> for UserInfoResponse {
    fn from(user: UserInfo) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// The one success shape for signup, login, refresh and logout
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfoResponse>,
}

impl AuthResponse {
    fn issued(message: &str, issued: IssuedTokens, expires_in: i64) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            access_token: Some(issued.access_token.encoded),
            refresh_token: issued.refresh_token.map(|token| token.encoded),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(expires_in),
            user: issued.user.map(UserInfoResponse::from),
        }
    }

    fn message_only(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            access_token: None,
            refresh_token: None,
            token_type: None,
            expires_in: None,
            user: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// POST /api/auth/signup
///
/// Register a new user and return an access token for the new session.
///
/// # Errors
/// - 400: Invalid field or weak password
/// - 409: Email already registered
/// - 503: User store unavailable
pub async fn signup(
    form: web::Json<SignupRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let name = is_valid_name(&form.name)?;
    let contact_number = is_valid_contact_number(&form.contact_number)?;
    let email = is_valid_email(&form.email)?;
    is_present_password(&form.password)?;

    let issued = auth
        .signup(Registration {
            name,
            contact_number,
            email,
            password: form.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(AuthResponse::issued(
        "User has been registered successfully",
        issued,
        auth.access_token_ttl(),
    )))
}

/// POST /api/auth/login
///
/// Authenticate with email and password. Any earlier session of the user
/// stops being honoured.
///
/// # Errors
/// - 400: Malformed email or empty password
/// - 401: Invalid credentials (unknown email and wrong password look the same)
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let email = is_valid_email(&normalize_email(&form.email))?;
    is_present_password(&form.password)?;

    let issued = auth.login(&email, &form.password, form.remember_me).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::issued(
        "Login successful",
        issued,
        auth.access_token_ttl(),
    )))
}

/// POST /api/auth/refresh
///
/// Exchange the current refresh token for a new access/refresh pair.
///
/// # Errors
/// - 401: Missing, invalid, expired or already used refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let issued = auth.refresh(&form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::issued(
        "Token refreshed successfully",
        issued,
        auth.access_token_ttl(),
    )))
}

/// POST /api/auth/logout
///
/// Token comes from `?token=` or the `Authorization: Bearer` header.
///
/// # Errors
/// - 401: Token missing, or not the caller's current access token
pub async fn logout(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let token = extract_bearer_token(&req).ok_or(AuthError::MissingToken)?;

    if !auth.validate(&token) {
        return Err(AuthError::InvalidToken.into());
    }

    auth.logout(&token);

    Ok(HttpResponse::Ok().json(AuthResponse::message_only(
        "User has been logged out successfully",
    )))
}

/// GET /api/auth/profile
///
/// **Requires a current access token**; claims are injected by `BearerAuth`.
pub async fn profile(
    claims: web::ReqData<Claims>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = auth.find_user(&claims.sub).await?;

    Ok(match user {
        Some(user) => HttpResponse::Ok().json(ProfileResponse {
            success: true,
            message: "Profile fetched successfully".to_string(),
            user: Some(UserProfile {
                id: user.id,
                name: user.name,
                contact_number: user.contact_number,
                email: user.email,
            }),
        }),
        None => HttpResponse::NotFound().json(ProfileResponse {
            success: false,
            message: "User profile not found".to_string(),
            user: None,
        }),
    })
}
