mod auth;
mod health_check;

pub use auth::{
    login, logout, profile, refresh, signup, AuthResponse, LoginRequest, ProfileResponse,
    RefreshRequest, SignupRequest, UserInfoResponse, UserProfile,
};
pub use health_check::health_check;
