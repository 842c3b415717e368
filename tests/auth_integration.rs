use actix_web::web;
use serde_json::{json, Value};
use signup_auth::auth::AuthService;
use signup_auth::configuration::{JwtSettings, PasswordSettings};
use signup_auth::startup::run;
use signup_auth::store::InMemoryUserStore;
use std::net::TcpListener;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = JwtSettings {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        issuer: "test".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
        long_refresh_token_expiry: 7776000,
    };
    let auth = web::Data::new(AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        &jwt,
        &PasswordSettings { hash_cost: 4 },
    ));

    let server = run(listener, auth).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn signup(&self, body: &Value) -> reqwest::Response {
        self.post("/api/auth/signup", body).await
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post(
            "/api/auth/login",
            &json!({"email": email, "password": password}),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/api/auth/refresh", &json!({"refreshToken": refresh_token}))
            .await
    }

    async fn logout(&self, access_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/auth/logout", &self.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn profile(&self, access_token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}/api/auth/profile", &self.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn jane() -> Value {
    json!({
        "name": "Jane Doe",
        "contactNumber": "9876543210",
        "email": "jane@example.com",
        "password": "Abcdef12"
    })
}

async fn body_of(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse response")
}

fn token(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("Response has no {}: {}", field, body))
        .to_string()
}

// --- Signup Tests ---

#[tokio::test]
async fn signup_returns_201_and_a_usable_access_token() {
    let app = spawn_app();

    let response = app.signup(&jane()).await;
    assert_eq!(201, response.status().as_u16());

    let body = body_of(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert!(body.get("refreshToken").is_none());

    let profile = app.profile(&token(&body, "accessToken")).await;
    assert_eq!(200, profile.status().as_u16());
}

#[tokio::test]
async fn signup_returns_400_for_invalid_fields() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"name": "J", "contactNumber": "9876543210", "email": "jane@example.com", "password": "Abcdef12"}), "name too short"),
        (json!({"name": "Jane Doe", "contactNumber": "12345", "email": "jane@example.com", "password": "Abcdef12"}), "contact number too short"),
        (json!({"name": "Jane Doe", "contactNumber": "9876543210", "email": "notanemail", "password": "Abcdef12"}), "invalid email"),
        (json!({"name": "Jane Doe", "contactNumber": "9876543210", "email": "Jane@Example.com", "password": "Abcdef12"}), "upper-case email"),
        (json!({"name": "Jane Doe", "contactNumber": "9876543210", "email": "jane@example.com"}), "missing password"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app.signup(&body).await;
        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }
}

#[tokio::test]
async fn signup_returns_400_for_weak_password() {
    let app = spawn_app();

    for weak_password in ["short1", "alllowercase1", "NOUPPERCASEOK"] {
        let mut body = jane();
        body["password"] = json!(weak_password);

        let response = app.signup(&body).await;
        assert_eq!(400, response.status().as_u16(), "Should reject weak password: {}", weak_password);

        let body = body_of(response).await;
        assert_eq!(body["code"], "WEAK_PASSWORD");
    }
}

#[tokio::test]
async fn signup_returns_409_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.signup(&jane()).await.status().as_u16());

    let response = app.signup(&jane()).await;
    assert_eq!(409, response.status().as_u16());
    assert_eq!(body_of(response).await["success"], false);
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_tokens_and_user_info() {
    let app = spawn_app();
    app.signup(&jane()).await;

    let response = app.login("jane@example.com", "Abcdef12").await;
    assert_eq!(200, response.status().as_u16());

    let body = body_of(response).await;
    assert_eq!(body["success"], true);
    assert!(body.get("accessToken").is_some());
    assert!(body.get("refreshToken").is_some());
    assert_eq!(body["user"], json!({"email": "jane@example.com", "name": "Jane Doe"}));
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let app = spawn_app();
    app.signup(&jane()).await;

    let wrong_password = app.login("jane@example.com", "Wrongpass1").await;
    let unknown_email = app.login("nobody@example.com", "Abcdef12").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let wrong_password = body_of(wrong_password).await;
    let unknown_email = body_of(unknown_email).await;
    assert_eq!(wrong_password["message"], unknown_email["message"]);
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_accepts_mixed_case_email() {
    let app = spawn_app();
    app.signup(&jane()).await;

    let response = app.login("Jane@Example.COM", "Abcdef12").await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn second_login_supersedes_the_first() {
    let app = spawn_app();
    app.signup(&jane()).await;

    let first = body_of(app.login("jane@example.com", "Abcdef12").await).await;
    let second = body_of(app.login("jane@example.com", "Abcdef12").await).await;

    assert_eq!(401, app.profile(&token(&first, "accessToken")).await.status().as_u16());
    assert_eq!(200, app.profile(&token(&second, "accessToken")).await.status().as_u16());
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_rotates_tokens_and_rejects_reuse() {
    let app = spawn_app();
    app.signup(&jane()).await;
    let login = body_of(app.login("jane@example.com", "Abcdef12").await).await;
    let r1 = token(&login, "refreshToken");

    let response = app.refresh(&r1).await;
    assert_eq!(200, response.status().as_u16());
    let rotated = body_of(response).await;
    let r2 = token(&rotated, "refreshToken");
    assert_ne!(r1, r2);

    let reuse = app.refresh(&r1).await;
    assert_eq!(401, reuse.status().as_u16());
    assert_eq!(body_of(reuse).await["message"], "Invalid or expired token");

    assert_eq!(200, app.refresh(&r2).await.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_401_for_missing_or_wrong_tokens() {
    let app = spawn_app();
    let signup = body_of(app.signup(&jane()).await).await;

    let missing = app.post("/api/auth/refresh", &json!({})).await;
    assert_eq!(401, missing.status().as_u16());
    assert_eq!(body_of(missing).await["code"], "MISSING_TOKEN");

    let garbage = app.refresh("invalid.token.here").await;
    assert_eq!(401, garbage.status().as_u16());

    let access_as_refresh = app.refresh(&token(&signup, "accessToken")).await;
    assert_eq!(401, access_as_refresh.status().as_u16());
}

// --- Logout & Protected Route Tests ---

#[tokio::test]
async fn logout_ends_the_session() {
    let app = spawn_app();
    app.signup(&jane()).await;
    let login = body_of(app.login("jane@example.com", "Abcdef12").await).await;
    let access = token(&login, "accessToken");

    let response = app.logout(&access).await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(body_of(response).await["success"], true);

    assert_eq!(401, app.profile(&access).await.status().as_u16());
    assert_eq!(401, app.refresh(&token(&login, "refreshToken")).await.status().as_u16());

    // A second logout with the same token is refused as unauthenticated
    assert_eq!(401, app.logout(&access).await.status().as_u16());
}

#[tokio::test]
async fn logout_accepts_token_as_query_parameter() {
    let app = spawn_app();
    let signup = body_of(app.signup(&jane()).await).await;
    let access = token(&signup, "accessToken");
    let bearer = format!("Bearer {}", access);

    let response = app
        .client
        .post(&format!(
            "{}/api/auth/logout?token={}",
            &app.address,
            urlencoding::encode(&bearer)
        ))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    assert_eq!(401, app.profile(&access).await.status().as_u16());
}

#[tokio::test]
async fn logout_without_token_returns_401() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/api/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn profile_returns_401_without_token() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/api/auth/profile", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body = body_of(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "MISSING_TOKEN");
    assert_eq!(body["status"], 401);
    assert!(body["error_id"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn protected_route_and_handler_failures_share_one_error_shape() {
    let app = spawn_app();

    let profile = body_of(app.profile("invalid.token.here").await).await;
    let logout = body_of(app.logout("invalid.token.here").await).await;

    let keys = |body: &Value| {
        let mut keys: Vec<String> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&profile), keys(&logout));
    assert_eq!(profile["code"], logout["code"]);
    assert_eq!(profile["message"], logout["message"]);
}

#[tokio::test]
async fn error_id_matches_request_id_header() {
    let app = spawn_app();

    let requests = vec![
        (
            app.client.post(&format!("{}/api/auth/logout", &app.address)),
            "logout without token",
        ),
        (
            app.client.get(&format!("{}/api/auth/profile", &app.address)),
            "profile without token",
        ),
        (
            app.client
                .post(&format!("{}/api/auth/login", &app.address))
                .json(&json!({"email": "nobody@example.com", "password": "Abcdef12"})),
            "login with unknown email",
        ),
    ];

    for (request, reason) in requests {
        let response = request.send().await.expect("Failed to execute request.");
        let header = response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| panic!("No x-request-id header: {}", reason));

        let body = body_of(response).await;
        assert_eq!(body["error_id"], json!(header), "Ids differ: {}", reason);
    }
}

#[tokio::test]
async fn profile_returns_401_with_invalid_token() {
    let app = spawn_app();

    let response = app.profile("invalid.token.here").await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(body_of(response).await["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn profile_rejects_refresh_token() {
    let app = spawn_app();
    app.signup(&jane()).await;
    let login = body_of(app.login("jane@example.com", "Abcdef12").await).await;

    let response = app.profile(&token(&login, "refreshToken")).await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn profile_returns_user_details() {
    let app = spawn_app();
    app.signup(&jane()).await;
    let login = body_of(app.login("jane@example.com", "Abcdef12").await).await;

    let response = app.profile(&token(&login, "accessToken")).await;
    assert_eq!(200, response.status().as_u16());

    let body = body_of(response).await;
    assert_eq!(body["user"]["name"], "Jane Doe");
    assert_eq!(body["user"]["contactNumber"], "9876543210");
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert_eq!(body["user"]["id"], 1);
}
