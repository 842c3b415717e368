/// Bearer Authentication Middleware
///
/// Validates the access token of each request against the auth service
/// and injects its claims into request extensions for route handlers.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use std::rc::Rc;

use crate::auth::AuthService;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn strip_bearer(value: &str) -> &str {
    value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim()
}

/// Token from the `token` query parameter (with or without a `Bearer `
/// prefix), falling back to the `Authorization: Bearer` header
pub fn extract_bearer_token(req: &HttpRequest) -> Option<String> {
    let from_query = web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token)
        .map(|token| strip_bearer(&token).to_string())
        .filter(|token| !token.is_empty());

    from_query.or_else(|| {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Middleware for routes that require a current access token
pub struct BearerAuth {
    service: web::Data<AuthService>,
}

impl BearerAuth {
    pub fn new(service: web::Data<AuthService>) -> Self {
        Self { service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(BearerAuthService {
            service: Rc::new(service),
            auth: self.service.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    auth: web::Data<AuthService>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let auth = self.auth.clone();

        // Rejections render inside the future so they carry the request id
        Box::pin(async move {
            let rejection = match extract_bearer_token(req.request()) {
                None => {
                    tracing::warn!(path = %req.path(), "Missing bearer token");
                    AuthError::MissingToken
                }
                Some(token) => match auth.authenticate(&token) {
                    Some(access) => {
                        tracing::debug!(user = %access.subject(), "Access token accepted");
                        req.extensions_mut().insert(access.claims);
                        let res = service.call(req).await?;
                        return Ok(res.map_into_left_body());
                    }
                    None => {
                        tracing::warn!(path = %req.path(), "Access token rejected");
                        AuthError::InvalidToken
                    }
                },
            };

            let response = HttpResponse::from_error(AppError::from(rejection));
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}
