use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::warn;
use crate::model::global_error::{AppError, ErrorCode};
use super::jwt::{JwtUtils, TokenVerifyResult};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Rejects requests without a valid access token and stores the caller's user
/// id (`i32`) in the request extensions for `web::ReqData<i32>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(user_id) => {
                req.extensions_mut().insert(user_id);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(err) => {
                warn!(path = req.path(), code = ?err.code(), "request rejected at the auth boundary");
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header
        .or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|cookie| cookie.value().to_string()))
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &ServiceRequest) -> Result<i32, AppError> {
    let jwt = req
        .app_data::<web::Data<JwtUtils>>()
        .ok_or_else(|| AppError::with_detail(ErrorCode::InternalError, "token verifier is not configured"))?;

    let token = bearer_token(req).ok_or_else(|| AppError::unauthorized(ErrorCode::MissingAuthToken))?;

    match jwt.verify_token(&token) {
        TokenVerifyResult::Valid(claims) => claims
            .user_id()
            .ok_or_else(|| AppError::unauthorized(ErrorCode::InvalidAuthToken)),
        TokenVerifyResult::Expired => Err(AppError::unauthorized(ErrorCode::ExpiredAuthToken)),
        TokenVerifyResult::Invalid => Err(AppError::unauthorized(ErrorCode::InvalidAuthToken)),
    }
}
