use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{Claims, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// The `Authorization: Bearer <token>` value, if the header has that shape.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token as an access token.
///
/// `Ok(None)` when no token is presented or it does not verify.
fn access_claims(req: &ServiceRequest) -> Result<Option<Claims>, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        AppError::InternalServerError("AppState is not registered on the app".into())
    })?;
    Ok(bearer_token(req).and_then(|token| {
        state
            .tokens
            .verify(token, TokenKind::Access)
            .map_err(|e| log::debug!("bearer token rejected: {}", e))
            .ok()
    }))
}

fn reject<B>(req: ServiceRequest, error: AppError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(error.error_response()).map_into_right_body()
}

/// Lets a request through only with a valid access token, and puts the
/// verified [`Claims`] into the request extensions for the handler.
///
/// Missing header, malformed header and failed verification all answer
/// 403 `Not authenticated`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
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
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match access_claims(&req) {
            Ok(Some(claims)) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Ok(None) => {
                let response = reject(req, AppError::not_authenticated());
                Box::pin(async move { Ok(response) })
            }
            Err(error) => {
                let response = reject(req, error);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Inverse of [`AuthMiddleware`] for signup and login: a caller presenting a
/// valid access token gets 403 `Already authenticated`. Anything that fails
/// to verify is let through.
pub struct GuestOnly;

impl<S, B> Transform<S, ServiceRequest> for GuestOnly
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = GuestOnlyService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GuestOnlyService { service }))
    }
}

pub struct GuestOnlyService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for GuestOnlyService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match access_claims(&req) {
            Ok(None) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Ok(Some(claims)) => {
                log::debug!("user {} is already authenticated", claims.user_id);
                let response = reject(req, AppError::Forbidden("Already authenticated".into()));
                Box::pin(async move { Ok(response) })
            }
            Err(error) => {
                let response = reject(req, error);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
