use actix_web::{
    cookie::Cookie, get, post, route, web, HttpRequest, HttpResponse, ResponseError,
};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{
        cookie::{cleared_refresh_cookie, refresh_cookie, refresh_token_from},
        Credentials, GuestOnly, LoginRequest, Registration, SessionError, SignupRequest,
    },
    error::AppError,
    state::AppState,
};

/// Register a new user
///
/// Creates the account and returns it. The caller still has to log in.
#[post("/signup", wrap = "GuestOnly")]
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let registration = Registration::try_from(body.into_inner())?;

    let user = state.session.signup(registration).await?;

    Ok(HttpResponse::Created().json(json!({
        "user": user,
        "message": "User created successfully",
    })))
}

/// Login user
///
/// Returns a short-lived access token in the body and sets the refresh token
/// as an HttpOnly cookie.
#[post("/login", wrap = "GuestOnly")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let credentials = Credentials::try_from(body.into_inner())?;

    let outcome = state.session.login(credentials).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(outcome.refresh_token, state.secure_cookies))
        .json(json!({
            "accessToken": outcome.access_token,
            "user": outcome.user,
            "message": "Authenticated",
        })))
}

/// Mint a new access token from the refresh cookie.
#[route("/refresh-token", method = "GET", method = "POST")]
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token_from(&req);
    let access_token = state.session.refresh(token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "accessToken": access_token,
        "message": "Access token refreshed",
    })))
}

/// The user behind the refresh cookie.
#[get("/auth-refresh")]
pub async fn auth_refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token_from(&req);
    let user = state.session.current_user(token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": user,
        "message": "User authenticated",
    })))
}

/// Renders `error` with the removal cookie attached.
fn with_cleared_cookie(error: AppError, cleared: &Cookie<'_>) -> Result<HttpResponse, AppError> {
    let mut response = error.error_response();
    response
        .add_cookie(cleared)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(response)
}

/// End the session behind the refresh cookie and clear the cookie.
///
/// Logging out a session that is already gone still succeeds. Every outcome,
/// failures included, clears the cookie.
#[route("/logout", method = "POST", method = "DELETE")]
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = refresh_token_from(&req);
    let cleared = cleared_refresh_cookie(state.secure_cookies);

    match state.session.logout(token.as_deref()).await {
        Ok(_) => Ok(HttpResponse::Ok()
            .cookie(cleared)
            .json(json!({ "message": "Token successfully deleted" }))),
        Err(SessionError::NoToken) => with_cleared_cookie(
            AppError::BadRequest("No refresh token provided".into()),
            &cleared,
        ),
        Err(e) => with_cleared_cookie(e.into(), &cleared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PasswordHasher, TokenIssuer};
    use crate::models::{
        List, NewTask, NewUser, RefreshTokenRecord, StoredRefreshToken, Task, User,
    };
    use crate::store::{
        ListStore, RefreshTokenStore, StoreError, StoreResult, TaskStore, UserStore,
    };
    use actix_web::{cookie::time::Duration as CookieDuration, http::StatusCode, test, App};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    /// Every call fails as if the database were unreachable.
    struct UnreachableStore;

    fn down<T>() -> StoreResult<T> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    #[async_trait]
    impl UserStore for UnreachableStore {
        async fn create_user(&self, _: NewUser) -> StoreResult<User> {
            down()
        }
        async fn find_by_email(&self, _: &str) -> StoreResult<Option<User>> {
            down()
        }
        async fn find_active_by_email(&self, _: &str) -> StoreResult<Option<User>> {
            down()
        }
        async fn find_active_by_id(&self, _: i32) -> StoreResult<Option<User>> {
            down()
        }
    }

    #[async_trait]
    impl RefreshTokenStore for UnreachableStore {
        async fn save(
            &self,
            _: &str,
            _: &User,
            _: DateTime<Utc>,
        ) -> StoreResult<RefreshTokenRecord> {
            down()
        }
        async fn find_by_token(&self, _: &str) -> StoreResult<Option<StoredRefreshToken>> {
            down()
        }
        async fn deactivate(&self, _: &RefreshTokenRecord) -> StoreResult<bool> {
            down()
        }
        async fn delete(&self, _: &str) -> StoreResult<u64> {
            down()
        }
        async fn list_for_user(&self, _: i32) -> StoreResult<Vec<RefreshTokenRecord>> {
            down()
        }
    }

    #[async_trait]
    impl ListStore for UnreachableStore {
        async fn create_list(&self, _: &str, _: i32) -> StoreResult<List> {
            down()
        }
        async fn lists_by_owner(&self, _: i32) -> StoreResult<Vec<List>> {
            down()
        }
        async fn find_owned_list(&self, _: i32, _: i32) -> StoreResult<Option<List>> {
            down()
        }
        async fn update_list(&self, _: &List) -> StoreResult<List> {
            down()
        }
    }

    #[async_trait]
    impl TaskStore for UnreachableStore {
        async fn create_task(&self, _: NewTask) -> StoreResult<Task> {
            down()
        }
        async fn tasks_by_list(&self, _: i32) -> StoreResult<Vec<Task>> {
            down()
        }
        async fn find_owned_task(&self, _: i32, _: i32) -> StoreResult<Option<Task>> {
            down()
        }
        async fn update_task(&self, _: &Task) -> StoreResult<Task> {
            down()
        }
    }

    #[actix_rt::test]
    async fn test_logout_clears_cookie_when_store_fails() {
        let state = AppState::new(
            Arc::new(UnreachableStore),
            Arc::new(TokenIssuer::new("access-secret", "refresh-secret")),
            PasswordHasher::new(4).unwrap(),
            false,
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(logout),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/logout")
            .cookie(Cookie::new("refreshToken", "whatever"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let cleared = resp
            .response()
            .cookies()
            .find(|c| c.name() == "refreshToken")
            .map(|c| c.into_owned())
            .unwrap();
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(CookieDuration::ZERO));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
