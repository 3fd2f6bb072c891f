#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    cookie::Cookie,
    dev::{Service, ServiceResponse},
    test, web, App, Error,
};
use serde_json::{json, Value};

use listforge::auth::{PasswordHasher, TokenIssuer};
use listforge::routes;
use listforge::state::AppState;
use listforge::store::MemoryStore;

pub const PASSWORD: &str = "longenough";

pub fn test_tokens() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        "integration-access-secret",
        "integration-refresh-secret",
    ))
}

/// State over a store and issuer the test keeps handles to.
pub fn test_state_with(store: Arc<MemoryStore>, tokens: Arc<TokenIssuer>) -> AppState {
    AppState::new(
        store,
        tokens,
        PasswordHasher::new(4).expect("bcrypt cost 4 is valid"),
        false,
    )
}

pub fn test_state() -> AppState {
    test_state_with(Arc::new(MemoryStore::new()), test_tokens())
}

pub async fn test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::config),
    )
    .await
}

/// A logged-in user as seen by the client.
pub struct Session {
    pub access_token: String,
    pub refresh_cookie: Cookie<'static>,
    pub user: Value,
}

impl Session {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.access_token))
    }
}

pub async fn signup<S, B>(app: &S, email: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({
            "email": email,
            "name": "A",
            "surname": "B",
            "password": PASSWORD,
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "signup of {} failed", email);
    let body: Value = test::read_body_json(resp).await;
    body["user"].clone()
}

pub async fn login<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "login of {} failed", email);

    let refresh_cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "refreshToken")
        .map(|c| c.into_owned())
        .expect("login sets the refresh cookie");
    let body: Value = test::read_body_json(resp).await;

    Session {
        access_token: body["accessToken"]
            .as_str()
            .expect("login returns an access token")
            .to_string(),
        refresh_cookie,
        user: body["user"].clone(),
    }
}

pub async fn signup_and_login<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    signup(app, email).await;
    login(app, email).await
}
