use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::auth::session::SessionService;
use crate::auth::token::TokenIssuer;
use crate::store::{ListStore, RefreshTokenStore, TaskStore, UserStore};

/// Shared application state, registered once as `web::Data<AppState>`.
///
/// Cheaply cloneable; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionService,
    /// Used by the auth gates to verify bearer tokens.
    pub tokens: Arc<TokenIssuer>,
    pub lists: Arc<dyn ListStore>,
    pub tasks: Arc<dyn TaskStore>,
    /// Whether the refresh cookie is marked `Secure`.
    pub secure_cookies: bool,
}

impl AppState {
    /// Wires every store seam to one backend.
    pub fn new<S>(
        store: Arc<S>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
        secure_cookies: bool,
    ) -> Self
    where
        S: UserStore + RefreshTokenStore + ListStore + TaskStore + 'static,
    {
        let session = SessionService::new(store.clone(), store.clone(), tokens.clone(), hasher);
        Self {
            session,
            tokens,
            lists: store.clone(),
            tasks: store,
            secure_cookies,
        }
    }
}
