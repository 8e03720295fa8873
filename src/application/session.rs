use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::application::forms::{Form, LoginForm};
use crate::domain::{
    entities::LoginInfo,
    error::ApiError,
    ports::{TokenStore, Transport},
    request::{call, ApiRequest},
    value_objects::AuthToken,
};

pub const LOGIN_PATH: &str = "auth/login/";
pub const ME_PATH: &str = "auth/me/";

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "token", alias = "access_token")]
    access: String,
}

/// The signed-in operator: token lifecycle plus the cached account info
/// that gates superuser-only actions.
pub struct Session {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    me: Mutex<Option<LoginInfo>>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            tokens,
            me: Mutex::new(None),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.load().is_some()
    }

    pub async fn login(&self, form: &LoginForm) -> Result<AuthToken, ApiError> {
        form.check()?;
        let resp: LoginResponse = call(
            self.transport.as_ref(),
            ApiRequest::post_form(LOGIN_PATH, form.fields()),
        )
        .await?;

        self.tokens
            .save(&resp.access)
            .map_err(|e| ApiError::Decode(format!("could not store token: {e:#}")))?;
        self.forget_me();
        info!("logged in");
        Ok(AuthToken(resp.access))
    }

    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "could not clear stored token");
        }
        self.forget_me();
    }

    /// Account info of the current token, fetched once per session.
    pub async fn me(&self) -> Result<LoginInfo, ApiError> {
        if let Some(info) = self.cached_me() {
            return Ok(info);
        }
        let info: LoginInfo = call(self.transport.as_ref(), ApiRequest::get(ME_PATH)).await?;
        if let Ok(mut slot) = self.me.lock() {
            *slot = Some(info.clone());
        }
        Ok(info)
    }

    /// `false` when signed out or when the lookup fails.
    pub async fn is_superuser(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        match self.me().await {
            Ok(info) => info.is_superuser,
            Err(e) => {
                debug!(error = %e, "superuser lookup failed, treating as regular user");
                false
            }
        }
    }

    /// Refuse locally, before any request, when the operator is not a superuser.
    pub async fn require_superuser(&self) -> Result<(), ApiError> {
        if self.is_superuser().await {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }

    fn cached_me(&self) -> Option<LoginInfo> {
        self.me.lock().ok().and_then(|slot| slot.clone())
    }

    fn forget_me(&self) {
        if let Ok(mut slot) = self.me.lock() {
            *slot = None;
        }
    }
}
