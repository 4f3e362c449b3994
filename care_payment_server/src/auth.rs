//! Static API-key authentication.
//!
//! Callers identify themselves with an `X-Api-Key` header, resolved against the two keys in [`AuthConfig`]:
//! the admin key grants [`Role::Admin`], the service key (used by the upstream trigger relay) grants
//! [`Role::Service`]. An empty configured key matches nothing, so an unconfigured server rejects everything
//! rather than letting requests through.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use care_payment_engine::db_types::{Caller, Role};
use log::*;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Extractor for routes that accept any authenticated caller. Role checks happen downstream, either in the
/// engine's API layer or via [`AuthenticatedCaller::require_role`].
pub struct AuthenticatedCaller(pub Caller);

impl AuthenticatedCaller {
    pub fn caller(&self) -> &Caller {
        &self.0
    }

    pub fn require_role(&self, role: Role) -> Result<&Caller, ServerError> {
        if self.0.role == role {
            Ok(&self.0)
        } else {
            warn!("🔑️ {} ({}) attempted access to a {role}-only route", self.0.id, self.0.role);
            Err(ServerError::InsufficientPermissions(format!("This route requires the {role} role")))
        }
    }
}

impl FromRequest for AuthenticatedCaller {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_caller(req).map(AuthenticatedCaller))
    }
}

fn resolve_caller(req: &HttpRequest) -> Result<Caller, ServerError> {
    let config = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| ServerError::ConfigurationError("No authentication configuration was registered".into()))?;
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingApiKey)?;
    match_key(key, config).ok_or_else(|| {
        debug!("🔑️ Rejected a request with an unrecognised API key");
        ServerError::AuthenticationError(AuthError::InvalidApiKey)
    })
}

fn match_key(key: &str, config: &AuthConfig) -> Option<Caller> {
    if !key.is_empty() && key == config.admin_api_key.reveal() {
        return Some(Caller::new("admin", Role::Admin));
    }
    if !key.is_empty() && key == config.service_api_key.reveal() {
        return Some(Caller::new("trigger-relay", Role::Service));
    }
    None
}
