//! Sessions issued by the hosted auth provider.
//!
//! Tokens are HS256 JWTs signed with the project secret. The admin role
//! travels in the `app_role` claim; tokens minted before the claim existed
//! get it resolved once by [`session::TokenSession::refresh_role`].

pub mod session;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::store::StoreError;
use crate::types::Role;

pub use session::TokenSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_role: Option<Role>,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Option<Role>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into(),
            email: email.into(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            app_role: role,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Access token has expired")]
    Expired,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session carries no admin role")]
    MissingRole,

    #[error("Requires the {0} role")]
    InsufficientRole(Role),

    #[error("JWT secret not configured")]
    NotConfigured,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingToken | AuthError::NotSignedIn => "Please sign in.".to_string(),
            AuthError::InvalidToken(_) => "Your session is not valid. Please sign in again.".to_string(),
            AuthError::Expired => "Your session has expired. Please sign in again.".to_string(),
            AuthError::MissingRole => "Your account has no access to the admin panel.".to_string(),
            AuthError::InsufficientRole(_) => "Only administrators can do this.".to_string(),
            AuthError::NotConfigured => "Authentication is not configured.".to_string(),
            AuthError::Store(e) => e.user_message(),
        }
    }
}

/// The signed-in user as the admin panel sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Option<Role>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidToken(format!("bad exp {}", claims.exp)))?;
        Ok(Self { user_id: claims.sub, email: claims.email, role: claims.app_role, expires_at })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(|r| r.is_admin())
    }

    /// The role, or `MissingRole` when it has not been resolved
    pub fn require_role(&self) -> Result<Role, AuthError> {
        self.role.ok_or(AuthError::MissingRole)
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.require_role()?.is_admin() {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole(Role::Admin))
        }
    }
}

/// Source of the current session for the admin shell
pub trait AuthBoundary: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    fn on_session_change(&self) -> watch::Receiver<Option<Session>>;

    fn sign_out(&self);
}

/// Validate a token and turn it into a session
pub fn decode_session(token: &str, secret: &str) -> Result<Session, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    // Provider tokens carry `aud: authenticated`; nothing here depends on it
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        }
    })?;

    Session::from_claims(data.claims)
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_role_claim() {
        let claims = Claims::new("u1", "ola@rekordit.pl", Some(Role::Admin), Duration::hours(1));
        let token = generate_jwt(&claims, SECRET).unwrap();
        let session = decode_session(&token, SECRET).unwrap();
        assert_eq!(session.user_id, "u1");
        assert!(session.is_admin());
        assert!(session.require_admin().is_ok());
    }

    #[test]
    fn missing_role_claim_decodes_as_none() {
        let claims = Claims::new("u2", "", None, Duration::hours(1));
        let token = generate_jwt(&claims, SECRET).unwrap();
        let session = decode_session(&token, SECRET).unwrap();
        assert_eq!(session.role, None);
        assert_eq!(session.require_role(), Err(AuthError::MissingRole));
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let expired = Claims::new("u3", "", Some(Role::Editor), Duration::hours(-2));
        let token = generate_jwt(&expired, SECRET).unwrap();
        assert_eq!(decode_session(&token, SECRET), Err(AuthError::Expired));

        let valid = generate_jwt(&Claims::new("u3", "", None, Duration::hours(1)), "other").unwrap();
        assert!(matches!(decode_session(&valid, SECRET), Err(AuthError::InvalidToken(_))));
        assert_eq!(decode_session(&valid, ""), Err(AuthError::NotConfigured));
    }

    #[test]
    fn editor_is_not_admin() {
        let claims = Claims::new("u4", "", Some(Role::Editor), Duration::hours(1));
        let session = Session::from_claims(claims).unwrap();
        assert_eq!(session.require_admin(), Err(AuthError::InsufficientRole(Role::Admin)));
    }
}
