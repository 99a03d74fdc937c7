use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{decode_session, AuthBoundary, AuthError, Session};
use crate::store::{DataStore, Rpc};
use crate::types::Role;

/// Session held in memory and published on a `watch` channel
pub struct TokenSession {
    secret: Option<String>,
    tx: watch::Sender<Option<Session>>,
}

impl TokenSession {
    pub fn new(secret: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { secret: Some(secret.into()), tx }
    }

    /// Wrap a session that was already validated, e.g. by the HTTP middleware
    pub fn from_session(session: Session) -> Self {
        let (tx, _rx) = watch::channel(Some(session));
        Self { secret: None, tx }
    }

    pub fn sign_in(&self, token: &str) -> Result<Session, AuthError> {
        let secret = self.secret.as_deref().ok_or(AuthError::NotConfigured)?;
        let session = decode_session(token, secret)?;
        info!("Signed in as {}", session.user_id);
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Resolve the role once when the token did not carry it
    pub async fn refresh_role(&self, store: &dyn DataStore) -> Result<Role, AuthError> {
        let mut session = self.current_session().ok_or(AuthError::NotSignedIn)?;
        if let Some(role) = session.role {
            return Ok(role);
        }

        let result = store.call(Rpc::IsSuperAdmin { user_id: session.user_id.clone() }).await?;
        let role = match result {
            Value::Bool(true) => Role::Admin,
            Value::Bool(false) | Value::Null => Role::Editor,
            other => {
                warn!("Unexpected is_super_admin result {}, treating as editor", other);
                Role::Editor
            }
        };
        debug!("Resolved role {} for {}", role, session.user_id);

        session.role = Some(role);
        self.tx.send_replace(Some(session));
        Ok(role)
    }
}

impl AuthBoundary for TokenSession {
    fn current_session(&self) -> Option<Session> {
        self.tx.borrow().clone().filter(|s| !s.is_expired())
    }

    fn on_session_change(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Signed out");
        }
    }
}
