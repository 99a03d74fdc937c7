//! Team roster: who may sign in to the admin panel and with which role.
//!
//! Members are read from `admin_users_view` (admins joined with auth users)
//! and written to `admins`. Account creation, lookup and removal go through
//! stored procedures.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::record::Record;
use crate::section::Notice;
use crate::store::{DataStore, OrderBy, Query, Rpc, StoreError};
use crate::types::Role;

pub const TEAM_VIEW: &str = "admin_users_view";
pub const TEAM_TABLE: &str = "admins";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TeamError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("No user found for '{0}'")]
    UserNotFound(String),

    #[error("User is already a team member")]
    DuplicateMember,

    #[error("No team member with id {0}")]
    MemberNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TeamError {
    pub fn user_message(&self) -> String {
        match self {
            TeamError::InvalidEmail(_) => "Enter a valid email address to create an account.".to_string(),
            TeamError::UserNotFound(_) => {
                "User not found. Check the email or set a password to create the account.".to_string()
            }
            TeamError::DuplicateMember => "This user is already a team member.".to_string(),
            TeamError::MemberNotFound(_) => self.to_string(),
            TeamError::Store(e) => e.user_message(),
        }
    }
}

/// One row of the roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMember {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl TeamMember {
    fn from_record(record: &Record) -> Option<Self> {
        let id = record.id()?;
        let role = match record.text("role").parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                warn!("Member {} has an unreadable role, treating as editor: {}", id, e);
                Role::Editor
            }
        };
        Some(Self {
            id,
            email: record.text("email"),
            role,
            created_at: record.get("created_at").and_then(Value::as_str).map(String::from),
        })
    }
}

/// Input for adding someone to the team
#[derive(Clone)]
pub struct NewMember {
    /// Email address, or a raw user id when no password is given
    pub email: String,
    /// When present a new account is created with this password
    pub password: Option<String>,
    pub role: Role,
}

impl fmt::Debug for NewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewMember")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

/// A single '@' with something on both sides
pub fn is_email_shaped(input: &str) -> bool {
    match input.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamView {
    pub members: Vec<TeamMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_removal: Option<TeamMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl fmt::Display for TeamView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(notice) = &self.notice {
            writeln!(f, "[{:?}] {}", notice.level, notice.message)?;
        }
        if self.members.is_empty() {
            return writeln!(f, "  (no team members)");
        }
        for member in &self.members {
            writeln!(f, "  {:<36}  {:<32}  {}", member.id, member.email, member.role)?;
        }
        if let Some(pending) = &self.pending_removal {
            writeln!(f, "Remove {} and their account?", pending.email)?;
        }
        Ok(())
    }
}

pub struct TeamEditor {
    store: Arc<dyn DataStore>,
    members: Vec<TeamMember>,
    pending_removal: Option<TeamMember>,
    notice: Option<Notice>,
}

impl TeamEditor {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store, members: Vec::new(), pending_removal: None, notice: None }
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn fail(&mut self, err: TeamError) -> TeamError {
        warn!("Team operation failed: {}", err);
        self.notice = Some(Notice::alert(err.user_message()));
        err
    }

    /// Fetch the roster, oldest first
    pub async fn load(&mut self) -> Result<usize, TeamError> {
        let query = Query::new().order_by(OrderBy::created_at());
        match self.store.select(TEAM_VIEW, &query).await {
            Ok(rows) => {
                self.members = rows.iter().filter_map(TeamMember::from_record).collect();
                info!("Loaded {} team members", self.members.len());
                Ok(self.members.len())
            }
            Err(e) => {
                warn!("Loading team failed: {}", e);
                self.members.clear();
                self.notice = Some(Notice::error(e.user_message()));
                Err(TeamError::Store(e))
            }
        }
    }

    async fn refetch(&mut self) {
        if let Err(e) = self.load().await {
            warn!("Refetch of team failed: {}", e);
        }
    }

    /// Work out which user id the new member refers to
    async fn resolve_user(&self, member: &NewMember) -> Result<String, TeamError> {
        let input = member.email.trim();
        let password = member.password.as_deref().filter(|p| !p.is_empty());
        if input.is_empty() {
            return Err(TeamError::UserNotFound(String::new()));
        }

        if let Some(password) = password {
            if !is_email_shaped(input) {
                return Err(TeamError::InvalidEmail(input.to_string()));
            }
            let created = self
                .store
                .call(Rpc::CreateUserWithPassword { email: input.to_string(), password: password.to_string() })
                .await?;
            return match created {
                Value::String(id) if !id.is_empty() => {
                    info!("Created account for {}", input);
                    Ok(id)
                }
                other => Err(TeamError::Store(StoreError::procedure(
                    "create_user_with_password",
                    format!("unexpected result {}", other),
                ))),
            };
        }

        if !is_email_shaped(input) {
            // Without a password, anything that is not an email is taken as a user id
            return Ok(input.to_string());
        }

        match self.store.call(Rpc::GetUserIdByEmail { email: input.to_string() }).await {
            Ok(Value::String(id)) if !id.is_empty() => Ok(id),
            Ok(_) | Err(_) => Err(TeamError::UserNotFound(input.to_string())),
        }
    }

    /// Add a member; returns the user id that was granted access
    pub async fn add_member(&mut self, member: NewMember) -> Result<String, TeamError> {
        let user_id = match self.resolve_user(&member).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e)),
        };

        let mut row = Record::new();
        row.set("id", user_id.clone()).set("role", member.role.as_str());
        if let Err(e) = self.store.insert(TEAM_TABLE, row).await {
            let err = if e.is_constraint_violation() { TeamError::DuplicateMember } else { TeamError::Store(e) };
            return Err(self.fail(err));
        }

        info!("Added team member {} as {}", user_id, member.role);
        self.notice = None;
        self.refetch().await;
        Ok(user_id)
    }

    pub fn request_removal(&mut self, id: &str) -> Result<(), TeamError> {
        let member = self
            .members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| TeamError::MemberNotFound(id.to_string()))?;
        self.pending_removal = Some(member);
        Ok(())
    }

    pub fn cancel_removal(&mut self) {
        self.pending_removal = None;
    }

    /// Remove the member awaiting confirmation. Returns false when none was pending.
    pub async fn confirm_removal(&mut self) -> Result<bool, TeamError> {
        let Some(member) = self.pending_removal.take() else {
            return Ok(false);
        };
        self.remove_member(&member.id).await?;
        Ok(true)
    }

    /// Delete the account and every admin row for it
    pub async fn remove_member(&mut self, id: &str) -> Result<(), TeamError> {
        if let Err(e) = self.store.call(Rpc::DeleteUserCompletely { user_id: id.to_string() }).await {
            return Err(self.fail(e.into()));
        }
        info!("Removed team member {}", id);
        self.notice = None;
        self.refetch().await;
        Ok(())
    }

    pub async fn change_role(&mut self, id: &str, role: Role) -> Result<(), TeamError> {
        let mut row = Record::new();
        row.set("role", role.as_str());
        if let Err(e) = self.store.update(TEAM_TABLE, id, row).await {
            return Err(self.fail(e.into()));
        }
        info!("Changed role of {} to {}", id, role);
        self.notice = None;
        self.refetch().await;
        Ok(())
    }

    pub fn view(&self) -> TeamView {
        TeamView {
            members: self.members.clone(),
            pending_removal: self.pending_removal.clone(),
            notice: self.notice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_shape_needs_one_at_with_both_sides() {
        assert!(is_email_shaped("ola@rekordit.pl"));
        assert!(!is_email_shaped("ola"));
        assert!(!is_email_shaped("@rekordit.pl"));
        assert!(!is_email_shaped("ola@"));
        assert!(!is_email_shaped("a@b@c"));
    }

    #[test]
    fn new_member_debug_hides_password() {
        let member = NewMember { email: "a@b.pl".into(), password: Some("secret".into()), role: Role::Editor };
        assert!(!format!("{:?}", member).contains("secret"));
    }

    #[test]
    fn unreadable_role_falls_back_to_editor() {
        let record = Record::from_json(json!({"id": "u1", "email": "a@b.pl", "role": "owner"})).unwrap();
        assert_eq!(TeamMember::from_record(&record).unwrap().role, Role::Editor);
    }
}
