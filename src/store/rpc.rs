use serde_json::{json, Value};

/// Stored procedures the admin layer relies on
#[derive(Clone, PartialEq)]
pub enum Rpc {
    /// Create an auth user, returns the new user id
    CreateUserWithPassword { email: String, password: String },
    /// Look up an existing auth user, returns an id or null
    GetUserIdByEmail { email: String },
    /// Remove the auth user and every admin row that references it
    DeleteUserCompletely { user_id: String },
    /// Whether the given user holds the admin role
    IsSuperAdmin { user_id: String },
}

impl Rpc {
    pub fn name(&self) -> &'static str {
        match self {
            Rpc::CreateUserWithPassword { .. } => "create_user_with_password",
            Rpc::GetUserIdByEmail { .. } => "get_user_id_by_email",
            Rpc::DeleteUserCompletely { .. } => "delete_user_completely",
            Rpc::IsSuperAdmin { .. } => "is_super_admin",
        }
    }

    /// Named arguments as the backend expects them
    pub fn args(&self) -> Value {
        match self {
            Rpc::CreateUserWithPassword { email, password } => json!({"email": email, "password": password}),
            Rpc::GetUserIdByEmail { email } => json!({"user_email": email}),
            Rpc::DeleteUserCompletely { user_id } => json!({"target_user_id": user_id}),
            Rpc::IsSuperAdmin { user_id } => json!({"user_id": user_id}),
        }
    }
}

impl std::fmt::Debug for Rpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rpc::CreateUserWithPassword { email, .. } => f
                .debug_struct("CreateUserWithPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Rpc::GetUserIdByEmail { email } => f.debug_struct("GetUserIdByEmail").field("email", email).finish(),
            Rpc::DeleteUserCompletely { user_id } => {
                f.debug_struct("DeleteUserCompletely").field("user_id", user_id).finish()
            }
            Rpc::IsSuperAdmin { user_id } => f.debug_struct("IsSuperAdmin").field("user_id", user_id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_passwords() {
        let rpc = Rpc::CreateUserWithPassword { email: "a@b.pl".into(), password: "hunter2".into() };
        let printed = format!("{:?}", rpc);
        assert!(printed.contains("a@b.pl"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn lookup_uses_user_email_argument() {
        let rpc = Rpc::GetUserIdByEmail { email: "a@b.pl".into() };
        assert_eq!(rpc.name(), "get_user_id_by_email");
        assert_eq!(rpc.args()["user_email"], "a@b.pl");
    }
}
