use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{confirm, fail, output_success, output_view};
use crate::cli::CliContext;
use crate::team::NewMember;
use crate::types::Role;

#[derive(Subcommand)]
pub enum TeamCommands {
    #[command(about = "List team members")]
    List,

    #[command(about = "Grant admin panel access to a user")]
    Add {
        #[arg(help = "Email of an existing user, or a user ID")]
        email: String,
        #[arg(long, env = "REKORD_NEW_MEMBER_PASSWORD", hide_env_values = true, help = "Create the account with this password")]
        password: Option<String>,
        #[arg(long, default_value = "editor", help = "admin or editor")]
        role: Role,
    },

    #[command(about = "Remove a member and delete their account")]
    Remove {
        #[arg(help = "User ID")]
        id: String,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Change a member's role")]
    Role {
        #[arg(help = "User ID")]
        id: String,
        #[arg(help = "admin or editor")]
        role: Role,
    },
}

pub async fn handle(cmd: TeamCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let mut team = ctx.shell.open_team().await.map_err(fail)?;

    match cmd {
        TeamCommands::List => output_view(ctx.format, &team.view()),
        TeamCommands::Add { email, password, role } => {
            let id = team.add_member(NewMember { email: email.clone(), password, role }).await.map_err(fail)?;
            output_success(
                ctx.format,
                &format!("Added {} as {}", email, role),
                Some(json!({ "id": id, "role": role })),
            )
        }
        TeamCommands::Remove { id, yes } => {
            team.request_removal(&id).map_err(fail)?;
            if !yes {
                let email = team.view().pending_removal.map(|m| m.email).unwrap_or_default();
                if !confirm(&format!("Remove {} and delete their account?", email))? {
                    team.cancel_removal();
                    return output_success(ctx.format, "Cancelled", None);
                }
            }
            team.confirm_removal().await.map_err(fail)?;
            output_success(ctx.format, &format!("Removed {}", id), Some(json!({ "id": id })))
        }
        TeamCommands::Role { id, role } => {
            team.change_role(&id, role).await.map_err(fail)?;
            output_success(ctx.format, &format!("{} is now {}", id, role), Some(json!({ "id": id, "role": role })))
        }
    }
}
