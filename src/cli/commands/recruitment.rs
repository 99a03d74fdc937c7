use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{fail, output_success};
use crate::cli::CliContext;
use crate::settings::RecruitmentFlag;

#[derive(Subcommand)]
pub enum RecruitmentCommands {
    #[command(about = "Show whether recruitment is open")]
    Status,
    #[command(about = "Open recruitment")]
    Open,
    #[command(about = "Close recruitment")]
    Close,
    #[command(about = "Flip the current status")]
    Toggle,
}

pub async fn handle(cmd: RecruitmentCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let flag = match cmd {
        RecruitmentCommands::Status => ctx.shell.refresh_recruitment().await,
        RecruitmentCommands::Open => ctx.shell.set_recruitment(RecruitmentFlag::open()).await,
        RecruitmentCommands::Close => ctx.shell.set_recruitment(RecruitmentFlag::closed()).await,
        RecruitmentCommands::Toggle => ctx.shell.toggle_recruitment().await,
    }
    .map_err(fail)?;

    let status = if flag.is_open { "open" } else { "closed" };
    output_success(ctx.format, &format!("Recruitment is {}", status), Some(json!(flag)))
}
