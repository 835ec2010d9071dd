use clap::Subcommand;

use crate::transport::HttpBackend;
use crate::util::{exit_error, print_json, require_identity};
use dayreport_core::UserId;

#[derive(Subcommand)]
pub enum TeamCommands {
    /// Each team member with their latest report
    List,
    /// All reports of one team member
    Member {
        #[arg(long)]
        user_id: String,
    },
}

pub async fn run(
    backend: &HttpBackend,
    command: TeamCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = require_identity(backend.session());
    if !identity.role.can_review_team() {
        exit_error(
            "Team reports are only available to team leads and admins.",
            Some("Log in with a 팀장 or 임원 account."),
        );
    }

    match command {
        TeamCommands::List => print_json(&backend.team_reports().await?),
        TeamCommands::Member { user_id } => {
            print_json(&backend.team_member_reports(&UserId::new(user_id)).await?)
        }
    }
}
