use clap::Subcommand;
use dayreport_core::{ChatSession, ReportId, RoomId, SessionConfig};
use serde_json::json;

use crate::transport::HttpBackend;
use crate::util::{print_json, require_identity};

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Generate the daily report for a conversation (once per conversation)
    Generate {
        #[arg(long)]
        room_id: String,
    },
    /// List your reports, newest first
    List,
    /// Show a report with the conversation it was generated from
    Show {
        #[arg(long)]
        report_id: String,
    },
}

pub async fn run(
    backend: &HttpBackend,
    config: SessionConfig,
    command: ReportCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    require_identity(backend.session());

    match command {
        ReportCommands::Generate { room_id } => {
            let mut session = ChatSession::open(backend, &RoomId::new(room_id), config).await?;
            let report_id = session.fire_report(backend).await?;
            print_json(&json!({
                "status": "generated",
                "report_id": report_id,
                "room_id": session.conversation().id,
                "room_title": session.conversation().title,
            }))
        }
        ReportCommands::List => print_json(&backend.list_reports().await?),
        ReportCommands::Show { report_id } => {
            print_json(&backend.get_report(&ReportId::new(report_id)).await?)
        }
    }
}
