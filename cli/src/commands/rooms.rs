use clap::Subcommand;
use dayreport_core::{ChatSession, RoomId, SessionConfig};
use serde_json::json;

use crate::render::session_json;
use crate::transport::HttpBackend;
use crate::util::{exit_error, print_json, require_identity};

#[derive(Subcommand)]
pub enum RoomCommands {
    /// List your conversations, newest first
    List,
    /// Start a new, empty conversation
    Create,
    /// Rename a conversation
    Rename {
        #[arg(long)]
        room_id: String,
        #[arg(long)]
        title: String,
    },
    /// Delete a conversation with its messages and report
    Delete {
        #[arg(long)]
        room_id: String,
        /// Confirm deletion (required, there is no interactive prompt)
        #[arg(long)]
        confirm: bool,
    },
    /// Show a conversation with its readiness state
    Show {
        #[arg(long)]
        room_id: String,
    },
}

pub async fn run(
    backend: &HttpBackend,
    config: SessionConfig,
    command: RoomCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    require_identity(backend.session());

    match command {
        RoomCommands::List => print_json(&backend.list_rooms().await?),
        RoomCommands::Create => {
            let room = backend.create_room().await?;
            tracing::info!(room_id = %room.room_id, "conversation created");
            print_json(&room)
        }
        RoomCommands::Rename { room_id, title } => {
            let title = title.trim();
            if title.is_empty() {
                exit_error("제목을 입력해주세요.", Some("Pass a non-blank --title."));
            }
            print_json(&backend.rename_room(&RoomId::new(room_id), title).await?)
        }
        RoomCommands::Delete { room_id, confirm } => {
            if !confirm {
                exit_error(
                    "Deleting a conversation also removes its messages and report.",
                    Some("Add --confirm to proceed: rooms delete --room-id <id> --confirm"),
                );
            }
            let room_id = RoomId::new(room_id);
            backend.delete_room(&room_id).await?;
            print_json(&json!({ "status": "deleted", "room_id": room_id }))
        }
        RoomCommands::Show { room_id } => {
            let session = ChatSession::open(backend, &RoomId::new(room_id), config).await?;
            print_json(&session_json(&session))
        }
    }
}
