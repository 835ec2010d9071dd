use clap::Args;
use dayreport_core::{ChatSession, RoomId, SessionConfig, TurnOutcome, TurnRejected};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::{message_line, status_block};
use crate::transport::HttpBackend;
use crate::util::require_identity;

#[derive(Args)]
pub struct ChatArgs {
    /// Conversation to continue
    #[arg(long)]
    pub room_id: String,
    /// Send a single message and exit instead of reading stdin
    #[arg(long)]
    pub message: Option<String>,
}

const HELP: &str = "메시지를 입력하세요. /status 준비 상태, /report 리포트 생성, /quit 종료";

pub async fn run(
    backend: &HttpBackend,
    config: SessionConfig,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    require_identity(backend.session());

    let mut session = ChatSession::open(backend, &RoomId::new(args.room_id), config).await?;

    if let Some(message) = args.message {
        session.set_input(message);
        submit_draft(backend, &mut session).await;
        println!("{}", status_block(&session));
        return Ok(());
    }

    println!("# {}", session.conversation().title);
    for message in session.conversation().timeline().iter() {
        println!("{}", message_line(message));
    }
    println!("{}", status_block(&session));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/status" => println!("{}", status_block(&session)),
            "/report" => match session.fire_report(backend).await {
                Ok(report_id) => {
                    println!("리포트가 생성되었습니다. (report_id: {report_id})");
                    println!("# {}", session.conversation().title);
                }
                Err(e) => eprintln!("{e}"),
            },
            "/help" => println!("{HELP}"),
            _ => {
                session.set_input(line.as_str());
                if submit_draft(backend, &mut session).await {
                    println!("{}", status_block(&session));
                }
            }
        }

        if backend.session().identity().is_none() {
            eprintln!("세션이 만료되었습니다. 다시 로그인해주세요: dayreport login");
            break;
        }
    }

    Ok(())
}

/// Send the draft held by the session. Returns false when nothing was sent.
async fn submit_draft(backend: &HttpBackend, session: &mut ChatSession) -> bool {
    match session.submit_input(backend).await {
        Ok(outcome) => {
            print_reply(session, outcome);
            true
        }
        Err(TurnRejected::BlankInput) => false,
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn print_reply(session: &ChatSession, outcome: TurnOutcome) {
    if let Some(last) = session.conversation().timeline().last() {
        println!("{}", message_line(last));
    }
    if let TurnOutcome::Failed(err) = outcome {
        eprintln!("{err}");
    }
}
