use chrono::Local;
use dayreport_core::{ChatSession, Message, ReadinessState, ReadinessTracker, Sender};
use serde_json::{Value, json};

pub fn message_line(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "나",
        Sender::Assistant => "AI",
    };
    let at = message.created_at.with_timezone(&Local).format("%H:%M:%S");
    format!("[{at}] {who}: {}", message.content)
}

fn state_label(state: ReadinessState) -> &'static str {
    match state {
        ReadinessState::Sufficient => "충분",
        ReadinessState::Missing => "부족",
        ReadinessState::Unknown => "알 수 없음",
    }
}

/// One line per category, e.g. `  오늘 한 일: 충분`.
pub fn readiness_lines(tracker: &ReadinessTracker) -> Vec<String> {
    tracker
        .entries()
        .map(|(category, state)| format!("  {category}: {}", state_label(state)))
        .collect()
}

pub fn readiness_json(tracker: &ReadinessTracker) -> Value {
    json!({
        "categories": tracker.snapshot(),
        "fully_sufficient": tracker.is_fully_sufficient(),
        "missing": tracker.missing_categories(),
    })
}

/// Status block shown by `/status` and after each turn.
pub fn status_block(session: &ChatSession) -> String {
    let mut lines = Vec::new();
    match session.report_gate() {
        Ok(()) => lines.push("리포트를 생성할 수 있습니다. /report 로 생성하세요.".to_string()),
        Err(block) => lines.push(block.to_string()),
    }
    if !session.conversation().has_report() {
        lines.extend(readiness_lines(session.conversation().readiness()));
    }
    lines.join("\n")
}

pub fn session_json(session: &ChatSession) -> Value {
    let conversation = session.conversation();
    json!({
        "room_id": conversation.id,
        "title": conversation.title,
        "has_report": conversation.has_report(),
        "report_enabled": session.report_enabled(),
        "readiness": readiness_json(conversation.readiness()),
        "messages": conversation.timeline().as_slice(),
    })
}
