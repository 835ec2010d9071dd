use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;

use crate::backend::ChatBackend;
use crate::conversation::{Conversation, Message, ReportReceipt, RoomDetail, RoomId, TurnReply};
use crate::error::BackendError;
use crate::readiness::{ReadinessMap, ReadinessState};

pub(crate) fn readiness(entries: &[(&str, ReadinessState)]) -> ReadinessMap {
    entries.iter().map(|(k, v)| (*k, *v)).collect()
}

pub(crate) fn conversation(entries: &[(&str, ReadinessState)]) -> Conversation {
    let mut conversation = Conversation::empty(RoomId::new("1"), "대화");
    conversation.readiness.set_all(readiness(entries));
    conversation
}

pub(crate) fn reply(content: &str, entries: &[(&str, ReadinessState)]) -> TurnReply {
    TurnReply {
        message: Message::assistant(content, Utc::now()),
        report_status: readiness(entries),
    }
}

/// Backend double answering from queued results, in order.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<TurnReply, BackendError>>>,
    reports: Mutex<VecDeque<Result<ReportReceipt, BackendError>>>,
    prompts: Mutex<Vec<String>>,
    report_calls: Mutex<usize>,
    hang_next_reply: Mutex<bool>,
    hang_next_report: Mutex<bool>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_reply(&self, result: Result<TurnReply, BackendError>) {
        self.replies.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_report(&self, result: Result<ReportReceipt, BackendError>) {
        self.reports.lock().unwrap().push_back(result);
    }

    pub(crate) fn hang_next_reply(&self) {
        *self.hang_next_reply.lock().unwrap() = true;
    }

    /// The next `generate_report` never answers.
    pub(crate) fn hang_next_report(&self) {
        *self.hang_next_report.lock().unwrap() = true;
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn report_calls(&self) -> usize {
        *self.report_calls.lock().unwrap()
    }
}

impl ChatBackend for ScriptedBackend {
    async fn load_room(&self, room_id: &RoomId) -> Result<RoomDetail, BackendError> {
        Ok(RoomDetail {
            room_id: room_id.clone(),
            title: "첫 번째 대화".to_string(),
            has_report: false,
            messages: vec![Message::assistant(
                "안녕하세요! AI 업무 비서입니다. 오늘 하루는 어떠셨나요?",
                Utc::now(),
            )],
            report_status: Some(readiness(&[
                ("오늘 한 일", ReadinessState::Missing),
                ("이슈 및 블로커", ReadinessState::Missing),
                ("내일 할 일", ReadinessState::Missing),
                ("컨디션", ReadinessState::Missing),
            ])),
        })
    }

    async fn send_message(
        &self,
        _room_id: &RoomId,
        prompt: &str,
    ) -> Result<TurnReply, BackendError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let hang = std::mem::take(&mut *self.hang_next_reply.lock().unwrap());
        if hang {
            std::future::pending::<()>().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted reply".into())))
    }

    async fn generate_report(&self, _room_id: &RoomId) -> Result<ReportReceipt, BackendError> {
        *self.report_calls.lock().unwrap() += 1;
        let hang = std::mem::take(&mut *self.hang_next_report.lock().unwrap());
        if hang {
            std::future::pending::<()>().await;
        }
        self.reports
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted report".into())))
    }
}
