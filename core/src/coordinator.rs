use std::time::Duration;

use chrono::Utc;

use crate::backend::{ChatBackend, bounded};
use crate::conversation::{Conversation, Message, RoomId, TurnReply};
use crate::error::{BackendError, TURN_FAILURE_NOTICE, TurnRejected};

pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// What the session is doing right now. Only `Idle` accepts a new turn or a
/// report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sending,
    GeneratingReport,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// `None` waits forever.
    pub turn_timeout: Option<Duration>,
    pub report_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Some(DEFAULT_TURN_TIMEOUT),
            report_timeout: Some(DEFAULT_REPORT_TIMEOUT),
        }
    }
}

/// Proof that a turn was admitted. Only [`ChatSession::begin_turn`] makes one,
/// and only one can be outstanding because admission requires `Idle`.
#[derive(Debug)]
#[must_use = "a pending turn must be completed or the session stays in Sending"]
pub struct PendingTurn {
    room_id: RoomId,
    prompt: String,
}

impl PendingTurn {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[derive(Debug)]
pub enum TurnOutcome {
    Replied,
    /// The failure notice was appended; readiness kept its previous value.
    Failed(BackendError),
}

/// An open conversation plus the turn state machine driving it.
#[derive(Debug)]
pub struct ChatSession {
    pub(crate) conversation: Conversation,
    pub(crate) phase: SessionPhase,
    input: String,
    pub(crate) config: SessionConfig,
}

impl ChatSession {
    pub fn new(conversation: Conversation, config: SessionConfig) -> Self {
        Self {
            conversation,
            phase: SessionPhase::Idle,
            input: String::new(),
            config,
        }
    }

    /// Load a conversation by id and open a session on it.
    pub async fn open<B: ChatBackend>(
        backend: &B,
        room_id: &RoomId,
        config: SessionConfig,
    ) -> Result<Self, BackendError> {
        let detail = backend.load_room(room_id).await?;
        let session = Self::new(Conversation::from(detail), config);
        tracing::debug!(
            room_id = %session.conversation.id,
            messages = session.conversation.timeline().len(),
            has_report = session.conversation.has_report(),
            "conversation loaded"
        );
        Ok(session)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Admit a turn: append the user's message and move to `Sending`.
    ///
    /// Blank text or a busy session is rejected without touching anything.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn, TurnRejected> {
        if text.trim().is_empty() {
            return Err(TurnRejected::BlankInput);
        }
        if self.phase != SessionPhase::Idle {
            return Err(TurnRejected::Busy(self.phase));
        }

        self.conversation
            .timeline
            .append(Message::user(text, Utc::now()));
        self.input.clear();
        self.phase = SessionPhase::Sending;

        Ok(PendingTurn {
            room_id: self.conversation.id.clone(),
            prompt: text.to_string(),
        })
    }

    /// Fold the backend's answer into the conversation and return to `Idle`.
    ///
    /// A `pending` turn this session is not waiting for is refused untouched.
    pub fn complete_turn(
        &mut self,
        pending: PendingTurn,
        result: Result<TurnReply, BackendError>,
    ) -> Result<TurnOutcome, TurnRejected> {
        if self.phase != SessionPhase::Sending || pending.room_id != self.conversation.id {
            tracing::error!(
                room_id = %self.conversation.id,
                pending_room_id = %pending.room_id,
                phase = ?self.phase,
                "turn completion does not match session"
            );
            return Err(TurnRejected::Mismatched);
        }
        self.phase = SessionPhase::Idle;

        match result {
            Ok(reply) => {
                self.conversation.timeline.append(reply.message);
                self.conversation.readiness.set_all(reply.report_status);
                tracing::info!(
                    room_id = %pending.room_id,
                    fully_sufficient = self.conversation.readiness.is_fully_sufficient(),
                    "turn completed"
                );
                Ok(TurnOutcome::Replied)
            }
            Err(err) => {
                tracing::warn!(room_id = %pending.room_id, error = %err, "turn failed");
                self.conversation
                    .timeline
                    .append(Message::assistant(TURN_FAILURE_NOTICE, Utc::now()));
                Ok(TurnOutcome::Failed(err))
            }
        }
    }

    /// Run one full turn against `backend`.
    pub async fn submit<B: ChatBackend>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Result<TurnOutcome, TurnRejected> {
        let pending = self.begin_turn(text)?;
        let result = bounded(
            self.config.turn_timeout,
            backend.send_message(&pending.room_id, &pending.prompt),
        )
        .await;
        self.complete_turn(pending, result)
    }

    /// Submit the draft held in the input buffer.
    pub async fn submit_input<B: ChatBackend>(
        &mut self,
        backend: &B,
    ) -> Result<TurnOutcome, TurnRejected> {
        let text = self.input.clone();
        self.submit(backend, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;
    use crate::readiness::ReadinessState::{Missing, Sufficient};
    use crate::test_support::{ScriptedBackend, conversation, reply};

    #[tokio::test]
    async fn successful_turns_grow_timeline_by_two_in_order() {
        let backend = ScriptedBackend::new();
        backend.push_reply(Ok(reply("a1", &[("tasks", Missing)])));
        backend.push_reply(Ok(reply("a2", &[("tasks", Sufficient)])));
        backend.push_reply(Ok(reply("a3", &[("tasks", Sufficient)])));

        let mut session =
            ChatSession::new(conversation(&[("tasks", Missing)]), SessionConfig::default());
        session
            .conversation
            .timeline
            .append(Message::assistant("안녕하세요!", Utc::now()));
        let initial = session.conversation().timeline().len();

        for text in ["u1", "u2", "u3"] {
            let outcome = session.submit(&backend, text).await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Replied));
        }

        let timeline = session.conversation().timeline();
        assert_eq!(timeline.len(), 2 * 3 + initial);
        let contents: Vec<&str> = timeline
            .iter()
            .skip(initial)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["u1", "a1", "u2", "a2", "u3", "a3"]);
        assert_eq!(backend.prompts(), vec!["u1", "u2", "u3"]);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let backend = ScriptedBackend::new();
        let mut session = ChatSession::new(conversation(&[]), SessionConfig::default());

        for text in ["", "   ", "\n\t "] {
            let rejected = session.submit(&backend, text).await.unwrap_err();
            assert_eq!(rejected, TurnRejected::BlankInput);
        }
        assert!(session.conversation().timeline().is_empty());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(backend.prompts().is_empty());
    }

    #[test]
    fn second_submit_while_sending_is_a_no_op() {
        let mut session =
            ChatSession::new(conversation(&[("plan", Missing)]), SessionConfig::default());
        let pending = session.begin_turn("first").unwrap();
        let before_len = session.conversation().timeline().len();
        let before_readiness = session.conversation().readiness().snapshot().clone();

        let rejected = session.begin_turn("second").unwrap_err();
        assert_eq!(rejected, TurnRejected::Busy(SessionPhase::Sending));
        assert_eq!(session.conversation().timeline().len(), before_len);
        assert_eq!(session.conversation().readiness().snapshot(), &before_readiness);

        session
            .complete_turn(pending, Ok(reply("ok", &[("plan", Sufficient)])))
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn completion_from_another_session_is_refused() {
        let mut first =
            ChatSession::new(conversation(&[("plan", Missing)]), SessionConfig::default());
        let mut other = ChatSession::new(
            Conversation::empty(RoomId::new("2"), "다른 대화"),
            SessionConfig::default(),
        );
        let foreign = first.begin_turn("첫 번째 방").unwrap();
        let own = other.begin_turn("두 번째 방").unwrap();

        let rejected = other
            .complete_turn(foreign, Ok(reply("엉뚱한 답", &[("plan", Sufficient)])))
            .unwrap_err();
        assert_eq!(rejected, TurnRejected::Mismatched);
        assert_eq!(other.phase(), SessionPhase::Sending);
        assert_eq!(other.conversation().timeline().len(), 1);
        assert!(other.conversation().readiness().snapshot().is_empty());

        let outcome = other.complete_turn(own, Ok(reply("네", &[]))).unwrap();
        assert!(matches!(outcome, TurnOutcome::Replied));
        assert_eq!(other.phase(), SessionPhase::Idle);
        assert_eq!(first.phase(), SessionPhase::Sending);
    }

    #[test]
    fn completion_while_idle_is_refused() {
        let mut session = ChatSession::new(conversation(&[]), SessionConfig::default());
        let pending = session.begin_turn("한 번").unwrap();
        session.complete_turn(pending, Ok(reply("네", &[]))).unwrap();

        let replay = PendingTurn {
            room_id: session.conversation().id.clone(),
            prompt: "한 번".to_string(),
        };
        assert_eq!(
            session.complete_turn(replay, Ok(reply("또", &[]))).unwrap_err(),
            TurnRejected::Mismatched
        );
        assert_eq!(session.conversation().timeline().len(), 2);
    }

    #[tokio::test]
    async fn failed_turn_keeps_readiness_and_appends_notice() {
        let backend = ScriptedBackend::new();
        backend.push_reply(Err(BackendError::Status {
            status: 500,
            body: serde_json::json!({"detail": "Triage AI call with Gemini failed"}),
        }));

        let mut session = ChatSession::new(
            conversation(&[("tasks", Sufficient), ("plan", Missing)]),
            SessionConfig::default(),
        );
        let before = session.conversation().readiness().snapshot().clone();

        let outcome = session.submit(&backend, "오늘 배포했어요").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Failed(_)));

        assert_eq!(session.conversation().readiness().snapshot(), &before);
        let last = session.conversation().timeline().last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.content, TURN_FAILURE_NOTICE);
        assert_eq!(session.conversation().timeline().len(), 2);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn hung_turn_times_out_through_failure_path() {
        let backend = ScriptedBackend::new();
        backend.hang_next_reply();

        let config = SessionConfig {
            turn_timeout: Some(Duration::from_millis(20)),
            ..SessionConfig::default()
        };
        let mut session = ChatSession::new(conversation(&[("plan", Missing)]), config);

        let outcome = session.submit(&backend, "여보세요?").await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed(BackendError::Timeout(_))
        ));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(
            session.conversation().timeline().last().map(|m| m.content.as_str()),
            Some(TURN_FAILURE_NOTICE)
        );
    }

    #[tokio::test]
    async fn submit_input_clears_draft_only_when_admitted() {
        let backend = ScriptedBackend::new();
        backend.push_reply(Ok(reply("네", &[])));
        let mut session = ChatSession::new(conversation(&[]), SessionConfig::default());

        session.set_input("   ");
        assert_eq!(
            session.submit_input(&backend).await.unwrap_err(),
            TurnRejected::BlankInput
        );
        assert_eq!(session.input(), "   ");

        session.set_input("내일은 리팩터링");
        session.submit_input(&backend).await.unwrap();
        assert_eq!(session.input(), "");
        assert_eq!(backend.prompts(), vec!["내일은 리팩터링"]);
    }

    #[tokio::test]
    async fn open_hydrates_from_backend() {
        let backend = ScriptedBackend::new();
        let session = ChatSession::open(&backend, &RoomId::new("1"), SessionConfig::default())
            .await
            .unwrap();
        assert_eq!(session.conversation().title, "첫 번째 대화");
        assert_eq!(session.conversation().timeline().len(), 1);
        assert!(!session.conversation().readiness().is_fully_sufficient());
    }
}
