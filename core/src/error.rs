use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::coordinator::SessionPhase;

/// Shown in place of the assistant reply when a turn fails.
pub const TURN_FAILURE_NOTICE: &str = "AI 응답을 받는데 실패했습니다.";
/// Used when a report failure carries no readable payload.
pub const REPORT_FAILURE_FALLBACK: &str = "리포트 생성에 실패했습니다.";

/// Failure of a call to one of the backend collaborators.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend answered 401. The transport has already notified its listeners.
    #[error("authorization rejected by backend")]
    Unauthorized,
    /// Any other non-2xx answer. A body that is not JSON arrives as
    /// `{"raw": <text>}`.
    #[error("backend returned status {status}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("login failed: {0}")]
    Backend(#[from] BackendError),
}

/// Why a `submit` was dropped. The session is untouched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnRejected {
    #[error("message is blank")]
    BlankInput,
    #[error("session is busy ({0:?})")]
    Busy(SessionPhase),
    /// A completion was handed to a session that did not issue it, or that is
    /// no longer waiting for it. Nothing was applied.
    #[error("completion does not belong to this session")]
    Mismatched,
}

/// Why the report trigger is currently disabled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportBlock {
    #[error("이미 리포트가 생성되었습니다.")]
    AlreadyReported,
    #[error("session is busy ({0:?})")]
    Busy(SessionPhase),
    #[error("{}", format_incomplete(.missing))]
    Incomplete { missing: Vec<String> },
}

fn format_incomplete(missing: &[String]) -> String {
    const NOTICE: &str = "아직 리포트 생성을 위한 대화가 부족합니다!";
    if missing.is_empty() {
        return NOTICE.to_string();
    }
    format!("{NOTICE} ({})", missing.join(", "))
}

/// Report generation failure. `Display` is the text shown to the user.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("{0}")]
    NotEnabled(ReportBlock),
    /// Structured refusal naming the categories the backend still wants.
    #[error("{}", format_rejection(.message, .missing_fields))]
    Rejected {
        message: String,
        missing_fields: Vec<String>,
    },
    /// The backend explained itself in plain text.
    #[error("{0}")]
    Refused(String),
    #[error("{}", REPORT_FAILURE_FALLBACK)]
    Backend(#[source] BackendError),
    /// See [`TurnRejected::Mismatched`].
    #[error("completion does not belong to this session")]
    Mismatched,
}

fn format_rejection(message: &str, missing_fields: &[String]) -> String {
    if missing_fields.is_empty() {
        return message.to_string();
    }
    format!("{message}\n- {}", missing_fields.join("\n- "))
}

#[derive(Deserialize)]
struct RejectionPayload {
    message: String,
    #[serde(default, alias = "missingFields")]
    missing_fields: Vec<String>,
}

impl ReportError {
    /// Classify a failed report call by inspecting the error body.
    ///
    /// Accepts `{message, missing_fields}` at the top level or nested under
    /// `detail`, and a plain-string `detail`. Anything else falls back to the
    /// generic notice.
    pub fn from_backend(err: BackendError) -> Self {
        let payload = match &err {
            BackendError::Status { body, .. } => Some(body.get("detail").unwrap_or(body).clone()),
            _ => None,
        };
        let Some(payload) = payload else {
            return ReportError::Backend(err);
        };

        if let Some(text) = payload.as_str() {
            let text = text.trim();
            if text.is_empty() {
                return ReportError::Backend(err);
            }
            return ReportError::Refused(text.to_string());
        }
        match serde_json::from_value::<RejectionPayload>(payload) {
            Ok(rejection) => ReportError::Rejected {
                message: rejection.message,
                missing_fields: rejection.missing_fields,
            },
            Err(_) => ReportError::Backend(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status(body: serde_json::Value) -> BackendError {
        BackendError::Status { status: 400, body }
    }

    #[test]
    fn nested_detail_payload_lists_missing_fields() {
        let err = ReportError::from_backend(status(json!({
            "detail": {
                "message": "리포트를 생성하기에 충분한 정보가 없습니다.",
                "missing_fields": ["오늘 한 일", "내일 할 일"]
            }
        })));
        assert_eq!(
            err.to_string(),
            "리포트를 생성하기에 충분한 정보가 없습니다.\n- 오늘 한 일\n- 내일 할 일"
        );
    }

    #[test]
    fn top_level_camel_case_payload_is_accepted() {
        let err = ReportError::from_backend(status(json!({
            "message": "카테고리 부족",
            "missingFields": ["plan"]
        })));
        assert!(matches!(err, ReportError::Rejected { .. }));
        assert!(err.to_string().contains("plan"));
    }

    #[test]
    fn string_detail_is_surfaced_verbatim() {
        let err = ReportError::from_backend(status(json!({
            "detail": "이미 리포트가 생성된 대화입니다."
        })));
        assert_eq!(err.to_string(), "이미 리포트가 생성된 대화입니다.");
    }

    #[test]
    fn blank_detail_falls_back_to_generic_notice() {
        let err = ReportError::from_backend(status(json!({"detail": "  "})));
        assert!(matches!(err, ReportError::Backend(_)));
        assert_eq!(err.to_string(), REPORT_FAILURE_FALLBACK);
    }

    #[test]
    fn non_json_body_falls_back_to_generic_notice() {
        let err = ReportError::from_backend(status(json!({
            "raw": "<html><body>502 Bad Gateway</body></html>"
        })));
        assert_eq!(err.to_string(), REPORT_FAILURE_FALLBACK);
    }

    #[test]
    fn incomplete_notice_names_missing_categories_only_when_known() {
        let block = ReportBlock::Incomplete {
            missing: vec!["내일 할 일".to_string()],
        };
        assert_eq!(
            block.to_string(),
            "아직 리포트 생성을 위한 대화가 부족합니다! (내일 할 일)"
        );

        let block = ReportBlock::Incomplete { missing: vec![] };
        assert_eq!(block.to_string(), "아직 리포트 생성을 위한 대화가 부족합니다!");
    }

    #[test]
    fn unreadable_payload_falls_back_to_generic_notice() {
        let err = ReportError::from_backend(status(json!({"unexpected": true})));
        assert_eq!(err.to_string(), REPORT_FAILURE_FALLBACK);

        let err = ReportError::from_backend(BackendError::Transport("reset".into()));
        assert_eq!(err.to_string(), REPORT_FAILURE_FALLBACK);
    }
}
