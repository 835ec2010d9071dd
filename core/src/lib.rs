//! Chat session and report-readiness coordination for the dayreport client.

pub mod backend;
pub mod conversation;
pub mod coordinator;
pub mod error;
pub mod readiness;
pub mod report;
pub mod reports;
pub mod session;
pub mod timeline;

#[cfg(test)]
mod test_support;

pub use backend::{AuthBackend, ChatBackend};
pub use conversation::{Conversation, Message, RecordId, ReportId, RoomId, Sender, UserId};
pub use coordinator::{ChatSession, SessionConfig, SessionPhase, TurnOutcome};
pub use error::{AuthError, BackendError, ReportBlock, ReportError, TurnRejected};
pub use readiness::{ReadinessMap, ReadinessState, ReadinessTracker};
pub use session::{Identity, Role, Session, SessionStore, TransportEvent, TransportListener};
