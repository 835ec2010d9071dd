//! Seams to the backend collaborators. The HTTP implementation lives in the
//! CLI; tests drive the coordinator with in-memory doubles.
#![allow(async_fn_in_trait)]

use std::future::Future;
use std::time::Duration;

use crate::conversation::{ReportReceipt, RoomDetail, RoomId, TurnReply};
use crate::error::BackendError;
use crate::session::LoginGrant;

pub trait AuthBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, BackendError>;
}

pub trait ChatBackend {
    async fn load_room(&self, room_id: &RoomId) -> Result<RoomDetail, BackendError>;

    /// One turn: the prompt goes out, the assistant reply and the refreshed
    /// readiness snapshot come back.
    async fn send_message(&self, room_id: &RoomId, prompt: &str) -> Result<TurnReply, BackendError>;

    async fn generate_report(&self, room_id: &RoomId) -> Result<ReportReceipt, BackendError>;
}

/// Await `call`, failing with [`BackendError::Timeout`] once `limit` elapses.
pub async fn bounded<T>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(BackendError::Timeout(limit))),
        None => call.await,
    }
}
