use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::AuthBackend;
use crate::conversation::UserId;
use crate::error::{AuthError, BackendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Lead,
    Admin,
}

impl Role {
    /// Leads and admins may read their team's reports.
    pub fn can_review_team(self) -> bool {
        matches!(self, Role::Lead | Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        match label.trim() {
            "팀장" | "lead" | "leader" => Role::Lead,
            "임원" | "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Role::from(label.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

/// Answer to `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(alias = "userId")]
    pub user_id: UserId,
    pub role: Role,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl LoginGrant {
    fn into_session(self) -> Session {
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.username.clone());
        Session {
            token: self.access_token,
            identity: Identity {
                id: self.user_id,
                username: self.username,
                role: self.role,
                display_name,
            },
        }
    }
}

/// Bearer token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

/// Something emitted by the transport after inspecting a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A call came back 401.
    Unauthorized { path: String },
}

/// Observer of transport events. Registered with the transport at startup.
pub trait TransportListener: Send + Sync {
    fn on_transport_event(&self, event: &TransportEvent);
}

/// An outbound request that can carry a bearer credential.
pub trait AuthorizeRequest: Sized {
    fn with_bearer(self, token: &str) -> Self;
}

/// Process-wide session. Cloning shares the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a session persisted by an earlier process.
    pub fn restore(session: Session) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.current().map(|session| session.identity)
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|session| session.token)
    }

    /// Exchange credentials for a session and keep it.
    ///
    /// Bad credentials leave any existing session in place.
    pub async fn authenticate<A: AuthBackend>(
        &self,
        backend: &A,
        username: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let grant = match backend.login(username, password).await {
            Ok(grant) => grant,
            Err(BackendError::Unauthorized) => return Err(AuthError::InvalidCredentials),
            Err(BackendError::Status { status: 400 | 401 | 403, .. }) => {
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(AuthError::Backend(err)),
        };

        let session = grant.into_session();
        let identity = session.identity.clone();
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        tracing::info!(username = %identity.username, role = ?identity.role, "session established");
        Ok(identity)
    }

    /// Attach the stored bearer token, if any. Without one the request goes
    /// out unauthenticated.
    pub fn authorize_request<R: AuthorizeRequest>(&self, request: R) -> R {
        match self.token() {
            Some(token) => request.with_bearer(&token),
            None => request,
        }
    }

    pub fn logout(&self) {
        self.clear();
    }

    /// Drop the session after the backend rejected our credential.
    pub fn on_unauthorized(&self) {
        if self.clear() {
            tracing::warn!("session invalidated by backend");
        }
    }

    fn clear(&self) -> bool {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}

impl TransportListener for SessionStore {
    fn on_transport_event(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Unauthorized { .. } => self.on_unauthorized(),
        }
    }
}
