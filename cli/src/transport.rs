//! reqwest-backed implementation of the backend collaborators.

use std::sync::Arc;

use dayreport_core::backend::{AuthBackend, ChatBackend};
use dayreport_core::conversation::{ReportReceipt, RoomDetail, RoomSummary, TurnReply};
use dayreport_core::reports::{ReportDetail, ReportRecord, TeamMemberStatus};
use dayreport_core::session::{AuthorizeRequest, LoginGrant};
use dayreport_core::{
    BackendError, ReportId, RoomId, SessionStore, TransportEvent, TransportListener, UserId,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

const LOGIN: &str = "login";
const CHAT_ROOMS: &str = "chat_rooms";
const REPORTS: &str = "reports";

/// A request on its way out, open to the session's authorize hook.
struct Outbound(reqwest::RequestBuilder);

impl AuthorizeRequest for Outbound {
    fn with_bearer(self, token: &str) -> Self {
        Outbound(self.0.bearer_auth(token))
    }
}

enum Body<'a> {
    Empty,
    Json(serde_json::Value),
    Form(&'a [(&'a str, &'a str)]),
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: url::Url,
    session: SessionStore,
    listeners: Vec<Arc<dyn TransportListener>>,
}

impl HttpBackend {
    pub fn new(api_url: &str, session: SessionStore) -> Result<Self, BackendError> {
        let parsed = url::Url::parse(api_url)
            .map_err(|e| BackendError::Transport(format!("Invalid API URL '{api_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::Transport(format!(
                "Unsupported API URL scheme '{}'",
                parsed.scheme()
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: parsed,
            session,
            listeners: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, listener: Arc<dyn TransportListener>) {
        self.listeners.push(listener);
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn emit(&self, event: TransportEvent) {
        for listener in &self.listeners {
            listener.on_transport_event(&event);
        }
    }

    /// Resolve `segments` below the API base. Each segment is
    /// percent-encoded, so an id can never change the endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<url::Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::Transport(format!("API URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request and return the raw body of a 2xx answer.
    ///
    /// A 401 is broadcast to every listener, except on the login call where
    /// it only means the credentials were wrong.
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Body<'_>,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(segments)?;
        let path = format!("/{}", segments.join("/"));

        let request_id = uuid::Uuid::now_v7().to_string();
        let builder = self
            .client
            .request(method.clone(), url)
            .header("x-request-id", &request_id);
        let Outbound(mut builder) = self.session.authorize_request(Outbound(builder));

        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(fields) => builder.form(fields),
        };

        tracing::debug!(%method, %path, %request_id, "backend call");
        let resp = builder
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            if segments != [LOGIN] {
                self.emit(TransportEvent::Unauthorized { path });
            }
            return Err(BackendError::Unauthorized);
        }

        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));
            tracing::debug!(%method, %path, status = status.as_u16(), "backend refused call");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(text)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Body<'_>,
    ) -> Result<T, BackendError> {
        let text = self.execute(method, segments, body).await?;
        serde_json::from_str(&text)
            .map_err(|e| BackendError::Decode(format!("/{}: {e}", segments.join("/"))))
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomSummary>, BackendError> {
        self.call(Method::GET, &[CHAT_ROOMS], Body::Empty).await
    }

    pub async fn create_room(&self) -> Result<RoomSummary, BackendError> {
        self.call(Method::POST, &[CHAT_ROOMS], Body::Empty).await
    }

    pub async fn rename_room(
        &self,
        room_id: &RoomId,
        title: &str,
    ) -> Result<RoomSummary, BackendError> {
        self.call(
            Method::PUT,
            &[CHAT_ROOMS, room_id.as_str()],
            Body::Json(json!({ "title": title })),
        )
        .await
    }

    pub async fn delete_room(&self, room_id: &RoomId) -> Result<(), BackendError> {
        self.execute(Method::DELETE, &[CHAT_ROOMS, room_id.as_str()], Body::Empty)
            .await
            .map(|_| ())
    }

    pub async fn list_reports(&self) -> Result<Vec<ReportRecord>, BackendError> {
        self.call(Method::GET, &[REPORTS], Body::Empty).await
    }

    pub async fn get_report(&self, report_id: &ReportId) -> Result<ReportDetail, BackendError> {
        self.call(Method::GET, &[REPORTS, report_id.as_str()], Body::Empty)
            .await
    }

    pub async fn team_reports(&self) -> Result<Vec<TeamMemberStatus>, BackendError> {
        self.call(Method::GET, &["team", REPORTS], Body::Empty).await
    }

    pub async fn team_member_reports(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReportRecord>, BackendError> {
        self.call(Method::GET, &["team", REPORTS, user_id.as_str()], Body::Empty)
            .await
    }
}

impl AuthBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, BackendError> {
        let fields = [("username", username), ("password", password)];
        self.call(Method::POST, &[LOGIN], Body::Form(&fields)).await
    }
}

impl ChatBackend for HttpBackend {
    async fn load_room(&self, room_id: &RoomId) -> Result<RoomDetail, BackendError> {
        self.call(Method::GET, &[CHAT_ROOMS, room_id.as_str()], Body::Empty)
            .await
    }

    async fn send_message(
        &self,
        room_id: &RoomId,
        prompt: &str,
    ) -> Result<TurnReply, BackendError> {
        self.call(
            Method::POST,
            &[CHAT_ROOMS, room_id.as_str(), "messages"],
            Body::Json(json!({ "prompt": prompt })),
        )
        .await
    }

    async fn generate_report(&self, room_id: &RoomId) -> Result<ReportReceipt, BackendError> {
        self.call(
            Method::POST,
            &[CHAT_ROOMS, room_id.as_str(), REPORTS],
            Body::Empty,
        )
        .await
    }
}
