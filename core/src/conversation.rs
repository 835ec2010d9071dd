use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::readiness::{ReadinessMap, ReadinessTracker};
use crate::timeline::MessageTimeline;

/// Opaque backend identifier. The backend issues integers; strings are
/// accepted as well so the client never does arithmetic on ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

pub type RoomId = RecordId;
pub type ReportId = RecordId;
pub type UserId = RecordId;

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(id) => Self::from(id),
            Raw::Text(id) => Self(id),
        })
    }
}

/// Backend timestamps arrive as RFC 3339 or as naive datetimes in UTC.
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "deserialize_timestamp")] DateTime<Utc>);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(ts)| ts))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

/// One exchanged message. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    /// Display/ordering only.
    #[serde(alias = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            created_at,
        }
    }

    pub fn assistant(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: content.into(),
            created_at,
        }
    }
}

/// An open conversation: its history, readiness and report flag.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: RoomId,
    pub title: String,
    pub(crate) has_report: bool,
    pub(crate) timeline: MessageTimeline,
    pub(crate) readiness: ReadinessTracker,
}

impl Conversation {
    /// A freshly created conversation with no history.
    pub fn empty(id: RoomId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            has_report: false,
            timeline: MessageTimeline::default(),
            readiness: ReadinessTracker::default(),
        }
    }

    pub fn has_report(&self) -> bool {
        self.has_report
    }

    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    pub fn readiness(&self) -> &ReadinessTracker {
        &self.readiness
    }
}

/// `GET /chat_rooms/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomDetail {
    #[serde(alias = "roomId")]
    pub room_id: RoomId,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "hasReport")]
    pub has_report: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, alias = "reportStatus")]
    pub report_status: Option<ReadinessMap>,
}

impl From<RoomDetail> for Conversation {
    fn from(detail: RoomDetail) -> Self {
        let mut conversation = Conversation::empty(detail.room_id, detail.title);
        conversation.has_report = detail.has_report;
        conversation.timeline.replace_all(detail.messages);
        conversation
            .readiness
            .set_all(detail.report_status.unwrap_or_default());
        conversation
    }
}

/// Row of `GET /chat_rooms`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    #[serde(alias = "roomId")]
    pub room_id: RoomId,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub title: String,
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_optional_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Answer to `POST /chat_rooms/{id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnReply {
    pub message: Message,
    #[serde(default, alias = "reportStatus")]
    pub report_status: ReadinessMap,
}

/// Answer to `POST /chat_rooms/{id}/reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportReceipt {
    #[serde(alias = "reportId")]
    pub report_id: ReportId,
    #[serde(default, alias = "roomTitle")]
    pub room_title: Option<String>,
    #[serde(default, alias = "summaryContent", skip_serializing_if = "Option::is_none")]
    pub summary_content: Option<String>,
}
