use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::{
    Message, ReportId, RoomId, RoomSummary, UserId, deserialize_optional_timestamp,
};
use crate::session::Role;

/// A generated report. `summary_content` is opaque markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(alias = "reportId")]
    pub report_id: ReportId,
    #[serde(alias = "roomId")]
    pub room_id: RoomId,
    #[serde(default, alias = "summaryContent")]
    pub summary_content: String,
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_optional_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "chatRoom", skip_serializing_if = "Option::is_none")]
    pub chat_room: Option<RoomSummary>,
}

/// `GET /reports/{id}`: the report plus the conversation it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetail {
    pub report: ReportRecord,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(alias = "userId")]
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default, alias = "teamId")]
    pub team_id: Option<i64>,
}

/// Row of `GET /team/reports`: a member and their most recent report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberStatus {
    pub user: TeamMember,
    #[serde(default, alias = "latestReport")]
    pub latest_report: Option<ReportRecord>,
}
