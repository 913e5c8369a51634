use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, game::QuestionSummary, millis, wire_position},
    state::{session::SessionStatus, store::SessionRecord},
};

/// Lifecycle command sent by the game owner.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutateGameRequest {
    pub mutation_type: MutationType,
}

/// Supported lifecycle commands.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationType {
    /// Create a session in the lobby.
    Start,
    /// Open the next question, or end after the last one.
    Advance,
    /// End the running session.
    End,
}

/// What a lifecycle command did.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Started,
    Advanced,
    Ended,
}

/// Response to a lifecycle command.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub status: MutationStatus,
    /// Join code of the affected session.
    pub session_id: u32,
    /// Newly opened question index after an advance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Coarse session status on the wire.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatusDto {
    Lobby,
    Active,
    Ended,
}

impl From<SessionStatus> for SessionStatusDto {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Lobby => SessionStatusDto::Lobby,
            SessionStatus::Active => SessionStatusDto::Active,
            SessionStatus::Ended => SessionStatusDto::Ended,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    pub joined_at: String,
}

/// Owner view of a session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub session_id: u32,
    pub game_id: Uuid,
    /// Whether the session is in the lobby or running.
    pub active: bool,
    pub status: SessionStatusDto,
    /// Current question index, `-1` in the lobby.
    pub position: i64,
    pub questions: Vec<QuestionSummary>,
    pub question_started_at: Option<String>,
    /// Server-computed countdown of the open window.
    pub remaining_ms: u64,
    pub players: Vec<RosterEntry>,
    /// Number of committed transitions.
    pub version: usize,
}

impl SessionStatusResponse {
    /// Snapshot `record` as seen at `now`.
    pub fn snapshot(record: &SessionRecord, now: SystemTime) -> Self {
        let session = &record.session;
        Self {
            session_id: session.id.value(),
            game_id: session.game_id,
            active: session.is_live(),
            status: session.status().into(),
            position: wire_position(session.position()),
            questions: session.questions.iter().map(Into::into).collect(),
            question_started_at: session.question_started_at().map(format_system_time),
            remaining_ms: millis(session.remaining(now)),
            players: record
                .players
                .values()
                .map(|player| RosterEntry {
                    id: player.id,
                    name: player.name.clone(),
                    joined_at: format_system_time(player.joined_at),
                })
                .collect(),
            version: session.version(),
        }
    }
}
