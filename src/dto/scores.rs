use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::ScoreEntity;

/// Payload of a score submission.
///
/// Both fields are deliberately lenient so malformed bodies reach the
/// service layer and come back as a structured 400 instead of a framework
/// rejection: `score` in particular accepts any JSON value and is checked
/// for being an integral, non-negative number afterwards.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitScoreRequest {
    /// Player name; required, non-empty once trimmed.
    #[serde(default)]
    pub name: Option<String>,
    /// Score reached; required, non-negative integer.
    #[serde(default)]
    #[schema(value_type = Option<u64>)]
    pub score: Option<serde_json::Value>,
}

/// Acknowledgement returned on a successful submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitScoreResponse {
    /// Always `true`; failures are reported through the error body instead.
    pub success: bool,
}

impl SubmitScoreResponse {
    /// The positive acknowledgement.
    pub fn acknowledged() -> Self {
        Self { success: true }
    }
}

/// One row of the ranking returned by the leaderboard.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScoreRecord {
    /// Player name.
    pub name: String,
    /// Best score submitted for this player.
    pub score: u32,
}

impl From<ScoreEntity> for ScoreRecord {
    fn from(value: ScoreEntity) -> Self {
        Self {
            name: value.name,
            score: value.score,
        }
    }
}
