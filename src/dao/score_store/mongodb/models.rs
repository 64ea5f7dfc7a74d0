use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::ScoreEntity;

/// Collection holding one document per distinct player name.
pub const SCORE_COLLECTION_NAME: &str = "scores";

/// Wire shape of a leaderboard document.
///
/// `score` is stored as `i64` because BSON has no unsigned integers;
/// `created_at` is written once on first insert and never touched again, so
/// ascending `created_at` reproduces submission order for tie-breaking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDocument {
    pub name: String,
    pub score: i64,
    pub created_at: DateTime,
}

impl From<ScoreDocument> for ScoreEntity {
    fn from(value: ScoreDocument) -> Self {
        Self {
            name: value.name,
            score: value.score.clamp(0, i64::from(u32::MAX)) as u32,
        }
    }
}
