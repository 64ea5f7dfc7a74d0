use serde::Serialize;
use utoipa::ToSchema;

use crate::state::engine::EnginePhase;

/// Session phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// First question not drawn yet.
    Loading,
    /// A question is live and the countdown is running.
    Playing,
    /// Question swap or settle window in flight; inputs are ignored.
    Transitioning,
    /// Session ended; only restart is accepted.
    GameOver,
}

impl From<EnginePhase> for VisibleSessionPhase {
    fn from(value: EnginePhase) -> Self {
        match value {
            EnginePhase::Loading => VisibleSessionPhase::Loading,
            EnginePhase::Playing => VisibleSessionPhase::Playing,
            EnginePhase::Transitioning => VisibleSessionPhase::Transitioning,
            EnginePhase::GameOver => VisibleSessionPhase::GameOver,
        }
    }
}
