use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{phase::VisibleSessionPhase, validation::validate_player_name},
    state::{
        engine::EngineSnapshot,
        game::{Country, Feedback, Question},
    },
};

/// Payload used to open a new quiz session.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Optional player name. When present, the final score is submitted to
    /// the leaderboard once the session ends.
    #[serde(default)]
    #[validate(custom(function = validate_player_name))]
    pub player_name: Option<String>,
}

/// Payload of an answer to the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Id of the chosen option.
    pub country_id: String,
}

/// Acknowledgement for session operations without a snapshot result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Always `true`; failures are reported through the error body instead.
    pub success: bool,
}

impl ActionResponse {
    /// The positive acknowledgement.
    pub fn acknowledged() -> Self {
        Self { success: true }
    }
}

/// One selectable option of a question.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct CountryOption {
    /// Stable unique code, echoed back in [`AnswerRequest`].
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flag image URL.
    pub flag_url: String,
}

impl From<Country> for CountryOption {
    fn from(value: Country) -> Self {
        Self {
            id: value.id,
            name: value.name,
            flag_url: value.flag_url,
        }
    }
}

/// Client view of the current question. The flag shown is the answer's;
/// which option is correct is never exposed here.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    /// Flag image the player has to identify.
    pub flag_url: String,
    /// The four candidate countries.
    pub options: Vec<CountryOption>,
}

impl From<&Question> for QuestionView {
    fn from(value: &Question) -> Self {
        Self {
            flag_url: value.answer.flag_url.clone(),
            options: value.options.iter().cloned().map(Into::into).collect(),
        }
    }
}

/// Full client-facing view of one session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: Uuid,
    /// Current phase.
    pub phase: VisibleSessionPhase,
    /// Correct answers so far.
    pub score: u32,
    /// Remaining lives.
    pub lives: u8,
    /// Seconds left on the current question.
    pub time_left_seconds: u8,
    /// Whether the session reached its terminal state.
    pub is_game_over: bool,
    /// Remaining free question swaps.
    pub skips_remaining: u8,
    /// Current question, absent while loading or after game over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Outcome message for the last evaluated event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl From<(Uuid, EngineSnapshot)> for SessionSnapshot {
    fn from((id, snapshot): (Uuid, EngineSnapshot)) -> Self {
        Self {
            id,
            phase: snapshot.phase.into(),
            score: snapshot.session.score,
            lives: snapshot.session.lives,
            time_left_seconds: snapshot.session.time_left_seconds,
            is_game_over: snapshot.session.is_game_over,
            skips_remaining: snapshot.session.skips_remaining,
            question: snapshot.question.as_ref().map(Into::into),
            feedback: snapshot.feedback.as_ref().map(feedback_message),
        }
    }
}

/// Player-facing rendering of an evaluation outcome.
fn feedback_message(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Correct => "Correct! +1 point".to_owned(),
        Feedback::Wrong { correct } => format!("Wrong! It was {correct}"),
        Feedback::TimedOut => "Time's up!".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_messages_name_the_correct_country() {
        assert_eq!(
            feedback_message(&Feedback::Wrong {
                correct: "Brazil".into()
            }),
            "Wrong! It was Brazil"
        );
        assert_eq!(feedback_message(&Feedback::Correct), "Correct! +1 point");
        assert_eq!(feedback_message(&Feedback::TimedOut), "Time's up!");
    }
}
