//! Domain types shared between the quiz engine, the services, and the DTOs.

/// A country as the quiz engine sees it, narrowed from the raw feed at the
/// ingestion boundary so nothing downstream handles optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    /// Stable unique code (ISO 3166-1 alpha-3).
    pub id: String,
    /// Common display name shown as an option label.
    pub name: String,
    /// URL of the flag image the player has to identify.
    pub flag_url: String,
}

/// One round of the quiz: four distinct options and the country whose flag is
/// being shown.
#[derive(Debug, Clone)]
pub struct Question {
    /// Candidate countries, drawn without replacement from the pool. Order
    /// carries no meaning.
    pub options: Vec<Country>,
    /// The correct option. Always one of `options`.
    pub answer: Country,
}

impl Question {
    /// Whether the given country id matches the correct option.
    pub fn is_correct(&self, country_id: &str) -> bool {
        self.answer.id == country_id
    }
}

/// Mutable per-playthrough bookkeeping owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSession {
    /// Number of correctly answered questions.
    pub score: u32,
    /// Remaining lives; the session ends when this reaches zero.
    pub lives: u8,
    /// Seconds left on the current question's countdown.
    pub time_left_seconds: u8,
    /// Terminal flag; once set, no event mutates the session until restart.
    pub is_game_over: bool,
    /// Remaining free question swaps.
    pub skips_remaining: u8,
}

/// Outcome message attached to the last evaluated event, shown to the player
/// during the settle window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// The chosen option was the right country.
    Correct,
    /// The chosen option was wrong; carries the name of the right one.
    Wrong {
        /// Display name of the country that was the correct answer.
        correct: String,
    },
    /// The countdown expired before an answer arrived.
    TimedOut,
}
