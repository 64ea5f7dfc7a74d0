//! Pure state machine driving one quiz playthrough.
//!
//! The engine owns the [`GameSession`] bookkeeping and the current
//! [`Question`], and applies events (answers, countdown ticks, timeouts,
//! skips, restarts) synchronously. It performs no I/O and holds no clocks;
//! the async driver in `services::session_service` owns the actual timer
//! resources and calls in here under the per-session lock. Events that
//! arrive outside their window (while a question swap is in flight, or after
//! the session ended) are dropped, never queued.

use rand::Rng;
use rand::seq::index;
use thiserror::Error;

use crate::state::game::{Country, Feedback, GameSession, Question};

/// Lives a fresh session starts with.
pub const INITIAL_LIVES: u8 = 3;
/// Countdown length for every question, in seconds.
pub const QUESTION_SECONDS: u8 = 15;
/// Free question swaps granted per playthrough.
pub const INITIAL_SKIPS: u8 = 2;
/// Options drawn per question, all distinct.
pub const OPTION_COUNT: usize = 4;

/// Coarse phase derived from the engine's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// No question yet (pool still being ingested or first draw pending).
    Loading,
    /// A question is live and the countdown is running.
    Playing,
    /// A question swap or settle window is in flight; events are dropped.
    Transitioning,
    /// Terminal until an explicit restart.
    GameOver,
}

/// Why a question draw was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionRefusal {
    /// The pool cannot supply four distinct options. Recoverable: the
    /// engine is left untouched and the session keeps its current state.
    #[error("country pool holds {available} entries, at least 4 required")]
    PoolExhausted {
        /// Number of countries currently in the pool.
        available: usize,
    },
    /// The session already ended; no further questions are generated.
    #[error("session is over")]
    SessionOver,
}

/// Result of evaluating a player's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The event arrived outside the playing window and was dropped.
    Ignored,
    /// Right country; score incremented, next question follows after the
    /// settle delay.
    Correct,
    /// Wrong country; a life was lost, next question follows after the
    /// settle delay.
    Incorrect,
    /// Wrong country and it was the last life; the session is over.
    GameOver,
}

/// Result of a countdown expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// Stale or out-of-window timeout, dropped without effect.
    Ignored,
    /// A life was lost; next question follows after the settle delay.
    LifeLost,
    /// The last life was lost; the session is over.
    GameOver,
}

/// Result of a one-second countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown is running (swap in flight, terminal, or no question).
    Ignored,
    /// Countdown decremented; carries the seconds remaining.
    Counting(u8),
    /// Countdown just hit zero; the caller should apply [`QuizEngine::time_out`].
    Expired,
}

/// Result of a skip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// No skip budget left, or the event arrived outside the playing window.
    Ignored,
    /// One skip consumed; the next question should be drawn immediately.
    Skipped,
}

/// Immutable view of the engine handed to the DTO layer.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// Derived phase.
    pub phase: EnginePhase,
    /// Session bookkeeping.
    pub session: GameSession,
    /// Current question, if one is live.
    pub question: Option<Question>,
    /// Feedback for the last evaluated event, if any.
    pub feedback: Option<Feedback>,
}

fn fresh_session() -> GameSession {
    GameSession {
        score: 0,
        lives: INITIAL_LIVES,
        time_left_seconds: QUESTION_SECONDS,
        is_game_over: false,
        skips_remaining: INITIAL_SKIPS,
    }
}

/// State machine for one playthrough over a fixed country pool.
#[derive(Debug)]
pub struct QuizEngine {
    pool: Vec<Country>,
    session: GameSession,
    question: Option<Question>,
    feedback: Option<Feedback>,
    transitioning: bool,
    epoch: u64,
}

impl QuizEngine {
    /// Build an engine over the given pool. The pool is taken as-is; the
    /// ingestion boundary guarantees distinct ids, and a pool smaller than
    /// [`OPTION_COUNT`] simply refuses to draw questions.
    pub fn new(pool: Vec<Country>) -> Self {
        Self {
            pool,
            session: fresh_session(),
            question: None,
            feedback: None,
            transitioning: false,
            epoch: 0,
        }
    }

    /// Generation counter bumped on every restart. Async continuations
    /// capture it when spawned and drop themselves when it moved on.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Copy of the session bookkeeping.
    pub fn session(&self) -> GameSession {
        self.session
    }

    /// Phase derived from the terminal flag, the transition gate, and
    /// question presence.
    pub fn phase(&self) -> EnginePhase {
        if self.session.is_game_over {
            EnginePhase::GameOver
        } else if self.transitioning {
            EnginePhase::Transitioning
        } else if self.question.is_some() {
            EnginePhase::Playing
        } else {
            EnginePhase::Loading
        }
    }

    /// Snapshot the engine for read-only consumers.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase(),
            session: self.session,
            question: self.question.clone(),
            feedback: self.feedback.clone(),
        }
    }

    /// Open a question transition: raise the gate and reset the countdown.
    ///
    /// The countdown is reset *before* the draw commits so a snapshot taken
    /// during the swap window already shows the full time budget. Refused
    /// without any state change when the session is over or the pool cannot
    /// fill a question.
    pub fn begin_transition(&mut self) -> Result<(), QuestionRefusal> {
        if self.session.is_game_over {
            return Err(QuestionRefusal::SessionOver);
        }
        let available = self.pool.len();
        if available < OPTION_COUNT {
            return Err(QuestionRefusal::PoolExhausted { available });
        }

        self.transitioning = true;
        self.session.time_left_seconds = QUESTION_SECONDS;
        Ok(())
    }

    /// Draw and install the next question, closing the transition gate.
    ///
    /// Four distinct countries are sampled without replacement and the
    /// answer is picked uniformly among them. No-op unless a transition is
    /// open (so stale continuations cannot overwrite a live question).
    pub fn commit_question(&mut self, rng: &mut impl Rng) {
        if !self.transitioning || self.session.is_game_over {
            return;
        }
        if self.pool.len() < OPTION_COUNT {
            return;
        }

        let options: Vec<Country> = index::sample(rng, self.pool.len(), OPTION_COUNT)
            .iter()
            .map(|i| self.pool[i].clone())
            .collect();
        let answer = options[rng.random_range(0..OPTION_COUNT)].clone();

        self.question = Some(Question { options, answer });
        self.feedback = None;
        self.transitioning = false;
    }

    /// Evaluate the player's pick against the live question.
    ///
    /// The caller must cancel the countdown before invoking this, so a
    /// timeout firing in the same tick cannot double-charge the question.
    /// Out-of-window events (no question, swap in flight, terminal) are
    /// dropped.
    pub fn answer(&mut self, country_id: &str) -> AnswerOutcome {
        if self.transitioning || self.session.is_game_over {
            return AnswerOutcome::Ignored;
        }
        let Some(question) = self.question.as_ref() else {
            return AnswerOutcome::Ignored;
        };

        let correct = question.is_correct(country_id);
        let answer_name = question.answer.name.clone();

        if correct {
            self.session.score += 1;
            self.feedback = Some(Feedback::Correct);
            self.transitioning = true;
            AnswerOutcome::Correct
        } else {
            self.feedback = Some(Feedback::Wrong {
                correct: answer_name,
            });
            if self.lose_life() {
                AnswerOutcome::GameOver
            } else {
                self.transitioning = true;
                AnswerOutcome::Incorrect
            }
        }
    }

    /// Apply one second of countdown while a question is live.
    pub fn tick(&mut self) -> TickOutcome {
        if self.transitioning || self.session.is_game_over || self.question.is_none() {
            return TickOutcome::Ignored;
        }
        if self.session.time_left_seconds == 0 {
            return TickOutcome::Ignored;
        }

        self.session.time_left_seconds -= 1;
        if self.session.time_left_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Counting(self.session.time_left_seconds)
        }
    }

    /// Countdown expiry: the automatic wrong answer.
    ///
    /// Dropped when stale — an answer evaluated for the same question has
    /// already raised the transition gate (or ended the session), so the
    /// score and lives stay untouched.
    pub fn time_out(&mut self) -> TimeoutOutcome {
        if self.transitioning || self.session.is_game_over || self.question.is_none() {
            return TimeoutOutcome::Ignored;
        }

        self.feedback = Some(Feedback::TimedOut);
        if self.lose_life() {
            TimeoutOutcome::GameOver
        } else {
            self.transitioning = true;
            TimeoutOutcome::LifeLost
        }
    }

    /// Trade one skip for an immediate fresh question. No score or life
    /// effect; the budget never goes below zero.
    pub fn skip(&mut self) -> SkipOutcome {
        if self.transitioning || self.session.is_game_over || self.question.is_none() {
            return SkipOutcome::Ignored;
        }
        if self.session.skips_remaining == 0 {
            return SkipOutcome::Ignored;
        }

        self.session.skips_remaining -= 1;
        self.transitioning = true;
        SkipOutcome::Skipped
    }

    /// Reset to a fresh session on the same pool and invalidate every
    /// outstanding continuation by moving to a new epoch.
    pub fn restart(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.session = fresh_session();
        self.question = None;
        self.feedback = None;
        self.transitioning = false;
    }

    fn lose_life(&mut self) -> bool {
        self.session.lives = self.session.lives.saturating_sub(1);
        if self.session.lives == 0 {
            self.session.is_game_over = true;
            self.transitioning = false;
        }
        self.session.is_game_over
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn pool(n: usize) -> Vec<Country> {
        (0..n)
            .map(|i| Country {
                id: format!("C{i:02}"),
                name: format!("Country {i}"),
                flag_url: format!("https://flags.example/c{i}.png"),
            })
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn advance(engine: &mut QuizEngine, rng: &mut StdRng) {
        engine.begin_transition().unwrap();
        engine.commit_question(rng);
    }

    fn playing_engine() -> (QuizEngine, StdRng) {
        let mut engine = QuizEngine::new(pool(8));
        let mut rng = rng();
        advance(&mut engine, &mut rng);
        (engine, rng)
    }

    fn answer_id(engine: &QuizEngine) -> String {
        engine.question.as_ref().unwrap().answer.id.clone()
    }

    #[test]
    fn fresh_engine_starts_loading_with_initial_session() {
        let engine = QuizEngine::new(pool(8));
        assert_eq!(engine.phase(), EnginePhase::Loading);
        assert_eq!(
            engine.session(),
            GameSession {
                score: 0,
                lives: 3,
                time_left_seconds: 15,
                is_game_over: false,
                skips_remaining: 2,
            }
        );
    }

    #[test]
    fn question_has_four_distinct_options_and_answer_among_them() {
        for seed in 0..64 {
            let mut engine = QuizEngine::new(pool(12));
            let mut rng = StdRng::seed_from_u64(seed);
            advance(&mut engine, &mut rng);

            let question = engine.question.as_ref().unwrap();
            assert_eq!(question.options.len(), 4);

            let mut ids: Vec<&str> = question.options.iter().map(|c| c.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 4, "duplicate option ids with seed {seed}");

            assert!(
                question.options.iter().any(|c| c.id == question.answer.id),
                "answer not among options with seed {seed}"
            );
        }
    }

    #[test]
    fn exact_size_pool_is_drawn_whole() {
        let source = pool(4);
        let mut engine = QuizEngine::new(source.clone());
        let mut rng = rng();
        advance(&mut engine, &mut rng);

        let question = engine.question.as_ref().unwrap();
        let mut drawn: Vec<&str> = question.options.iter().map(|c| c.id.as_str()).collect();
        let mut expected: Vec<&str> = source.iter().map(|c| c.id.as_str()).collect();
        drawn.sort_unstable();
        expected.sort_unstable();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn undersized_pool_refuses_without_state_change() {
        let mut engine = QuizEngine::new(pool(3));
        let err = engine.begin_transition().unwrap_err();
        assert_eq!(err, QuestionRefusal::PoolExhausted { available: 3 });
        assert_eq!(engine.phase(), EnginePhase::Loading);
        assert!(engine.question.is_none());
    }

    #[test]
    fn begin_transition_resets_countdown_before_commit() {
        let (mut engine, _rng) = playing_engine();
        engine.tick();
        engine.tick();
        assert_eq!(engine.session().time_left_seconds, 13);

        engine.begin_transition().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Transitioning);
        assert_eq!(engine.session().time_left_seconds, QUESTION_SECONDS);
    }

    #[test]
    fn correct_answer_scores_and_raises_gate() {
        let (mut engine, _rng) = playing_engine();
        let id = answer_id(&engine);

        assert_eq!(engine.answer(&id), AnswerOutcome::Correct);
        assert_eq!(engine.session().score, 1);
        assert_eq!(engine.session().lives, 3);
        assert_eq!(engine.feedback, Some(Feedback::Correct));
        assert_eq!(engine.phase(), EnginePhase::Transitioning);
    }

    #[test]
    fn wrong_answer_costs_life_and_names_the_correct_country() {
        let (mut engine, _rng) = playing_engine();
        let correct_name = engine.question.as_ref().unwrap().answer.name.clone();

        assert_eq!(engine.answer("not-a-country"), AnswerOutcome::Incorrect);
        assert_eq!(engine.session().score, 0);
        assert_eq!(engine.session().lives, 2);
        assert_eq!(
            engine.feedback,
            Some(Feedback::Wrong {
                correct: correct_name
            })
        );
    }

    #[test]
    fn third_lost_life_is_terminal() {
        let (mut engine, mut rng) = playing_engine();

        assert_eq!(engine.answer("zz"), AnswerOutcome::Incorrect);
        advance(&mut engine, &mut rng);
        assert_eq!(engine.answer("zz"), AnswerOutcome::Incorrect);
        advance(&mut engine, &mut rng);
        assert_eq!(engine.answer("zz"), AnswerOutcome::GameOver);

        assert!(engine.session().is_game_over);
        assert_eq!(engine.session().lives, 0);
        assert_eq!(engine.phase(), EnginePhase::GameOver);
    }

    #[test]
    fn terminal_session_drops_every_event() {
        let (mut engine, mut rng) = playing_engine();
        for _ in 0..3 {
            engine.answer("zz");
            let _ = engine.begin_transition();
            engine.commit_question(&mut rng);
        }
        assert!(engine.session().is_game_over);
        let before = engine.session();
        let question_before = engine.question.clone().map(|q| q.answer.id);

        assert_eq!(
            engine.begin_transition().unwrap_err(),
            QuestionRefusal::SessionOver
        );
        engine.commit_question(&mut rng);
        assert_eq!(engine.answer("zz"), AnswerOutcome::Ignored);
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.time_out(), TimeoutOutcome::Ignored);
        assert_eq!(engine.skip(), SkipOutcome::Ignored);

        assert_eq!(engine.session(), before);
        assert_eq!(engine.question.map(|q| q.answer.id), question_before);
    }

    #[test]
    fn stale_timeout_after_answer_is_dropped() {
        let (mut engine, _rng) = playing_engine();
        let id = answer_id(&engine);
        assert_eq!(engine.answer(&id), AnswerOutcome::Correct);

        assert_eq!(engine.time_out(), TimeoutOutcome::Ignored);
        assert_eq!(engine.session().score, 1);
        assert_eq!(engine.session().lives, 3);
        assert_eq!(engine.feedback, Some(Feedback::Correct));
    }

    #[test]
    fn answer_during_swap_window_is_dropped() {
        let (mut engine, _rng) = playing_engine();
        engine.begin_transition().unwrap();

        assert_eq!(engine.answer("C00"), AnswerOutcome::Ignored);
        assert_eq!(engine.session().score, 0);
        assert_eq!(engine.session().lives, 3);
    }

    #[test]
    fn countdown_counts_down_and_expires() {
        let (mut engine, _rng) = playing_engine();

        for expected in (1..QUESTION_SECONDS).rev() {
            assert_eq!(engine.tick(), TickOutcome::Counting(expected));
        }
        assert_eq!(engine.tick(), TickOutcome::Expired);
        assert_eq!(engine.session().time_left_seconds, 0);

        assert_eq!(engine.time_out(), TimeoutOutcome::LifeLost);
        assert_eq!(engine.session().lives, 2);
        assert_eq!(engine.feedback, Some(Feedback::TimedOut));
        assert_eq!(engine.phase(), EnginePhase::Transitioning);
    }

    #[test]
    fn tick_is_ignored_while_transitioning() {
        let (mut engine, _rng) = playing_engine();
        engine.begin_transition().unwrap();
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.session().time_left_seconds, QUESTION_SECONDS);
    }

    #[test]
    fn timeout_on_last_life_is_terminal() {
        let (mut engine, mut rng) = playing_engine();
        engine.answer("zz");
        advance(&mut engine, &mut rng);
        engine.answer("zz");
        advance(&mut engine, &mut rng);

        assert_eq!(engine.time_out(), TimeoutOutcome::GameOver);
        assert!(engine.session().is_game_over);
    }

    #[test]
    fn skip_consumes_budget_and_floors_at_zero() {
        let (mut engine, mut rng) = playing_engine();

        assert_eq!(engine.skip(), SkipOutcome::Skipped);
        assert_eq!(engine.session().skips_remaining, 1);
        engine.commit_question(&mut rng);

        assert_eq!(engine.skip(), SkipOutcome::Skipped);
        assert_eq!(engine.session().skips_remaining, 0);
        engine.commit_question(&mut rng);

        assert_eq!(engine.skip(), SkipOutcome::Ignored);
        assert_eq!(engine.session().skips_remaining, 0);
        assert_eq!(engine.session().lives, 3);
        assert_eq!(engine.session().score, 0);
    }

    #[test]
    fn skip_leaves_score_and_lives_untouched() {
        let (mut engine, mut rng) = playing_engine();
        engine.skip();
        engine.commit_question(&mut rng);
        assert_eq!(engine.session().score, 0);
        assert_eq!(engine.session().lives, 3);
        assert_eq!(engine.phase(), EnginePhase::Playing);
    }

    #[test]
    fn restart_resets_session_and_moves_to_a_new_epoch() {
        let (mut engine, mut rng) = playing_engine();
        let id = answer_id(&engine);
        engine.answer(&id);
        advance(&mut engine, &mut rng);
        engine.answer("zz");
        let old_epoch = engine.epoch();

        engine.restart();

        assert_eq!(engine.epoch(), old_epoch + 1);
        assert_eq!(engine.phase(), EnginePhase::Loading);
        assert!(engine.question.is_none());
        assert!(engine.feedback.is_none());
        assert_eq!(
            engine.session(),
            GameSession {
                score: 0,
                lives: 3,
                time_left_seconds: 15,
                is_game_over: false,
                skips_remaining: 2,
            }
        );

        advance(&mut engine, &mut rng);
        assert_eq!(engine.phase(), EnginePhase::Playing);
    }

    #[test]
    fn restart_recovers_a_terminal_session() {
        let (mut engine, mut rng) = playing_engine();
        for _ in 0..3 {
            engine.answer("zz");
            let _ = engine.begin_transition();
            engine.commit_question(&mut rng);
        }
        assert!(engine.session().is_game_over);

        engine.restart();
        advance(&mut engine, &mut rng);
        assert_eq!(engine.phase(), EnginePhase::Playing);
        assert!(!engine.session().is_game_over);
    }
}
