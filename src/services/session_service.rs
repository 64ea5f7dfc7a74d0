//! Async driver for the quiz engine.
//!
//! The engine itself is synchronous; this module owns everything temporal:
//! the per-question countdown task, the settle delays between questions,
//! and the question-swap pause. All of it funnels through the per-session
//! mutex, and every spawned continuation captures the engine epoch so a
//! restart (or deletion) strands it harmlessly.

use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::sleep};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{models::ScoreEntity, score_store::ScoreStore},
    dto::session::{ActionResponse, AnswerRequest, CreateSessionRequest, SessionSnapshot},
    error::ServiceError,
    state::{
        SessionHandle, SessionRuntime, SharedState,
        engine::{
            AnswerOutcome, QuestionRefusal, QuizEngine, SkipOutcome, TickOutcome, TimeoutOutcome,
        },
    },
};

/// Granularity of the question countdown.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Open a new session over the ingested country pool and kick off the
/// first question draw.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSnapshot, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(format!("validation failed: {err}")))?;

    let pool = state
        .country_pool()
        .await
        .ok_or(ServiceError::PoolUnavailable)?;

    let player_name = request.player_name.map(|name| name.trim().to_owned());
    let engine = QuizEngine::new(pool.as_ref().clone());
    let id = Uuid::new_v4();
    let runtime: SessionHandle = Arc::new(Mutex::new(SessionRuntime::new(engine, player_name)));
    state.sessions().insert(id, runtime.clone());

    let rt = runtime.lock().await;
    schedule_advance(state, id, &runtime, rt.engine.epoch(), Duration::ZERO);
    info!(%id, "session created");

    Ok(snapshot_of(id, &rt))
}

/// Read-only snapshot of a session.
pub async fn get_session(state: &SharedState, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
    let runtime = lookup(state, id)?;
    let rt = runtime.lock().await;
    Ok(snapshot_of(id, &rt))
}

/// Evaluate an answer for the current question.
pub async fn answer_question(
    state: &SharedState,
    id: Uuid,
    request: AnswerRequest,
) -> Result<SessionSnapshot, ServiceError> {
    let runtime = lookup(state, id)?;
    let mut rt = runtime.lock().await;

    // The countdown is cancelled before evaluating, so a timeout can never
    // fire for a question that already has an answer recorded.
    rt.cancel_countdown();
    let epoch = rt.engine.epoch();

    match rt.engine.answer(&request.country_id) {
        AnswerOutcome::Correct => {
            schedule_advance(state, id, &runtime, epoch, state.config().answer_settle());
        }
        AnswerOutcome::Incorrect => {
            schedule_advance(state, id, &runtime, epoch, state.config().life_lost_settle());
        }
        AnswerOutcome::GameOver => finish_session(state, id, &mut rt),
        AnswerOutcome::Ignored => {}
    }

    Ok(snapshot_of(id, &rt))
}

/// Trade one skip for an immediate fresh question.
pub async fn skip_question(state: &SharedState, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
    let runtime = lookup(state, id)?;
    let mut rt = runtime.lock().await;
    let epoch = rt.engine.epoch();

    if let SkipOutcome::Skipped = rt.engine.skip() {
        rt.cancel_countdown();
        schedule_advance(state, id, &runtime, epoch, Duration::ZERO);
    }

    Ok(snapshot_of(id, &rt))
}

/// Reset a session to its initial bookkeeping and draw a fresh question.
pub async fn restart_session(
    state: &SharedState,
    id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    let runtime = lookup(state, id)?;
    let mut rt = runtime.lock().await;

    rt.cancel_countdown();
    rt.engine.restart();
    rt.score_submitted = false;
    schedule_advance(state, id, &runtime, rt.engine.epoch(), Duration::ZERO);
    info!(%id, "session restarted");

    Ok(snapshot_of(id, &rt))
}

/// Drop a session and cancel its timer resources.
pub async fn delete_session(state: &SharedState, id: Uuid) -> Result<ActionResponse, ServiceError> {
    let Some((_, runtime)) = state.sessions().remove(&id) else {
        return Err(ServiceError::NotFound(format!("session `{id}` not found")));
    };

    let mut rt = runtime.lock().await;
    rt.cancel_countdown();
    // Moving to a new epoch strands any settle continuation still in flight.
    rt.engine.restart();
    info!(%id, "session deleted");

    Ok(ActionResponse::acknowledged())
}

fn lookup(state: &SharedState, id: Uuid) -> Result<SessionHandle, ServiceError> {
    state
        .sessions()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))
}

fn snapshot_of(id: Uuid, rt: &SessionRuntime) -> SessionSnapshot {
    (id, rt.engine.snapshot()).into()
}

/// Spawn the settle → swap → commit continuation for the next question.
fn schedule_advance(
    state: &SharedState,
    id: Uuid,
    runtime: &SessionHandle,
    epoch: u64,
    settle: Duration,
) {
    let state = state.clone();
    let runtime = runtime.clone();
    tokio::spawn(run_advance(state, id, runtime, epoch, settle));
}

/// Wait out the settle delay, open the question transition, wait out the
/// swap window, then commit the draw and arm a fresh countdown. Every step
/// re-checks the epoch under the lock and drops itself when stale.
async fn run_advance(
    state: SharedState,
    id: Uuid,
    runtime: SessionHandle,
    epoch: u64,
    settle: Duration,
) {
    if !settle.is_zero() {
        sleep(settle).await;
    }

    {
        let mut rt = runtime.lock().await;
        if rt.engine.epoch() != epoch {
            return;
        }
        match rt.engine.begin_transition() {
            Ok(()) => {}
            Err(QuestionRefusal::SessionOver) => return,
            Err(refusal @ QuestionRefusal::PoolExhausted { .. }) => {
                warn!(%id, error = %refusal, "cannot draw the next question");
                return;
            }
        }
    }

    sleep(state.config().question_swap()).await;

    let mut rt = runtime.lock().await;
    if rt.engine.epoch() != epoch {
        return;
    }
    rt.engine.commit_question(&mut rand::rng());
    arm_countdown(&state, id, &runtime, &mut rt, epoch);
}

/// Cancel-then-arm: replace whatever countdown was running with a fresh
/// one-second ticker for the question just committed.
fn arm_countdown(
    state: &SharedState,
    id: Uuid,
    runtime: &SessionHandle,
    rt: &mut SessionRuntime,
    epoch: u64,
) {
    rt.cancel_countdown();

    let state = state.clone();
    let runtime = runtime.clone();
    rt.countdown = Some(tokio::spawn(async move {
        loop {
            sleep(TICK_INTERVAL).await;
            let mut rt = runtime.lock().await;
            if rt.engine.epoch() != epoch {
                return;
            }
            match rt.engine.tick() {
                TickOutcome::Counting(_) => {}
                TickOutcome::Ignored => return,
                TickOutcome::Expired => {
                    match rt.engine.time_out() {
                        TimeoutOutcome::LifeLost => {
                            let settle = state.config().life_lost_settle();
                            schedule_advance(&state, id, &runtime, epoch, settle);
                        }
                        TimeoutOutcome::GameOver => finish_session(&state, id, &mut rt),
                        TimeoutOutcome::Ignored => {}
                    }
                    return;
                }
            }
        }
    }));
}

/// Terminal handling: stop the timer and submit the final score once.
///
/// Submission is fire-and-forget; a storage failure is logged and never
/// surfaces to the player.
fn finish_session(state: &SharedState, id: Uuid, rt: &mut SessionRuntime) {
    rt.cancel_countdown();
    let score = rt.engine.session().score;
    info!(%id, score, "session over");

    if rt.score_submitted {
        return;
    }
    let Some(name) = rt.player_name.clone() else {
        return;
    };
    rt.score_submitted = true;

    let state = state.clone();
    tokio::spawn(async move {
        match state.score_store().await {
            Some(store) => {
                let entry = ScoreEntity {
                    name: name.clone(),
                    score,
                };
                if let Err(err) = store.submit_if_higher(entry).await {
                    warn!(%id, player = %name, error = %err, "failed to submit final score");
                }
            }
            None => {
                warn!(%id, player = %name, "storage unavailable; final score not submitted");
            }
        }
    });
}
