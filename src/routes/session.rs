use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::session::{ActionResponse, AnswerRequest, CreateSessionRequest, SessionSnapshot},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Quiz session endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/session", post(create_session))
        .route(
            "/api/session/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/session/{id}/answer", post(answer_question))
        .route("/api/session/{id}/skip", post(skip_question))
        .route("/api/session/{id}/restart", post(restart_session))
}

#[utoipa::path(
    post,
    path = "/api/session",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created; first question loading", body = SessionSnapshot),
        (status = 503, description = "Country pool not ingested yet")
    )
)]
/// Open a new session and start drawing the first question.
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::create_session(&state, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/session/{id}",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Current session snapshot", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
/// Return the current snapshot of a session.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/session/{id}/answer",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Snapshot after evaluation; late answers are dropped, not errors", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
/// Answer the current question.
pub async fn answer_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::answer_question(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/session/{id}/skip",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Snapshot after the skip; out-of-budget skips are dropped", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
/// Trade one skip for a fresh question.
pub async fn skip_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::skip_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/session/{id}/restart",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Snapshot of the reset session", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
/// Reset a session to its initial state and draw a fresh question.
pub async fn restart_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::restart_session(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/session/{id}",
    tag = "session",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session removed and its timers cancelled", body = ActionResponse),
        (status = 404, description = "Unknown session")
    )
)]
/// Drop a session.
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(session_service::delete_session(&state, id).await?))
}
