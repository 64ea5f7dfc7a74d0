use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::scores::{ScoreRecord, SubmitScoreRequest, SubmitScoreResponse},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Leaderboard endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/scores", get(get_top_scores).post(submit_score))
}

#[utoipa::path(
    post,
    path = "/api/scores",
    tag = "scores",
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score recorded (or discarded as lower than the stored best)", body = SubmitScoreResponse),
        (status = 400, description = "Missing name or non-numeric score"),
        (status = 500, description = "Store unavailable")
    )
)]
/// Submit a score; the stored value per player only ever grows.
pub async fn submit_score(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<Json<SubmitScoreResponse>, AppError> {
    Ok(Json(score_service::submit_score(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/scores",
    tag = "scores",
    responses(
        (status = 200, description = "Ranking, at most ten records, score descending", body = [ScoreRecord]),
        (status = 500, description = "Store unavailable")
    )
)]
/// Return the current ranking.
pub async fn get_top_scores(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ScoreRecord>>, AppError> {
    Ok(Json(score_service::top_scores(&state).await?))
}
