use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the flag quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::scores::submit_score,
        crate::routes::scores::get_top_scores,
        crate::routes::session::create_session,
        crate::routes::session::get_session,
        crate::routes::session::answer_question,
        crate::routes::session::skip_question,
        crate::routes::session::restart_session,
        crate::routes::session::delete_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scores::SubmitScoreRequest,
            crate::dto::scores::SubmitScoreResponse,
            crate::dto::scores::ScoreRecord,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::AnswerRequest,
            crate::dto::session::ActionResponse,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::QuestionView,
            crate::dto::session::CountryOption,
            crate::dto::phase::VisibleSessionPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scores", description = "Leaderboard submission and ranking"),
        (name = "session", description = "Quiz session lifecycle and gameplay"),
    )
)]
pub struct ApiDoc;
