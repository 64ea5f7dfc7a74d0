use serde_json::Value;

use crate::{
    dao::{models::ScoreEntity, score_store::ScoreStore},
    dto::{
        scores::{ScoreRecord, SubmitScoreRequest, SubmitScoreResponse},
        validation::validate_player_name,
    },
    error::ServiceError,
    state::SharedState,
};

const SCORE_MESSAGE: &str = "score must be a non-negative integer";

/// Record a submitted score.
///
/// The stored score for a name is the maximum ever submitted: a lower or
/// equal submission is acknowledged but leaves the record untouched (that
/// is the expected steady state, not an error). Validation failures leave
/// the store unmutated.
pub async fn submit_score(
    state: &SharedState,
    request: SubmitScoreRequest,
) -> Result<SubmitScoreResponse, ServiceError> {
    let name = request
        .name
        .as_deref()
        .ok_or_else(|| ServiceError::InvalidInput("name is required".into()))?;
    validate_player_name(name)
        .map_err(|_| ServiceError::InvalidInput("name must not be empty".into()))?;

    let score = parse_score(request.score)?;
    let store = state.require_score_store().await?;
    store
        .submit_if_higher(ScoreEntity {
            name: name.trim().to_owned(),
            score,
        })
        .await?;

    Ok(SubmitScoreResponse::acknowledged())
}

/// Return the ranking, at most the configured number of records, ordered by
/// score descending with ties ranked first-submitted-first.
pub async fn top_scores(state: &SharedState) -> Result<Vec<ScoreRecord>, ServiceError> {
    let store = state.require_score_store().await?;
    let rows = store.top_scores(state.config().leaderboard_limit()).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Narrow the lenient JSON `score` field into a `u32`.
///
/// Accepts plain integers and integral floats (`9` and `9.0`); rejects
/// everything else a client could send instead of a number.
fn parse_score(value: Option<Value>) -> Result<u32, ServiceError> {
    let Some(Value::Number(number)) = value else {
        return Err(ServiceError::InvalidInput(SCORE_MESSAGE.into()));
    };

    let unsigned = if let Some(unsigned) = number.as_u64() {
        unsigned
    } else if let Some(float) = number.as_f64() {
        if !float.is_finite() || float < 0.0 || float.fract() != 0.0 {
            return Err(ServiceError::InvalidInput(SCORE_MESSAGE.into()));
        }
        float as u64
    } else {
        return Err(ServiceError::InvalidInput(SCORE_MESSAGE.into()));
    };

    u32::try_from(unsigned).map_err(|_| ServiceError::InvalidInput("score is out of range".into()))
}

#[cfg(all(test, feature = "mem-store"))]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::score_store::memory::MemoryScoreStore,
        state::{AppState, SharedState},
    };

    async fn state_with_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        state
    }

    fn request(name: Option<&str>, score: Value) -> SubmitScoreRequest {
        SubmitScoreRequest {
            name: name.map(str::to_owned),
            score: Some(score),
        }
    }

    fn record(name: &str, score: u32) -> ScoreRecord {
        ScoreRecord {
            name: name.to_owned(),
            score,
        }
    }

    #[tokio::test]
    async fn ranking_is_descending_and_capped() {
        let state = state_with_store().await;
        for (name, score) in [("A", 5), ("B", 9), ("C", 7)] {
            submit_score(&state, request(Some(name), json!(score)))
                .await
                .unwrap();
        }

        let rows = top_scores(&state).await.unwrap();
        assert_eq!(rows, vec![record("B", 9), record("C", 7), record("A", 5)]);
    }

    #[tokio::test]
    async fn stored_score_is_the_maximum_submitted() {
        let state = state_with_store().await;
        for score in [3, 9, 4] {
            submit_score(&state, request(Some("Ana"), json!(score)))
                .await
                .unwrap();
        }

        assert_eq!(top_scores(&state).await.unwrap(), vec![record("Ana", 9)]);
    }

    #[tokio::test]
    async fn name_is_trimmed_before_storage() {
        let state = state_with_store().await;
        submit_score(&state, request(Some("  Ana  "), json!(4)))
            .await
            .unwrap();

        assert_eq!(top_scores(&state).await.unwrap(), vec![record("Ana", 4)]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_mutation() {
        let state = state_with_store().await;
        for name in [None, Some(""), Some("   ")] {
            let err = submit_score(&state, request(name, json!(10)))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        assert!(top_scores(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_score_is_rejected_without_mutation() {
        let state = state_with_store().await;
        for score in [json!("9"), json!(null), json!(-1), json!(3.5), json!([9])] {
            let err = submit_score(&state, request(Some("Ana"), score))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }
        let err = submit_score(
            &state,
            SubmitScoreRequest {
                name: Some("Ana".into()),
                score: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        assert!(top_scores(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn integral_float_is_accepted() {
        let state = state_with_store().await;
        submit_score(&state, request(Some("Ana"), json!(9.0)))
            .await
            .unwrap();

        assert_eq!(top_scores(&state).await.unwrap(), vec![record("Ana", 9)]);
    }

    #[tokio::test]
    async fn missing_store_reports_degraded() {
        let state = AppState::new(AppConfig::default());

        let err = submit_score(&state, request(Some("Ana"), json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));

        let err = top_scores(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
