//! Service layer: business logic between the routes and the state/dao.

/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Background ingestion of the country pool.
pub mod pool_supervisor;
/// Leaderboard submission and ranking operations.
pub mod score_service;
/// Quiz session lifecycle: timers, settle delays, and event application.
pub mod session_service;
/// Storage connection supervisor with degraded-mode handling.
pub mod storage_supervisor;
