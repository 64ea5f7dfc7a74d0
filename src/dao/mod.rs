//! Data access: leaderboard persistence backends and the country feed.

/// Outbound integration with the country feed.
pub mod country_feed;
/// Persistence model definitions.
pub mod models;
/// Leaderboard storage backends and the trait they implement.
pub mod score_store;
/// Storage abstraction layer shared by every backend.
pub mod storage;
