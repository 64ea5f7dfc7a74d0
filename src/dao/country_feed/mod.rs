//! Country pool ingestion from the public countries feed.

mod restcountries;

use thiserror::Error;

pub use restcountries::fetch_countries;

/// Failures while ingesting the country pool.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure, including the bounded request timeout.
    #[error("country feed request failed")]
    Request {
        /// Underlying HTTP client error.
        #[from]
        source: reqwest::Error,
    },
    /// The feed answered, but too few records survived narrowing to build
    /// even one question.
    #[error("country feed yielded {available} usable countries, at least 4 required")]
    NotEnoughCountries {
        /// Number of records that survived narrowing.
        available: usize,
    },
}
