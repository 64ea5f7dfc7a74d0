use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{dao::country_feed, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Fetch the country pool until it succeeds, then install it and exit.
///
/// The pool is immutable for the process lifetime, so unlike the storage
/// supervisor this task is one-shot: once the feed yields a usable pool
/// there is nothing left to watch. Sessions created before installation
/// are refused with a 503.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        let config = state.config();
        match country_feed::fetch_countries(config.countries_url(), config.feed_timeout()).await {
            Ok(countries) => {
                info!(count = countries.len(), "country pool ingested");
                state.install_pool(Arc::new(countries)).await;
                return;
            }
            Err(err) => {
                warn!(error = %err, "country feed fetch failed; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}
