//! REST Countries client and the narrowing of its duck-typed records.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::FeedError;
use crate::state::{engine::OPTION_COUNT, game::Country};

/// Raw feed record. Every field is optional; narrowing decides what is
/// usable so nothing downstream ever sees a partial country.
#[derive(Debug, Default, Deserialize)]
struct RawCountry {
    #[serde(default)]
    name: RawName,
    #[serde(default)]
    flags: RawFlags,
    #[serde(default)]
    cca3: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawName {
    #[serde(default)]
    common: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFlags {
    #[serde(default)]
    png: Option<String>,
}

/// Fetch the country feed with a bounded timeout and narrow it into the
/// strict pool shape: unique id, display name, and flag image for every
/// entry.
pub async fn fetch_countries(url: &str, timeout: Duration) -> Result<Vec<Country>, FeedError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let raw: Vec<RawCountry> = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let countries = narrow(raw);
    if countries.len() < OPTION_COUNT {
        return Err(FeedError::NotEnoughCountries {
            available: countries.len(),
        });
    }

    Ok(countries)
}

/// Keep only records carrying all three required fields, dropping
/// duplicated ids so the pool invariant (distinct countries) holds by
/// construction.
fn narrow(raw: Vec<RawCountry>) -> Vec<Country> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|record| {
            let id = record.cca3.filter(|id| !id.trim().is_empty())?;
            let name = record.name.common.filter(|name| !name.trim().is_empty())?;
            let flag_url = record.flags.png.filter(|url| !url.trim().is_empty())?;

            seen.insert(id.clone()).then_some(Country { id, name, flag_url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<RawCountry> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn complete_records_are_narrowed() {
        let raw = parse(
            r#"[{
                "name": { "common": "Brazil", "official": "Federative Republic of Brazil" },
                "flags": { "png": "https://flagcdn.com/w320/br.png", "svg": "https://flagcdn.com/br.svg" },
                "cca3": "BRA",
                "region": "Americas"
            }]"#,
        );

        let countries = narrow(raw);
        assert_eq!(
            countries,
            vec![Country {
                id: "BRA".into(),
                name: "Brazil".into(),
                flag_url: "https://flagcdn.com/w320/br.png".into(),
            }]
        );
    }

    #[test]
    fn partial_records_are_dropped() {
        let raw = parse(
            r#"[
                { "name": { "common": "No Flag" }, "cca3": "NOF" },
                { "flags": { "png": "https://flagcdn.com/w320/xx.png" }, "cca3": "NON" },
                { "name": { "common": "No Code" }, "flags": { "png": "https://flagcdn.com/w320/yy.png" } },
                { "name": { "common": "" }, "flags": { "png": "https://flagcdn.com/w320/zz.png" }, "cca3": "EMP" }
            ]"#,
        );

        assert!(narrow(raw).is_empty());
    }

    #[test]
    fn duplicate_ids_keep_the_first_record() {
        let raw = parse(
            r#"[
                { "name": { "common": "First" }, "flags": { "png": "https://flagcdn.com/w320/a.png" }, "cca3": "DUP" },
                { "name": { "common": "Second" }, "flags": { "png": "https://flagcdn.com/w320/b.png" }, "cca3": "DUP" }
            ]"#,
        );

        let countries = narrow(raw);
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].name, "First");
    }
}
