use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr};

use chrono::Duration;
use labeling_block::assignment::{DEFAULT_ABANDON_WINDOW_SECS, MAX_ABANDON_WINDOW_SECS};
use labeling_block::export::ExportUrls;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub abandon_window_secs: u32,
    pub storage_url_prefix: String,
    pub snapshot_base_url: String,
    pub cors_origin: String,
    pub sweep_limit: usize,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            table_name: try_load(&lookup, "TABLE_NAME", "food-truck-spy".to_string()),
            abandon_window_secs: try_load_in_range(
                &lookup,
                "ABANDON_WINDOW_SECS",
                DEFAULT_ABANDON_WINDOW_SECS,
                1..=MAX_ABANDON_WINDOW_SECS,
            ),
            storage_url_prefix: try_load(&lookup, "STORAGE_URL_PREFIX", "gs://".to_string()),
            snapshot_base_url: try_load(
                &lookup,
                "SNAPSHOT_BASE_URL",
                "https://food-truck-spy.appspot.com".to_string(),
            ),
            cors_origin: try_load(&lookup, "CORS_ORIGIN", "*".to_string()),
            sweep_limit: try_load(&lookup, "SWEEP_LIMIT", 1),
        }
    }

    pub fn abandon_window(&self) -> Duration {
        Duration::try_seconds(i64::from(self.abandon_window_secs))
            .unwrap_or_else(|| Duration::seconds(i64::from(DEFAULT_ABANDON_WINDOW_SECS)))
    }

    pub fn export_urls(&self) -> ExportUrls {
        ExportUrls {
            storage_prefix: self.storage_url_prefix.clone(),
            snapshot_base: self.snapshot_base_url.clone(),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

fn try_load_in_range<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    range: RangeInclusive<T>,
) -> T
where
    T: FromStr + Display + PartialOrd + Copy,
    T::Err: Display,
{
    let value = try_load(lookup, key, default);
    if range.contains(&value) {
        return value;
    }

    warn!(
        "Invalid {key} value {value}: outside {}..={}, using default: {default}",
        range.start(),
        range.end()
    );
    default
}
