use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::work_settings::WorkSettings;

const SETTINGS_KEY: u64 = 1;

static SETTINGS_CACHE: Lazy<Cache<u64, WorkSettings>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(60))
        .build()
});

/// Resolve the work settings singleton, serving from cache when warm.
/// A missing row or a failed read resolves to the in-code defaults so
/// approval never blocks on configuration.
pub async fn resolve(pool: &MySqlPool) -> WorkSettings {
    if let Some(settings) = SETTINGS_CACHE.get(&SETTINGS_KEY).await {
        return settings;
    }

    let settings = fetch(pool).await;
    SETTINGS_CACHE.insert(SETTINGS_KEY, settings.clone()).await;
    settings
}

async fn fetch(pool: &MySqlPool) -> WorkSettings {
    let result = sqlx::query_as::<_, WorkSettings>(
        r#"
        SELECT id, shift_start, grace_minutes, weekly_off_days, updated_at
        FROM work_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(settings)) => settings,
        Ok(None) => WorkSettings::fallback(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load work settings, using defaults");
            WorkSettings::fallback()
        }
    }
}

/// Called after the settings row is written.
pub async fn invalidate() {
    SETTINGS_CACHE.invalidate(&SETTINGS_KEY).await;
}
