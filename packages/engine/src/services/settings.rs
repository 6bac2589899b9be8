use spelling_algo::sanitize::require_text;
use spelling_algo::{PointSettings, ValidationError};

use crate::db::RecordStore;
use crate::error::EngineResult;

/// Point values for the user; defaults when nothing has been saved yet.
pub async fn get_settings(store: &dyn RecordStore, user_id: &str) -> EngineResult<PointSettings> {
    let user_id = require_text("user id", user_id)?;
    Ok(store.get_settings(user_id).await?.unwrap_or_default())
}

/// Like [`get_settings`] but never fails: store errors fall back to defaults.
pub(crate) async fn settings_or_default(store: &dyn RecordStore, user_id: &str) -> PointSettings {
    match store.get_settings(user_id).await {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(user_id = %user_id, error = %err, "point settings unavailable, using defaults");
            PointSettings::default()
        }
    }
}

fn validate_settings(settings: &PointSettings) -> Result<(), ValidationError> {
    let fields = [
        ("correct word points", settings.correct_word_points),
        ("perfect list points", settings.perfect_list_points),
        ("streak points", settings.streak_points),
    ];
    for (field, value) in fields {
        if value == 0 {
            return Err(ValidationError::NotPositive(field));
        }
    }
    Ok(())
}

pub async fn update_settings(
    store: &dyn RecordStore,
    user_id: &str,
    settings: PointSettings,
) -> EngineResult<PointSettings> {
    let user_id = require_text("user id", user_id)?;
    validate_settings(&settings)?;
    store.upsert_settings(user_id, &settings).await?;
    tracing::info!(user_id = %user_id, ?settings, "point settings updated");
    Ok(settings)
}

/// Sum of the user's point ledger.
pub async fn total_points(store: &dyn RecordStore, user_id: &str) -> EngineResult<u64> {
    let user_id = require_text("user id", user_id)?;
    let entries = store.list_point_entries(user_id).await?;
    Ok(entries.iter().map(|entry| u64::from(entry.amount)).sum())
}
