//! Store settings commands.

use vanity_core::settings::KNOWN_KEYS;
use vanity_db::Database;

use super::{table, Output};
use crate::cli::SettingsAction;
use crate::error::{ApiError, ApiResult, ErrorCode};

pub async fn run(db: &Database, action: SettingsAction) -> ApiResult<Output> {
    let repo = db.settings();
    match action {
        SettingsAction::List => {
            let settings = repo.all().await?;
            let rows = settings
                .iter()
                .map(|s| vec![s.key.clone(), s.value.clone()])
                .collect::<Vec<_>>();
            Output::new(table(&["key", "value"], &rows), &settings)
        }
        SettingsAction::Get { key } => {
            let value = repo.get(key.trim()).await?.ok_or_else(|| {
                ApiError::new(
                    ErrorCode::NotFound,
                    format!("Unknown setting '{}'; known keys: {}", key.trim(), KNOWN_KEYS.join(", ")),
                )
            })?;
            Output::new(value.clone(), &serde_json::json!({ "key": key.trim(), "value": value }))
        }
        SettingsAction::Set { key, value } => {
            repo.set(key.trim(), &value).await?;
            let stored = repo.get(key.trim()).await?.unwrap_or_default();
            Output::new(
                format!("{} = {}", key.trim(), stored),
                &serde_json::json!({ "key": key.trim(), "value": stored }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::harness;

    #[tokio::test]
    async fn test_list_get_set() {
        let h = harness().await;

        let out = run(&h.db, SettingsAction::List).await.unwrap();
        assert_eq!(out.data.as_array().unwrap().len(), 7);
        assert!(out.text.contains("invoice_prefix"));

        let out = run(&h.db, SettingsAction::Get { key: "invoice_counter".into() })
            .await
            .unwrap();
        assert_eq!(out.text, "1000");

        let out = run(
            &h.db,
            SettingsAction::Set {
                key: "store_name".into(),
                value: "  Glow Studio ".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out.data["value"], "Glow Studio");
        assert_eq!(h.db.settings().load().await.unwrap().store_name, "Glow Studio");
    }

    #[tokio::test]
    async fn test_invalid_settings() {
        let h = harness().await;

        let err = run(&h.db, SettingsAction::Get { key: "colour".into() }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = run(
            &h.db,
            SettingsAction::Set {
                key: "default_tax_rate".into(),
                value: "150".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = run(
            &h.db,
            SettingsAction::Set {
                key: "colour".into(),
                value: "pink".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
