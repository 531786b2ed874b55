use std::sync::Arc;

use study_core::model::{AppSettings, AppSettingsDraft};
use storage::repository::AppSettingsRepository;

use crate::error::AppSettingsServiceError;

#[derive(Clone)]
pub struct AppSettingsService {
    repo: Arc<dyn AppSettingsRepository>,
}

impl AppSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: AppSettingsDraft,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn defaults_until_saved() {
        let service = AppSettingsService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.load().await.unwrap(), AppSettings::default());

        let saved = service
            .save(AppSettingsDraft {
                api_model: Some(" gpt-4o ".into()),
                ..AppSettingsDraft::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.api_model(), Some("gpt-4o"));
        assert_eq!(service.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn invalid_base_url_is_rejected() {
        let service = AppSettingsService::new(Arc::new(InMemoryRepository::new()));
        let err = service
            .save(AppSettingsDraft {
                api_base_url: Some("ftp://example.com".into()),
                ..AppSettingsDraft::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppSettingsServiceError::Validation(_)));
    }
}
