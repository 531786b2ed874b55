use thiserror::Error;
use url::Url;

/// Persisted configuration for the content generator.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AppSettings {
    api_key: Option<String>,
    api_model: Option<String>,
    api_base_url: Option<String>,
    tutor_instructions: Option<String>,
    offline_only: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub api_key: Option<String>,
    pub api_model: Option<String>,
    pub api_base_url: Option<String>,
    pub tutor_instructions: Option<String>,
    pub offline_only: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AppSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into persisted settings.
    ///
    /// Blank strings become `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the base URL is present but is not an http(s) URL.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let api_base_url = normalize_optional(self.api_base_url);

        if let Some(raw) = api_base_url.as_ref() {
            let parsed = Url::parse(raw).map_err(|_| AppSettingsError::InvalidBaseUrl(raw.clone()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppSettingsError::InvalidBaseUrl(raw.clone()));
            }
        }

        Ok(AppSettings {
            api_key: normalize_optional(self.api_key),
            api_model: normalize_optional(self.api_model),
            api_base_url,
            tutor_instructions: normalize_optional(self.tutor_instructions),
            offline_only: self.offline_only,
        })
    }
}

impl AppSettings {
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the stored base URL no longer validates.
    pub fn from_persisted(draft: AppSettingsDraft) -> Result<Self, AppSettingsError> {
        draft.validate()
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn api_model(&self) -> Option<&str> {
        self.api_model.as_deref()
    }

    #[must_use]
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }

    #[must_use]
    pub fn tutor_instructions(&self) -> Option<&str> {
        self.tutor_instructions.as_deref()
    }

    /// When set, the local heuristic generator is used even if an API key is configured.
    #[must_use]
    pub fn offline_only(&self) -> bool {
        self.offline_only
    }

    #[must_use]
    pub fn to_draft(&self) -> AppSettingsDraft {
        AppSettingsDraft {
            api_key: self.api_key.clone(),
            api_model: self.api_model.clone(),
            api_base_url: self.api_base_url.clone(),
            tutor_instructions: self.tutor_instructions.clone(),
            offline_only: self.offline_only,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_normalize_to_none() {
        let settings = AppSettingsDraft {
            api_key: Some("  ".into()),
            api_model: Some(" gpt-4o-mini ".into()),
            ..AppSettingsDraft::new()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.api_key(), None);
        assert_eq!(settings.api_model(), Some("gpt-4o-mini"));
        assert!(!settings.offline_only());
    }

    #[test]
    fn rejects_non_http_base_url() {
        for raw in ["not a url", "ftp://example.com"] {
            let err = AppSettingsDraft {
                api_base_url: Some(raw.into()),
                ..AppSettingsDraft::new()
            }
            .validate()
            .unwrap_err();
            assert_eq!(err, AppSettingsError::InvalidBaseUrl(raw.into()));
        }
    }

    #[test]
    fn draft_round_trip() {
        let settings = AppSettingsDraft {
            api_base_url: Some("https://api.example.com/v1".into()),
            offline_only: true,
            ..AppSettingsDraft::new()
        }
        .validate()
        .unwrap();
        let again = AppSettings::from_persisted(settings.to_draft()).unwrap();
        assert_eq!(settings, again);
    }
}
