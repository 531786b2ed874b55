use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::app_settings_service::AppSettingsService;
use crate::error::AppServicesError;
use crate::generator::{
    ContentGenerator, FallbackGenerator, GeneratorConfig, HttpGenerator, LocalGenerator,
};
use crate::library_service::LibraryService;
use crate::progress_service::ProgressService;
use crate::sessions::StudyService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    study: Arc<StudyService>,
    library: Arc<LibraryService>,
    progress: Arc<ProgressService>,
    app_settings: Arc<AppSettingsService>,
    online: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or settings loading fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock, GeneratorConfig::from_env()).await
    }

    /// Build services over in-memory storage with the offline generator only.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if settings loading fails.
    pub async fn new_in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock, None).await
    }

    /// Build services over existing storage. Persisted settings are layered over
    /// `env_config` to configure the online generator.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if settings loading fails.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        env_config: Option<GeneratorConfig>,
    ) -> Result<Self, AppServicesError> {
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.app_settings)));
        let settings = app_settings.load().await?;
        let config = GeneratorConfig::resolve(env_config, &settings);
        let online = config.is_some();
        match config.as_ref() {
            Some(cfg) => info!(model = %cfg.model, base_url = %cfg.base_url, "online generator enabled"),
            None => info!("no API key configured, using the offline generator"),
        }

        let generator: Arc<dyn ContentGenerator> = Arc::new(FallbackGenerator::new(
            Arc::new(HttpGenerator::new(config)),
            Arc::new(LocalGenerator::new()),
        ));
        Ok(Self::with_generator(storage, clock, generator, app_settings, online))
    }

    fn with_generator(
        storage: Storage,
        clock: Clock,
        generator: Arc<dyn ContentGenerator>,
        app_settings: Arc<AppSettingsService>,
        online: bool,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(Arc::clone(&storage.stats)));
        let library = Arc::new(LibraryService::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&progress),
        ));
        let study = Arc::new(StudyService::new(clock, generator, Arc::clone(&progress)));

        Self {
            study,
            library,
            progress,
            app_settings,
            online,
        }
    }

    /// Build services with a caller-supplied generator.
    #[must_use]
    pub fn with_custom_generator(
        storage: Storage,
        clock: Clock,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.app_settings)));
        Self::with_generator(storage, clock, generator, app_settings, false)
    }

    /// Whether an online generator is configured.
    #[must_use]
    pub fn online(&self) -> bool {
        self.online
    }

    #[must_use]
    pub fn study(&self) -> Arc<StudyService> {
        Arc::clone(&self.study)
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn app_settings(&self) -> Arc<AppSettingsService> {
        Arc::clone(&self.app_settings)
    }
}
