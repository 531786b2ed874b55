#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_settings_service;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod library_service;
pub mod progress_service;
pub mod sessions;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use app_settings_service::AppSettingsService;
pub use error::{
    AppServicesError, AppSettingsServiceError, GeneratorError, IngestError, LibraryServiceError,
    ProgressServiceError, StudyError,
};
pub use generator::{
    ContentGenerator, FallbackGenerator, GeneratedContent, GenerationRequest, GeneratorConfig,
    HttpGenerator, LocalGenerator,
};
pub use library_service::LibraryService;
pub use progress_service::ProgressService;
pub use sessions::{ExamCountdown, ExamOutcome, Explanation, StudyService};
