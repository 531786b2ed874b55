use std::sync::Arc;

use async_trait::async_trait;
use study_core::model::SourceDocument;
use tracing::warn;

use super::{ContentGenerator, GeneratedContent, GenerationRequest};
use crate::error::GeneratorError;

/// Uses `primary` and falls back to `secondary` when it fails for any reason.
#[derive(Clone)]
pub struct FallbackGenerator {
    primary: Arc<dyn ContentGenerator>,
    secondary: Arc<dyn ContentGenerator>,
}

impl FallbackGenerator {
    #[must_use]
    pub fn new(primary: Arc<dyn ContentGenerator>, secondary: Arc<dyn ContentGenerator>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl ContentGenerator for FallbackGenerator {
    async fn generate(
        &self,
        document: &SourceDocument,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GeneratorError> {
        match self.primary.generate(document, request).await {
            Ok(content) => Ok(content),
            Err(GeneratorError::Disabled) => self.secondary.generate(document, request).await,
            Err(err) => {
                warn!(
                    error = %err,
                    document = document.name(),
                    request = request.label(),
                    "content generator failed, using offline generator"
                );
                self.secondary.generate(document, request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for Failing {
        async fn generate(
            &self,
            _document: &SourceDocument,
            _request: &GenerationRequest,
        ) -> Result<GeneratedContent, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GeneratorError::EmptyResponse)
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ContentGenerator for Fixed {
        async fn generate(
            &self,
            _document: &SourceDocument,
            _request: &GenerationRequest,
        ) -> Result<GeneratedContent, GeneratorError> {
            Ok(GeneratedContent::Text(self.0.to_string()))
        }
    }

    fn doc() -> SourceDocument {
        SourceDocument::text("n.txt", "notes").unwrap()
    }

    #[tokio::test]
    async fn primary_failure_uses_secondary() {
        let primary = Arc::new(Failing {
            calls: AtomicUsize::new(0),
        });
        let generator = FallbackGenerator::new(primary.clone(), Arc::new(Fixed("offline")));

        let content = generator
            .generate(&doc(), &GenerationRequest::Summary)
            .await
            .unwrap();
        assert_eq!(content, GeneratedContent::Text("offline".into()));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let generator = FallbackGenerator::new(Arc::new(Fixed("online")), Arc::new(Fixed("offline")));
        let content = generator
            .generate(&doc(), &GenerationRequest::Summary)
            .await
            .unwrap();
        assert_eq!(content, GeneratedContent::Text("online".into()));
    }
}
