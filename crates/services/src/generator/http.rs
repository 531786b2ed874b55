use std::env;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use study_core::model::{AppSettings, ChatRole, DocumentKind, SourceDocument};
use tracing::debug;

use super::{
    ContentGenerator, EXAM_QUESTION_COUNT, FLASHCARD_COUNT, GeneratedContent, GenerationRequest,
};
use crate::error::GeneratorError;
use crate::ingest;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TUTOR_INSTRUCTIONS: &str = "You are a patient study tutor. \
Explain the material clearly, use real-world analogies for hard concepts, \
format answers in Markdown and write formulas in LaTeX.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub tutor_instructions: Option<String>,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("STUDY_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
            tutor_instructions: None,
        })
    }

    /// Layer persisted settings over an environment config.
    ///
    /// Returns `None` when the learner chose offline mode or no API key is known.
    #[must_use]
    pub fn resolve(env: Option<Self>, settings: &AppSettings) -> Option<Self> {
        if settings.offline_only() {
            return None;
        }
        let api_key = settings
            .api_key()
            .map(str::to_owned)
            .or_else(|| env.as_ref().map(|cfg| cfg.api_key.clone()))?;
        let base_url = settings
            .api_base_url()
            .map(str::to_owned)
            .or_else(|| env.as_ref().map(|cfg| cfg.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let model = settings
            .api_model()
            .map(str::to_owned)
            .or_else(|| env.as_ref().map(|cfg| cfg.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
            tutor_instructions: settings.tutor_instructions().map(str::to_owned),
        })
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct HttpGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl HttpGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(
        &self,
        config: &GeneratorConfig,
        messages: Vec<ChatRequestMessage>,
        temperature: f32,
    ) -> Result<String, GeneratorError> {
        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages,
            temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ContentGenerator for HttpGenerator {
    async fn generate(
        &self,
        document: &SourceDocument,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;
        debug!(model = %config.model, request = request.label(), "calling content generator");

        let messages = build_messages(config, document, request);
        let temperature = match request {
            GenerationRequest::Flashcards | GenerationRequest::Exam => 0.2,
            _ => 0.7,
        };
        let reply = self.complete(config, messages, temperature).await?;

        match request {
            GenerationRequest::Flashcards => {
                let report = ingest::parse_flashcards(&reply)?;
                Ok(GeneratedContent::Flashcards(report.accepted))
            }
            GenerationRequest::Exam => {
                let report = ingest::parse_exam(&reply)?;
                Ok(GeneratedContent::Exam(report.accepted))
            }
            _ => Ok(GeneratedContent::Text(reply)),
        }
    }
}

fn build_messages(
    config: &GeneratorConfig,
    document: &SourceDocument,
    request: &GenerationRequest,
) -> Vec<ChatRequestMessage> {
    let system = config
        .tutor_instructions
        .clone()
        .unwrap_or_else(|| DEFAULT_TUTOR_INSTRUCTIONS.to_string());
    let mut messages = vec![ChatRequestMessage::text("system", system)];

    match request {
        GenerationRequest::ChatTurn { history, message } => {
            messages.push(ChatRequestMessage {
                role: "user",
                content: vec![
                    document_part(document),
                    ContentPart::text("Answer my questions about this document."),
                ],
            });
            for turn in history {
                let role = match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Tutor => "assistant",
                };
                messages.push(ChatRequestMessage::text(role, turn.text.clone()));
            }
            messages.push(ChatRequestMessage::text("user", message.clone()));
        }
        other => {
            messages.push(ChatRequestMessage {
                role: "user",
                content: vec![document_part(document), ContentPart::text(instruction(other))],
            });
        }
    }
    messages
}

fn instruction(request: &GenerationRequest) -> String {
    const ITEM_SHAPE: &str = r#""question" (string), "options" (array of 4 strings), "correctIndex" (integer, 0-based) and "explanation" (string)"#;
    match request {
        GenerationRequest::Summary => {
            "Summarize this material. Focus on the key points worth memorizing.".to_string()
        }
        GenerationRequest::DeepExplanation => "Analyze this material in depth. Explain the \
            background, how it works and walk through worked examples."
            .to_string(),
        GenerationRequest::Flashcards => format!(
            "Create {FLASHCARD_COUNT} multiple-choice flashcards from this material. \
             Reply with a JSON array only. Each item has {ITEM_SHAPE}."
        ),
        GenerationRequest::Exam => format!(
            "Create {EXAM_QUESTION_COUNT} practice exam questions of varying difficulty from this \
             material. Reply with a JSON array only. Each item has {ITEM_SHAPE}, plus \"topic\" \
             (string) and \"difficulty\" (\"Easy\", \"Medium\" or \"Hard\")."
        ),
        GenerationRequest::ChatTurn { message, .. } => message.clone(),
    }
}

fn document_part(document: &SourceDocument) -> ContentPart {
    match document.kind() {
        DocumentKind::Text => ContentPart::text(format!(
            "Document \"{}\":\n\n{}",
            document.name(),
            String::from_utf8_lossy(document.data())
        )),
        DocumentKind::Image => ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: data_url(document),
            },
        },
        DocumentKind::Pdf => ContentPart::File {
            file: FilePart {
                filename: document.name().to_string(),
                file_data: data_url(document),
            },
        },
    }
}

fn data_url(document: &SourceDocument) -> String {
    format!(
        "data:{};base64,{}",
        document.mime_type(),
        STANDARD.encode(document.data())
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

impl ChatRequestMessage {
    fn text(role: &'static str, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::text(text)],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    File { file: FilePart },
}

impl ContentPart {
    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct FilePart {
    filename: String,
    file_data: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{AppSettingsDraft, ChatMessage};
    use study_core::time::fixed_now;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            base_url: "https://example.com/v1".into(),
            api_key: "sk-env".into(),
            model: "env-model".into(),
            tutor_instructions: None,
        }
    }

    #[tokio::test]
    async fn disabled_without_config() {
        let generator = HttpGenerator::new(None);
        let doc = SourceDocument::text("n.txt", "Some notes.").unwrap();
        let err = generator
            .generate(&doc, &GenerationRequest::Summary)
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Disabled));
        assert!(!generator.enabled());
    }

    #[test]
    fn settings_override_env() {
        let settings = AppSettingsDraft {
            api_model: Some("custom".into()),
            tutor_instructions: Some("Be brief.".into()),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let resolved = GeneratorConfig::resolve(Some(config()), &settings).unwrap();
        assert_eq!(resolved.api_key, "sk-env");
        assert_eq!(resolved.model, "custom");
        assert_eq!(resolved.base_url, "https://example.com/v1");
        assert_eq!(resolved.tutor_instructions.as_deref(), Some("Be brief."));
    }

    #[test]
    fn offline_mode_or_missing_key_disables() {
        let offline = AppSettingsDraft {
            offline_only: true,
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert!(GeneratorConfig::resolve(Some(config()), &offline).is_none());
        assert!(GeneratorConfig::resolve(None, &AppSettings::default()).is_none());

        let keyed = AppSettingsDraft {
            api_key: Some("sk-saved".into()),
            ..AppSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let resolved = GeneratorConfig::resolve(None, &keyed).unwrap();
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.model, DEFAULT_MODEL);
    }

    #[test]
    fn images_are_sent_as_data_urls() {
        let doc = SourceDocument::new("scan.png", "image/png", vec![1, 2, 3]).unwrap();
        let messages = build_messages(&config(), &doc, &GenerationRequest::Summary);
        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[1]["content"][0]["type"], "image_url");
        assert_eq!(
            json[1]["content"][0]["image_url"]["url"],
            "data:image/png;base64,AQID"
        );
    }

    #[test]
    fn pdfs_are_sent_as_file_parts() {
        let doc = SourceDocument::new("book.pdf", "application/pdf", vec![1, 2, 3]).unwrap();
        let messages = build_messages(&config(), &doc, &GenerationRequest::Exam);
        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[1]["content"][0]["type"], "file");
        assert_eq!(json[1]["content"][0]["file"]["filename"], "book.pdf");
        assert!(
            json[1]["content"][1]["text"]
                .as_str()
                .unwrap()
                .contains("10 practice exam questions")
        );
    }

    #[test]
    fn chat_turns_replay_history() {
        let doc = SourceDocument::text("n.txt", "Notes.").unwrap();
        let request = GenerationRequest::ChatTurn {
            history: vec![
                ChatMessage::user("What is ATP?", fixed_now()),
                ChatMessage::tutor("Energy currency.", fixed_now()),
            ],
            message: "Where is it made?".into(),
        };
        let messages = build_messages(&config(), &doc, &request);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, ["system", "user", "user", "assistant", "user"]);
    }
}
