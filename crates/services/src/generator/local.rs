//! Offline generator working from the document text alone.
//!
//! Questions are cloze items: a sentence with its key term blanked out, the
//! other options being key terms from elsewhere in the notes. Everything is seeded
//! from a SHA-256 of the document bytes, so the same notes always give the same
//! questions.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};
use study_core::model::{
    Difficulty, ExamQuestion, ExamQuestionDraft, Question, QuestionDraft, SourceDocument,
};

use super::{
    ContentGenerator, EXAM_QUESTION_COUNT, FLASHCARD_COUNT, GeneratedContent, GenerationRequest,
};
use crate::error::GeneratorError;
use crate::ingest::DEFAULT_TOPIC;

/// Shown instead of an analysis when a document can't be read offline.
pub const OFFLINE_NOTICE: &str = "# Offline analysis\n\n\
No AI service is configured, or you are offline, so a full analysis is not available.\n\n\
### How to fix it\n\
1. Get an API key from your AI provider.\n\
2. Set `STUDY_AI_API_KEY` (and optionally `STUDY_AI_BASE_URL` and `STUDY_AI_MODEL`).\n\
3. Or save the key with the `settings` command.";

const MIN_SENTENCE_WORDS: usize = 5;
const MIN_TERM_CHARS: usize = 4;
const MAX_DISTRACTORS: usize = 3;
const SUMMARY_POINTS_PER_TOPIC: usize = 2;
const BLANK: &str = "_____";

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "always", "among", "because", "been", "before",
    "being", "between", "both", "called", "could", "does", "doing", "during", "each", "either",
    "every", "from", "have", "having", "into", "itself", "just", "known", "less", "like", "made",
    "make", "many", "more", "most", "much", "must", "never", "only", "other", "over", "same",
    "should", "since", "some", "such", "than", "that", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "under", "until", "used", "uses", "using", "very", "what",
    "when", "where", "which", "while", "will", "with", "within", "without", "would", "your",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGenerator;

impl LocalGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentGenerator for LocalGenerator {
    async fn generate(
        &self,
        document: &SourceDocument,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GeneratorError> {
        let Some(text) = document.as_text() else {
            return unreadable(request);
        };

        let sections = read_sections(&text);
        if sections.is_empty() {
            return Err(GeneratorError::InsufficientContent(document.name().to_string()));
        }

        let mut rng = StdRng::seed_from_u64(seed(document, request));
        match request {
            GenerationRequest::Summary => Ok(GeneratedContent::Text(summary(document, &sections))),
            GenerationRequest::DeepExplanation => {
                Ok(GeneratedContent::Text(deep_explanation(document, &sections)))
            }
            GenerationRequest::ChatTurn { message, .. } => {
                Ok(GeneratedContent::Text(answer(document, &sections, message)))
            }
            GenerationRequest::Flashcards => {
                let clozes = clozes(&sections);
                let cards: Vec<Question> = clozes
                    .iter()
                    .filter_map(|cloze| cloze_question(cloze, &clozes, &mut rng))
                    .take(FLASHCARD_COUNT)
                    .collect();
                if cards.is_empty() {
                    return Err(GeneratorError::InsufficientContent(document.name().to_string()));
                }
                Ok(GeneratedContent::Flashcards(cards))
            }
            GenerationRequest::Exam => {
                let clozes = clozes(&sections);
                let mut order: Vec<&Cloze> = clozes.iter().collect();
                order.shuffle(&mut rng);
                let mut questions = Vec::new();
                for cloze in order {
                    if questions.len() == EXAM_QUESTION_COUNT {
                        break;
                    }
                    let Some(question) = cloze_question(cloze, &clozes, &mut rng) else {
                        continue;
                    };
                    questions.push(
                        ExamQuestion::try_from(ExamQuestionDraft {
                            question: question.into(),
                            topic: cloze.topic.clone(),
                            difficulty: difficulty_for(&cloze.term),
                        })?,
                    );
                }
                if questions.is_empty() {
                    return Err(GeneratorError::InsufficientContent(document.name().to_string()));
                }
                Ok(GeneratedContent::Exam(questions))
            }
        }
    }
}

fn unreadable(request: &GenerationRequest) -> Result<GeneratedContent, GeneratorError> {
    match request {
        GenerationRequest::Flashcards => Ok(GeneratedContent::Flashcards(vec![
            setup_card().validate()?,
        ])),
        GenerationRequest::Exam => Ok(GeneratedContent::Exam(vec![
            ExamQuestionDraft {
                question: setup_card(),
                topic: "Setup".into(),
                difficulty: Difficulty::Easy,
            }
            .validate()?,
        ])),
        _ => Ok(GeneratedContent::Text(OFFLINE_NOTICE.to_string())),
    }
}

fn setup_card() -> QuestionDraft {
    QuestionDraft::new(
        "How do you turn on the online tutor?",
        vec![
            "Configure an API key".into(),
            "Leave it as it is".into(),
            "Reinstall the app".into(),
            "Switch to another computer".into(),
        ],
        0,
        "The tutor needs an API key (STUDY_AI_API_KEY or saved settings) to reach the online model.",
    )
}

fn seed(document: &SourceDocument, request: &GenerationRequest) -> u64 {
    let digest = Sha256::new()
        .chain_update(document.data())
        .chain_update(request.label().as_bytes())
        .finalize();
    let mut head = [0_u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

//
// ─── TEXT ANALYSIS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    topic: String,
    sentences: Vec<String>,
}

/// Group sentences under the nearest preceding markdown heading.
fn read_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut topic = DEFAULT_TOPIC.to_string();
    let mut body = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim();
            if !heading.is_empty() {
                push_section(&mut sections, &topic, &body);
                topic = heading.to_string();
                body.clear();
            }
            continue;
        }
        let content = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .unwrap_or(trimmed);
        body.push_str(content);
        body.push('\n');
    }
    push_section(&mut sections, &topic, &body);
    sections
}

fn push_section(sections: &mut Vec<Section>, topic: &str, body: &str) {
    let sentences = split_sentences(body);
    if sentences.is_empty() {
        return;
    }
    match sections.iter_mut().find(|s| s.topic == topic) {
        Some(existing) => existing.sentences.extend(sentences),
        None => sections.push(Section {
            topic: topic.to_string(),
            sentences,
        }),
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut sentences = Vec::new();
    let mut start = 0;

    for (idx, ch) in flat.char_indices() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let end = idx + ch.len_utf8();
        if flat[end..].chars().next().is_none_or(char::is_whitespace) {
            let sentence = flat[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }
    let tail = flat[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

fn content_terms(sentence: &str) -> impl Iterator<Item = &str> {
    sentence
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| {
            word.chars().count() >= MIN_TERM_CHARS
                && word.chars().all(|c| c.is_alphabetic() || c == '-')
                && !is_stopword(word)
        })
}

/// First one wins a tie.
fn longest<'a>(terms: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    terms.fold(None, |best: Option<&str>, word| match best {
        Some(b) if b.chars().count() >= word.chars().count() => Some(b),
        _ => Some(word),
    })
}

/// Longest content word of the sentence.
fn key_term(sentence: &str) -> Option<&str> {
    longest(content_terms(sentence))
}

/// Longest content word that occurs exactly once in the sentence, ignoring case
/// and counting matches inside other words, so blanking it hides the answer.
fn cloze_term(sentence: &str) -> Option<&str> {
    let lower = sentence.to_lowercase();
    longest(content_terms(sentence).filter(|term| lower.matches(&term.to_lowercase()).count() == 1))
}

fn difficulty_for(term: &str) -> Difficulty {
    match term.chars().count() {
        0..=6 => Difficulty::Easy,
        7..=9 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct Cloze {
    topic: String,
    sentence: String,
    term: String,
}

fn clozes(sections: &[Section]) -> Vec<Cloze> {
    let mut out = Vec::new();
    for section in sections {
        for sentence in &section.sentences {
            if sentence.split_whitespace().count() < MIN_SENTENCE_WORDS {
                continue;
            }
            if let Some(term) = cloze_term(sentence) {
                out.push(Cloze {
                    topic: section.topic.clone(),
                    sentence: sentence.clone(),
                    term: term.to_string(),
                });
            }
        }
    }
    out
}

fn cloze_question(cloze: &Cloze, pool: &[Cloze], rng: &mut StdRng) -> Option<Question> {
    let answer = cloze.term.to_lowercase();
    let mut seen = HashSet::from([answer]);
    let mut distractors: Vec<&str> = pool
        .iter()
        .map(|other| other.term.as_str())
        .filter(|term| seen.insert(term.to_lowercase()))
        .collect();
    if distractors.is_empty() {
        return None;
    }
    distractors.shuffle(rng);
    distractors.truncate(MAX_DISTRACTORS);

    let mut options: Vec<String> = distractors.into_iter().map(str::to_owned).collect();
    options.push(cloze.term.clone());
    options.shuffle(rng);
    let correct_option = options.iter().position(|o| *o == cloze.term)?;

    QuestionDraft::new(
        format!("Fill in the blank: {}", cloze.sentence.replacen(&cloze.term, BLANK, 1)),
        options,
        correct_option,
        format!("From the notes: \"{}\"", cloze.sentence),
    )
    .validate()
    .ok()
}

//
// ─── TEXT OUTPUT ───────────────────────────────────────────────────────────────
//

fn summary(document: &SourceDocument, sections: &[Section]) -> String {
    let mut out = format!("# Summary of {}\n", document.name());
    for section in sections {
        out.push_str(&format!("\n## {}\n", section.topic));
        for sentence in section.sentences.iter().take(SUMMARY_POINTS_PER_TOPIC) {
            out.push_str(&format!("- {sentence}\n"));
        }
    }
    out
}

fn deep_explanation(document: &SourceDocument, sections: &[Section]) -> String {
    let mut out = format!("# Deep dive: {}\n", document.name());
    for section in sections {
        out.push_str(&format!("\n## {}\n\n{}\n", section.topic, section.sentences.join(" ")));
        let mut terms: Vec<&str> = Vec::new();
        for term in section.sentences.iter().filter_map(|s| key_term(s)) {
            if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                terms.push(term);
            }
        }
        if !terms.is_empty() {
            out.push_str(&format!("\n**Key terms:** {}\n", terms.join(", ")));
        }
    }
    out
}

fn content_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3 && !is_stopword(word))
        .map(str::to_lowercase)
        .collect()
}

/// Reply with the sentence sharing the most words with the message.
fn answer(document: &SourceDocument, sections: &[Section], message: &str) -> String {
    let wanted = content_words(message);
    let best = sections
        .iter()
        .flat_map(|section| section.sentences.iter().map(move |s| (section, s)))
        .map(|(section, sentence)| {
            let overlap = content_words(sentence).intersection(&wanted).count();
            (overlap, section, sentence)
        })
        .filter(|(overlap, _, _)| *overlap > 0)
        .fold(None, |best: Option<(usize, &Section, &String)>, item| match best {
            Some(b) if b.0 >= item.0 => Some(b),
            _ => Some(item),
        });

    match best {
        Some((_, section, sentence)) => format!(
            "From \"{}\" ({}): {}",
            document.name(),
            section.topic,
            sentence
        ),
        None => {
            let topics: Vec<&str> = sections.iter().map(|s| s.topic.as_str()).collect();
            format!(
                "I could not find that in \"{}\". Try asking about: {}.",
                document.name(),
                topics.join(", ")
            )
        }
    }
}
