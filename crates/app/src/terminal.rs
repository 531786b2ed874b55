//! Line-oriented terminal front end for the study commands.

use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use services::{AppServices, ExamCountdown, StudyError};
use study_core::model::{
    Advance, Answer, Badge, ExamSession, FlashcardSession, LessonDraft, LessonId, SourceDocument,
    StudyEvent, Tick, XP_PER_LEVEL, XpAward,
};
use study_core::time::format_countdown;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

use crate::SettingsArgs;

type CmdResult = Result<(), Box<dyn Error>>;

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` once stdin is closed.
    async fn prompt(&mut self, text: &str) -> std::io::Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        self.read_line().await
    }

    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "md" | "markdown" => "text/markdown",
        _ => "text/plain",
    }
}

fn parse_option(line: &str, count: usize) -> Option<usize> {
    line.parse::<usize>()
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
}

/// Keeps the last four characters visible.
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    let tail: String = key.chars().skip(count.saturating_sub(4)).collect();
    format!("****{tail}")
}

fn print_award(award: &XpAward) {
    if award.xp_gained > 0 {
        println!("+{} XP", award.xp_gained);
    }
    for badge in &award.new_badges {
        println!("Badge unlocked: {} ({})", badge.name(), badge.description());
    }
    if award.leveled_up {
        println!("Level up!");
    }
}

//
// ─── LIBRARY ───────────────────────────────────────────────────────────────────
//

pub(crate) async fn add(services: &AppServices, path: &Path, name: Option<String>) -> CmdResult {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let document = SourceDocument::new(file_name, mime_for(path), data)?;
    let lesson_name = name.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    });

    let study = services.study();
    print_award(&study.open_document(&document).await?);

    let summary = study.explain(&document, false).await?;
    println!("\n{}\n", summary.text);

    let flashcards = match study.start_flashcards(&document).await {
        Ok(session) => Some(session.cards().to_vec()),
        Err(err) => {
            warn!(error = %err, "saving lesson without flashcards");
            None
        }
    };

    let mut draft = LessonDraft::new(lesson_name, document);
    draft.summary = Some(summary.text);
    draft.flashcards = flashcards;
    let (id, award) = services.library().save(draft).await?;
    println!("Saved as lesson {id}.");
    print_award(&award);
    Ok(())
}

pub(crate) async fn list(services: &AppServices) -> CmdResult {
    let lessons = services.library().list().await?;
    if lessons.is_empty() {
        println!("The library is empty. Add a document with `app add <path>`.");
        return Ok(());
    }
    for lesson in lessons {
        let mut artifacts = Vec::new();
        if lesson.summary.is_some() {
            artifacts.push("summary".to_string());
        }
        if lesson.deep_analysis.is_some() {
            artifacts.push("deep".to_string());
        }
        if let Some(cards) = &lesson.flashcards {
            artifacts.push(format!("{} cards", cards.len()));
        }
        println!(
            "{:>4}  {}  {}  [{}]",
            lesson.id,
            lesson.saved_at.format("%Y-%m-%d %H:%M"),
            lesson.name,
            artifacts.join(", ")
        );
    }
    Ok(())
}

pub(crate) async fn remove(services: &AppServices, id: LessonId) -> CmdResult {
    services.library().delete(id).await?;
    println!("Removed lesson {id}.");
    Ok(())
}

pub(crate) async fn summary(services: &AppServices, id: LessonId, deep: bool) -> CmdResult {
    let lesson = services.library().get(id).await?;
    let stored = if deep {
        lesson.deep_analysis.clone()
    } else {
        lesson.summary.clone()
    };

    if let Some(text) = stored {
        println!("{text}");
        if deep {
            print_award(&services.progress().record(StudyEvent::DeepAnalysisRead).await?);
        }
        return Ok(());
    }

    let explanation = services.study().explain(&lesson.document, deep).await?;
    println!("{}", explanation.text);
    if let Some(award) = &explanation.award {
        print_award(award);
    }

    let mut draft = LessonDraft::new(lesson.name, lesson.document);
    if deep {
        draft.deep_analysis = Some(explanation.text);
    } else {
        draft.summary = Some(explanation.text);
    }
    services.library().update(id, draft).await?;
    Ok(())
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

pub(crate) async fn flashcards(services: &AppServices, id: LessonId) -> CmdResult {
    let lesson = services.library().get(id).await?;
    let study = services.study();

    let mut session = match lesson.flashcards {
        Some(cards) => FlashcardSession::new(cards)?,
        None => {
            let session = study.start_flashcards(&lesson.document).await?;
            let mut draft = LessonDraft::new(lesson.name, lesson.document);
            draft.flashcards = Some(session.cards().to_vec());
            services.library().update(id, draft).await?;
            session
        }
    };

    let mut input = Input::new();
    if !run_flashcards(&mut session, &mut input).await? {
        println!("\nSession ended early; progress was not recorded.");
        return Ok(());
    }

    println!(
        "\nFinished! {} of {} cards right on the first try ({}%).",
        session.correct_count(),
        session.len(),
        session.final_score()
    );
    print_award(&study.finish_flashcards(&session).await?);
    Ok(())
}

/// Returns `false` if stdin closed before the last card.
async fn run_flashcards(
    session: &mut FlashcardSession,
    input: &mut Input,
) -> Result<bool, Box<dyn Error>> {
    let total = session.len();
    loop {
        let index = session.current_index();
        let card = session.current_card().clone();
        println!("\nCard {}/{}: {}", index + 1, total, card.prompt());
        for (idx, option) in card.options().iter().enumerate() {
            println!("  {}. {option}", idx + 1);
        }

        loop {
            let Some(line) = input.prompt("Your answer: ").await? else {
                return Ok(false);
            };
            let Some(option) = parse_option(&line, card.option_count()) else {
                println!("Enter a number from 1 to {}.", card.option_count());
                continue;
            };
            match session.select_option(option)? {
                Answer::Correct { credited: true } => {
                    println!("Correct!");
                    break;
                }
                Answer::Correct { credited: false } => {
                    println!("Correct, but only first tries count toward the score.");
                    break;
                }
                Answer::Wrong { attempts } => {
                    println!("Not quite (attempt {attempts}).");
                    let Some(choice) = input.prompt("(r)etry or (s)how the answer? ").await?
                    else {
                        return Ok(false);
                    };
                    if choice.eq_ignore_ascii_case("s") {
                        break;
                    }
                    session.retry()?;
                }
            }
        }

        session.reveal()?;
        println!("Answer: {}", card.options()[card.correct_option()]);
        if !card.explanation().is_empty() {
            println!("{}", card.explanation());
        }

        if input.prompt("Press Enter to continue...").await?.is_none() {
            return Ok(false);
        }
        if session.advance()? == Advance::Completed {
            return Ok(true);
        }
    }
}

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

pub(crate) async fn exam(services: &AppServices, id: LessonId) -> CmdResult {
    let lesson = services.library().get(id).await?;
    let study = services.study();
    let session = study.start_exam(&lesson.document).await?;

    println!(
        "\n{} questions, {} on the clock. Type a number to answer, n/p to move, \
         g <number> to jump, s to submit.",
        session.len(),
        format_countdown(session.remaining_seconds())
    );

    let exam = Arc::new(Mutex::new(session));
    let countdown = ExamCountdown::start(Arc::clone(&exam)).await;
    let mut ticks = countdown.subscribe();
    let mut ticking = true;
    let mut input = Input::new();
    let mut redraw = true;

    loop {
        if redraw {
            let guard = exam.lock().await;
            if guard.is_submitted() {
                break;
            }
            render_question(&guard);
            print!("> ");
            std::io::stdout().flush()?;
        }

        tokio::select! {
            line = input.read_line() => {
                redraw = true;
                let Some(line) = line? else {
                    exam.lock().await.submit();
                    break;
                };
                if handle_exam_command(&mut *exam.lock().await, &line) {
                    break;
                }
            }
            changed = ticks.changed(), if ticking => {
                redraw = false;
                if changed.is_err() {
                    ticking = false;
                    continue;
                }
                let tick = *ticks.borrow_and_update();
                if tick == Tick::TimedOut {
                    println!("\nTime is up! Your answers were submitted.");
                    break;
                }
            }
        }
    }
    countdown.stop();

    let session = exam.lock().await;
    let outcome = study.finish_exam(&session).await?;
    print_results(&session);
    print_award(&outcome.award);
    Ok(())
}

fn render_question(session: &ExamSession) {
    let index = session.current_index();
    let question = session.current_question();
    println!(
        "\n[{}] Question {}/{} ({}, {}): {}",
        format_countdown(session.remaining_seconds()),
        index + 1,
        session.len(),
        question.topic(),
        question.difficulty(),
        question.question().prompt()
    );
    for (idx, option) in question.question().options().iter().enumerate() {
        let marker = if session.answer(index) == Some(idx) { '*' } else { ' ' };
        println!(" {marker}{}. {option}", idx + 1);
    }
}

/// Apply one line of exam input. Returns `true` once the exam is submitted.
fn handle_exam_command(session: &mut ExamSession, line: &str) -> bool {
    match line {
        "n" => session.next(),
        "p" => session.previous(),
        "s" => {
            let unanswered = session.len() - session.answered_count();
            if unanswered > 0 {
                println!("Submitting with {unanswered} unanswered question(s).");
            }
            session.submit();
            return true;
        }
        _ => {
            if let Some(target) = line.strip_prefix("g ") {
                match parse_option(target.trim(), session.len()) {
                    Some(index) => session.go_to(index),
                    None => println!("No question {}.", target.trim()),
                }
            } else if let Some(option) =
                parse_option(line, session.current_question().question().option_count())
            {
                if let Err(err) = session.select_answer(option) {
                    println!("{err}");
                } else if !session.is_last() {
                    session.next();
                }
            } else {
                println!("Unknown input: {line}");
            }
        }
    }
    false
}

fn print_results(session: &ExamSession) {
    let result = session.result();
    println!(
        "\nScore: {}% ({} of {} correct)",
        result.score, result.correct, result.total
    );
    println!("\nBy topic:");
    for topic in &result.topics {
        println!(
            "  {:<24} {:>3}%  ({}/{})",
            topic.topic, topic.percentage, topic.correct, topic.total
        );
    }

    println!("\nReview:");
    for (index, question) in session.questions().iter().enumerate() {
        let Some(review) = session.review(index) else {
            continue;
        };
        let options = question.question().options();
        let verdict = if review.is_correct { "right" } else { "wrong" };
        let picked = review
            .selected
            .and_then(|idx| options.get(idx))
            .map_or("(no answer)", String::as_str);
        println!(
            "  {}. [{verdict}] {}\n     your answer: {picked}\n     correct: {}",
            index + 1,
            question.question().prompt(),
            options[review.correct_option]
        );
        if !question.question().explanation().is_empty() {
            println!("     {}", question.question().explanation());
        }
    }
}

//
// ─── CHAT ──────────────────────────────────────────────────────────────────────
//

pub(crate) async fn chat(services: &AppServices, id: LessonId) -> CmdResult {
    let lesson = services.library().get(id).await?;
    let study = services.study();
    let mut history = Vec::new();
    let mut input = Input::new();

    println!("Ask about \"{}\". An empty line ends the chat.", lesson.name);
    loop {
        let Some(line) = input.prompt("\nYou: ").await? else {
            break;
        };
        if line.is_empty() || line == "quit" {
            break;
        }
        match study.chat(&lesson.document, &mut history, &line).await {
            Ok(reply) => println!("\nTutor: {}", reply.text),
            Err(StudyError::EmptyMessage) => {}
            Err(err) => println!("\nTutor is unavailable: {err}"),
        }
    }
    Ok(())
}

//
// ─── PROGRESS & SETTINGS ───────────────────────────────────────────────────────
//

pub(crate) async fn stats(services: &AppServices) -> CmdResult {
    let stats = services.progress().stats().await?;
    println!(
        "Level {}  ({} XP, {}/{} to the next level)",
        stats.level(),
        stats.xp(),
        stats.xp_into_level(),
        XP_PER_LEVEL
    );
    println!(
        "Documents: {}  Flashcard sessions: {}  Exams: {}  Deep analyses: {}",
        stats.files_processed(),
        stats.flashcards_completed(),
        stats.exams_completed(),
        stats.deep_analyses_read()
    );
    println!("\nBadges:");
    for badge in Badge::ALL {
        let mark = if stats.has_badge(badge) { "x" } else { " " };
        println!("  [{mark}] {:<14} {}", badge.name(), badge.description());
    }
    Ok(())
}

pub(crate) async fn show_settings(services: &AppServices) -> CmdResult {
    let settings = services.app_settings().load().await?;
    let key = settings
        .api_key()
        .map_or_else(|| "(not set)".to_string(), mask_key);
    println!("API key:       {key}");
    println!("Model:         {}", settings.api_model().unwrap_or("(default)"));
    println!("Base URL:      {}", settings.api_base_url().unwrap_or("(default)"));
    println!(
        "Instructions:  {}",
        settings.tutor_instructions().unwrap_or("(default)")
    );
    println!("Offline only:  {}", settings.offline_only());
    println!(
        "Generator:     {}",
        if services.online() { "online" } else { "offline" }
    );
    Ok(())
}

pub(crate) async fn update_settings(services: &AppServices, update: SettingsArgs) -> CmdResult {
    let current = services.app_settings().load().await?;
    let mut draft = current.to_draft();
    if let Some(key) = update.api_key {
        draft.api_key = Some(key);
    }
    if let Some(model) = update.model {
        draft.api_model = Some(model);
    }
    if let Some(url) = update.base_url {
        draft.api_base_url = Some(url);
    }
    if let Some(text) = update.instructions {
        draft.tutor_instructions = Some(text);
    }
    if let Some(offline) = update.offline {
        draft.offline_only = offline;
    }
    services.app_settings().save(draft).await?;
    println!("Settings saved. They apply from the next command.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Difficulty, ExamQuestionDraft, QuestionDraft};

    fn exam() -> ExamSession {
        let questions = ["Q1", "Q2"]
            .into_iter()
            .map(|prompt| {
                ExamQuestionDraft {
                    question: QuestionDraft::new(prompt, vec!["a".into(), "b".into()], 1, ""),
                    topic: "General".into(),
                    difficulty: Difficulty::Easy,
                }
                .validate()
                .unwrap()
            })
            .collect();
        ExamSession::new(questions).unwrap()
    }

    #[test]
    fn mime_types_follow_extensions() {
        assert_eq!(mime_for(Path::new("a/b/Book.PDF")), "application/pdf");
        assert_eq!(mime_for(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("notes")), "text/plain");
    }

    #[test]
    fn api_keys_are_masked() {
        assert_eq!(mask_key("sk-abcdef1234"), "****1234");
        assert_eq!(mask_key("ab"), "****ab");
    }

    #[test]
    fn options_are_one_based() {
        assert_eq!(parse_option("1", 4), Some(0));
        assert_eq!(parse_option("4", 4), Some(3));
        assert_eq!(parse_option("0", 4), None);
        assert_eq!(parse_option("5", 4), None);
        assert_eq!(parse_option("x", 4), None);
    }

    #[test]
    fn exam_commands_answer_and_move() {
        let mut session = exam();
        assert!(!handle_exam_command(&mut session, "2"));
        assert_eq!(session.answer(0), Some(1));
        assert_eq!(session.current_index(), 1);

        assert!(!handle_exam_command(&mut session, "p"));
        assert_eq!(session.current_index(), 0);
        assert!(!handle_exam_command(&mut session, "g 2"));
        assert_eq!(session.current_index(), 1);

        assert!(handle_exam_command(&mut session, "s"));
        assert!(session.is_submitted());
        assert_eq!(session.score(), 50);
    }
}
