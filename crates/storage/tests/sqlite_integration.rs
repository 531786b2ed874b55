use chrono::Duration;
use storage::repository::{AppSettingsRepository, LessonRepository, StatsRepository, Storage};
use storage::sqlite::SqliteRepository;
use study_core::model::{
    AppSettingsDraft, Badge, LessonDraft, Question, QuestionDraft, SourceDocument, StudyEvent,
    UserStats,
};
use study_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn card(prompt: &str) -> Question {
    QuestionDraft::new(
        prompt,
        vec!["yes".into(), "no".into()],
        0,
        "because",
    )
    .validate()
    .unwrap()
}

#[tokio::test]
async fn lesson_round_trip_keeps_document_bytes_and_cards() {
    let repo = connect("memdb_lesson_roundtrip").await;

    let document = SourceDocument::new("scan.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]).unwrap();
    let mut draft = LessonDraft::new("Scanned notes", document.clone());
    draft.summary = Some("A short summary.".into());
    draft.flashcards = Some(vec![card("Is this a card?")]);
    let validated = draft.validate(fixed_now()).unwrap();

    let id = repo.insert_lesson(&validated).await.unwrap();
    let stored = repo.get_lesson(id).await.unwrap().expect("lesson");

    assert_eq!(stored, validated.assign_id(id));
    assert_eq!(stored.document.data(), document.data());
    assert!(stored.deep_analysis.is_none());
}

#[tokio::test]
async fn upsert_merges_missing_artifacts() {
    let repo = connect("memdb_lesson_merge").await;

    let mut draft = LessonDraft::new("Biology", SourceDocument::text("bio.txt", "Cells.").unwrap());
    draft.summary = Some("Cells are small.".into());
    let id = repo
        .insert_lesson(&draft.validate(fixed_now()).unwrap())
        .await
        .unwrap();

    let mut update = LessonDraft::new("Biology", SourceDocument::text("bio.txt", "Cells.").unwrap());
    update.deep_analysis = Some("Cells in depth.".into());
    let update = update
        .validate(fixed_now() + Duration::minutes(3))
        .unwrap()
        .assign_id(id);
    repo.upsert_lesson(&update).await.unwrap();

    let stored = repo.get_lesson(id).await.unwrap().unwrap();
    assert_eq!(stored.summary.as_deref(), Some("Cells are small."));
    assert_eq!(stored.deep_analysis.as_deref(), Some("Cells in depth."));
    assert_eq!(stored.saved_at, fixed_now() + Duration::minutes(3));
    assert_eq!(repo.count_lessons().await.unwrap(), 1);
}

#[tokio::test]
async fn list_orders_newest_first_and_delete_removes() {
    let repo = connect("memdb_lesson_list").await;

    let mut ids = Vec::new();
    for (offset, name) in [(0, "first"), (20, "third"), (10, "second")] {
        let lesson = LessonDraft::new(name, SourceDocument::text("n.txt", name).unwrap())
            .validate(fixed_now() + Duration::minutes(offset))
            .unwrap();
        ids.push(repo.insert_lesson(&lesson).await.unwrap());
    }

    let names: Vec<String> = repo
        .list_lessons()
        .await
        .unwrap()
        .into_iter()
        .map(|lesson| lesson.name)
        .collect();
    assert_eq!(names, ["third", "second", "first"]);

    assert!(repo.delete_lesson(ids[0]).await.unwrap());
    assert!(!repo.delete_lesson(ids[0]).await.unwrap());
    assert_eq!(repo.count_lessons().await.unwrap(), 2);
}

#[tokio::test]
async fn stats_persist_badges_and_counters() {
    let repo = connect("memdb_stats").await;
    assert!(repo.load_stats().await.unwrap().is_none());

    let mut stats = UserStats::default();
    stats.record(StudyEvent::FileProcessed);
    stats.record(StudyEvent::ExamCompleted { score: 100 });
    repo.save_stats(&stats).await.unwrap();

    let loaded = repo.load_stats().await.unwrap().expect("stats");
    assert_eq!(loaded, stats);
    assert!(loaded.has_badge(Badge::Pioneer));
    assert!(loaded.has_badge(Badge::PerfectScore));

    stats.record(StudyEvent::DeepAnalysisRead);
    repo.save_stats(&stats).await.unwrap();
    assert_eq!(repo.load_stats().await.unwrap().unwrap().deep_analyses_read(), 1);
}

#[tokio::test]
async fn settings_round_trip() {
    let repo = connect("memdb_settings").await;
    assert!(repo.get_settings().await.unwrap().is_none());

    let settings = AppSettingsDraft {
        api_key: Some("sk-test".into()),
        api_model: Some("gpt-4o-mini".into()),
        api_base_url: Some("https://example.com/v1".into()),
        tutor_instructions: None,
        offline_only: true,
    }
    .validate()
    .unwrap();
    repo.save_settings(&settings).await.unwrap();

    assert_eq!(repo.get_settings().await.unwrap(), Some(settings));
}

#[tokio::test]
async fn storage_sqlite_runs_migrations_twice() {
    let url = "sqlite:file:memdb_storage_twice?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("first");
    storage
        .lessons
        .insert_lesson(
            &LessonDraft::new("kept", SourceDocument::text("k.txt", "kept").unwrap())
                .validate(fixed_now())
                .unwrap(),
        )
        .await
        .unwrap();

    let again = Storage::sqlite(url).await.expect("second");
    assert_eq!(again.lessons.count_lessons().await.unwrap(), 1);
}
