use study_core::model::{
    Advance, Difficulty, ExamPhase, ExamQuestion, ExamQuestionDraft, ExamSession,
    FlashcardSession, Question, QuestionDraft, Tick,
};

fn exam_question(prompt: &str, topic: &str, correct: usize) -> ExamQuestion {
    ExamQuestionDraft {
        question: QuestionDraft::new(
            prompt,
            vec!["first".into(), "second".into(), "third".into()],
            correct,
            "see notes",
        ),
        topic: topic.into(),
        difficulty: Difficulty::Easy,
    }
    .validate()
    .unwrap()
}

fn flashcard(correct: usize) -> Question {
    QuestionDraft::new(
        "What does ATP stand for?",
        vec![
            "Adenosine triphosphate".into(),
            "Adenine tripeptide".into(),
        ],
        correct,
        "ATP is the energy currency of the cell.",
    )
    .validate()
    .unwrap()
}

#[test]
fn scenario_a_perfect_exam() {
    let mut session = ExamSession::new(vec![
        exam_question("Q1", "Cells", 1),
        exam_question("Q2", "Energy", 1),
        exam_question("Q3", "Cells", 1),
    ])
    .unwrap();

    for _ in 0..3 {
        session.select_answer(1).unwrap();
        session.next();
    }
    session.submit();

    assert_eq!(session.score(), 100);
    for topic in session.topic_breakdown() {
        assert_eq!(topic.percentage, 100, "topic {}", topic.topic);
    }
}

#[test]
fn scenario_b_timeout_auto_submit() {
    let mut session = ExamSession::new(vec![
        exam_question("Q1", "Cells", 0),
        exam_question("Q2", "Cells", 2),
    ])
    .unwrap();
    assert_eq!(session.remaining_seconds(), 240);

    session.select_answer(0).unwrap();

    let mut last = Tick::Idle;
    for _ in 0..240 {
        last = session.tick();
    }

    assert_eq!(last, Tick::TimedOut);
    assert_eq!(session.phase(), ExamPhase::Submitted);
    assert_eq!(session.score(), 50);
}

#[test]
fn scenario_c_late_tick_after_submit() {
    let mut session = ExamSession::new(vec![exam_question("Q1", "Cells", 0)]).unwrap();
    session.select_answer(0).unwrap();
    session.tick();
    session.submit();

    let remaining = session.remaining_seconds();
    let score = session.score();

    assert_eq!(session.tick(), Tick::Idle);
    assert_eq!(session.remaining_seconds(), remaining);
    assert_eq!(session.score(), score);
}

#[test]
fn scenario_d_flashcard_retry_penalty() {
    let mut session = FlashcardSession::new(vec![flashcard(0)]).unwrap();
    session.select_option(1).unwrap();
    session.retry().unwrap();
    session.select_option(0).unwrap();
    session.reveal().unwrap();

    assert_eq!(session.final_score(), 0);
}

#[test]
fn scenario_e_flashcard_first_try_credit() {
    let mut session = FlashcardSession::new(vec![flashcard(0)]).unwrap();
    session.select_option(0).unwrap();

    assert_eq!(session.final_score(), 100);

    session.reveal().unwrap();
    assert_eq!(session.advance().unwrap(), Advance::Completed);
    assert_eq!(session.final_score(), 100);
}

#[test]
fn topic_breakdown_agrees_with_overall_score() {
    let mut session = ExamSession::new(vec![
        exam_question("Q1", "A", 0),
        exam_question("Q2", "B", 1),
        exam_question("Q3", "A", 2),
        exam_question("Q4", "C", 0),
        exam_question("Q5", "B", 0),
    ])
    .unwrap();

    for (idx, option) in [0, 1, 0, 0, 2].into_iter().enumerate() {
        session.go_to(idx);
        session.select_answer(option).unwrap();
    }
    session.submit();

    let breakdown = session.topic_breakdown();
    let correct: u32 = breakdown.iter().map(|t| t.correct).sum();
    let total: u32 = breakdown.iter().map(|t| t.total).sum();

    assert_eq!(correct, session.correct_count());
    assert_eq!(total as usize, session.len());
    assert_eq!(session.score(), 60);
}
