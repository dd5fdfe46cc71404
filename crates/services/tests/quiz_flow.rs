use std::collections::HashSet;
use std::sync::Arc;

use kanji_core::model::{
    Catalog, CompletionReason, KanjiDraft, QuizDifficulty, QuizMode, QuizRules, QuizSettings,
};
use kanji_core::time::fixed_clock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, ProgressService, QuizError, QuizLoopService, QuizPhase, QuizRunner};
use storage::repository::{InMemoryStore, Storage};

async fn quiz_over(catalog: Catalog, rules: QuizRules) -> QuizLoopService {
    let progress = ProgressService::load(
        Arc::new(catalog),
        Arc::new(InMemoryStore::new()),
        fixed_clock(),
    )
    .await
    .expect("load progress");
    QuizLoopService::new(Arc::new(progress)).with_rules(rules)
}

#[tokio::test]
async fn all_correct_answers_complete_and_learn_distinct_kanji() {
    let quiz = quiz_over(Catalog::builtin().unwrap(), QuizRules::default()).await;
    let settings = QuizSettings::new(QuizMode::Meaning, QuizDifficulty::Easy, 3);
    let mut session = quiz.new_session(settings);
    let questions = quiz
        .generator()
        .generate(&settings, &mut StdRng::seed_from_u64(2024));
    let distinct: HashSet<_> = questions.iter().map(|q| q.kanji_id).collect();
    quiz.start_with(&mut session, questions.clone()).await;

    let mut completion = None;
    for question in &questions {
        quiz.submit_answer(&mut session, &question.correct_answer)
            .await
            .unwrap();
        completion = quiz.advance(&mut session).await.unwrap();
    }

    let completion = completion.expect("third advance completes");
    assert_eq!(session.score(), 3);
    assert!(session.is_completed());
    assert_eq!(completion.reason, CompletionReason::AllAnswered);
    assert_eq!(completion.result.percent(), 100);
    assert_eq!(quiz.progress().learned_count(), distinct.len());
    assert_eq!(quiz.progress().total_practice_minutes(), 1);
}

#[tokio::test]
async fn time_up_mid_quiz_credits_once_and_rejects_answers() {
    let quiz = quiz_over(Catalog::builtin().unwrap(), QuizRules::default()).await;
    let settings = QuizSettings::new(QuizMode::Meaning, QuizDifficulty::Easy, 5);
    let mut session = quiz.new_session(settings);
    quiz.start(&mut session).await;

    for _ in 0..2 {
        let answer = session.current_question().unwrap().correct_answer.clone();
        quiz.submit_answer(&mut session, &answer).await.unwrap();
        quiz.advance(&mut session).await.unwrap();
    }

    let mut completions = 0;
    for _ in 0..75 {
        if quiz.tick(&mut session).await.is_some() {
            completions += 1;
        }
    }

    assert_eq!(completions, 1);
    assert_eq!(session.phase(), QuizPhase::Completed);
    assert_eq!(session.completion().unwrap().reason, CompletionReason::TimeUp);
    assert_eq!(session.completion().unwrap().result.total(), 5);
    assert_eq!(quiz.progress().total_practice_minutes(), 1);

    let before = quiz.progress().snapshot();
    let err = quiz.submit_answer(&mut session, "sun, day").await.unwrap_err();
    assert_eq!(err, QuizError::NotInProgress);
    assert_eq!(quiz.progress().snapshot(), before);
}

#[tokio::test]
async fn two_record_tier_bounds_the_quiz() {
    let catalog = Catalog::from_drafts(vec![
        KanjiDraft::new("日", "sun", 4).with_level("N5"),
        KanjiDraft::new("月", "moon", 4).with_level("N5"),
    ])
    .unwrap();
    let quiz = quiz_over(catalog, QuizRules::default()).await;
    let mut session = quiz.new_session(QuizSettings::new(
        QuizMode::Meaning,
        QuizDifficulty::Easy,
        10,
    ));

    quiz.start(&mut session).await;
    assert_eq!(session.question_count(), 2);
}

#[tokio::test]
async fn empty_catalog_quiz_completes_with_zero_score() {
    let quiz = quiz_over(Catalog::default(), QuizRules::default()).await;
    let mut session = quiz.new_session(QuizSettings::default());

    let completion = quiz.start(&mut session).await.expect("completes at once");
    assert_eq!(completion.result.total(), 0);
    assert_eq!(completion.result.fraction(), 0.0);
    assert_eq!(quiz.progress().progress_fraction(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn runner_reveals_then_auto_advances() {
    let quiz = Arc::new(quiz_over(Catalog::builtin().unwrap(), QuizRules::default()).await);
    let settings = QuizSettings::new(QuizMode::Meaning, QuizDifficulty::Easy, 2);
    let mut session = quiz.new_session(settings);
    let questions = quiz
        .generator()
        .generate(&settings, &mut StdRng::seed_from_u64(8));
    quiz.start_with(&mut session, questions.clone()).await;

    let handle = QuizRunner::spawn(Arc::clone(&quiz), session);
    let mut rx = handle.subscribe();

    assert!(handle.answer(questions[0].correct_answer.clone()).await);
    let revealed = rx
        .wait_for(|s| s.reveal.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(revealed.index, 0);
    assert_eq!(revealed.score, 1);

    let moved = rx
        .wait_for(|s| s.index == 1)
        .await
        .unwrap()
        .clone();
    assert!(moved.reveal.is_none());
    assert_eq!(moved.phase, QuizPhase::InProgress);

    assert!(handle.answer("definitely wrong").await);
    assert!(handle.advance().await);
    let done = rx
        .wait_for(|s| s.phase == QuizPhase::Completed)
        .await
        .unwrap()
        .clone();
    assert_eq!(done.score, 1);
    assert_eq!(done.completion.unwrap().reason, CompletionReason::AllAnswered);

    let session = handle.stop().await.expect("session handed back");
    assert!(session.is_completed());
    assert_eq!(quiz.progress().total_practice_minutes(), 1);
}

#[tokio::test(start_paused = true)]
async fn early_advance_disarms_the_pending_auto_advance() {
    let quiz = Arc::new(quiz_over(Catalog::builtin().unwrap(), QuizRules::default()).await);
    let settings = QuizSettings::new(QuizMode::Meaning, QuizDifficulty::Easy, 3);
    let mut session = quiz.new_session(settings);
    let questions = quiz
        .generator()
        .generate(&settings, &mut StdRng::seed_from_u64(31));
    quiz.start_with(&mut session, questions.clone()).await;

    let handle = QuizRunner::spawn(Arc::clone(&quiz), session);
    let mut rx = handle.subscribe();

    assert!(handle.answer(questions[0].correct_answer.clone()).await);
    rx.wait_for(|s| s.reveal.is_some()).await.unwrap();
    assert!(handle.advance().await);
    rx.wait_for(|s| s.index == 1).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(2_000)).await;
    let settled = handle.snapshot();
    assert_eq!(settled.index, 1);
    assert_eq!(settled.phase, QuizPhase::InProgress);
    assert!(settled.reveal.is_none());
    assert_eq!(settled.rejected, None);
}

#[tokio::test(start_paused = true)]
async fn runner_reports_rejected_commands_and_restarts() {
    let quiz = Arc::new(quiz_over(Catalog::builtin().unwrap(), QuizRules::default()).await);
    let handle = QuizRunner::spawn(
        Arc::clone(&quiz),
        quiz.new_session(QuizSettings::new(QuizMode::Mixed, QuizDifficulty::Easy, 5)),
    );
    let mut rx = handle.subscribe();
    rx.wait_for(|s| s.phase == QuizPhase::InProgress).await.unwrap();

    assert!(handle.advance().await);
    let rejected = rx
        .wait_for(|s| s.rejected.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(rejected.rejected, Some(QuizError::NoPendingAnswer));
    assert_eq!(rejected.index, 0);

    tokio::time::sleep(std::time::Duration::from_millis(10_500)).await;
    let ticked = handle.snapshot();
    assert!(ticked.remaining_secs < 60);
    assert_eq!(ticked.rejected, Some(QuizError::NoPendingAnswer));

    assert!(handle.restart().await);
    let restarted = rx
        .wait_for(|s| s.rejected.is_none() && s.remaining_secs == 60)
        .await
        .unwrap()
        .clone();
    assert_eq!(restarted.total, 5);
    assert_eq!(restarted.phase, QuizPhase::InProgress);
}

#[tokio::test]
async fn progress_persists_through_app_services() {
    let storage = Storage::in_memory();
    {
        let catalog = Catalog::builtin().unwrap();
        let services = AppServices::with_storage(storage.clone(), catalog, fixed_clock())
            .await
            .unwrap();
        let quiz = services.quiz_loop();
        let mut session = quiz.new_session(QuizSettings::default());
        quiz.start(&mut session).await;
        let answer = session.current_question().unwrap().correct_answer.clone();
        quiz.submit_answer(&mut session, &answer).await.unwrap();
    }

    let catalog = Catalog::builtin().unwrap();
    let services = AppServices::with_storage(storage, catalog, fixed_clock())
        .await
        .unwrap();
    assert_eq!(services.progress().learned_count(), 1);
    assert_eq!(services.overview().review_count, 1);
}
