mod common;

use chrono::Utc;
use common::{ai_with, ai_without_providers, create_catalog, create_test_db, create_user, StubProvider};
use intelliquiz::db::models::NewDraft;
use intelliquiz::models::{Difficulty, DraftItem, ParsedDraft};
use intelliquiz::services::generation::{
    DraftReviewOutcome, ExplanationOutcome, GenerationOutcome, GenerationService, Selection,
};

const THREE_ITEMS: &str = r#"```json
{"items": [
  {"question": "Which keyword declares an immutable binding?", "choices": ["let", "mut", "static"], "correct_index": 0},
  {"question": "What does Option::None mean?", "choices": ["an error", "no value"], "correct": "B"},
  {"question": "Which trait enables {:?} formatting?", "choices": ["Display", "Debug", "Clone"], "correct_index": "1"}
]}
```"#;

async fn selection_fixture(
    db: &intelliquiz::db::Db,
) -> (
    intelliquiz::db::models::Category,
    intelliquiz::db::models::Subcategory,
) {
    let (category_id, subcategory_id) = create_catalog(db, "Languages", "Rust").await;
    let category = db
        .category(category_id)
        .await
        .expect("category")
        .expect("exists");
    let subcategory = db
        .subcategory(subcategory_id)
        .await
        .expect("subcategory")
        .expect("exists");
    (category, subcategory)
}

#[tokio::test]
async fn generated_items_become_a_published_quiz() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "alice").await;
    let (category, subcategory) = selection_fixture(&db).await;
    let provider = StubProvider::replying(THREE_ITEMS);
    let service = GenerationService::new(db.clone(), ai_with(provider.clone()));

    let outcome = service
        .generate(
            user_id,
            &Selection {
                category: &category,
                subcategory: &subcategory,
                difficulty: Difficulty::Medium,
                num_questions: 5,
            },
        )
        .await
        .expect("generate");

    let GenerationOutcome::QuizReady(quiz_id) = outcome else {
        panic!("expected a ready quiz, got {outcome:?}");
    };

    let quiz = db
        .published_quiz(quiz_id)
        .await
        .expect("quiz")
        .expect("published");
    assert_eq!(quiz.title, "Rust - Medium (AI)");
    assert_eq!(quiz.status, "active");
    assert_eq!(quiz.category_id, Some(category.id));
    assert_eq!(quiz.subcategory_id, Some(subcategory.id));

    let questions = db.questions_with_choices(quiz_id).await.expect("questions");
    assert_eq!(questions.len(), 3);
    assert_eq!(
        questions[1].correct_choice().map(|c| c.text.as_str()),
        Some("no value")
    );

    let prompts = provider.prompts.lock().expect("prompt log");
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Languages - Rust"));

    let drafts = db.drafts(false).await.expect("drafts");
    assert_eq!(drafts.len(), 1);
    assert!(drafts[0].approved);
    assert_eq!(drafts[0].target_quiz_id, Some(quiz_id));
    assert_eq!(drafts[0].provider, "openai");
    assert_eq!(drafts[0].created_by, Some(user_id));
}

#[tokio::test]
async fn provider_failure_is_recorded_as_a_draft() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "bob").await;
    let (category, subcategory) = selection_fixture(&db).await;
    let service = GenerationService::new(db.clone(), ai_with(StubProvider::failing(503)));

    let outcome = service
        .generate(
            user_id,
            &Selection {
                category: &category,
                subcategory: &subcategory,
                difficulty: Difficulty::Hard,
                num_questions: 10,
            },
        )
        .await
        .expect("generate");

    let GenerationOutcome::Failed(draft_id) = outcome else {
        panic!("expected a failure, got {outcome:?}");
    };
    let draft = db.draft(draft_id).await.expect("draft").expect("exists");
    assert!(draft.error.contains("503"));
    assert_eq!(draft.provider, "openai");
    assert!(!draft.prompt.is_empty());
    assert!(draft.is_pending());
    assert!(db.all_quizzes().await.expect("quizzes").is_empty());
}

#[tokio::test]
async fn missing_provider_is_recorded_as_a_draft() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "carol").await;
    let (category, subcategory) = selection_fixture(&db).await;
    let service = GenerationService::new(db.clone(), ai_without_providers());

    let outcome = service
        .generate(
            user_id,
            &Selection {
                category: &category,
                subcategory: &subcategory,
                difficulty: Difficulty::Easy,
                num_questions: 5,
            },
        )
        .await
        .expect("generate");

    let GenerationOutcome::Failed(draft_id) = outcome else {
        panic!("expected a failure, got {outcome:?}");
    };
    let draft = db.draft(draft_id).await.expect("draft").expect("exists");
    assert_eq!(draft.provider, "");
    assert!(!draft.error.is_empty());
}

#[tokio::test]
async fn unusable_output_leaves_a_draft_for_review() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "dave").await;
    let (category, subcategory) = selection_fixture(&db).await;
    let service = GenerationService::new(
        db.clone(),
        ai_with(StubProvider::replying("Sorry, I cannot help with that.")),
    );

    let outcome = service
        .generate(
            user_id,
            &Selection {
                category: &category,
                subcategory: &subcategory,
                difficulty: Difficulty::Easy,
                num_questions: 5,
            },
        )
        .await
        .expect("generate");

    let GenerationOutcome::DraftSaved(draft_id) = outcome else {
        panic!("expected a saved draft, got {outcome:?}");
    };
    assert_eq!(
        service.import_draft(draft_id).await.expect("import"),
        DraftReviewOutcome::NothingImportable
    );
}

#[tokio::test]
async fn admin_review_imports_or_rejects_pending_drafts() {
    let db = create_test_db().await;
    let (category_id, subcategory_id) = create_catalog(&db, "Languages", "Rust").await;
    let service = GenerationService::new(db.clone(), ai_without_providers());

    let parsed = ParsedDraft {
        items: vec![
            DraftItem {
                question: "Is Rust memory safe?".to_string(),
                choices: vec!["yes".to_string(), "no".to_string()],
                correct_index: 0,
                points: 1,
                explanation: String::new(),
            },
            DraftItem {
                question: "Broken".to_string(),
                choices: Vec::new(),
                correct_index: 0,
                points: 1,
                explanation: String::new(),
            },
        ],
    };
    let draft = NewDraft {
        provider: "anthropic".to_string(),
        parsed,
        category_id: Some(category_id),
        subcategory_id: Some(subcategory_id),
        difficulty: "hard".to_string(),
        num_questions: 2,
        ..NewDraft::default()
    };
    let import_id = db.create_draft(&draft).await.expect("draft");
    let reject_id = db.create_draft(&draft).await.expect("draft");

    let DraftReviewOutcome::Imported { quiz_id, questions } =
        service.import_draft(import_id).await.expect("import")
    else {
        panic!("expected an import");
    };
    assert_eq!(questions, 1);

    let quiz = db.quiz(quiz_id).await.expect("quiz").expect("exists");
    assert_eq!(quiz.title, "Rust - Hard (AI)");
    assert!(!quiz.is_published);
    assert_eq!(
        service.import_draft(import_id).await.expect("again"),
        DraftReviewOutcome::AlreadyReviewed
    );

    assert_eq!(
        service.reject_draft(reject_id).await.expect("reject"),
        DraftReviewOutcome::Rejected
    );
    let rejected = db.draft(reject_id).await.expect("draft").expect("exists");
    assert!(rejected.rejected);
    assert_eq!(
        service.import_draft(reject_id).await.expect("import rejected"),
        DraftReviewOutcome::AlreadyReviewed
    );
    assert_eq!(
        service.reject_draft(9999).await.expect("missing"),
        DraftReviewOutcome::NotFound
    );
}

#[tokio::test]
async fn explanations_are_generated_once_and_shared() {
    let db = create_test_db().await;
    let owner = create_user(&db, "erin").await;
    let other = create_user(&db, "frank").await;
    let quiz_id = common::create_published_quiz(&db, "Explained", 2).await;
    let questions = db.questions_with_choices(quiz_id).await.expect("questions");
    let attempt = db
        .submit_full_attempt(owner, quiz_id, &questions, &Default::default(), Utc::now())
        .await
        .expect("submit");
    let answer_id = db
        .answer_reviews(attempt.id, quiz_id)
        .await
        .expect("reviews")[0]
        .answer_id
        .expect("answer row");

    let provider = StubProvider::replying(
        r#"{"summary": "The first choice is right.", "resources": [{"title": "Docs", "url": "https://doc.rust-lang.org"}, {"title": "Bad", "url": "ftp://nope"}]}"#,
    );
    let service = GenerationService::new(db.clone(), ai_with(provider.clone()));

    let ExplanationOutcome::Ready(first) = service
        .explanation_for_answer(answer_id, owner)
        .await
        .expect("explain")
    else {
        panic!("expected an explanation");
    };
    assert_eq!(first.summary, "The first choice is right.");
    assert_eq!(first.resources().len(), 1);

    let ExplanationOutcome::Ready(second) = service
        .explanation_for_answer(answer_id, owner)
        .await
        .expect("explain again")
    else {
        panic!("expected an explanation");
    };
    assert_eq!(second.id, first.id);
    assert_eq!(provider.prompts.lock().expect("prompt log").len(), 1);

    assert!(matches!(
        service
            .explanation_for_answer(answer_id, other)
            .await
            .expect("foreign"),
        ExplanationOutcome::NotFound
    ));

    let rated = service
        .rate_explanation(answer_id, owner, true)
        .await
        .expect("rate")
        .expect("explanation exists");
    assert_eq!(rated.helpful, 1);
    assert_eq!(rated.not_helpful, 0);
    assert!(service
        .rate_explanation(answer_id, other, false)
        .await
        .expect("foreign rate")
        .is_none());
}
