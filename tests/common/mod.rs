#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use intelliquiz::ai::{AiError, AiService, Completion, CorrectIndexPolicy, LlmProvider, ProviderKind};
use intelliquiz::db::models::NewQuiz;
use intelliquiz::db::Db;
use intelliquiz::models::{Difficulty, QuestionType, QuizStatus};

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("intelliquiz_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url).await.expect("failed to create test database")
}

pub async fn create_user(db: &Db, username: &str) -> i64 {
    db.create_user(username, "password", username, false)
        .await
        .expect("create user")
}

pub async fn create_admin(db: &Db, username: &str) -> i64 {
    db.create_user(username, "password", username, true)
        .await
        .expect("create admin")
}

/// A category with one subcategory; returns `(category_id, subcategory_id)`.
pub async fn create_catalog(db: &Db, category: &str, subcategory: &str) -> (i64, i64) {
    let category_id = db
        .create_category(category, "", "", "")
        .await
        .expect("create category");
    let subcategory_id = db
        .create_subcategory(category_id, subcategory, "", "", "")
        .await
        .expect("create subcategory");
    (category_id, subcategory_id)
}

/// A published, active quiz with `questions` questions whose first choice is
/// correct.
pub async fn create_published_quiz(db: &Db, title: &str, questions: usize) -> i64 {
    let quiz_id = db
        .create_quiz(&NewQuiz::new(title, Difficulty::Easy))
        .await
        .expect("create quiz");

    for i in 0..questions {
        db.add_question(
            quiz_id,
            &format!("Question {}", i + 1),
            QuestionType::MultipleChoice,
            1,
            &["right".to_string(), "wrong".to_string(), "also wrong".to_string()],
            Some(0),
        )
        .await
        .expect("add question");
    }

    db.set_quiz_status(quiz_id, QuizStatus::Active, true)
        .await
        .expect("publish quiz");
    quiz_id
}

/// Provider returning canned completions, recording the prompts it saw.
pub struct StubProvider {
    pub reply: Result<String, u16>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, AiError> {
        self.prompts
            .lock()
            .expect("prompt log")
            .push(prompt.to_string());

        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                meta: serde_json::json!({ "model": "stub" }),
            }),
            Err(status) => Err(AiError::Provider {
                status: *status,
                body: "stub failure".to_string(),
            }),
        }
    }
}

pub fn ai_with(provider: Arc<StubProvider>) -> Arc<AiService> {
    let provider: Arc<dyn LlmProvider> = provider;
    Arc::new(AiService::with_providers(
        vec![provider],
        None,
        CorrectIndexPolicy::Strict,
    ))
}

pub fn ai_without_providers() -> Arc<AiService> {
    Arc::new(AiService::with_providers(
        Vec::new(),
        None,
        CorrectIndexPolicy::Strict,
    ))
}
