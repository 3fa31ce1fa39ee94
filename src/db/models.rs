// Database model structs

use chrono::{DateTime, Utc};

use crate::models::{Difficulty, ParsedDraft, Resource};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subcategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub quiz_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuizModel {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub difficulty: String,
    pub status: String,
    pub is_published: bool,
    pub time_limit: i64,
    pub passing_score: i64,
    pub max_attempts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin (or the generation flow) supplies for a new quiz.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub difficulty: Difficulty,
    pub time_limit: i64,
    pub passing_score: i64,
    pub max_attempts: i64,
}

impl NewQuiz {
    pub fn new(title: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category_id: None,
            subcategory_id: None,
            difficulty,
            time_limit: 30,
            passing_score: 60,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuizListing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub status: String,
    pub is_published: bool,
    pub time_limit: i64,
    pub category_name: Option<String>,
    pub subcategory_name: Option<String>,
    pub question_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionModel {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub question_type: String,
    pub points: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChoiceModel {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct QuestionWithChoices {
    pub question: QuestionModel,
    pub choices: Vec<ChoiceModel>,
}

impl QuestionWithChoices {
    pub fn correct_choice(&self) -> Option<&ChoiceModel> {
        self.choices.iter().find(|c| c.is_correct)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptModel {
    pub id: i64,
    pub user_id: Option<i64>,
    pub quiz_id: i64,
    pub score: i64,
    pub correct_count: i64,
    pub total: i64,
    pub current_index: i64,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    pub question_started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerModel {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_choice_id: Option<i64>,
    pub is_correct_cached: bool,
    pub time_taken: Option<i64>,
    pub explanation_id: Option<i64>,
}

/// One row of the result page: every question of the quiz, answered or not.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerReview {
    pub question_id: i64,
    pub question_text: String,
    pub answer_id: Option<i64>,
    pub selected_text: Option<String>,
    pub correct_text: Option<String>,
    pub is_correct: bool,
    pub time_taken: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExplanationModel {
    pub id: i64,
    pub question_id: i64,
    pub summary: String,
    pub resources: String,
    pub provider: String,
    pub helpful: i64,
    pub not_helpful: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExplanationModel {
    pub fn resources(&self) -> Vec<Resource> {
        serde_json::from_str(&self.resources).unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DraftModel {
    pub id: i64,
    pub provider: String,
    pub prompt: String,
    pub raw_response: String,
    pub parsed: String,
    pub meta: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub difficulty: String,
    pub num_questions: i64,
    pub target_quiz_id: Option<i64>,
    pub created_by: Option<i64>,
    pub approved: bool,
    pub rejected: bool,
    pub error: String,
    pub created_at: DateTime<Utc>,
}

impl DraftModel {
    pub fn parsed(&self) -> ParsedDraft {
        serde_json::from_str(&self.parsed).unwrap_or_default()
    }

    pub fn is_pending(&self) -> bool {
        !self.approved && !self.rejected
    }
}

/// Everything a draft row records about one generation call.
#[derive(Debug, Clone, Default)]
pub struct NewDraft {
    pub provider: String,
    pub prompt: String,
    pub raw_response: String,
    pub parsed: ParsedDraft,
    pub meta: serde_json::Value,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub difficulty: String,
    pub num_questions: i64,
    pub created_by: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingQuizRequest {
    pub token: String,
    pub user_id: i64,
    pub category_slug: String,
    pub subcategory_id: i64,
    pub difficulty: String,
    pub num_questions: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompletedAttemptRow {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub category_name: Option<String>,
    pub score: i64,
    pub correct_count: i64,
    pub total: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub category_name: Option<String>,
    pub score: i64,
    pub total: i64,
    pub current_index: i64,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeerCount {
    pub quiz_id: i64,
    pub ongoing: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardAttemptRow {
    pub user_id: i64,
    pub display_name: String,
    pub score: i64,
    pub correct_count: i64,
    pub total: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}
