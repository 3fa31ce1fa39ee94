pub const LOGIN_URL: &str = "/login";
pub const LOGOUT_URL: &str = "/logout";
pub const HISTORY_URL: &str = "/dashboard/history";
pub const STATS_URL: &str = "/dashboard/stats";
pub const LEADERBOARD_URL: &str = "/dashboard/leaderboard";
pub const ADMIN_URL: &str = "/admin";
pub const ADMIN_CATEGORIES_URL: &str = "/admin/categories";
pub const ADMIN_QUIZZES_URL: &str = "/admin/quizzes";

pub const USER_SESSION_COOKIE_NAME: &str = "user_session";
pub const PENDING_REQUEST_COOKIE_NAME: &str = "pending_quiz";

pub fn quiz_list_url(notice: Option<&str>) -> String {
    match notice {
        Some(notice) => format!("/?notice={notice}"),
        None => "/".to_string(),
    }
}

pub fn category_url(slug: &str) -> String {
    format!("/categories/{slug}")
}

pub fn start_quiz_url(slug: &str) -> String {
    format!("/categories/{slug}/start")
}

pub fn generate_ai_url(slug: &str) -> String {
    format!("/categories/{slug}/generate-ai")
}

pub fn quiz_session_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/session")
}

pub fn quiz_session_question_url(quiz_id: i64, idx: i64) -> String {
    format!("/quizzes/{quiz_id}/session?q={idx}")
}

pub fn take_quiz_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/take")
}

pub fn result_url(attempt_id: i64) -> String {
    format!("/attempts/{attempt_id}/result")
}

pub fn result_url_with_notice(attempt_id: i64, notice: &str) -> String {
    format!("/attempts/{attempt_id}/result?notice={notice}")
}

pub fn explanation_url(answer_id: i64) -> String {
    format!("/answers/{answer_id}/explanation")
}

pub fn admin_subcategories_url(category_id: i64) -> String {
    format!("/admin/categories/{category_id}/subcategories")
}

pub fn admin_quiz_status_url(quiz_id: i64) -> String {
    format!("/admin/quizzes/{quiz_id}/status")
}

pub fn admin_draft_url(draft_id: i64) -> String {
    format!("/admin/drafts/{draft_id}")
}

pub fn admin_draft_import_url(draft_id: i64) -> String {
    format!("/admin/drafts/{draft_id}/import")
}

pub fn admin_draft_reject_url(draft_id: i64) -> String {
    format!("/admin/drafts/{draft_id}/reject")
}

// Quiz selection defaults
pub const QUESTION_COUNT_OPTIONS: &[i64] = &[5, 10, 15, 20];
pub const DEFAULT_QUESTION_COUNT: i64 = 5;
pub const PENDING_REQUEST_TTL_MINUTES: i64 = 30;

// Dashboard
pub const SCORE_SERIES_LEN: usize = 12;
pub const LEADERBOARD_SIZE: usize = 50;

// Notices carried across redirects
pub const NOTICE_TIME_UP: &str = "time_up";
pub const NOTICE_SUBMITTED: &str = "submitted";
pub const NOTICE_NO_QUESTIONS: &str = "no_questions";
pub const NOTICE_AI_FAILED: &str = "ai_failed";
pub const NOTICE_AI_DRAFT_SAVED: &str = "ai_draft_saved";
pub const NOTICE_NO_PENDING: &str = "no_pending";
pub const NOTICE_NO_ATTEMPTS_LEFT: &str = "no_attempts_left";

// i18n
pub const LOCALE_COOKIE_NAME: &str = "lang";
pub const DEFAULT_LOCALE: &str = "en";
pub const SET_LOCALE_URL: &str = "/set-locale";
