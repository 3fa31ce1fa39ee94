use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;

use crate::db::models::{AnswerModel, AttemptModel, ChoiceModel, QuestionWithChoices, QuizModel};
use crate::db::Db;

// ---------------------------------------------------------------------------
// SessionRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait SessionRepository: Send + Sync {
    fn published_quiz(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<QuizModel>>> + Send;

    fn questions_with_choices(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<QuestionWithChoices>>> + Send;

    fn in_progress_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<AttemptModel>>> + Send;

    fn completed_attempt_count(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    fn latest_completed_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<AttemptModel>>> + Send;

    fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        total: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<AttemptModel>> + Send;

    fn answers_for_attempt(
        &self,
        attempt_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<AnswerModel>>> + Send;

    fn upsert_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected: Option<ChoiceModel>,
        time_taken: Option<i64>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn move_to_question(
        &self,
        attempt_id: i64,
        index: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn finalize_attempt(
        &self,
        attempt_id: i64,
        total: i64,
        now: DateTime<Utc>,
        time_taken: i64,
    ) -> impl std::future::Future<Output = Result<AttemptModel>> + Send;
}

impl SessionRepository for Db {
    fn published_quiz(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<QuizModel>>> + Send {
        Db::published_quiz(self, quiz_id)
    }

    fn questions_with_choices(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<QuestionWithChoices>>> + Send {
        Db::questions_with_choices(self, quiz_id)
    }

    fn in_progress_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<AttemptModel>>> + Send {
        Db::in_progress_attempt(self, user_id, quiz_id)
    }

    fn completed_attempt_count(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<i64>> + Send {
        Db::completed_attempt_count(self, user_id, quiz_id)
    }

    fn latest_completed_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<AttemptModel>>> + Send {
        Db::latest_completed_attempt(self, user_id, quiz_id)
    }

    fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        total: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<AttemptModel>> + Send {
        Db::create_attempt(self, user_id, quiz_id, total, now)
    }

    fn answers_for_attempt(
        &self,
        attempt_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<AnswerModel>>> + Send {
        Db::answers_for_attempt(self, attempt_id)
    }

    fn upsert_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected: Option<ChoiceModel>,
        time_taken: Option<i64>,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            Db::upsert_answer(self, attempt_id, question_id, selected.as_ref(), time_taken).await
        }
    }

    fn move_to_question(
        &self,
        attempt_id: i64,
        index: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        Db::move_to_question(self, attempt_id, index, now)
    }

    fn finalize_attempt(
        &self,
        attempt_id: i64,
        total: i64,
        now: DateTime<Utc>,
        time_taken: i64,
    ) -> impl std::future::Future<Output = Result<AttemptModel>> + Send {
        Db::finalize_attempt(self, attempt_id, total, now, time_taken)
    }
}

// ---------------------------------------------------------------------------
// Timing and navigation rules
// ---------------------------------------------------------------------------

/// Seconds allowed for an attempt. The standard question counts have fixed
/// limits; anything else uses the quiz's own limit in minutes.
pub fn time_limit_secs(question_count: i64, quiz_time_limit_minutes: i64) -> i64 {
    match question_count {
        5 => 300,
        10 => 600,
        15 => 720,
        20 => 900,
        _ => quiz_time_limit_minutes.max(1) * 60,
    }
}

pub fn deadline(started_at: DateTime<Utc>, limit_secs: i64) -> DateTime<Utc> {
    started_at + Duration::seconds(limit_secs)
}

/// The requested index, else the stored one, clamped to `[0, total-1]`.
pub fn clamp_index(requested: Option<i64>, current: i64, total: i64) -> i64 {
    requested.unwrap_or(current).clamp(0, (total - 1).max(0))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Nav {
    Prev,
    #[default]
    Next,
    Submit,
}

impl Nav {
    /// Unknown or missing values mean `next`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("prev") => Nav::Prev,
            Some("submit") => Nav::Submit,
            _ => Nav::Next,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCell {
    pub index: i64,
    pub answered: bool,
    pub is_current: bool,
}

/// Everything the question page renders.
#[derive(Debug, Clone)]
pub struct SessionPage {
    pub quiz: QuizModel,
    pub attempt: AttemptModel,
    pub question: QuestionWithChoices,
    pub index: i64,
    pub total: i64,
    pub selected_choice_id: Option<i64>,
    pub answered_count: i64,
    pub progress_percent: i64,
    pub review: Vec<ReviewCell>,
    pub deadline_epoch: i64,
    pub time_limit_secs: i64,
}

impl SessionPage {
    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.total - 1
    }
}

#[derive(Debug)]
pub enum SessionOutcome {
    /// Quiz missing or unpublished.
    NotFound,
    NoQuestions,
    /// The user used up `max_attempts` and has nothing in progress.
    NoAttemptsLeft,
    /// The deadline passed; the attempt was completed at the limit.
    TimeUp(AttemptModel),
    Page(Box<SessionPage>),
    /// Navigation saved; show the question at this index.
    Moved(i64),
    Finished(AttemptModel),
}

/// A POSTed question form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Submission {
    pub choice: Option<i64>,
    pub nav: Nav,
}

struct Active {
    quiz: QuizModel,
    questions: Vec<QuestionWithChoices>,
    attempt: AttemptModel,
    limit_secs: i64,
    deadline: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// QuizSessionService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct QuizSessionService<R: SessionRepository = Db> {
    repo: R,
}

impl<R: SessionRepository> QuizSessionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resolve the quiz and the user's running attempt, force-completing it
    /// once the deadline has passed. Only `open` passes `create`: a POST never
    /// starts an attempt, so a repeated final submit cannot score a new one.
    async fn activate(
        &self,
        user_id: i64,
        quiz_id: i64,
        create: bool,
        now: DateTime<Utc>,
    ) -> Result<Result<Active, SessionOutcome>> {
        let Some(quiz) = self.repo.published_quiz(quiz_id).await? else {
            return Ok(Err(SessionOutcome::NotFound));
        };

        let questions = self.repo.questions_with_choices(quiz_id).await?;
        let total = questions.len() as i64;
        if total == 0 {
            return Ok(Err(SessionOutcome::NoQuestions));
        }

        let attempt = match self.repo.in_progress_attempt(user_id, quiz_id).await? {
            Some(attempt) => attempt,
            None if !create => {
                let outcome = match self.repo.latest_completed_attempt(user_id, quiz_id).await? {
                    Some(done) => SessionOutcome::Finished(done),
                    None => SessionOutcome::Moved(0),
                };
                return Ok(Err(outcome));
            }
            None => {
                if quiz.max_attempts > 0 {
                    let used = self.repo.completed_attempt_count(user_id, quiz_id).await?;
                    if used >= quiz.max_attempts {
                        tracing::info!(
                            "user {user_id} has no attempts left on quiz {quiz_id} ({used}/{})",
                            quiz.max_attempts
                        );
                        return Ok(Err(SessionOutcome::NoAttemptsLeft));
                    }
                }
                self.repo.create_attempt(user_id, quiz_id, total, now).await?
            }
        };

        let limit_secs = time_limit_secs(total, quiz.time_limit);
        let deadline = deadline(attempt.started_at, limit_secs);

        if now >= deadline {
            tracing::info!("attempt {} ran out of time", attempt.id);
            let attempt = self
                .repo
                .finalize_attempt(attempt.id, total, now, limit_secs)
                .await?;
            return Ok(Err(SessionOutcome::TimeUp(attempt)));
        }

        Ok(Ok(Active {
            quiz,
            questions,
            attempt,
            limit_secs,
            deadline,
        }))
    }

    /// GET: the question page at `requested` (or where the user left off).
    pub async fn open(
        &self,
        user_id: i64,
        quiz_id: i64,
        requested: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome> {
        let active = match self.activate(user_id, quiz_id, true, now).await? {
            Ok(active) => active,
            Err(outcome) => return Ok(outcome),
        };

        let total = active.questions.len() as i64;
        let index = clamp_index(requested, active.attempt.current_index, total);

        if index != active.attempt.current_index {
            self.repo
                .move_to_question(active.attempt.id, index, now)
                .await?;
        }

        let answers = self.repo.answers_for_attempt(active.attempt.id).await?;
        let answered: HashSet<i64> = answers.iter().map(|a| a.question_id).collect();
        let question = active.questions[index as usize].clone();
        let selected_choice_id = answers
            .iter()
            .find(|a| a.question_id == question.question.id)
            .and_then(|a| a.selected_choice_id);

        let review = active
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| ReviewCell {
                index: i as i64,
                answered: answered.contains(&q.question.id),
                is_current: i as i64 == index,
            })
            .collect();

        let answered_count = answered.len() as i64;

        Ok(SessionOutcome::Page(Box::new(SessionPage {
            quiz: active.quiz,
            attempt: active.attempt,
            question,
            index,
            total,
            selected_choice_id,
            answered_count,
            progress_percent: answered_count * 100 / total,
            review,
            deadline_epoch: active.deadline.timestamp(),
            time_limit_secs: active.limit_secs,
        })))
    }

    /// POST: save the selection for the current question, then navigate or
    /// finalize.
    pub async fn submit(
        &self,
        user_id: i64,
        quiz_id: i64,
        requested: Option<i64>,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome> {
        let active = match self.activate(user_id, quiz_id, false, now).await? {
            Ok(active) => active,
            Err(outcome) => return Ok(outcome),
        };

        let attempt = &active.attempt;
        let total = active.questions.len() as i64;
        let index = clamp_index(requested, attempt.current_index, total);
        let current = &active.questions[index as usize];

        if let Some(choice_id) = submission.choice {
            // a choice from another question is stored as no selection
            let selected = current.choices.iter().find(|c| c.id == choice_id).cloned();
            let spent = (now - attempt.question_started_at).num_seconds().max(0);
            self.repo
                .upsert_answer(attempt.id, current.question.id, selected, Some(spent))
                .await?;
        }

        let finishing = submission.nav == Nav::Submit
            || (submission.nav == Nav::Next && index == total - 1);

        if finishing {
            let elapsed = (now - attempt.started_at).num_seconds();
            let attempt = self
                .repo
                .finalize_attempt(attempt.id, total, now, elapsed)
                .await?;
            return Ok(SessionOutcome::Finished(attempt));
        }

        let next = match submission.nav {
            Nav::Prev => (index - 1).max(0),
            _ => (index + 1).min(total - 1),
        };
        self.repo.move_to_question(attempt.id, next, now).await?;

        Ok(SessionOutcome::Moved(next))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn quiz(max_attempts: i64) -> QuizModel {
        QuizModel {
            id: 7,
            title: "Physics - Easy (AI)".to_string(),
            slug: "physics-easy-ai".to_string(),
            description: String::new(),
            category_id: Some(1),
            subcategory_id: Some(2),
            difficulty: "easy".to_string(),
            status: "active".to_string(),
            is_published: true,
            time_limit: 30,
            passing_score: 60,
            max_attempts,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    fn questions(n: i64) -> Vec<QuestionWithChoices> {
        (1..=n)
            .map(|q| QuestionWithChoices {
                question: crate::db::models::QuestionModel {
                    id: q,
                    quiz_id: 7,
                    text: format!("Question {q}"),
                    question_type: "multiple_choice".to_string(),
                    points: 1,
                },
                choices: (0..2)
                    .map(|c| ChoiceModel {
                        id: q * 10 + c,
                        question_id: q,
                        text: format!("Choice {c}"),
                        is_correct: c == 0,
                    })
                    .collect(),
            })
            .collect()
    }

    fn attempt(started: i64, current_index: i64, total: i64) -> AttemptModel {
        AttemptModel {
            id: 99,
            user_id: Some(1),
            quiz_id: 7,
            score: 0,
            correct_count: 0,
            total,
            current_index,
            is_completed: false,
            started_at: at(started),
            question_started_at: at(started),
            completed_at: None,
            time_taken: None,
        }
    }

    fn completed(mut attempt: AttemptModel, time_taken: i64) -> AttemptModel {
        attempt.is_completed = true;
        attempt.time_taken = Some(time_taken);
        attempt
    }

    fn repo_with(n: i64, running: Option<AttemptModel>) -> MockSessionRepository {
        let mut mock = MockSessionRepository::new();
        mock.expect_published_quiz()
            .returning(|_| Box::pin(async { Ok(Some(quiz(3))) }));
        mock.expect_questions_with_choices()
            .returning(move |_| Box::pin(async move { Ok(questions(n)) }));
        mock.expect_in_progress_attempt().returning(move |_, _| {
            let running = running.clone();
            Box::pin(async move { Ok(running) })
        });
        mock
    }

    // ----- rules -----

    #[test]
    fn limits_follow_question_count() {
        assert_eq!(time_limit_secs(5, 30), 300);
        assert_eq!(time_limit_secs(10, 30), 600);
        assert_eq!(time_limit_secs(15, 30), 720);
        assert_eq!(time_limit_secs(20, 30), 900);
        assert_eq!(time_limit_secs(3, 2), 120);
        assert_eq!(time_limit_secs(3, 0), 60);
    }

    #[test]
    fn index_is_clamped() {
        assert_eq!(clamp_index(Some(-3), 2, 5), 0);
        assert_eq!(clamp_index(Some(9), 2, 5), 4);
        assert_eq!(clamp_index(None, 2, 5), 2);
        assert_eq!(clamp_index(None, 0, 1), 0);
    }

    #[test]
    fn nav_defaults_to_next() {
        assert_eq!(Nav::parse(Some("prev")), Nav::Prev);
        assert_eq!(Nav::parse(Some("submit")), Nav::Submit);
        assert_eq!(Nav::parse(Some("sideways")), Nav::Next);
        assert_eq!(Nav::parse(None), Nav::Next);
    }

    // ----- open -----

    #[tokio::test]
    async fn open_unpublished_quiz_is_not_found() {
        let mut mock = MockSessionRepository::new();
        mock.expect_published_quiz()
            .returning(|_| Box::pin(async { Ok(None) }));

        let svc = QuizSessionService::new(mock);
        let outcome = svc.open(1, 7, None, at(0)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::NotFound));
    }

    #[tokio::test]
    async fn open_quiz_without_questions_reports_it() {
        let svc = QuizSessionService::new(repo_with(0, None));
        let outcome = svc.open(1, 7, None, at(0)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::NoQuestions));
    }

    #[tokio::test]
    async fn open_creates_attempt_and_renders_first_question() {
        let mut mock = repo_with(5, None);
        mock.expect_completed_attempt_count()
            .returning(|_, _| Box::pin(async { Ok(0) }));
        mock.expect_create_attempt()
            .withf(|_, _, total, _| *total == 5)
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(attempt(0, 0, 5)) }));
        mock.expect_answers_for_attempt()
            .returning(|_| Box::pin(async { Ok(vec![]) }));

        let svc = QuizSessionService::new(mock);
        let outcome = svc.open(1, 7, None, at(10)).await.unwrap();

        let SessionOutcome::Page(page) = outcome else {
            panic!("expected a question page");
        };
        assert_eq!(page.index, 0);
        assert_eq!(page.total, 5);
        assert_eq!(page.time_limit_secs, 300);
        assert_eq!(page.deadline_epoch, at(300).timestamp());
        assert_eq!(page.review.len(), 5);
        assert!(page.review[0].is_current);
    }

    #[tokio::test]
    async fn open_refuses_new_attempt_when_attempts_used_up() {
        let mut mock = repo_with(5, None);
        mock.expect_completed_attempt_count()
            .returning(|_, _| Box::pin(async { Ok(3) }));
        mock.expect_create_attempt().never();

        let svc = QuizSessionService::new(mock);
        let outcome = svc.open(1, 7, None, at(0)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::NoAttemptsLeft));
    }

    #[tokio::test]
    async fn open_after_deadline_finalizes_at_the_limit() {
        let mut mock = repo_with(10, Some(attempt(0, 3, 10)));
        mock.expect_finalize_attempt()
            .withf(|id, total, _, time_taken| *id == 99 && *total == 10 && *time_taken == 600)
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(completed(attempt(0, 3, 10), 600)) }));

        let svc = QuizSessionService::new(mock);
        let outcome = svc.open(1, 7, Some(4), at(601)).await.unwrap();

        let SessionOutcome::TimeUp(done) = outcome else {
            panic!("expected time up");
        };
        assert_eq!(done.time_taken, Some(600));
    }

    #[tokio::test]
    async fn open_preselects_previous_answer() {
        let mut mock = repo_with(5, Some(attempt(0, 1, 5)));
        mock.expect_answers_for_attempt().returning(|_| {
            Box::pin(async {
                Ok(vec![AnswerModel {
                    id: 1,
                    attempt_id: 99,
                    question_id: 2,
                    selected_choice_id: Some(21),
                    is_correct_cached: false,
                    time_taken: Some(4),
                    explanation_id: None,
                }])
            })
        });

        let svc = QuizSessionService::new(mock);
        let SessionOutcome::Page(page) = svc.open(1, 7, None, at(5)).await.unwrap() else {
            panic!("expected a question page");
        };
        assert_eq!(page.index, 1);
        assert_eq!(page.selected_choice_id, Some(21));
        assert_eq!(page.answered_count, 1);
        assert_eq!(page.progress_percent, 20);
    }

    // ----- submit -----

    #[tokio::test]
    async fn submit_next_saves_answer_and_moves_on() {
        let mut mock = repo_with(5, Some(attempt(0, 0, 5)));
        mock.expect_upsert_answer()
            .withf(|_, question_id, selected, spent| {
                *question_id == 1
                    && selected.as_ref().is_some_and(|c| c.id == 10 && c.is_correct)
                    && *spent == Some(12)
            })
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));
        mock.expect_move_to_question()
            .withf(|_, index, _| *index == 1)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let svc = QuizSessionService::new(mock);
        let submission = Submission {
            choice: Some(10),
            nav: Nav::Next,
        };
        let outcome = svc.submit(1, 7, Some(0), submission, at(12)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Moved(1)));
    }

    #[tokio::test]
    async fn submit_foreign_choice_stores_no_selection() {
        let mut mock = repo_with(5, Some(attempt(0, 2, 5)));
        mock.expect_upsert_answer()
            .withf(|_, question_id, selected, _| *question_id == 3 && selected.is_none())
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));
        mock.expect_move_to_question()
            .withf(|_, index, _| *index == 1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let svc = QuizSessionService::new(mock);
        let submission = Submission {
            choice: Some(10),
            nav: Nav::Prev,
        };
        let outcome = svc.submit(1, 7, None, submission, at(3)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Moved(1)));
    }

    #[tokio::test]
    async fn submit_next_on_last_question_finalizes() {
        let mut mock = repo_with(5, Some(attempt(0, 4, 5)));
        mock.expect_finalize_attempt()
            .withf(|_, total, _, time_taken| *total == 5 && *time_taken == 95)
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(completed(attempt(0, 4, 5), 95)) }));

        let svc = QuizSessionService::new(mock);
        let outcome = svc
            .submit(1, 7, Some(4), Submission::default(), at(95))
            .await
            .unwrap();
        assert!(matches!(outcome, SessionOutcome::Finished(_)));
    }

    #[tokio::test]
    async fn repeated_final_submit_returns_finished_attempt() {
        let mut mock = repo_with(5, None);
        mock.expect_latest_completed_attempt()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(Some(completed(attempt(0, 4, 5), 95))) }));
        mock.expect_create_attempt().never();
        mock.expect_upsert_answer().never();
        mock.expect_finalize_attempt().never();

        let svc = QuizSessionService::new(mock);
        let submission = Submission {
            choice: Some(41),
            nav: Nav::Submit,
        };
        let outcome = svc.submit(1, 7, Some(4), submission, at(97)).await.unwrap();

        let SessionOutcome::Finished(done) = outcome else {
            panic!("expected the finished attempt");
        };
        assert_eq!(done.id, 99);
        assert_eq!(done.time_taken, Some(95));
    }

    #[tokio::test]
    async fn submit_without_any_attempt_goes_back_to_the_session() {
        let mut mock = repo_with(5, None);
        mock.expect_latest_completed_attempt()
            .returning(|_, _| Box::pin(async { Ok(None) }));
        mock.expect_create_attempt().never();

        let svc = QuizSessionService::new(mock);
        let outcome = svc
            .submit(1, 7, Some(2), Submission::default(), at(0))
            .await
            .unwrap();
        assert!(matches!(outcome, SessionOutcome::Moved(0)));
    }

    #[tokio::test]
    async fn submit_after_deadline_does_not_record_answer() {
        let mut mock = repo_with(5, Some(attempt(0, 1, 5)));
        mock.expect_upsert_answer().never();
        mock.expect_finalize_attempt()
            .withf(|_, _, _, time_taken| *time_taken == 300)
            .returning(|_, _, _, _| Box::pin(async { Ok(completed(attempt(0, 1, 5), 300)) }));

        let svc = QuizSessionService::new(mock);
        let submission = Submission {
            choice: Some(20),
            nav: Nav::Next,
        };
        let outcome = svc.submit(1, 7, Some(1), submission, at(300)).await.unwrap();
        assert!(matches!(outcome, SessionOutcome::TimeUp(_)));
    }
}
