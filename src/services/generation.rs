use std::sync::Arc;

use color_eyre::Result;

use crate::ai::prompt::ExplanationContext;
use crate::ai::AiService;
use crate::db::models::{Category, DraftModel, ExplanationModel, NewDraft, NewQuiz, Subcategory};
use crate::db::Db;
use crate::models::{Difficulty, QuizStatus};

#[derive(Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A quiz was created from the draft, published, and is ready to take.
    QuizReady(i64),
    /// The provider answered but nothing was importable; the draft waits for
    /// an admin.
    DraftSaved(i64),
    /// The provider call failed; the draft records the error.
    Failed(i64),
}

#[derive(Debug, PartialEq, Eq)]
pub enum DraftReviewOutcome {
    Imported { quiz_id: i64, questions: usize },
    Rejected,
    NothingImportable,
    AlreadyReviewed,
    NotFound,
}

#[derive(Debug)]
pub enum ExplanationOutcome {
    Ready(ExplanationModel),
    NotFound,
    /// No explanation exists and the provider could not produce one.
    Unavailable(String),
}

/// What the user picked on the subcategory page.
pub struct Selection<'a> {
    pub category: &'a Category,
    pub subcategory: &'a Subcategory,
    pub difficulty: Difficulty,
    pub num_questions: i64,
}

#[derive(Clone)]
pub struct GenerationService {
    db: Db,
    ai: Arc<AiService>,
}

impl GenerationService {
    pub fn new(db: Db, ai: Arc<AiService>) -> Self {
        Self { db, ai }
    }

    /// Ask a provider for questions, record the draft, and turn a usable
    /// draft into a published quiz. Provider failures never escape as
    /// errors; only storage failures do.
    pub async fn generate(&self, user_id: i64, selection: &Selection<'_>) -> Result<GenerationOutcome> {
        let Selection {
            category,
            subcategory,
            difficulty,
            num_questions,
        } = *selection;

        let topic = format!("{} - {}", category.name, subcategory.name);
        let draft = NewDraft {
            category_id: Some(category.id),
            subcategory_id: Some(subcategory.id),
            difficulty: difficulty.to_string(),
            num_questions,
            created_by: Some(user_id),
            ..NewDraft::default()
        };

        let generated = match self
            .ai
            .generate_questions(&topic, difficulty, num_questions, None)
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!("question generation for {topic:?} failed: {e}");
                let draft_id = self
                    .db
                    .create_draft(&NewDraft {
                        provider: e.provider.map(|p| p.to_string()).unwrap_or_default(),
                        prompt: e.prompt.clone(),
                        error: e.to_string(),
                        ..draft
                    })
                    .await?;
                return Ok(GenerationOutcome::Failed(draft_id));
            }
        };

        let items = generated.parsed.items.clone();
        let draft_id = self
            .db
            .create_draft(&NewDraft {
                provider: generated.provider.to_string(),
                prompt: generated.prompt,
                raw_response: generated.raw,
                parsed: generated.parsed,
                meta: generated.meta,
                ..draft
            })
            .await?;

        if items.is_empty() {
            return Ok(GenerationOutcome::DraftSaved(draft_id));
        }

        let quiz = NewQuiz {
            description: format!(
                "Auto-generated quiz for {} / {}",
                category.name, subcategory.name
            ),
            category_id: Some(category.id),
            subcategory_id: Some(subcategory.id),
            ..NewQuiz::new(
                format!("{} - {} (AI)", subcategory.name, difficulty.title()),
                difficulty,
            )
        };
        let quiz_id = self.db.create_quiz(&quiz).await?;
        self.db.set_draft_target(draft_id, quiz_id).await?;

        let created = self.db.import_draft_items(quiz_id, &items).await?;
        if created.is_empty() {
            tracing::warn!("draft {draft_id} had no importable items");
            return Ok(GenerationOutcome::DraftSaved(draft_id));
        }

        self.db
            .set_quiz_status(quiz_id, QuizStatus::Active, true)
            .await?;
        self.db.approve_draft(draft_id).await?;

        Ok(GenerationOutcome::QuizReady(quiz_id))
    }

    /// Import a pending draft into its target quiz, creating one when the
    /// draft has none. The quiz keeps its status; publishing is a separate
    /// admin step.
    pub async fn import_draft(&self, draft_id: i64) -> Result<DraftReviewOutcome> {
        let Some(draft) = self.db.draft(draft_id).await? else {
            return Ok(DraftReviewOutcome::NotFound);
        };
        if !draft.is_pending() {
            return Ok(DraftReviewOutcome::AlreadyReviewed);
        }

        let items = draft.parsed().items;
        if !items.iter().any(crate::db::is_importable) {
            return Ok(DraftReviewOutcome::NothingImportable);
        }

        let quiz_id = match draft.target_quiz_id {
            Some(quiz_id) => quiz_id,
            None => {
                let quiz_id = self.db.create_quiz(&self.quiz_for_draft(&draft).await?).await?;
                self.db.set_draft_target(draft_id, quiz_id).await?;
                quiz_id
            }
        };

        let created = self.db.import_draft_items(quiz_id, &items).await?;
        self.db.approve_draft(draft_id).await?;

        Ok(DraftReviewOutcome::Imported {
            quiz_id,
            questions: created.len(),
        })
    }

    pub async fn reject_draft(&self, draft_id: i64) -> Result<DraftReviewOutcome> {
        let Some(draft) = self.db.draft(draft_id).await? else {
            return Ok(DraftReviewOutcome::NotFound);
        };
        if !draft.is_pending() {
            return Ok(DraftReviewOutcome::AlreadyReviewed);
        }

        self.db.reject_draft(draft_id).await?;
        Ok(DraftReviewOutcome::Rejected)
    }

    async fn quiz_for_draft(&self, draft: &DraftModel) -> Result<NewQuiz> {
        let difficulty = draft.difficulty.parse().unwrap_or(Difficulty::Medium);

        let subcategory = match draft.subcategory_id {
            Some(id) => self.db.subcategory(id).await?,
            None => None,
        };
        let title_part = match (&subcategory, draft.category_id) {
            (Some(sub), _) => sub.name.clone(),
            (None, Some(category_id)) => self
                .db
                .category(category_id)
                .await?
                .map(|c| c.name)
                .unwrap_or_else(|| format!("Draft {}", draft.id)),
            (None, None) => format!("Draft {}", draft.id),
        };

        Ok(NewQuiz {
            category_id: draft.category_id,
            subcategory_id: subcategory.map(|s| s.id),
            ..NewQuiz::new(
                format!("{title_part} - {} (AI)", difficulty.title()),
                difficulty,
            )
        })
    }

    /// The question's shared explanation, generated on first request and
    /// linked to the answer. Only the answer's owner may ask.
    pub async fn explanation_for_answer(
        &self,
        answer_id: i64,
        user_id: i64,
    ) -> Result<ExplanationOutcome> {
        let Some(answer) = self.db.answer_for_user(answer_id, user_id).await? else {
            return Ok(ExplanationOutcome::NotFound);
        };

        let explanation = match self.db.explanation_for_question(answer.question_id).await? {
            Some(explanation) => explanation,
            None => {
                let Some(question) = self.db.question_with_choices(answer.question_id).await? else {
                    return Ok(ExplanationOutcome::NotFound);
                };

                let choices: Vec<String> =
                    question.choices.iter().map(|c| c.text.clone()).collect();
                let selected = answer
                    .selected_choice_id
                    .and_then(|id| question.choices.iter().find(|c| c.id == id))
                    .map(|c| c.text.as_str());
                let ctx = ExplanationContext {
                    question: &question.question.text,
                    choices: &choices,
                    correct: question.correct_choice().map(|c| c.text.as_str()),
                    selected,
                };

                match self.ai.explain(&ctx).await {
                    Ok(generated) => {
                        self.db
                            .create_explanation(
                                answer.question_id,
                                &generated.summary,
                                &generated.resources,
                                generated.provider.as_str(),
                            )
                            .await?
                    }
                    Err(e) => {
                        tracing::error!("explanation for answer {answer_id} failed: {e}");
                        return Ok(ExplanationOutcome::Unavailable(e.to_string()));
                    }
                }
            }
        };

        if answer.explanation_id != Some(explanation.id) {
            self.db
                .set_answer_explanation(answer.id, explanation.id)
                .await?;
        }

        Ok(ExplanationOutcome::Ready(explanation))
    }

    /// Count a helpful / not helpful vote on the answer's explanation.
    /// `None` when there is nothing to rate.
    pub async fn rate_explanation(
        &self,
        answer_id: i64,
        user_id: i64,
        helpful: bool,
    ) -> Result<Option<ExplanationModel>> {
        let Some(answer) = self.db.answer_for_user(answer_id, user_id).await? else {
            return Ok(None);
        };

        let explanation = match answer.explanation_id {
            Some(id) => self.db.explanation(id).await?,
            None => self.db.explanation_for_question(answer.question_id).await?,
        };
        let Some(explanation) = explanation else {
            return Ok(None);
        };

        self.db
            .record_explanation_feedback(explanation.id, helpful)
            .await?;
        self.db.explanation(explanation.id).await
    }
}
