use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    db::models::{AnswerReview, AttemptModel, QuestionWithChoices, QuizModel},
    names,
    services::quiz_session::{ReviewCell, SessionPage},
    utils,
    views::components,
};

pub fn question_page(page: &SessionPage, locale: &str) -> Markup {
    let quiz_id = page.quiz.id;
    let action = names::quiz_session_question_url(quiz_id, page.index);

    html! {
        div.session-bar {
            hgroup {
                h2 { (page.quiz.title) }
                p {
                    (t!("session.question_of", locale = locale, current = page.index + 1, total = page.total))
                }
            }
            span id="timer" class="timer" data-deadline=(page.deadline_epoch) {
                (utils::format_clock(Some(page.time_limit_secs)))
            }
        }

        progress value=(page.answered_count) max=(page.total) {}
        small.muted {
            (t!("session.answered", locale = locale, answered = page.answered_count, total = page.total))
            " (" (page.progress_percent) "%)"
        }

        article {
            h3 { (page.question.question.text) }
            form method="post" action=(action) {
                fieldset {
                    @for choice in &page.question.choices {
                        label {
                            input type="radio" name="choice" value=(choice.id)
                                  checked[page.selected_choice_id == Some(choice.id)];
                            (choice.text)
                        }
                    }
                }
                div.nav-buttons {
                    @if page.has_prev() {
                        button type="submit" name="nav" value="prev" class="secondary" {
                            (t!("session.prev", locale = locale))
                        }
                    } @else {
                        span {}
                    }
                    @if page.is_last() {
                        button type="submit" name="nav" value="submit" {
                            (t!("session.submit", locale = locale))
                        }
                    } @else {
                        div {
                            button type="submit" name="nav" value="submit" class="outline" {
                                (t!("session.finish_now", locale = locale))
                            }
                            " "
                            button type="submit" name="nav" value="next" {
                                (t!("session.next", locale = locale))
                            }
                        }
                    }
                }
            }
        }

        nav.review-map aria-label=(t!("session.review", locale = locale)) {
            @for cell in &page.review {
                a href=(names::quiz_session_question_url(quiz_id, cell.index))
                  class=(review_class(cell)) {
                    (cell.index + 1)
                }
            }
        }

        script src="/static/js/session.js" {}
    }
}

fn review_class(cell: &ReviewCell) -> &'static str {
    match (cell.answered, cell.is_current) {
        (true, true) => "answered current",
        (true, false) => "answered",
        (false, true) => "current",
        (false, false) => "",
    }
}

/// Every question on one page; scored when the form is posted.
pub fn take_page(quiz: &QuizModel, questions: &[QuestionWithChoices], locale: &str) -> Markup {
    html! {
        hgroup {
            h1 { (quiz.title) }
            p { (components::difficulty_badge(&quiz.difficulty, locale)) }
        }
        form method="post" action=(names::take_quiz_url(quiz.id)) {
            @for (i, q) in questions.iter().enumerate() {
                article {
                    h4 { (i + 1) ". " (q.question.text) }
                    fieldset {
                        @for choice in &q.choices {
                            label {
                                input type="radio"
                                      name=(format!("question_{}", q.question.id))
                                      value=(choice.id);
                                (choice.text)
                            }
                        }
                    }
                }
            }
            button type="submit" { (t!("session.submit", locale = locale)) }
        }
    }
}

pub fn result_page(
    quiz: &QuizModel,
    attempt: &AttemptModel,
    reviews: &[AnswerReview],
    notice: Option<&str>,
    locale: &str,
) -> Markup {
    let passed = attempt.score >= quiz.passing_score;
    let seconds = crate::services::stats::attempt_seconds(
        attempt.time_taken,
        attempt.started_at,
        attempt.completed_at,
    );

    html! {
        (components::notice(notice, locale))
        hgroup {
            h1 { (quiz.title) }
            p { (t!("result.subtitle", locale = locale)) }
        }

        article {
            h2 class=(if passed { "correct" } else { "wrong" }) {
                (attempt.score) "%"
            }
            p {
                (t!("result.correct_of", locale = locale, correct = attempt.correct_count, total = attempt.total))
                " · "
                (t!("result.time", locale = locale, time = utils::format_clock(Some(seconds))))
            }
            p {
                @if passed {
                    strong.correct { (t!("result.passed", locale = locale, passing = quiz.passing_score)) }
                } @else {
                    strong.wrong { (t!("result.failed", locale = locale, passing = quiz.passing_score)) }
                }
            }
        }

        h3 { (t!("result.review", locale = locale)) }
        @for (i, review) in reviews.iter().enumerate() {
            article {
                p {
                    strong { (i + 1) ". " (review.question_text) }
                }
                p {
                    (t!("result.your_answer", locale = locale)) ": "
                    @match &review.selected_text {
                        Some(text) => {
                            span class=(if review.is_correct { "correct" } else { "wrong" }) { (text) }
                        }
                        None => {
                            span.muted { (t!("result.no_answer", locale = locale)) }
                        }
                    }
                }
                @if !review.is_correct {
                    p {
                        (t!("result.correct_answer", locale = locale)) ": "
                        span.correct { (review.correct_text.as_deref().unwrap_or("—")) }
                    }
                }
                @if let Some(answer_id) = review.answer_id {
                    div id=(format!("explanation-{answer_id}")) {
                        button class="outline secondary"
                               hx-get=(names::explanation_url(answer_id))
                               hx-target=(format!("#explanation-{answer_id}"))
                               hx-swap="innerHTML" {
                            (t!("result.explain", locale = locale))
                        }
                    }
                }
            }
        }

        p {
            a href=(names::quiz_list_url(None)) role="button" { (t!("result.back", locale = locale)) }
            " "
            a href=(names::HISTORY_URL) class="secondary" { (t!("nav.history", locale = locale)) }
        }
    }
}
