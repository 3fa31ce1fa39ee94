use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    db::models::{Category, QuizListing, Subcategory},
    models::Difficulty,
    names,
    views::components,
};

pub fn quiz_list(
    quizzes: &[QuizListing],
    categories: &[Category],
    selected_category: Option<i64>,
    notice: Option<&str>,
    locale: &str,
) -> Markup {
    html! {
        (components::notice(notice, locale))
        h1 { (t!("catalog.title", locale = locale)) }

        section {
            h2 { (t!("catalog.categories", locale = locale)) }
            div.quiz-grid {
                @for category in categories {
                    article {
                        header {
                            @if !category.icon.is_empty() { (category.icon) " " }
                            strong { (category.name) }
                        }
                        @if !category.description.is_empty() {
                            p.muted { (category.description) }
                        }
                        footer {
                            a href=(names::category_url(&category.slug)) role="button" {
                                (t!("catalog.new_quiz", locale = locale))
                            }
                            " "
                            @if selected_category == Some(category.id) {
                                a href=(names::quiz_list_url(None)) { (t!("catalog.show_all", locale = locale)) }
                            } @else {
                                a href=(format!("/?category={}", category.id)) {
                                    (t!("catalog.filter", locale = locale))
                                }
                            }
                        }
                    }
                }
            }
        }

        section {
            h2 { (t!("catalog.published", locale = locale)) }
            @if quizzes.is_empty() {
                p.muted { (t!("catalog.empty", locale = locale)) }
            }
            div.quiz-grid {
                @for quiz in quizzes {
                    (quiz_card(quiz, locale))
                }
            }
        }
    }
}

fn quiz_card(quiz: &QuizListing, locale: &str) -> Markup {
    html! {
        article {
            header {
                strong { (quiz.title) }
                " "
                (components::difficulty_badge(&quiz.difficulty, locale))
            }
            @if let Some(category) = &quiz.category_name {
                p.muted {
                    (category)
                    @if let Some(sub) = &quiz.subcategory_name { " / " (sub) }
                }
            }
            @if !quiz.description.is_empty() {
                p { (quiz.description) }
            }
            p {
                small {
                    (t!("catalog.question_count", locale = locale, count = quiz.question_count))
                    " · "
                    (t!("catalog.time_limit", locale = locale, minutes = quiz.time_limit))
                }
            }
            footer {
                a href=(names::quiz_session_url(quiz.id)) role="button" {
                    (t!("catalog.start", locale = locale))
                }
                " "
                a href=(names::take_quiz_url(quiz.id)) class="secondary" {
                    (t!("catalog.single_page", locale = locale))
                }
            }
        }
    }
}

/// Values the user entered, echoed back when validation fails.
#[derive(Debug, Default)]
pub struct SelectionForm {
    pub subcategory_id: Option<i64>,
    pub difficulty: Option<Difficulty>,
    pub num_questions: i64,
}

#[derive(Debug, Default)]
pub struct SelectionErrors {
    pub subcategory: bool,
    pub difficulty: bool,
    pub num_questions: bool,
}

impl SelectionErrors {
    pub fn any(&self) -> bool {
        self.subcategory || self.difficulty || self.num_questions
    }
}

pub fn subcategory_select(
    category: &Category,
    subcategories: &[Subcategory],
    filter: &str,
    form: &SelectionForm,
    errors: &SelectionErrors,
    locale: &str,
) -> Markup {
    let required = t!("select.required", locale = locale).to_string();

    html! {
        hgroup {
            h1 { (category.name) }
            p { (t!("select.subtitle", locale = locale)) }
        }

        form role="search" method="get" action=(names::category_url(&category.slug)) {
            input type="search" name="q" value=(filter)
                  placeholder=(t!("select.search", locale = locale))
                  aria-label=(t!("select.search", locale = locale));
            button type="submit" { (t!("select.search_btn", locale = locale)) }
        }

        form method="post" action=(names::start_quiz_url(&category.slug)) {
            fieldset {
                legend { (t!("select.subcategory", locale = locale)) }
                @if subcategories.is_empty() {
                    p.muted { (t!("select.no_subcategories", locale = locale)) }
                }
                @for sub in subcategories {
                    label {
                        input type="radio" name="subcategory" value=(sub.id)
                              checked[form.subcategory_id == Some(sub.id)];
                        (sub.name)
                        " "
                        small.muted { (t!("select.quiz_count", locale = locale, count = sub.quiz_count)) }
                    }
                }
                (components::field_error(errors.subcategory.then_some(required.as_str())))
            }

            label {
                (t!("select.difficulty", locale = locale))
                select name="difficulty" aria-invalid=[errors.difficulty.then_some("true")] {
                    option value="" { "—" }
                    @for d in Difficulty::ALL {
                        @let key = format!("difficulty.{}", d.as_str());
                        option value=(d.as_str()) selected[form.difficulty == Some(*d)] {
                            (t!(&key, locale = locale))
                        }
                    }
                }
                (components::field_error(errors.difficulty.then_some(required.as_str())))
            }

            label {
                (t!("select.num_questions", locale = locale))
                select name="num_questions" aria-invalid=[errors.num_questions.then_some("true")] {
                    @for n in names::QUESTION_COUNT_OPTIONS {
                        option value=(n) selected[form.num_questions == *n] { (n) }
                    }
                }
                (components::field_error(errors.num_questions.then_some(required.as_str())))
            }

            button type="submit" { (t!("select.continue", locale = locale)) }
        }
    }
}

/// Confirmation step of AI generation. The form posts itself on load; the
/// button is the fallback.
pub fn generate_confirm(
    category: &Category,
    subcategory: &Subcategory,
    difficulty: Difficulty,
    num_questions: i64,
    locale: &str,
) -> Markup {
    let url = names::generate_ai_url(&category.slug);
    html! {
        h1 { (t!("generate.title", locale = locale)) }
        article {
            p {
                strong { (category.name) " / " (subcategory.name) }
                " · "
                (components::difficulty_badge(difficulty.as_str(), locale))
                " · "
                (t!("catalog.question_count", locale = locale, count = num_questions))
            }
            form method="post" action=(url) hx-post=(url) hx-trigger="load, submit" hx-target="main"
                hx-sync="this:drop" hx-disabled-elt="find button" {
                button type="submit" aria-busy="true" {
                    (t!("generate.working", locale = locale))
                }
            }
            p.muted { small { (t!("generate.hint", locale = locale)) } }
        }
    }
}
