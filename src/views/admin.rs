use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    db::{
        is_importable,
        models::{Category, DraftModel, QuizListing, Subcategory},
    },
    models::{Difficulty, QuizStatus},
    names,
};

/// Outcome of the last admin form, shown above the dashboard.
pub enum AdminMessage {
    Saved,
    Error(String),
}

pub struct CatalogTree {
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

fn message(message: Option<&AdminMessage>, locale: &str) -> Markup {
    html! {
        @match message {
            Some(AdminMessage::Saved) => {
                p.notice role="status" { (t!("admin.saved", locale = locale)) }
            }
            Some(AdminMessage::Error(error)) => {
                p.notice.error role="alert" { (error) }
            }
            None => {}
        }
    }
}

fn name_fields(locale: &str) -> Markup {
    html! {
        div.grid {
            input name="name" type="text" required="true"
                  placeholder=(t!("admin.name", locale = locale))
                  aria-label=(t!("admin.name", locale = locale));
            input name="slug" type="text"
                  placeholder=(t!("admin.slug", locale = locale))
                  aria-label=(t!("admin.slug", locale = locale));
            input name="icon" type="text"
                  placeholder=(t!("admin.icon", locale = locale))
                  aria-label=(t!("admin.icon", locale = locale));
        }
        input name="description" type="text"
              placeholder=(t!("admin.description", locale = locale))
              aria-label=(t!("admin.description", locale = locale));
    }
}

fn catalog(tree: &[CatalogTree], locale: &str) -> Markup {
    html! {
        section {
            h2 { (t!("admin.categories", locale = locale)) }
            @for node in tree {
                details {
                    summary {
                        @if !node.category.icon.is_empty() { (node.category.icon) " " }
                        (node.category.name) " "
                        small.muted { "/" (node.category.slug) }
                    }
                    ul {
                        @for sub in &node.subcategories {
                            li { (sub.name) " " small.muted { "(" (sub.slug) ")" } }
                        }
                    }
                    form method="post" action=(names::admin_subcategories_url(node.category.id)) {
                        (name_fields(locale))
                        button type="submit" class="secondary" {
                            (t!("admin.add_subcategory", locale = locale))
                        }
                    }
                }
            }

            form method="post" action=(names::ADMIN_CATEGORIES_URL) {
                fieldset {
                    legend { (t!("admin.new_category", locale = locale)) }
                    (name_fields(locale))
                }
                button type="submit" { (t!("admin.add_category", locale = locale)) }
            }
        }
    }
}

fn new_quiz_form(tree: &[CatalogTree], locale: &str) -> Markup {
    html! {
        form method="post" action=(names::ADMIN_QUIZZES_URL) {
            fieldset {
                legend { (t!("admin.new_quiz", locale = locale)) }
                input name="title" type="text" required="true"
                      placeholder=(t!("admin.quiz_title", locale = locale))
                      aria-label=(t!("admin.quiz_title", locale = locale));
                input name="description" type="text"
                      placeholder=(t!("admin.description", locale = locale))
                      aria-label=(t!("admin.description", locale = locale));
                div.grid {
                    select name="subcategory" aria-label=(t!("select.subcategory", locale = locale)) {
                        option value="" { (t!("admin.no_subcategory", locale = locale)) }
                        @for node in tree {
                            optgroup label=(node.category.name) {
                                @for sub in &node.subcategories {
                                    option value=(sub.id) { (sub.name) }
                                }
                            }
                        }
                    }
                    select name="difficulty" aria-label=(t!("select.difficulty", locale = locale)) {
                        @for d in Difficulty::ALL {
                            @let key = format!("difficulty.{}", d.as_str());
                            option value=(d.as_str()) selected[*d == Difficulty::Medium] {
                                (t!(&key, locale = locale))
                            }
                        }
                    }
                }
                div.grid {
                    label {
                        (t!("admin.time_limit", locale = locale))
                        input name="time_limit" type="number" min="1" value="30";
                    }
                    label {
                        (t!("admin.passing_score", locale = locale))
                        input name="passing_score" type="number" min="0" max="100" value="60";
                    }
                    label {
                        (t!("admin.max_attempts", locale = locale))
                        input name="max_attempts" type="number" min="0" value="3";
                    }
                }
            }
            button type="submit" { (t!("admin.create_quiz", locale = locale)) }
        }
    }
}

fn quiz_table(quizzes: &[QuizListing], locale: &str) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { (t!("admin.quiz_title", locale = locale)) }
                    th { (t!("history.category", locale = locale)) }
                    th { (t!("admin.questions", locale = locale)) }
                    th { (t!("admin.status", locale = locale)) }
                }
            }
            tbody {
                @for quiz in quizzes {
                    tr {
                        td { (quiz.title) }
                        td {
                            (quiz.category_name.as_deref().unwrap_or("—"))
                            @if let Some(sub) = &quiz.subcategory_name { " / " (sub) }
                        }
                        td { (quiz.question_count) }
                        td {
                            form method="post" action=(names::admin_quiz_status_url(quiz.id)) {
                                div.grid {
                                    select name="status" aria-label=(t!("admin.status", locale = locale)) {
                                        @for s in QuizStatus::ALL {
                                            @let key = format!("admin.status_{}", s.as_str());
                                            option value=(s.as_str()) selected[quiz.status == s.as_str()] {
                                                (t!(&key, locale = locale))
                                            }
                                        }
                                    }
                                    label {
                                        input name="is_published" type="checkbox" value="true"
                                              checked[quiz.is_published];
                                        (t!("admin.published", locale = locale))
                                    }
                                    button type="submit" class="outline" { (t!("admin.save", locale = locale)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn draft_state(draft: &DraftModel, locale: &str) -> Markup {
    html! {
        @if draft.approved {
            span.correct { (t!("admin.draft_approved", locale = locale)) }
        } @else if draft.rejected {
            span.muted { (t!("admin.draft_rejected", locale = locale)) }
        } @else if !draft.error.is_empty() {
            span.wrong { (t!("admin.draft_failed", locale = locale)) }
        } @else {
            span { (t!("admin.draft_pending", locale = locale)) }
        }
    }
}

pub fn dashboard(
    tree: &[CatalogTree],
    quizzes: &[QuizListing],
    drafts: &[DraftModel],
    notice: Option<&AdminMessage>,
    locale: &str,
) -> Markup {
    html! {
        h1 { (t!("admin.title", locale = locale)) }
        (message(notice, locale))

        (catalog(tree, locale))

        section {
            h2 { (t!("admin.quizzes", locale = locale)) }
            (new_quiz_form(tree, locale))
            (quiz_table(quizzes, locale))
        }

        section {
            h2 { (t!("admin.drafts", locale = locale)) }
            @if drafts.is_empty() {
                p.muted { (t!("admin.no_drafts", locale = locale)) }
            } @else {
                table {
                    thead {
                        tr {
                            th { "#" }
                            th { (t!("admin.provider", locale = locale)) }
                            th { (t!("select.difficulty", locale = locale)) }
                            th { (t!("admin.items", locale = locale)) }
                            th { (t!("admin.status", locale = locale)) }
                            th { (t!("admin.created", locale = locale)) }
                        }
                    }
                    tbody {
                        @for draft in drafts {
                            tr {
                                td { a href=(names::admin_draft_url(draft.id)) { (draft.id) } }
                                td { (draft.provider) }
                                td { (draft.difficulty) }
                                td { (draft.parsed().items.len()) " / " (draft.num_questions) }
                                td { (draft_state(draft, locale)) }
                                td { (draft.created_at.format("%Y-%m-%d %H:%M")) }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn draft(draft: &DraftModel, notice: Option<&AdminMessage>, locale: &str) -> Markup {
    let items = draft.parsed().items;

    html! {
        p { a href=(names::ADMIN_URL) { "← " (t!("admin.title", locale = locale)) } }
        h1 { (t!("admin.draft_title", locale = locale, id = draft.id)) }
        (message(notice, locale))

        article {
            p {
                (draft_state(draft, locale))
                " · " (draft.provider)
                " · " (draft.difficulty)
                " · " (draft.created_at.format("%Y-%m-%d %H:%M"))
            }
            @if let Some(quiz_id) = draft.target_quiz_id {
                p.muted { (t!("admin.target_quiz", locale = locale, id = quiz_id)) }
            }
            @if !draft.error.is_empty() {
                p.wrong { strong { (t!("admin.error", locale = locale)) ": " } (draft.error) }
            }
            @if draft.is_pending() {
                div.nav-buttons {
                    form method="post" action=(names::admin_draft_import_url(draft.id)) {
                        button type="submit" { (t!("admin.import", locale = locale)) }
                    }
                    form method="post" action=(names::admin_draft_reject_url(draft.id)) {
                        button type="submit" class="secondary" { (t!("admin.reject", locale = locale)) }
                    }
                }
            }
        }

        h3 { (t!("admin.items", locale = locale)) " (" (items.len()) ")" }
        @for (i, item) in items.iter().enumerate() {
            article.muted[!is_importable(item)] {
                p {
                    strong { (i + 1) ". " (item.question) }
                    @if !is_importable(item) {
                        " " small.wrong { (t!("admin.not_importable", locale = locale)) }
                    }
                }
                ol {
                    @for (j, choice) in item.choices.iter().enumerate() {
                        li.correct[j == item.correct_index] { (choice) }
                    }
                }
                @if !item.explanation.is_empty() {
                    small.muted { (item.explanation) }
                }
            }
        }

        @if !draft.prompt.is_empty() {
            details {
                summary { (t!("admin.prompt", locale = locale)) }
                pre { (draft.prompt) }
            }
        }
        @if !draft.raw_response.is_empty() {
            details {
                summary { (t!("admin.raw_response", locale = locale)) }
                pre { (draft.raw_response) }
            }
        }
    }
}
