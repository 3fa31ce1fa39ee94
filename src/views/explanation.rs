use maud::{html, Markup};
use rust_i18n::t;

use crate::{db::models::ExplanationModel, names};

/// Swapped into `#explanation-{answer_id}` on the result page.
pub fn explanation(answer_id: i64, explanation: &ExplanationModel, locale: &str) -> Markup {
    let url = names::explanation_url(answer_id);
    let target = format!("#explanation-{answer_id}");
    let resources = explanation.resources();

    html! {
        article.explanation {
            header { strong { (t!("explanation.title", locale = locale)) } }
            p { (explanation.summary) }
            @if !resources.is_empty() {
                h6 { (t!("explanation.resources", locale = locale)) }
                ul {
                    @for resource in &resources {
                        li {
                            a href=(resource.url) target="_blank" rel="noopener noreferrer" {
                                (resource.title)
                            }
                        }
                    }
                }
            }
            footer {
                small.muted { (t!("explanation.was_helpful", locale = locale)) " " }
                button class="outline"
                       hx-post=(url)
                       hx-vals=r#"{"action":"helpful"}"#
                       hx-target=(target)
                       hx-swap="innerHTML" {
                    "\u{1F44D} " (explanation.helpful)
                }
                " "
                button class="outline secondary"
                       hx-post=(url)
                       hx-vals=r#"{"action":"not_helpful"}"#
                       hx-target=(target)
                       hx-swap="innerHTML" {
                    "\u{1F44E} " (explanation.not_helpful)
                }
                " "
                small.muted { (t!("explanation.provider", locale = locale, provider = explanation.provider)) }
            }
        }
    }
}

pub fn unavailable(locale: &str) -> Markup {
    html! {
        p.notice.error role="status" { (t!("explanation.unavailable", locale = locale)) }
    }
}
