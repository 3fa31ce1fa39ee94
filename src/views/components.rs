use maud::{html, Markup};
use rust_i18n::t;

use crate::names;

/// htmx navigation link with href fallback + hx-get for in-page swap.
pub fn nav_link(href: &str, body: Markup) -> Markup {
    html! {
        a href=(href)
          hx-get=(href)
          hx-target="main"
          hx-push-url="true"
          hx-swap="innerHTML" {
            (body)
        }
    }
}

/// Banner for a `?notice=` carried across a redirect. Unknown notices are
/// ignored.
pub fn notice(notice: Option<&str>, locale: &str) -> Markup {
    let (key, is_error) = match notice {
        Some(names::NOTICE_TIME_UP) => ("notice.time_up", false),
        Some(names::NOTICE_SUBMITTED) => ("notice.submitted", false),
        Some(names::NOTICE_NO_QUESTIONS) => ("notice.no_questions", true),
        Some(names::NOTICE_AI_FAILED) => ("notice.ai_failed", true),
        Some(names::NOTICE_AI_DRAFT_SAVED) => ("notice.ai_draft_saved", false),
        Some(names::NOTICE_NO_PENDING) => ("notice.no_pending", true),
        Some(names::NOTICE_NO_ATTEMPTS_LEFT) => ("notice.no_attempts_left", true),
        _ => return html! {},
    };

    html! {
        p.notice.error[is_error] role="status" { (t!(key, locale = locale)) }
    }
}

pub fn difficulty_badge(difficulty: &str, locale: &str) -> Markup {
    let key = format!("difficulty.{difficulty}");
    html! {
        span class=(format!("badge {difficulty}")) {
            (t!(&key, locale = locale))
        }
    }
}

/// Inline error under a form field.
pub fn field_error(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            small.wrong { (message) }
        }
    }
}
