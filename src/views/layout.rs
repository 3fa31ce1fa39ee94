use maud::{html, Markup, DOCTYPE};
use rust_i18n::t;

use crate::{db::models::AuthUser, names, utils, views::components};

fn css() -> Markup {
    html! {
        link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        script src="https://unpkg.com/htmx.org@2.0.4" {}
    }
}

fn icon() -> Markup {
    html! {
        link rel="icon" href="/static/img/icon.svg" type="image/svg+xml" {}
    }
}

fn locale_switch(locale: &str) -> Markup {
    html! {
        @for (code, label) in [("en", "EN"), ("ja", "日本語")] {
            li {
                @if code == locale {
                    strong { (label) }
                } @else {
                    a href="#"
                      hx-post=(names::SET_LOCALE_URL)
                      hx-vals=(format!(r#"{{"locale":"{code}"}}"#)) {
                        (label)
                    }
                }
            }
        }
    }
}

fn header(locale: &str, user: Option<&AuthUser>) -> Markup {
    html! {
        header {
            nav {
                ul {
                    li."secondary" {
                        a href="/" {
                            strong { "IntelliQuiz" }
                        }
                    }
                    li."secondary" { small { (utils::VERSION) } }
                }
                ul {
                    li { (components::nav_link(&names::quiz_list_url(None), html! { (t!("nav.quizzes", locale = locale)) })) }
                    @if let Some(user) = user {
                        li { (components::nav_link(names::HISTORY_URL, html! { (t!("nav.history", locale = locale)) })) }
                        li { (components::nav_link(names::STATS_URL, html! { (t!("nav.stats", locale = locale)) })) }
                        li { (components::nav_link(names::LEADERBOARD_URL, html! { (t!("nav.leaderboard", locale = locale)) })) }
                        @if user.is_admin {
                            li { a href=(names::ADMIN_URL) { (t!("nav.admin", locale = locale)) } }
                        }
                        li."secondary" { (user.display_name) }
                        li {
                            a href="#" hx-post=(names::LOGOUT_URL) {
                                (t!("nav.logout", locale = locale))
                            }
                        }
                    } @else {
                        li { a href=(names::LOGIN_URL) { (t!("nav.login", locale = locale)) } }
                    }
                    (locale_switch(locale))
                }
            }
        }
    }
}

fn main(body: Markup) -> Markup {
    html! {
        main { (body) }
    }
}

pub fn page(title: &str, body: Markup, locale: &str, user: Option<&AuthUser>) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="color-scheme" content="light dark";

                (css())
                (js())
                (icon())

                title { (format!("{title} - IntelliQuiz")) }
            }

            body."container" hx-boost="true" {
                (header(locale, user))
                (main(body))
            }
        }
    }
}

pub fn titled(title: &str, body: Markup) -> Markup {
    html! {
        title { (title) " - IntelliQuiz" }
        (body)
    }
}

/// Full page for normal requests, a titled fragment for htmx swaps.
pub fn render(
    is_htmx: bool,
    title: &str,
    body: Markup,
    locale: &str,
    user: Option<&AuthUser>,
) -> Markup {
    if is_htmx {
        titled(title, body)
    } else {
        page(title, body, locale, user)
    }
}
