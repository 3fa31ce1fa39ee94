use maud::{html, Markup};
use rust_i18n::t;

use crate::names;

pub enum LoginState {
    NoError,
    EmptyFields,
    InvalidCredentials,
}

pub fn login(state: LoginState, locale: &str) -> Markup {
    let error_msg = match state {
        LoginState::NoError => None,
        LoginState::EmptyFields => Some(t!("login.empty_fields", locale = locale).to_string()),
        LoginState::InvalidCredentials => {
            Some(t!("login.invalid_credentials", locale = locale).to_string())
        }
    };

    html! {
        h1 { (t!("login.title", locale = locale)) }
        article style="width: fit-content;" {
            form action=(names::LOGIN_URL) method="post" {
                label {
                    (t!("login.username", locale = locale))
                    input name="username"
                          type="text"
                          autocomplete="username"
                          required="true"
                          aria-label=(t!("login.username", locale = locale));
                }
                label {
                    (t!("login.password", locale = locale))
                    @if let Some(ref msg) = error_msg {
                        input name="password"
                              type="password"
                              autocomplete="current-password"
                              required="true"
                              aria-invalid="true"
                              aria-label=(t!("login.password", locale = locale));
                        small { (msg) }
                    } @else {
                        input name="password"
                              type="password"
                              autocomplete="current-password"
                              required="true"
                              aria-label=(t!("login.password", locale = locale));
                    }
                }
                button type="submit" { (t!("login.submit", locale = locale)) }
            }
        }
    }
}
