use axum::{
    http::{header::InvalidHeaderValue, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn cookie(name: &str, value: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age=86400;{secure} Path=/; SameSite=Strict"
    ))
}

pub fn expired_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}=; HttpOnly; Max-Age=0; Path=/; SameSite=Strict"))
}

/// Post/Redirect/Get: htmx requests are told to navigate via `HX-Redirect`,
/// plain requests get a `303 See Other`.
pub fn redirect(is_htmx: bool, url: &str) -> Response {
    if is_htmx {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(url) {
            headers.insert("HX-Redirect", value);
        }
        (StatusCode::OK, headers).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else become one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Random lowercase suffix taken from the entropy half of a ULID.
pub fn random_suffix() -> String {
    let id = ulid::Ulid::new().to_string();
    id[id.len() - 6..].to_lowercase()
}

pub fn format_duration(secs: i64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m {s:02}s")
    }
}

pub fn format_clock(secs: Option<i64>) -> String {
    match secs {
        Some(secs) if secs > 0 => format!("{:02}:{:02}", secs / 60, secs % 60),
        _ => "\u{2014}".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Science & Technology"), "science-technology");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("C++ 101"), "c-101");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn random_suffix_is_six_lowercase_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert_eq!(suffix, suffix.to_lowercase());
    }

    #[test]
    fn cookies_respect_secure_flag() {
        let plain = cookie("user_session", "abc", false).unwrap();
        assert!(plain.to_str().unwrap().starts_with("user_session=abc; HttpOnly"));
        assert!(!plain.to_str().unwrap().contains("Secure"));
        assert!(cookie("lang", "ja", true).unwrap().to_str().unwrap().contains("Secure"));
        assert!(expired_cookie("lang").unwrap().to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(125), "2m 05s");
        assert_eq!(format_duration(3_725), "1h 02m");
        assert_eq!(format_clock(Some(75)), "01:15");
        assert_eq!(format_clock(None), "\u{2014}");
    }
}
