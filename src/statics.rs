use std::path::Path;

use axum::{
    extract::Path as UrlPath,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};

use crate::rejections::AppError;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");
const STATIC_CACHE_CONTROL: &str = "max-age=3600, must-revalidate";

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css",
        Some("svg") => "image/svg+xml",
        Some("js") => "text/javascript",
        _ => "application/octet-stream",
    }
}

async fn send_file(UrlPath(path): UrlPath<String>) -> Result<impl IntoResponse, AppError> {
    let file = STATIC_DIR
        .get_file(Path::new(&path))
        .ok_or(AppError::NotFound)?;

    Ok((
        [
            (CONTENT_TYPE, content_type(file.path())),
            (CACHE_CONTROL, STATIC_CACHE_CONTROL),
        ],
        file.contents(),
    ))
}

pub fn routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/{*path}", get(send_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_assets_are_present() {
        assert!(STATIC_DIR.get_file("index.css").is_some());
        assert!(STATIC_DIR.get_file("js/session.js").is_some());
        assert!(STATIC_DIR.get_file("img/icon.svg").is_some());
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type(Path::new("index.css")), "text/css");
        assert_eq!(content_type(Path::new("js/session.js")), "text/javascript");
        assert_eq!(content_type(Path::new("font.woff2")), "application/octet-stream");
    }
}
