use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use docportal_core::config::is_production_environment;

static CACHED_IS_PRODUCTION: std::sync::LazyLock<bool> = std::sync::LazyLock::new(|| {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|e| is_production_environment(&e))
        .unwrap_or(false)
});

/// The API documentation page loads its viewer script from a CDN.
const DOCS_PATH: &str = "/docs";

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
const DOCS_CSP: &str = "default-src 'self'; script-src 'self' https://unpkg.com; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; font-src 'self' data: https:; connect-src 'self'";

/// Adds security headers to all HTTP responses
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_docs = request.uri().path().starts_with(DOCS_PATH);
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    // Tokens and account data must never be cached by intermediaries.
    if !is_docs {
        headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    }

    if *CACHED_IS_PRODUCTION {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(if is_docs { DOCS_CSP } else { API_CSP }),
    );

    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use axum_test::TestServer;

    fn app() -> Router {
        Router::new()
            .route("/api/v1/me", get(|| async { "me" }))
            .route("/docs", get(|| async { "docs" }))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    #[tokio::test]
    async fn test_api_responses_are_locked_down() {
        let server = TestServer::new(app()).unwrap();
        let response = server.get("/api/v1/me").await;
        let headers = response.headers();
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), API_CSP);
    }

    #[tokio::test]
    async fn test_docs_page_may_load_its_viewer() {
        let server = TestServer::new(app()).unwrap();
        let response = server.get("/docs").await;
        let headers = response.headers();
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), DOCS_CSP);
        assert!(headers.get("Cache-Control").is_none());
    }
}
