//! HTTP 요청 metrics middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::metrics::{record_http_duration, record_http_request, record_http_response};

/// 라우트에 매칭되지 않은 요청(fallback)의 경로 라벨.
pub const UNMATCHED_PATH_LABEL: &str = "unmatched";

/// 라벨로 쓸 경로. 라우트 템플릿(`/cards/{id}`)만 사용하며,
/// 매칭되지 않은 요청은 모두 [`UNMATCHED_PATH_LABEL`] 하나로 묶습니다.
fn path_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH_LABEL.to_string())
}

/// 요청마다 `http_requests_total`, `http_responses_total`,
/// `http_request_duration_seconds`를 기록합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = path_label(&request);

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn card() -> &'static str {
        "card"
    }

    async fn missing() -> StatusCode {
        StatusCode::NOT_FOUND
    }

    /// 라우터를 거친 요청마다 계산된 라벨을 모읍니다.
    fn labelled_app(labels: Arc<Mutex<Vec<String>>>) -> Router {
        let cards = Router::new().route("/{id}", get(card));
        Router::new()
            .nest("/cards", cards)
            .fallback(missing)
            .layer(middleware::from_fn(move |request: Request<Body>, next: Next| {
                let labels = labels.clone();
                async move {
                    labels.lock().unwrap().push(path_label(&request));
                    next.run(request).await
                }
            }))
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_through() {
        let app = Router::new()
            .route("/cards/{id}", get(card))
            .layer(middleware::from_fn(metrics_layer));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/cards/123e4567-e89b-12d3-a456-426614174000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_matched_route_uses_template() {
        let labels = Arc::new(Mutex::new(Vec::new()));
        let status = get_status(
            labelled_app(labels.clone()),
            "/cards/123e4567-e89b-12d3-a456-426614174000",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*labels.lock().unwrap(), vec!["/cards/{id}".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_paths_share_one_label() {
        let labels = Arc::new(Mutex::new(Vec::new()));
        for uri in ["/scan/1-x", "/scan/2-x", "/wp-admin/setup.php"] {
            let status = get_status(labelled_app(labels.clone()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        let labels = labels.lock().unwrap();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().all(|label| label == UNMATCHED_PATH_LABEL));
    }
}
