//! 에러 응답 본문에 요청 메서드와 경로를 채우는 middleware.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ApiErrorResponse;

/// [`ApiErrorResponse`] 확장이 붙은 응답만 본문을 다시 씁니다.
/// 상태 코드와 헤더, 나머지 확장은 그대로 둡니다.
pub async fn attach_request_info(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let Some(error) = parts.extensions.remove::<ApiErrorResponse>() else {
        return Response::from_parts(parts, body);
    };

    let enriched = error.with_request_info(&method, &uri);
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Json(enriched).into_response().into_body())
}
