use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::errors::PlanError;
use crate::handlers::{export, PlanForm, PlanHandler};

pub fn create_router(handler: Arc<PlanHandler>) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/plan", post(plan_json))
        .route("/plan.csv", post(plan_csv))
        .route("/health", get(health_check))
        .with_state(handler)
}

fn error_response(e: PlanError) -> Response {
    let status = match e {
        PlanError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    if status == StatusCode::BAD_REQUEST {
        log::warn!("⚠️ Rejected plan form: {}", e);
    } else {
        log::error!("❌ Plan request failed: {}", e);
    }
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

async fn form_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn plan_json(State(handler): State<Arc<PlanHandler>>, Form(form): Form<PlanForm>) -> Response {
    log::info!("🔔 Plan requested (json)");
    match handler.handle_form(form).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn plan_csv(State(handler): State<Arc<PlanHandler>>, Form(form): Form<PlanForm>) -> Response {
    log::info!("🔔 Plan requested (csv)");
    let result = match handler.handle_form(form).await {
        Ok(result) => result,
        Err(e) => return error_response(e),
    };

    match export::to_csv(&result.plan) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"meal-plan.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            log::error!("❌ CSV export failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "could not render CSV" })),
            )
                .into_response()
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockPlanService;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const FORM: &str = "weight=70&height=175&age=25&sex=male&activity=3&goal=auto&units=metric";

    fn router() -> Router {
        create_router(Arc::new(PlanHandler::new(Arc::new(MockPlanService::new()))))
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_form_page() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("<form"));
    }

    #[tokio::test]
    async fn test_plan_json() {
        let response = router().oneshot(post_form("/plan", FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["source"], "mock");
        assert_eq!(body["complete"], true);
        assert_eq!(body["plan"]["days"].as_array().map(Vec::len), Some(7));
        assert_eq!(body["metrics"]["classification"], "normal");
    }

    #[tokio::test]
    async fn test_plan_csv() {
        let response = router().oneshot(post_form("/plan.csv", FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let csv = body_string(response).await;
        assert_eq!(csv.lines().count(), 8);
        assert!(csv.starts_with(&export::CSV_HEADER.join(",")));
    }

    #[tokio::test]
    async fn test_invalid_form_is_bad_request() {
        let response = router()
            .oneshot(post_form("/plan", "weight=heavy&height=175&age=25&sex=male&activity=3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("weight"));
    }
}
