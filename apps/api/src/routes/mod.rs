pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resume::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(ui::create_resume_page))
        .route("/create-resume", get(ui::create_resume_page))
        .route("/api/resume", post(handlers::handle_create_resume))
        .route("/api/resume/extract", post(handlers::handle_extract))
        .route("/api/resume/render", post(handlers::handle_render))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::fake::ScriptedModel;
    use crate::llm_client::LlmError;
    use crate::render::fake::StaticRenderer;

    fn test_config() -> Config {
        Config {
            openai_api_key: "test-key".to_string(),
            openai_base_url: "http://localhost:0/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            chrome_executable: None,
            pdf_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
        }
    }

    fn app(model: Arc<ScriptedModel>, renderer: Arc<StaticRenderer>) -> Router {
        build_router(AppState {
            llm: model,
            renderer,
            config: test_config(),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(
            Arc::new(ScriptedModel::default()),
            Arc::new(StaticRenderer::returning(b"")),
        );
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_form_page_is_served_at_root_and_create_resume() {
        for uri in ["/", "/create-resume"] {
            let app = app(
                Arc::new(ScriptedModel::default()),
                Arc::new(StaticRenderer::returning(b"")),
            );
            let response = app
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
            assert!(content_type.starts_with("text/html"));
            let page = String::from_utf8(body_bytes(response).await).unwrap();
            assert!(page.contains("Create Your Resume"));
            assert!(page.contains("/api/resume/extract"));
        }
    }

    #[tokio::test]
    async fn test_create_resume_returns_pdf_download() {
        let model = Arc::new(ScriptedModel::answering(&[
            "name: Jane Doe\n",
            "```html\n<h1>Jane Doe</h1>\n```",
        ]));
        let renderer = Arc::new(StaticRenderer::returning(b"%PDF-1.7 test"));
        let app = app(model.clone(), renderer.clone());

        let response = app
            .oneshot(post_json(
                "/api/resume",
                json!({"content": "Jane Doe, Berlin", "customInput": "fintech"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"resume.pdf\""
        );
        assert_eq!(body_bytes(response).await, b"%PDF-1.7 test");
        assert_eq!(model.call_count(), 2);
        assert_eq!(renderer.rendered.lock().unwrap()[0], "<h1>Jane Doe</h1>");
    }

    #[tokio::test]
    async fn test_create_resume_without_content_is_400() {
        let model = Arc::new(ScriptedModel::default());
        let app = app(model.clone(), Arc::new(StaticRenderer::returning(b"")));

        let response = app
            .oneshot(post_json("/api/resume", json!({"customInput": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Content is required");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_resume_with_malformed_json_is_400() {
        let app = app(
            Arc::new(ScriptedModel::default()),
            Arc::new(StaticRenderer::returning(b"")),
        );
        let request = Request::post("/api/resume")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_resume_model_failure_is_500() {
        let model = Arc::new(ScriptedModel::new([Err(LlmError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        })]));
        let renderer = Arc::new(StaticRenderer::returning(b"%PDF"));
        let app = app(model, renderer.clone());

        let response = app
            .oneshot(post_json("/api/resume", json!({"content": "Jane"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert!(!body.to_string().contains("Invalid API key"));
        assert!(renderer.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_resume_render_failure_is_500() {
        let model = Arc::new(ScriptedModel::answering(&["name: Jane\n", "<p>Jane</p>"]));
        let app = app(model, Arc::new(StaticRenderer::failing()));

        let response = app
            .oneshot(post_json("/api/resume", json!({"content": "Jane"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "RENDER_ERROR");
    }

    #[tokio::test]
    async fn test_extract_returns_record_json() {
        let model = Arc::new(ScriptedModel::answering(&[
            "name: Jane Doe\nage: 34\nlinks:\n1. https://jane.example\n",
        ]));
        let app = app(model.clone(), Arc::new(StaticRenderer::returning(b"")));

        let response = app
            .oneshot(post_json("/api/resume/extract", json!({"content": "Jane"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({"name": "Jane Doe", "age": 34, "links": ["https://jane.example"]})
        );
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_render_uses_edited_record() {
        let model = Arc::new(ScriptedModel::answering(&["<h1>Edited</h1>"]));
        let renderer = Arc::new(StaticRenderer::returning(b"%PDF"));
        let app = app(model.clone(), renderer);

        let response = app
            .oneshot(post_json(
                "/api/resume/render",
                json!({"record": {"name": "Edited", "education": [{"school": "MIT"}]}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0[0]
            .content
            .contains(r#"{"name":"Edited","education":[{"school":"MIT"}]}"#));
    }

    #[tokio::test]
    async fn test_render_ignores_negative_age_from_form() {
        let model = Arc::new(ScriptedModel::answering(&["<h1>Ada</h1>"]));
        let app = app(model.clone(), Arc::new(StaticRenderer::returning(b"%PDF")));

        let response = app
            .oneshot(post_json(
                "/api/resume/render",
                json!({"record": {"name": "Ada", "age": -3}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let calls = model.calls.lock().unwrap();
        assert!(calls[0].0[0].content.contains(r#"{"name":"Ada"}"#));
    }

    #[tokio::test]
    async fn test_render_rejects_empty_record() {
        let model = Arc::new(ScriptedModel::default());
        let app = app(model.clone(), Arc::new(StaticRenderer::returning(b"")));

        let response = app
            .oneshot(post_json("/api/resume/render", json!({"record": {}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(model.call_count(), 0);
    }
}
