use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{chat_handler, health_handler, query_handler, reindex_handler, root_handler};
use super::server::AppState;

pub(crate) fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .route("/chat", post(chat_handler))
        .route("/reindex", post(reindex_handler))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use scribe_core::{AppContext, Config};
    use scribe_llm::any::AnyProvider;
    use scribe_llm::mock::MockProvider;

    use super::*;

    fn context(dir: &Path, provider: MockProvider) -> Arc<AppContext> {
        let mut config = Config::default();
        config.index.index_path = dir.join("n.index").to_string_lossy().into_owned();
        config.index.metadata_path = dir.join("n.json").to_string_lossy().into_owned();
        config.index.notes_dir = dir.join("notes").to_string_lossy().into_owned();
        Arc::new(AppContext::new(config, AnyProvider::Mock(provider)))
    }

    fn router(ctx: &Arc<AppContext>) -> Router {
        build_router(
            AppState {
                ctx: Arc::clone(ctx),
            },
            1_048_576,
        )
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn write_notes(dir: &Path) {
        let notes = dir.join("notes");
        std::fs::create_dir_all(&notes).unwrap();
        std::fs::write(notes.join("rust.md"), "Ownership moves values between bindings.").unwrap();
        std::fs::write(notes.join("food.md"), "Shopping list: apples, rice, coffee.").unwrap();
    }

    #[tokio::test]
    async fn health_reports_unloaded_index() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = router(&ctx).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["index_loaded"], false);
        assert_eq!(json["index_size"], 0);
        assert_eq!(json["metadata_size"], 0);
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = router(&ctx).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert!(json["endpoints"]["/chat"].is_string());
        assert_eq!(json["index_status"]["loaded"], false);
    }

    #[tokio::test]
    async fn query_without_index_is_503() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let resp = router(&ctx)
            .oneshot(post_json("/query", &serde_json::json!({"query": "x"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("index not loaded"));
    }

    #[tokio::test]
    async fn reindex_then_query() {
        let dir = tempfile::tempdir().unwrap();
        write_notes(dir.path());
        let ctx = context(dir.path(), MockProvider::default());

        let resp = router(&ctx)
            .oneshot(post_json("/reindex", &serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let report = json_body(resp).await;
        assert_eq!(report["files_indexed"], 2);
        assert_eq!(report["chunks"], 2);

        let resp = router(&ctx)
            .oneshot(post_json(
                "/query",
                &serde_json::json!({"query": "Shopping list: apples, rice, coffee.", "max_results": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["query"], "Shopping list: apples, rice, coffee.");
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0]["file_path"].as_str().unwrap().ends_with("food.md"));
        assert_eq!(results[0]["chunk_index"], 0);
        assert!(results[0]["score"].as_f64().unwrap() > 0.99);
    }

    #[tokio::test]
    async fn reindex_missing_notes_dir_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let resp = router(&ctx)
            .oneshot(post_json("/reindex", &serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("notes folder does not exist"));
    }

    #[tokio::test]
    async fn reindex_ignores_folder_in_body() {
        let dir = tempfile::tempdir().unwrap();
        write_notes(dir.path());
        let elsewhere = dir.path().join("elsewhere");
        std::fs::create_dir_all(&elsewhere).unwrap();
        for name in ["x.md", "y.md", "z.md"] {
            std::fs::write(elsewhere.join(name), "outside the notes folder").unwrap();
        }
        let ctx = context(dir.path(), MockProvider::default());

        let resp = router(&ctx)
            .oneshot(post_json(
                "/reindex",
                &serde_json::json!({"folder": elsewhere}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let report = json_body(resp).await;
        assert_eq!(report["files_found"], 2);

        let snapshot = ctx.index.snapshot().unwrap();
        assert!(
            snapshot
                .records()
                .iter()
                .all(|r| !r.file_path.contains("elsewhere"))
        );
    }

    #[tokio::test]
    async fn chat_returns_final_message() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            dir.path(),
            MockProvider::with_responses(vec![MockProvider::text("Hello from notes")]),
        );
        let resp = router(&ctx)
            .oneshot(post_json(
                "/chat",
                &serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["message"]["role"], "assistant");
        assert_eq!(json["message"]["content"], "Hello from notes");
        assert_eq!(json["usage"]["total_tokens"], 15);
        assert_eq!(json["model"], "mock-model");
    }

    #[tokio::test]
    async fn chat_provider_failure_is_502() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::failing());
        let resp = router(&ctx)
            .oneshot(post_json(
                "/chat",
                &serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }

    #[tokio::test]
    async fn missing_content_type_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let req = Request::builder()
            .method("POST")
            .uri("/query")
            .body(Body::from(r#"{"query":"x"}"#))
            .unwrap();
        let resp = router(&ctx).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 415);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("Content-Type"));
    }

    #[tokio::test]
    async fn malformed_body_is_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let resp = router(&ctx)
            .oneshot(post_json("/query", &serde_json::json!({"max_results": 2})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("query"));

        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = router(&ctx).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 400);
        let json = json_body(resp).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn body_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), MockProvider::default());
        let app = build_router(AppState { ctx }, 64);
        let oversized = serde_json::json!({"query": "a".repeat(256)});
        let resp = app.oneshot(post_json("/query", &oversized)).await.unwrap();
        assert_eq!(resp.status(), 413);
    }
}
