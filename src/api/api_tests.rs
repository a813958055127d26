#[cfg(test)]
mod ask_handler_tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::error::AppError;
    use crate::inference::{IntentClassifier, VectorEncoder};
    use crate::models::intent::{Intent, IntentSet};
    use crate::models::memory::MemoryRecord;
    use crate::models::network::{Activation, Layer, Network};
    use crate::models::vocabulary::Vocabulary;
    use crate::observability::AppMetrics;
    use crate::security::validation::QueryValidator;
    use crate::services::memoization::MemoizationStore;
    use crate::services::resolver::{Resolver, ResolverOptions};
    use crate::storage::repository::{
        InMemoryRepository, MemoryRepository, MockMemoryRepository,
    };

    fn classifier() -> Arc<IntentClassifier> {
        let vocabulary = Vocabulary::new(vec!["hello".into(), "bye".into()]).unwrap();
        let intents = IntentSet::new(vec![
            Intent::new("greeting", vec!["Hi!".into()]).unwrap(),
            Intent::new("goodbye", vec!["See you!".into()]).unwrap(),
        ])
        .unwrap();
        let layer = Layer::from_rows(
            vec![vec![5.0, 0.0], vec![0.0, 5.0]],
            vec![0.0, 0.0],
            Activation::Exp,
        )
        .unwrap();
        let network = Network::new(vec![layer]).unwrap();
        Arc::new(
            IntentClassifier::new(VectorEncoder::new(vocabulary), network, intents, 0.7).unwrap(),
        )
    }

    async fn app_with(repository: Arc<dyn MemoryRepository>, capacity: Option<usize>) -> Router {
        let metrics = Arc::new(AppMetrics::default());
        let memory = Arc::new(MemoizationStore::open(repository, capacity).await.unwrap());
        let resolver = Resolver::new(
            classifier(),
            memory,
            None,
            metrics.clone(),
            ResolverOptions {
                fallback_message: "not understood".into(),
                not_found_message: "no answer found".into(),
                max_concurrent_inferences: 2,
            },
        );
        let state = AppState::new(Arc::new(resolver), QueryValidator::new(32), metrics);
        create_router(state, &[])
    }

    async fn app() -> Router {
        app_with(Arc::new(InMemoryRepository::new()), Some(10)).await
    }

    fn ask_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_model_answer() {
        let response = app()
            .await
            .oneshot(ask_request(json!({"query": "Hello there"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "Hi!");
        assert_eq!(body["source"], "model");
        assert_eq!(body["intent"], "greeting");
    }

    #[tokio::test]
    async fn test_second_ask_is_served_from_memory() {
        let app = app().await;
        app.clone()
            .oneshot(ask_request(json!({"query": "unknown words"})))
            .await
            .unwrap();

        let response = app
            .oneshot(ask_request(json!({"question": "UNKNOWN WORDS"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "not understood");
        assert_eq!(body["source"], "memory");
        assert!(body.get("intent").is_none());
    }

    #[tokio::test]
    async fn test_blank_query_returns_400() {
        let app = app().await;
        for body in [json!({"query": "   "}), json!({})] {
            let response = app.clone().oneshot(ask_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["code"], "BAD_REQUEST");
        }
    }

    #[tokio::test]
    async fn test_over_long_query_returns_400() {
        let response = app()
            .await
            .oneshot(ask_request(json!({"query": "a".repeat(33)})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_persistence_failure_returns_500_with_answer() {
        let mut repository = MockMemoryRepository::new();
        repository.expect_load().returning(|| Ok(vec![]));
        repository
            .expect_save()
            .returning(|_| Err(AppError::persistence("disk full")));

        let response = app_with(Arc::new(repository), None)
            .await
            .oneshot(ask_request(json!({"query": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "PERSISTENCE_ERROR");
        assert_eq!(body["answer"], "Hi!");
    }

    #[tokio::test]
    async fn test_list_and_clear_memory() {
        let repository = Arc::new(InMemoryRepository::with_records(vec![
            MemoryRecord::new("first", "1"),
            MemoryRecord::new("second", "2"),
        ]));
        let app = app_with(repository.clone(), Some(10)).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["capacity"], 10);
        assert_eq!(body["entries"][0]["query"], "first");
        assert_eq!(body["entries"][1]["answer"], "2");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/memory")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({"cleared": true, "removed": 2}));
        assert!(repository.saved().await.is_empty());

        let response = app
            .oneshot(Request::builder().uri("/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_newline_separated_query_classifies_by_tokens() {
        let response = app()
            .await
            .oneshot(ask_request(json!({"query": "bye\nnow"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "See you!");
        assert_eq!(body["intent"], "goodbye");
    }

    #[tokio::test]
    async fn test_tab_separated_query_is_its_own_memory_key() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(ask_request(json!({"query": "hello\tthere"})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["source"], "model");

        let response = app
            .clone()
            .oneshot(ask_request(json!({"query": "hellothere"})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["answer"], "not understood");

        let response = app
            .oneshot(Request::builder().uri("/memory").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["entries"][0]["query"], "hello\tthere");
    }

    #[tokio::test]
    async fn test_malformed_body_returns_structured_400() {
        let app = app().await;
        let malformed = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"query\": "))
            .unwrap();

        for request in [malformed, ask_request(json!({"query": 5}))] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["code"], "BAD_REQUEST");
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_returns_structured_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .body(Body::from(json!({"query": "hello"}).to_string()))
            .unwrap();

        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }
}
