pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/ranking", post(handlers::handle_rank))
        .route("/api/v1/predict", post(handlers::handle_predict))
        .route(
            "/api/v1/jobs/:job_id/bias-audit",
            post(handlers::handle_bias_audit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::{Config, ModelSource};
    use crate::ranking::bias::BiasConfig;
    use crate::ranking::lock::AuditLock;
    use crate::ranking::service::tests::{job, resume, FixedModel};
    use crate::ranking::service::RankingService;
    use crate::store::memory::MemoryStore;

    fn app(store: Arc<MemoryStore>) -> Router {
        let config = Config {
            database_url: "postgres://localhost/ranking".to_string(),
            redis_url: "redis://127.0.0.1/".to_string(),
            model_source: ModelSource::File {
                path: "decision_tree_model.json".into(),
            },
            bias: BiasConfig::default(),
            audit_lock_ttl_secs: 60,
            port: 8080,
            rust_log: "info".to_string(),
        };
        let redis = redis::Client::open(config.redis_url.as_str()).unwrap();
        build_router(AppState {
            ranking: RankingService::new(store, Arc::new(FixedModel::new(0.73))),
            audit_lock: AuditLock::new(redis, Duration::from_secs(60)),
            config,
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(MemoryStore::default()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "candidate-ranking");
        assert_eq!(body["model"], "fixed");
    }

    #[tokio::test]
    async fn test_rank_returns_score() {
        let store = Arc::new(MemoryStore::default());
        let (resume_id, job_id) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_job(job(job_id));
        store.insert_resume(resume(resume_id, job_id, &["BSc in Computer Science"]));

        let response = app(store.clone())
            .oneshot(post_json(
                "/api/v1/ranking",
                serde_json::json!({ "resumeID": resume_id.to_string() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ranking_score"], 0.73);
        assert_eq!(store.resume(resume_id).unwrap().ranking_score, Some(0.73));
    }

    #[tokio::test]
    async fn test_rank_unknown_resume_is_404() {
        let response = app(Arc::new(MemoryStore::default()))
            .oneshot(post_json(
                "/api/v1/ranking",
                serde_json::json!({ "resumeID": Uuid::new_v4().to_string() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_rank_malformed_id_is_400() {
        let response = app(Arc::new(MemoryStore::default()))
            .oneshot(post_json(
                "/api/v1/ranking",
                serde_json::json!({ "resumeID": "not-a-uuid" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_scores_vector() {
        let response = app(Arc::new(MemoryStore::default()))
            .oneshot(post_json(
                "/api/v1/predict",
                serde_json::json!({
                    "education_similarity": 0.4,
                    "experience_years": 3.0,
                    "cosine_similarity_skills": 0.5,
                    "highest_degree": 4,
                    "ed_req_encoded": 4,
                    "exp_req_encoded": 2.0
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["score"], 0.73);
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range_rank() {
        let response = app(Arc::new(MemoryStore::default()))
            .oneshot(post_json(
                "/api/v1/predict",
                serde_json::json!({
                    "education_similarity": 0.4,
                    "experience_years": 3.0,
                    "cosine_similarity_skills": 0.5,
                    "highest_degree": 9,
                    "ed_req_encoded": 4,
                    "exp_req_encoded": 2.0
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
