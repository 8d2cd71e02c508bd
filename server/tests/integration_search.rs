use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use termspace_core::{DocId, IndexHandle, IndexStore, MemoryStore, SearchIndex};
use termspace_server::{build_app, AppState};
use tower::ServiceExt;

fn medical_corpus() -> Vec<(DocId, String)> {
    vec![
        (1, "After the medication, headache and nausea were reported by the patient.".to_string()),
        (2, "The patient reported nausea and dizziness caused by the medication.".to_string()),
        (3, "Headache and dizziness are common effects of this medication.".to_string()),
        (4, "The medication caused a headache and nausea, but no dizziness was reported.".to_string()),
    ]
}

fn test_app(corpus: &[(DocId, String)]) -> Router {
    let store: Arc<dyn IndexStore> = Arc::new(MemoryStore::new());
    let (index, _stats) = SearchIndex::build(store, corpus).unwrap();
    let state = AppState {
        index: Arc::new(IndexHandle::new(index)),
        admin_token: Some("secret".to_string()),
    };
    build_app(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let app = test_app(&medical_corpus());
    let (status, body) = get_json(app, "/search?q=nausea%20and%20dizziness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 4);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["doc_id"], 2);
    assert_eq!(results[0]["score"], 0.41);
    assert!(results[0]["content"]
        .as_str()
        .unwrap()
        .contains("nausea and dizziness"));
}

#[tokio::test]
async fn empty_query_is_an_empty_result_not_an_error() {
    let app = test_app(&medical_corpus());
    let (status, body) = get_json(app, "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 0);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn k_caps_the_result_list() {
    let app = test_app(&medical_corpus());
    let (status, body) = get_json(app, "/search?q=medication&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 4);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn doc_endpoint_serves_content_or_404() {
    let app = test_app(&medical_corpus());
    let (status, body) = get_json(app.clone(), "/doc/3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["content"].as_str().unwrap().contains("effects"));

    let (status, _) = get_json(app, "/doc/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rebuild_requires_the_admin_token() {
    let app = test_app(&medical_corpus());
    let req = Request::post("/index/rebuild")
        .header("content-type", "application/json")
        .body(Body::from("[]"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rebuild_swaps_in_the_new_generation() {
    let app = test_app(&medical_corpus());

    let docs = json!([
        {"id": 1, "text": "entirely new corpus about sailboats"},
        {"id": 2, "text": "sailboats and rigging"},
    ]);
    let req = Request::post("/index/rebuild")
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::from(docs.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["indexed"], 2);
    assert_eq!(body["rejected"], 0);

    // The old corpus is gone; the new one answers.
    let (_, body) = get_json(app.clone(), "/search?q=medication").await;
    assert_eq!(body["total_hits"], 0);
    let (_, body) = get_json(app, "/search?q=sailboats").await;
    assert_eq!(body["total_hits"], 2);
}
