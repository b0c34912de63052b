use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use postsearch_core::persist::{save_index, save_vector, IndexPaths};
use postsearch_core::tfidf::{corpus_terms, vectorize};
use postsearch_core::{InvertedIndex, Normalizer, SearchEngine, View};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn corpus() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("1.txt".to_string(), "Кошка спала на тёплом окне".to_string()),
        ("2.txt".to_string(), "Собака громко лаяла во дворе".to_string()),
        ("3.txt".to_string(), "Кошка и собака играли во дворе".to_string()),
    ])
}

const SAMPLE_DICTIONARY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/ru_morph_sample.tsv");

fn normalizer() -> Normalizer {
    Normalizer::from_dictionary(SAMPLE_DICTIONARY).unwrap()
}

fn build_tiny_index(dir: &std::path::Path) {
    let paths = IndexPaths::new(dir);
    let normalizer = normalizer();
    let docs = corpus();
    save_index(&paths, &InvertedIndex::build(&docs, &normalizer)).unwrap();
    for view in View::ALL {
        let (terms, snapshot) = corpus_terms(&docs, view, &normalizer);
        for (doc, doc_terms) in &terms {
            save_vector(&paths, view, doc, &vectorize(doc_terms, &snapshot)).unwrap();
        }
    }
    fs::write(
        dir.join("index.txt"),
        "1.txt\thttps://vk.com/wall-1_1\n2.txt\thttps://vk.com/wall-1_2\n3.txt\thttps://vk.com/wall-1_3\n",
    )
    .unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn app_from_disk(dir: &std::path::Path, top_k: Option<usize>) -> Router {
    server::build_app(&server::AppConfig {
        index_dir: dir.to_path_buf(),
        references: dir.join("index.txt"),
        dictionary: SAMPLE_DICTIONARY.into(),
        top_k,
    })
    .unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_from_disk(dir.path(), None);

    // "кошка" + "спала" favours 1.txt, which has both
    let (status, json) = call(app, "/search?query=%D0%BA%D0%BE%D1%88%D0%BA%D0%B0%20%D1%81%D0%BF%D0%B0%D0%BB%D0%B0&k=2").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 3);
    assert_eq!(arr[0]["document"], "1.txt");
    assert_eq!(arr[0]["reference"], "https://vk.com/wall-1_1");
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn empty_query_returns_no_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_from_disk(dir.path(), Some(10));

    let (status, json) = call(app, "/search?query=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn boolean_endpoint_evaluates_queries() {
    let docs = corpus();
    let engine = SearchEngine::from_documents(&docs, HashMap::new(), normalizer());
    let app = server::router(Arc::new(engine), None);

    // "собака -кошка"
    let uri = "/boolean?query=%D1%81%D0%BE%D0%B1%D0%B0%D0%BA%D0%B0%20-%D0%BA%D0%BE%D1%88%D0%BA%D0%B0";
    let (status, json) = call(app.clone(), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["documents"], serde_json::json!(["2.txt"]));

    let (status, _) = call(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(app, "/search?query=x&view=stems").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn missing_artifacts_fail_startup() {
    let dir = tempdir().unwrap();
    let result = server::build_app(&server::AppConfig {
        index_dir: dir.path().to_path_buf(),
        references: dir.path().join("index.txt"),
        dictionary: SAMPLE_DICTIONARY.into(),
        top_k: None,
    });
    assert!(result.is_err());
}

#[tokio::test]
async fn root_serves_the_search_page() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = app_from_disk(dir.path(), None);

    let resp = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("fetch(\"/search?\""));
}

#[test]
fn missing_dictionary_fails_startup() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let result = server::build_app(&server::AppConfig {
        index_dir: dir.path().to_path_buf(),
        references: dir.path().join("index.txt"),
        dictionary: dir.path().join("absent.tsv"),
        top_k: None,
    });
    assert!(result.is_err());
}
