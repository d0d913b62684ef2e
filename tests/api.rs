use serde_json::{json, Value};
use tabclust::api::{DendrogramRenderer, KmeansRequest};
use tabclust::{Dendrogram, Engine, EngineConfig, Linkage};

fn four_points() -> Value {
    json!([
        {"x": 0, "y": 0, "name": "a"},
        {"x": 0, "y": 1, "name": "b"},
        {"x": 10, "y": 10, "name": "c"},
        {"x": 10, "y": 11, "name": "d"},
    ])
}

fn call(engine: &Engine, endpoint: &str, body: Value) -> Value {
    serde_json::from_str(&engine.handle_json(endpoint, &body.to_string())).unwrap()
}

#[test]
fn kmeans_separates_two_blobs() {
    let engine = Engine::default();
    let v = call(
        &engine,
        "kmeans",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2, "distance_metric": "euclidean"}),
    );

    assert_eq!(v["success"], true);
    let clusters: Vec<usize> = serde_json::from_value(v["clusters"].clone()).unwrap();
    assert_eq!(clusters[0], clusters[1]);
    assert_eq!(clusters[2], clusters[3]);
    assert_ne!(clusters[0], clusters[2]);

    let mut centroids: Vec<Vec<f64>> = serde_json::from_value(v["centroids"].clone()).unwrap();
    centroids.sort_by(|a, b| a[0].total_cmp(&b[0]));
    assert_eq!(centroids, vec![vec![0.0, 0.5], vec![10.0, 10.5]]);

    assert_eq!(v["stats"], json!({"0": 2, "1": 2}));
    assert_eq!(v["plot_data"][3], json!([10.0, 11.0]));
    assert_eq!(v["converged"], true);
    assert!(v.get("error").is_none());
}

#[test]
fn kmeans_metric_names_are_case_insensitive() {
    let engine = Engine::default();
    for name in ["Manhattan", "COSINE", "chebyshev"] {
        let v = call(
            &engine,
            "kmeans",
            json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2, "distance_metric": name}),
        );
        assert_eq!(v["success"], true, "{name}");
    }
}

#[test]
fn hierarchical_agrees_with_kmeans_on_separated_data() {
    let engine = Engine::default();
    let v = call(
        &engine,
        "/api/hierarchical",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2, "linkage": "single"}),
    );

    assert_eq!(v["success"], true);
    assert_eq!(v["clusters"], json!([0, 0, 1, 1]));
    assert_eq!(v["stats"], json!({"0": 2, "1": 2}));
    assert_eq!(v["dendrogram_url"], Value::Null);
    assert_eq!(v["linkage_matrix"].as_array().unwrap().len(), 3);
    assert_eq!(v["linkage_matrix"][0], json!([0.0, 1.0, 1.0, 2.0]));
    assert_eq!(v["leaf_order"].as_array().unwrap().len(), 4);
    assert!((v["within_cluster_ss"].as_f64().unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn ward_with_manhattan_is_rejected() {
    let v = call(
        &Engine::default(),
        "hierarchical",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2,
               "linkage": "ward", "distance_metric": "manhattan"}),
    );
    assert_eq!(v["success"], false);
    assert_eq!(v["error_kind"], "IncompatibleLinkageError");
    assert!(v.get("clusters").is_none());
}

#[test]
fn elbow_sweeps_up_to_max_k() {
    let v = call(
        &Engine::default(),
        "elbow",
        json!({"data": four_points(), "features": ["x", "y"], "max_k": 3}),
    );
    assert_eq!(v["success"], true);
    assert_eq!(v["k_values"], json!([1, 2, 3]));
    assert_eq!(v["inertias"].as_array().unwrap().len(), 3);
    assert_eq!(v["optimal_k"], 2);
}

#[test]
fn elbow_rejects_k_above_row_count() {
    let v = call(
        &Engine::default(),
        "elbow",
        json!({"data": four_points(), "features": ["x", "y"], "max_k": 6}),
    );
    assert_eq!(v["success"], false);
    assert_eq!(v["error_kind"], "InvalidKRangeError");
}

#[test]
fn non_numeric_feature_fails_before_clustering() {
    let v = call(
        &Engine::default(),
        "kmeans",
        json!({"data": four_points(), "features": ["x", "name"], "n_clusters": 2}),
    );
    assert_eq!(v["success"], false);
    assert_eq!(v["error_kind"], "InvalidColumnError");
}

#[test]
fn unknown_metric_and_bad_k() {
    let engine = Engine::default();
    let v = call(
        &engine,
        "kmeans",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2, "distance_metric": "hamming"}),
    );
    assert_eq!(v["error_kind"], "UnknownMetricError");

    let v = call(
        &engine,
        "kmeans",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 5}),
    );
    assert_eq!(v["error_kind"], "InvalidKError");

    let v = call(
        &engine,
        "hierarchical",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 0}),
    );
    assert_eq!(v["error_kind"], "InvalidNClustersError");
}

#[test]
fn malformed_body_and_unknown_endpoint() {
    let engine = Engine::default();
    let v: Value = serde_json::from_str(&engine.handle_json("kmeans", "{not json")).unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["error_kind"], "IngestError");

    let v: Value = serde_json::from_str(&engine.handle_json("cluster-all", "{}")).unwrap();
    assert_eq!(v["error_kind"], "InvalidParameterError");
}

#[test]
fn generate_sample_is_reproducible() {
    let engine = Engine::default();
    let a = call(&engine, "generate-sample", json!({}));
    let b = call(&engine, "generate-sample", json!({}));
    assert_eq!(a, b);
    assert_eq!(a["success"], true);
    assert_eq!(a["columns"], json!(["Feature 1", "Feature 2"]));
    assert_eq!(a["numeric_columns"], json!(["Feature 1", "Feature 2"]));
    assert_eq!(a["data"].as_array().unwrap().len(), 148);
}

#[test]
fn sample_feeds_every_endpoint() {
    let engine = Engine::default();
    let sample = call(&engine, "generate-sample", json!({}));
    let data = sample["data"].clone();
    let features = json!(["Feature 1", "Feature 2"]);

    let v = call(&engine, "elbow", json!({"data": data, "features": features, "max_k": 8}));
    assert_eq!(v["success"], true);
    let k = v["optimal_k"].as_u64().unwrap();
    assert!((1..=8).contains(&k));

    let v = call(&engine, "kmeans", json!({"data": data, "features": features, "n_clusters": 4}));
    assert_eq!(v["clusters"].as_array().unwrap().len(), 148);

    let v = call(&engine, "hierarchical", json!({"data": data, "features": features, "n_clusters": 4}));
    let total: u64 = v["stats"].as_object().unwrap().values().map(|c| c.as_u64().unwrap()).sum();
    assert_eq!(total, 148);
}

#[test]
fn upload_csv() {
    let csv = b"height, weight ,species\n1.5,60,cat\n1.7,,dog\n1.6,70,cat\n";
    let resp = Engine::default().upload("animals.CSV", csv);
    assert!(resp.success);
    let body = resp.into_result().unwrap();
    assert_eq!(body.columns, vec!["height", "weight", "species"]);
    assert_eq!(body.numeric_columns, vec!["height", "weight"]);
    assert_eq!(body.data.len(), 3);
}

struct FixedUrl;

impl DendrogramRenderer for FixedUrl {
    fn render(&self, dendrogram: &Dendrogram, n_clusters: usize, linkage: Linkage) -> tabclust::Result<String> {
        Ok(format!("/plots/{linkage}-{}-{n_clusters}.png", dendrogram.n_items()))
    }
}

#[test]
fn renderer_supplies_dendrogram_url() {
    let engine = Engine::new(EngineConfig::default()).unwrap().with_renderer(FixedUrl);
    let v = call(
        &engine,
        "hierarchical",
        json!({"data": four_points(), "features": ["x", "y"], "n_clusters": 2}),
    );
    assert_eq!(v["dendrogram_url"], "/plots/ward-4-2.png");
}

#[test]
fn config_defaults_fill_missing_fields() {
    let config = EngineConfig::from_json(r#"{"n_clusters": 2}"#).unwrap();
    let engine = Engine::new(config).unwrap();
    let req = KmeansRequest {
        data: serde_json::from_value(four_points()).unwrap(),
        features: vec!["x".into(), "y".into()],
        n_clusters: None,
        distance_metric: None,
    };
    let body = engine.kmeans(&req).into_result().unwrap();
    assert_eq!(body.n_clusters, 2);
    assert!((body.inertia - 1.0).abs() < 1e-12);
}
