//! Generate blob data and run every clustering endpoint on it.
//!
//! ```text
//! RUST_LOG=tabclust=debug cargo run --example cluster_sample
//! ```

use serde_json::json;
use tabclust::Engine;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = Engine::default();
    let sample = match engine.generate_sample().into_result() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("sample generation failed: {e}");
            return;
        }
    };
    println!("{} rows, numeric columns {:?}", sample.data.len(), sample.numeric_columns);

    let features = &sample.numeric_columns[..2];
    let request = |extra: serde_json::Value| {
        let mut body = json!({"data": sample.data, "features": features});
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        body.to_string()
    };

    let elbow: serde_json::Value =
        serde_json::from_str(&engine.handle_json("elbow", &request(json!({"max_k": 8})))).unwrap();
    println!("\n=== Elbow ===");
    println!("  k_values:  {}", elbow["k_values"]);
    println!("  optimal_k: {}", elbow["optimal_k"]);
    let k = elbow["optimal_k"].as_u64().unwrap_or(4);

    let kmeans: serde_json::Value = serde_json::from_str(&engine.handle_json(
        "kmeans",
        &request(json!({"n_clusters": k, "distance_metric": "euclidean"})),
    ))
    .unwrap();
    println!("\n=== K-means (k={k}) ===");
    println!("  sizes:     {}", kmeans["stats"]);
    println!("  centroids: {}", kmeans["centroids"]);
    println!("  inertia:   {}", kmeans["inertia"]);

    for linkage in ["single", "complete", "average", "ward"] {
        let tree: serde_json::Value = serde_json::from_str(&engine.handle_json(
            "hierarchical",
            &request(json!({"n_clusters": k, "linkage": linkage})),
        ))
        .unwrap();
        println!("\n=== Hierarchical ({linkage}) ===");
        println!("  sizes:     {}", tree["stats"]);
        println!("  threshold: {}", tree["color_threshold"]);
    }
}
