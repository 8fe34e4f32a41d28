//! Build an index, measure recall, save it, reload it and search in parallel.
//!
//! Run with: cargo run --release --example build_and_search
//! Set RUST_LOG=smallworld=debug to see insertion and persistence logs.

use rand::rngs::StdRng;
use rand::SeedableRng;
use roaring::RoaringBitmap;
use smallworld::{recall_at_k, Dataset, DistanceMetric, HnswIndex, Parameters, SearchOptions};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const K: usize = 10;

fn main() -> smallworld::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    println!("Generating dataset...");
    let mut dataset = Dataset::generate(5000, 100, 64, 7);

    println!("Computing ground truth...");
    dataset.compute_ground_truth(K, DistanceMetric::Euclidean);

    let params = Parameters::new(16).with_ef_construction(200);
    let mut index = HnswIndex::with_seed(params, DistanceMetric::Euclidean, 7)?;

    println!("Building index in batches of 50...");
    let start = Instant::now();
    for chunk in dataset.vectors.chunks(50) {
        index.add_items(chunk.to_vec())?;
    }
    println!("Built {} nodes in {:.2?}", index.len(), start.elapsed());
    println!("{}", index.statistics().summary());
    println!("Health: {:?}\n", index.health_check());

    println!("{:>8} {:>10} {:>12} {:>10}", "ef", "recall@10", "latency(us)", "expanded");
    println!("{}", "-".repeat(44));
    for ef in [10, 20, 50, 100, 200] {
        let options = SearchOptions::new().with_ef(ef);
        let mut recall = 0.0;
        let mut expanded = 0;
        let start = Instant::now();
        for (query, truth) in dataset.queries.iter().zip(&dataset.ground_truth) {
            let outcome = index.knn_search_with(query, K, &options)?;
            let ids: Vec<usize> = outcome.results.iter().map(|(id, _)| *id).collect();
            recall += recall_at_k(&ids, truth, K);
            expanded += outcome.statistics.expanded_nodes;
        }
        let queries = dataset.queries.len();
        println!(
            "{:>8} {:>10.3} {:>12.1} {:>10}",
            ef,
            recall / queries as f32,
            start.elapsed().as_micros() as f64 / queries as f64,
            expanded / queries
        );
    }

    let path = std::env::temp_dir().join("smallworld_demo.hnsw");
    println!("\nSaving graph to {}", path.display());
    index.save_graph(&path)?;

    let mut restored = HnswIndex::load_graph(
        dataset.vectors.clone(),
        DistanceMetric::Euclidean,
        StdRng::seed_from_u64(8),
        &path,
    )?;
    restored.set_ef_search(64);
    println!("Reloaded {} nodes", restored.len());

    let start = Instant::now();
    let batch = restored.knn_search_batch(&dataset.queries, K)?;
    println!(
        "Parallel batch search of {} queries in {:.2?}",
        batch.len(),
        start.elapsed()
    );

    let even: RoaringBitmap = (0..dataset.vectors.len() as u32).filter(|id| id % 2 == 0).collect();
    let outcome = restored.knn_search_with(
        &dataset.queries[0],
        K,
        &SearchOptions::new().with_filter(&even),
    )?;
    println!("Filtered search: {:?}", outcome.results.iter().map(|(id, _)| id).collect::<Vec<_>>());
    println!("{}", outcome.statistics.summary());

    std::fs::remove_file(&path)?;
    Ok(())
}
