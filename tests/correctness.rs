//! Search quality checked against exhaustive ground truth.
//!
//! Run with: cargo test

use smallworld::dataset::exact_knn;
use smallworld::{recall_at_k, Dataset, DistanceMetric, HnswIndex, NeighbourSelection, Parameters, SearchOptions};

fn mean_recall(
    index: &HnswIndex<Vec<f32>, DistanceMetric>,
    dataset: &Dataset,
    k: usize,
    ef: usize,
) -> f32 {
    let options = SearchOptions::new().with_ef(ef);
    let total: f32 = dataset
        .queries
        .iter()
        .zip(&dataset.ground_truth)
        .map(|(query, truth)| {
            let outcome = index.knn_search_with(query, k, &options).unwrap();
            let ids: Vec<usize> = outcome.results.iter().map(|(id, _)| *id).collect();
            recall_at_k(&ids, truth, k)
        })
        .sum();
    total / dataset.queries.len() as f32
}

fn build(
    dataset: &Dataset,
    params: Parameters,
    metric: DistanceMetric,
) -> HnswIndex<Vec<f32>, DistanceMetric> {
    let mut index = HnswIndex::with_seed(params, metric, 1234).unwrap();
    index.add_items(dataset.vectors.clone()).unwrap();
    index
}

#[test]
fn test_high_recall_euclidean() {
    let mut dataset = Dataset::generate(1000, 50, 16, 42);
    dataset.compute_ground_truth(10, DistanceMetric::Euclidean);
    let index = build(&dataset, Parameters::new(16), DistanceMetric::Euclidean);

    let recall = mean_recall(&index, &dataset, 10, 100);
    assert!(recall >= 0.9, "Expected recall@10 >= 0.9, got {}", recall);
}

#[test]
fn test_high_recall_cosine_unit() {
    let mut dataset = Dataset::generate_normalized(800, 40, 24, 17);
    dataset.compute_ground_truth(10, DistanceMetric::CosineUnit);
    let index = build(&dataset, Parameters::new(12), DistanceMetric::CosineUnit);

    let recall = mean_recall(&index, &dataset, 10, 100);
    assert!(recall >= 0.85, "Expected recall@10 >= 0.85, got {}", recall);
}

#[test]
fn test_simple_selection_still_finds_neighbors() {
    let mut dataset = Dataset::generate(600, 30, 8, 8);
    dataset.compute_ground_truth(5, DistanceMetric::Euclidean);
    let params = Parameters::new(12).with_neighbour_selection(NeighbourSelection::Simple);
    let index = build(&dataset, params, DistanceMetric::Euclidean);

    let recall = mean_recall(&index, &dataset, 5, 64);
    assert!(recall >= 0.8, "Expected recall@5 >= 0.8, got {}", recall);
}

#[test]
fn test_recall_grows_with_search_breadth() {
    let mut dataset = Dataset::generate(1500, 60, 24, 3);
    dataset.compute_ground_truth(10, DistanceMetric::Euclidean);
    let index = build(
        &dataset,
        Parameters::new(6).with_ef_construction(40),
        DistanceMetric::Euclidean,
    );

    let narrow = mean_recall(&index, &dataset, 10, 10);
    let wide = mean_recall(&index, &dataset, 10, 200);
    assert!(
        wide + 0.02 >= narrow,
        "Recall should not drop with larger ef: ef=10 -> {}, ef=200 -> {}",
        narrow,
        wide
    );
    assert!(wide >= 0.9, "Expected recall@10 >= 0.9 at ef=200, got {}", wide);
}

#[test]
fn test_recall_grows_with_construction_breadth() {
    let mut dataset = Dataset::generate(1200, 60, 24, 5);
    dataset.compute_ground_truth(10, DistanceMetric::Euclidean);
    let coarse = build(
        &dataset,
        Parameters::new(6).with_ef_construction(6),
        DistanceMetric::Euclidean,
    );
    let fine = build(
        &dataset,
        Parameters::new(6).with_ef_construction(200),
        DistanceMetric::Euclidean,
    );

    let coarse_recall = mean_recall(&coarse, &dataset, 10, 20);
    let fine_recall = mean_recall(&fine, &dataset, 10, 20);
    assert!(
        fine_recall + 0.02 >= coarse_recall,
        "Recall should not drop with larger ef_construction: 6 -> {}, 200 -> {}",
        coarse_recall,
        fine_recall
    );
}

#[test]
fn test_closure_distance_over_integers() {
    let items: Vec<u64> = (0..500).map(|i| i * 7 % 1009).collect();
    let distance = |a: &u64, b: &u64| a.abs_diff(*b);
    let mut index = HnswIndex::with_seed(Parameters::new(8), distance, 9).unwrap();
    index.add_items(items.clone()).unwrap();
    index.set_ef_search(32);

    let query = 500u64;
    let results = index.knn_search(&query, 3).unwrap();
    let mut expected: Vec<(usize, u64)> = items
        .iter()
        .enumerate()
        .map(|(id, x)| (id, x.abs_diff(query)))
        .collect();
    expected.sort_by_key(|&(id, d)| (d, id));

    assert_eq!(results, expected[..3].to_vec());
}

#[test]
fn test_exact_knn_reference() {
    let vectors = vec![vec![0.0f32, 0.0], vec![2.0, 0.0], vec![1.0, 0.0], vec![-1.0, 0.0]];
    let nearest = exact_knn(&vectors, &[0.0, 0.0], 3, DistanceMetric::Euclidean);
    // 2 and 3 tie at distance 1, lower id first
    assert_eq!(nearest, vec![0, 2, 3]);
}
