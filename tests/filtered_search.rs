//! Filtered search through closures and bitmap allow lists.

use roaring::RoaringBitmap;
use smallworld::dataset::exact_knn;
use smallworld::{recall_at_k, Dataset, DistanceMetric, HnswIndex, NodeId, Parameters, SearchOptions};

type VecIndex = HnswIndex<Vec<f32>, DistanceMetric>;

fn built() -> (VecIndex, Dataset) {
    let dataset = Dataset::generate(600, 25, 10, 64);
    let mut index = HnswIndex::with_seed(Parameters::new(10), DistanceMetric::Euclidean, 64).unwrap();
    index.add_items(dataset.vectors.clone()).unwrap();
    (index, dataset)
}

#[test]
fn test_bitmap_filter_admits_only_members() {
    let (index, dataset) = built();
    let allowed: RoaringBitmap = (0..600u32).filter(|id| id % 2 == 0).collect();

    let options = SearchOptions::new().with_ef(64).with_filter(&allowed);

    for query in &dataset.queries {
        let results = index.knn_search_with(query, 8, &options).unwrap().results;
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|(id, _)| id % 2 == 0));
    }
}

#[test]
fn test_filtered_recall_against_restricted_ground_truth() {
    let (index, dataset) = built();
    let allowed: Vec<NodeId> = (0..600).filter(|id| id % 2 == 0).collect();
    let subset: Vec<Vec<f32>> = allowed.iter().map(|&id| dataset.vectors[id].clone()).collect();
    let filter = |id: NodeId| id % 2 == 0;
    let options = SearchOptions::new().with_ef(100).with_filter(&filter);

    let mut total = 0.0;
    for query in &dataset.queries {
        let truth: Vec<NodeId> = exact_knn(&subset, query, 5, DistanceMetric::Euclidean)
            .into_iter()
            .map(|i| allowed[i])
            .collect();
        let outcome = index.knn_search_with(query, 5, &options).unwrap();
        let ids: Vec<NodeId> = outcome.results.iter().map(|(id, _)| *id).collect();
        total += recall_at_k(&ids, &truth, 5);
    }
    let recall = total / dataset.queries.len() as f32;
    assert!(recall >= 0.7, "Expected filtered recall@5 >= 0.7, got {}", recall);
}

#[test]
fn test_cached_and_uncached_agree() {
    let (index, dataset) = built();
    let filter = |id: NodeId| id % 3 != 1;

    for query in &dataset.queries {
        let cached = index
            .knn_search_with(query, 10, &SearchOptions::new().with_ef(40).with_filter(&filter))
            .unwrap();
        let uncached = index
            .knn_search_with(
                query,
                10,
                &SearchOptions::new()
                    .with_ef(40)
                    .with_filter(&filter)
                    .without_filter_cache(),
            )
            .unwrap();

        assert_eq!(cached.results, uncached.results);
        assert!(cached.statistics.filter_evaluations > 0);
        assert!(cached.statistics.filter_evaluations <= uncached.statistics.filter_evaluations);
    }
}

#[test]
fn test_filter_admitting_nothing() {
    let (index, dataset) = built();
    let nothing = RoaringBitmap::new();

    let outcome = index
        .knn_search_with(&dataset.queries[0], 5, &SearchOptions::new().with_filter(&nothing))
        .unwrap();
    assert!(outcome.results.is_empty());
    assert!(outcome.statistics.expanded_nodes > 0);
}

#[test]
fn test_filter_admitting_everything_matches_unfiltered() {
    let (index, dataset) = built();
    let everything = |_: NodeId| true;

    for query in &dataset.queries {
        assert_eq!(
            index.knn_search_filtered(query, 6, &everything).unwrap(),
            index.knn_search(query, 6).unwrap()
        );
    }
}

#[test]
fn test_single_admitted_id() {
    let (index, dataset) = built();
    let mut only = RoaringBitmap::new();
    only.insert(17);

    let outcome = index
        .knn_search_with(
            &dataset.vectors[17],
            3,
            &SearchOptions::new().with_ef(600).with_filter(&only),
        )
        .unwrap();
    let ids: Vec<NodeId> = outcome.results.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![17]);
}
