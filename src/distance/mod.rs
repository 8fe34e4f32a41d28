//! Distance functions consumed by the graph.
//!
//! The graph never looks inside items. It only needs a symmetric function
//! returning a totally ordered value, expressed by the [`Distance`] trait.
//! Closures implement it directly, and [`DistanceMetric`] covers the common
//! metrics over anything that can be viewed as `&[f32]`.

pub mod scalar;

pub use scalar::{
    cosine_distance, cosine_distance_unit, dot_product, euclidean_distance,
    euclidean_distance_squared, manhattan_distance, normalize,
};

use std::fmt::Debug;

/// A symmetric distance between two items.
///
/// `Output` must be totally ordered in practice. Incomparable values (NaN)
/// are treated as equal and then ordered by node id.
pub trait Distance<T: ?Sized>: Send + Sync {
    /// Distance value type.
    type Output: PartialOrd + Copy + Send + Sync + Debug;

    /// Computes the distance between `a` and `b`.
    fn distance(&self, a: &T, b: &T) -> Self::Output;
}

impl<T, D, F> Distance<T> for F
where
    T: ?Sized,
    D: PartialOrd + Copy + Send + Sync + Debug,
    F: Fn(&T, &T) -> D + Send + Sync,
{
    type Output = D;

    #[inline]
    fn distance(&self, a: &T, b: &T) -> D {
        self(a, b)
    }
}

/// Supported distance metrics for `f32` vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Squared Euclidean distance. Same ordering as `Euclidean`, cheaper.
    EuclideanSquared,
    /// Cosine distance `1 - cos(a, b)`, range `[0, 2]`.
    Cosine,
    /// Cosine distance for vectors normalized ahead of time: `1 - dot(a, b)`.
    CosineUnit,
    /// Negative dot product. Larger dot product means smaller distance.
    DotProduct,
    /// Manhattan (L1) distance.
    Manhattan,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric.
    ///
    /// # Panics
    /// Panics if the vectors have different dimensions.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::EuclideanSquared => euclidean_distance_squared(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::CosineUnit => cosine_distance_unit(a, b),
            DistanceMetric::DotProduct => -dot_product(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }
}

impl<T> Distance<T> for DistanceMetric
where
    T: AsRef<[f32]> + ?Sized,
{
    type Output = f32;

    #[inline]
    fn distance(&self, a: &T, b: &T) -> f32 {
        self.compute(a.as_ref(), b.as_ref())
    }
}
