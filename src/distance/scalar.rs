//! Scalar distance kernels over `f32` slices.
//!
//! The loops accumulate into four independent lanes so the compiler can
//! vectorize them without explicit intrinsics.

const LANES: usize = 4;

#[inline]
fn lanes_sum<F>(a: &[f32], b: &[f32], f: F) -> f32
where
    F: Fn(f32, f32) -> f32,
{
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut acc = [0.0f32; LANES];
    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let tail_a = chunks_a.remainder();
    let tail_b = chunks_b.remainder();

    for (ca, cb) in chunks_a.zip(chunks_b) {
        for lane in 0..LANES {
            acc[lane] += f(ca[lane], cb[lane]);
        }
    }

    let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
    for (x, y) in tail_a.iter().zip(tail_b) {
        sum += f(*x, *y);
    }
    sum
}

/// Euclidean (L2) distance: `sqrt(sum((a[i] - b[i])^2))`.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Squared Euclidean distance. Preserves the ordering of [`euclidean_distance`]
/// without the square root.
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    lanes_sum(a, b, |x, y| {
        let diff = x - y;
        diff * diff
    })
}

/// Dot product: `sum(a[i] * b[i])`.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    lanes_sum(a, b, |x, y| x * y)
}

/// Manhattan (L1) distance: `sum(|a[i] - b[i]|)`.
#[inline]
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    lanes_sum(a, b, |x, y| (x - y).abs())
}

/// Cosine similarity in `[-1, 1]`. Zero vectors have similarity 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let denom = (dot_product(a, a) * dot_product(b, b)).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Cosine distance in `[0, 2]`: `1 - cosine_similarity(a, b)`.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Cosine distance for vectors already normalized to unit length.
#[inline]
pub fn cosine_distance_unit(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot_product(a, b)
}

/// Scales `v` in place to unit length. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
