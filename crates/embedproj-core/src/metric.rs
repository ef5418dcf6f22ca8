//! Cosine distance between embedding vectors.

/// Distance assigned to any pair involving a zero-magnitude vector.
pub const MAX_DISTANCE: f32 = 2.0;

/// Cosine metric used by neighbor search.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineMetric;

impl CosineMetric {
    /// Cosine similarity clamped to [-1, 1].
    ///
    /// Returns `None` if either vector has zero magnitude or the result is
    /// not finite (non-finite components). Sums run in f64 so components
    /// near the f32 limit do not overflow.
    /// Panics if slices have different lengths.
    pub fn similarity(a: &[f32], b: &[f32]) -> Option<f32> {
        assert_eq!(
            a.len(),
            b.len(),
            "vector dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        );

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;

        for (&x, &y) in a.iter().zip(b) {
            let (x, y) = (x as f64, y as f64);
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom == 0.0 {
            return None;
        }

        let sim = dot / denom;
        if !sim.is_finite() {
            return None;
        }

        Some(sim.clamp(-1.0, 1.0) as f32)
    }

    /// `1 - similarity`, in [0, 2].
    ///
    /// A zero-magnitude vector is maximally distant from everything,
    /// including itself.
    pub fn distance(a: &[f32], b: &[f32]) -> f32 {
        match Self::similarity(a, b) {
            Some(sim) => 1.0 - sim,
            None => MAX_DISTANCE,
        }
    }
}
