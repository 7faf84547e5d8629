//! Cosine similarity.

/// Cosine similarity between `a` and `b`: `dot(a, b) / (|a| * |b|)`.
///
/// Returns `None` when the lengths differ, either vector is empty, or either
/// has zero magnitude. Accumulates in `f64`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON || !denom.is_finite() {
        return None;
    }
    Some((dot / denom).clamp(-1.0, 1.0) as f32)
}
