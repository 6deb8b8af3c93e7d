use profilerag_core::error::{Error, Result};

/// Cosine similarity clamped to [0, 1]. Zero when either vector has zero norm,
/// a non-finite component, or the lengths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() { return 0.0; }
    let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 { return 0.0; }
    let cos = dot / (na.sqrt() * nb.sqrt());
    if !cos.is_finite() { return 0.0; }
    (cos as f32).clamp(0.0, 1.0)
}

/// Reject vectors carrying NaN or infinite components.
pub fn ensure_finite(vector: &[f32]) -> Result<()> {
    match vector.iter().position(|x| !x.is_finite()) {
        None => Ok(()),
        Some(i) => Err(Error::InvalidInput(format!("vector component {} is not finite", i))),
    }
}

/// Map a LanceDB cosine distance (`1 - cos`) back to a clamped similarity.
pub fn score_from_cosine_distance(distance: f32) -> f32 {
    if distance.is_nan() { return 0.0; }
    (1.0 - distance).clamp(0.0, 1.0)
}
