/// Cosine similarity `dot(a, b) / (|a| |b|)`.
///
/// `None` when either vector has zero norm or the lengths differ.
///
/// # Example
/// ```
/// use segsift::cluster::cosine_similarity;
///
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]), Some(0.0));
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), None);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if !(denom > 0.0) || !denom.is_finite() {
        return None;
    }
    Some((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// Population variance of the vector's elements, 0.0 when empty.
pub fn variance(v: &[f32]) -> f32 {
    if v.is_empty() {
        return 0.0;
    }
    let n = v.len() as f64;
    let mean = v.iter().map(|&x| x as f64).sum::<f64>() / n;
    (v.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n) as f32
}

/// Squared Euclidean distance.
pub(crate) fn squared_distance<'a, 'b>(a: impl IntoIterator<Item = &'a f32>, b: impl IntoIterator<Item = &'b f32>) -> f32 {
    a.into_iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_self_similarity() {
        let v = [0.3, -1.2, 4.0];
        assert_relative_eq!(cosine_similarity(&v, &v).unwrap(), 1.0, epsilon = 1e-6);
        let neg = [-0.3, 1.2, -4.0];
        assert_relative_eq!(cosine_similarity(&v, &neg).unwrap(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_known_angle() {
        let b = [0.9, (1.0f32 - 0.81).sqrt()];
        assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &b).unwrap(), 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn test_variance() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[2.0, 2.0]), 0.0);
        assert_relative_eq!(variance(&[1.0, 0.0]), 0.25);
        assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }
}
