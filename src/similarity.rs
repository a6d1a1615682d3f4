use crate::error::{Error, Result};

/// Cosine similarity between two fingerprints: dot product over the product
/// of Euclidean norms.
///
/// A zero-magnitude vector on either side yields 0.0 rather than NaN.
/// Mismatched lengths mean a corrupted embedding slipped past the embedder
/// contract; that fails fast instead of silently truncating.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::Internal(format!(
            "embedding length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3_f32, 0.7, 0.1, 0.9];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let zero = [0.0_f32; 4];
        let v = [0.5_f32, 0.5, 0.5, 0.5];
        assert_eq!(cosine_similarity(&zero, &v).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&v, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = [0.1_f32, 0.8, 0.3, 0.4];
        let b = [0.9_f32, 0.2, 0.6, 0.5];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = [1.0_f32, 0.0];
        let b = [0.0_f32, 1.0];
        let score = cosine_similarity(&a, &b).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn length_mismatch_fails_fast() {
        let a = [1.0_f32, 0.0, 0.0];
        let b = [1.0_f32, 0.0];
        let err = cosine_similarity(&a, &b).unwrap_err();
        assert_eq!(err.kind(), "internal");
    }
}
