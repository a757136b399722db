//! Embedding vector helpers.
//!
//! Embeddings come from an external model and are not guaranteed to be
//! unit-length, so similarity always divides by both norms.

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

/// Cosine similarity in `[-1, 1]`; 0 when either vector has zero norm.
///
/// Callers must pass equal-length vectors; extra trailing elements of the
/// longer one are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_l2_norm() {
        assert_relative_eq!(l2_norm(&[3.0, 4.0]), 5.0);
        assert_eq!(l2_norm(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_identical_unit() {
        let a = vec![0.6, 0.8];
        assert_relative_eq!(cosine_similarity(&a, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_unnormalized_input() {
        let a = vec![3.0, 4.0];
        let b = vec![30.0, 40.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert_relative_eq!(cosine_similarity(&a, &b), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &a), 0.0);
    }

    #[rstest]
    #[case(vec![1.0, 2.0, 3.0], vec![4.0, -5.0, 6.0])]
    #[case(vec![0.1, 0.9], vec![0.7, 0.2])]
    #[case(vec![-3.0, 0.5, 2.0, 1.0], vec![1.0, 1.0, -1.0, 0.0])]
    fn test_cosine_similarity_symmetric(#[case] a: Vec<f32>, #[case] b: Vec<f32>) {
        assert_relative_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }
}
