// Vector kernels used by every similarity computation.
// AVX2/FMA path on x86_64 for long embeddings, unrolled scalar fallback elsewhere.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

// Below this length the feature detection costs more than it saves
#[cfg(target_arch = "x86_64")]
const MIN_DIM_SIZE_AVX: usize = 32;

/// Dot product of two equally sized slices.
/// Returns 0.0 when the lengths differ.
#[inline]
pub fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_AVX
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { dot_product_avx2(a, b) };
        }
    }

    dot_product_scalar(a, b)
}

/// Squared Euclidean distance of two equally sized slices.
/// Returns infinity when the lengths differ.
#[inline]
pub fn l2_squared_simd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_AVX
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { l2_squared_avx2(a, b) };
        }
    }

    l2_squared_scalar(a, b)
}

/// Euclidean distance
#[inline]
pub fn l2_distance_simd(a: &[f32], b: &[f32]) -> f32 {
    l2_squared_simd(a, b).sqrt()
}

/// Squared length of a vector
#[inline]
pub fn norm_squared_simd(v: &[f32]) -> f32 {
    dot_product_simd(v, v)
}

/// Length of a vector
#[inline]
pub fn norm_simd(v: &[f32]) -> f32 {
    norm_squared_simd(v).sqrt()
}

/// `acc += scale * v`, element-wise
#[inline]
pub fn add_scaled(acc: &mut [f32], v: &[f32], scale: f32) {
    debug_assert_eq!(acc.len(), v.len());
    for (a, x) in acc.iter_mut().zip(v) {
        *a += scale * x;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn horizontal_sum(v: __m256) -> f32 {
    let high = _mm256_extractf128_ps(v, 1);
    let low = _mm256_castps256_ps128(v);
    let mut sum = _mm_add_ps(high, low);
    sum = _mm_hadd_ps(sum, sum);
    sum = _mm_hadd_ps(sum, sum);
    _mm_cvtss_f32(sum)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= dim {
        let x0 = _mm256_loadu_ps(a.as_ptr().add(i));
        let y0 = _mm256_loadu_ps(b.as_ptr().add(i));
        let x1 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
        let y1 = _mm256_loadu_ps(b.as_ptr().add(i + 8));
        acc0 = _mm256_fmadd_ps(x0, y0, acc0);
        acc1 = _mm256_fmadd_ps(x1, y1, acc1);
        i += 16;
    }

    let mut dot = horizontal_sum(_mm256_add_ps(acc0, acc1));
    for j in i..dim {
        dot += a[j] * b[j];
    }
    dot
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn l2_squared_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= dim {
        let d0 = _mm256_sub_ps(
            _mm256_loadu_ps(a.as_ptr().add(i)),
            _mm256_loadu_ps(b.as_ptr().add(i)),
        );
        let d1 = _mm256_sub_ps(
            _mm256_loadu_ps(a.as_ptr().add(i + 8)),
            _mm256_loadu_ps(b.as_ptr().add(i + 8)),
        );
        acc0 = _mm256_fmadd_ps(d0, d0, acc0);
        acc1 = _mm256_fmadd_ps(d1, d1, acc1);
        i += 16;
    }

    let mut sum = horizontal_sum(_mm256_add_ps(acc0, acc1));
    for j in i..dim {
        let d = a[j] - b[j];
        sum += d * d;
    }
    sum
}

/// Four independent accumulators so the loop pipelines
#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail = a_chunks.remainder().len();

    for (x, y) in a_chunks.zip(b_chunks) {
        acc[0] += x[0] * y[0];
        acc[1] += x[1] * y[1];
        acc[2] += x[2] * y[2];
        acc[3] += x[3] * y[3];
    }

    let start = a.len() - tail;
    let rest: f32 = a[start..].iter().zip(&b[start..]).map(|(x, y)| x * y).sum();
    acc[0] + acc[1] + acc[2] + acc[3] + rest
}

#[inline]
fn l2_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail = a_chunks.remainder().len();

    for (x, y) in a_chunks.zip(b_chunks) {
        for k in 0..4 {
            let d = x[k] - y[k];
            acc[k] += d * d;
        }
    }

    let start = a.len() - tail;
    let rest: f32 = a[start..]
        .iter()
        .zip(&b[start..])
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    acc[0] + acc[1] + acc[2] + acc[3] + rest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_product_matches_naive() {
        for dim in [1, 3, 4, 7, 16, 33, 100, 768] {
            let a: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.37).sin()).collect();
            let b: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.11).cos()).collect();
            let expected = naive_dot(&a, &b);
            let actual = dot_product_simd(&a, &b);
            assert!(
                (expected - actual).abs() < 1e-3,
                "dim {}: expected {}, got {}",
                dim,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_l2_distance() {
        assert!((l2_distance_simd(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);

        let a = vec![1.0f32; 64];
        let b = vec![0.0f32; 64];
        assert!((l2_squared_simd(&a, &b) - 64.0).abs() < 1e-4);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert_eq!(dot_product_simd(&[1.0, 2.0], &[1.0]), 0.0);
        assert!(l2_squared_simd(&[1.0, 2.0], &[1.0]).is_infinite());
    }

    #[test]
    fn test_add_scaled() {
        let mut acc = vec![1.0, 1.0, 1.0];
        add_scaled(&mut acc, &[2.0, 4.0, 6.0], 0.5);
        assert_eq!(acc, vec![2.0, 3.0, 4.0]);
    }
}
