use crate::engine::error::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Type-II discrete cosine transform, `Y_k = 2 sum_j x_j cos(pi k (2j + 1) / 2n)`.
///
/// Computed with a single complex FFT of the even/odd reordered input.
#[cfg(feature = "fft")]
pub fn dct2(input: &[f64]) -> Result<Vec<f64>> {
    use super::backend;
    use crate::core::units::PI;
    use rustfft::num_complex::Complex;

    let n = input.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![Complex { re: 0.0, im: 0.0 }; n];
    for (j, pair) in input.chunks(2).enumerate() {
        buf[j].re = pair[0];
        if let Some(&odd) = pair.get(1) {
            buf[n - 1 - j].re = odd;
        }
    }
    backend::forward(n).process(&mut buf);

    Ok(buf
        .iter()
        .enumerate()
        .map(|(k, v)| {
            let twiddle = Complex::from_polar(1.0, -PI * k as f64 / (2 * n) as f64);
            2.0 * (*v * twiddle).re
        })
        .collect())
}

#[cfg(not(feature = "fft"))]
pub fn dct2(_input: &[f64]) -> Result<Vec<f64>> {
    Err(crate::engine::error::EngineError::BackendUnavailable(
        "discrete cosine transform",
    ))
}

/// Transforms every curve independently.
pub fn dct2_batch(curves: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    #[cfg(not(feature = "parallel"))]
    let iter = curves.iter();
    #[cfg(feature = "parallel")]
    let iter = curves.par_iter();

    iter.map(|c| dct2(c)).collect()
}

#[cfg(all(test, feature = "fft"))]
mod tests {
    use super::*;
    use crate::core::units::PI;

    const TOLERANCE: f64 = 1e-9;

    fn reference_dct2(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                2.0 * x
                    .iter()
                    .enumerate()
                    .map(|(j, v)| v * (PI * k as f64 * (2 * j + 1) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    #[test]
    fn matches_direct_definition_for_odd_and_even_lengths() {
        for n in [1usize, 2, 5, 8, 13] {
            let x: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 5) as f64 - 1.5).collect();
            let fast = dct2(&x).unwrap();
            let slow = reference_dct2(&x);
            for (a, b) in fast.iter().zip(&slow) {
                assert!((a - b).abs() < TOLERANCE, "n = {n}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn constant_input_concentrates_in_first_coefficient() {
        let y = dct2(&[1.5; 6]).unwrap();
        assert!((y[0] - 18.0).abs() < TOLERANCE);
        for v in &y[1..] {
            assert!(v.abs() < TOLERANCE);
        }
    }

    #[test]
    fn batch_transforms_each_curve() {
        let curves = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let out = dct2_batch(&curves).unwrap();
        assert_eq!(out.len(), 2);
        for (curve, transformed) in curves.iter().zip(&out) {
            for (a, b) in transformed.iter().zip(reference_dct2(curve)) {
                assert!((a - b).abs() < TOLERANCE);
            }
        }
    }
}
