use crate::engine::error::{EngineError, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of lags computed for a series of `n` samples.
#[inline]
pub fn lag_count(n: usize) -> usize {
    (n / 2).max(1)
}

/// Autocorrelation of `nsignal` interleaved signals.
///
/// `series[t * nsignal + s]` is sample `t` of signal `s`. Returns the lag
/// count and `c[tau * nsignal + s] = sum_{t < n - tau} x[t] x[t + tau] / (n - tau)`
/// for `tau < lag_count(n)`.
pub fn autocorrelation(series: &[f64], nsignal: usize) -> Result<(usize, Vec<f64>)> {
    if nsignal == 0 || series.len() % nsignal != 0 || series.is_empty() {
        return Err(EngineError::invalid(
            "series",
            format!(
                "{} samples cannot be split into {nsignal} non-empty signals",
                series.len()
            ),
        ));
    }
    let n = series.len() / nsignal;
    let ntau = lag_count(n);

    #[cfg(not(feature = "parallel"))]
    let signals = (0..nsignal).into_iter();
    #[cfg(feature = "parallel")]
    let signals = (0..nsignal).into_par_iter();

    let per_signal: Vec<Vec<f64>> = signals
        .map(|s| {
            let x: Vec<f64> = series.iter().skip(s).step_by(nsignal).copied().collect();
            signal_acf(&x, ntau)
        })
        .collect();

    let mut out = vec![0.0; ntau * nsignal];
    for (s, acf) in per_signal.iter().enumerate() {
        for (tau, value) in acf.iter().enumerate() {
            out[tau * nsignal + s] = *value;
        }
    }
    Ok((ntau, out))
}

#[cfg(feature = "fft")]
fn signal_acf(x: &[f64], ntau: usize) -> Vec<f64> {
    use super::backend;
    use rustfft::num_complex::Complex;

    let n = x.len();
    let size = (n * 2).next_power_of_two();
    let fft = backend::forward(size);
    let ifft = backend::inverse(size);

    let mut buf = vec![Complex { re: 0.0, im: 0.0 }; size];
    for (b, &v) in buf.iter_mut().zip(x) {
        b.re = v;
    }
    fft.process(&mut buf);
    for v in &mut buf {
        *v = Complex {
            re: v.norm_sqr(),
            im: 0.0,
        };
    }
    ifft.process(&mut buf);

    let scale = 1.0 / size as f64;
    (0..ntau)
        .map(|tau| buf[tau].re * scale / (n - tau) as f64)
        .collect()
}

#[cfg(not(feature = "fft"))]
fn signal_acf(x: &[f64], ntau: usize) -> Vec<f64> {
    direct_acf(x, ntau)
}

#[cfg(any(test, not(feature = "fft")))]
fn direct_acf(x: &[f64], ntau: usize) -> Vec<f64> {
    let n = x.len();
    (0..ntau)
        .map(|tau| {
            let sum: f64 = x[..n - tau].iter().zip(&x[tau..]).map(|(a, b)| a * b).sum();
            sum / (n - tau) as f64
        })
        .collect()
}
