use crate::core::units;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Converts a smearing width in Kelvin to the normalised frequency scale of a
/// spectrum sampled every `dtion_ps` picoseconds.
pub fn smearing_from_temperature(kelvin: f64, dtion_ps: f64) -> f64 {
    kelvin * (units::KB_EV * 1e3) / units::THZ_TO_MEV * (2.0 * dtion_ps)
}

/// Convolves a spectrum with a Gaussian of width `sigma`, on the normalised
/// axis `i / n`.
pub fn gaussian_broaden(raw: &[f64], sigma: f64) -> Vec<f64> {
    let n = raw.len();
    let mut fit = vec![0.0; n];
    if n == 0 {
        return fit;
    }
    let renorm = 1.0 / (sigma * (2.0 * units::PI).sqrt());
    let inv_two_sigma2 = 1.0 / (2.0 * sigma * sigma);
    let inv_n = 1.0 / n as f64;

    for (i, value) in raw.iter().enumerate() {
        let center = i as f64 * inv_n;
        let amplitude = value * renorm;
        for (g, out) in fit.iter_mut().enumerate() {
            let d = g as f64 * inv_n - center;
            *out += amplitude * (-d * d * inv_two_sigma2).exp();
        }
    }
    fit
}

pub fn gaussian_broaden_all(curves: &[Vec<f64>], sigma: f64) -> Vec<Vec<f64>> {
    #[cfg(not(feature = "parallel"))]
    let iter = curves.iter();
    #[cfg(feature = "parallel")]
    let iter = curves.par_iter();

    iter.map(|c| gaussian_broaden(c, sigma)).collect()
}
