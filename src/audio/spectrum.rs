use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Forward/inverse FFT pair planned for one signal length.
///
/// The planned transforms are `Send + Sync`, so one instance can be shared
/// across rayon workers; frames of different lengths need their own.
pub struct SpectralTransform {
    len: usize,
    plans: Option<(Arc<dyn Fft<f32>>, Arc<dyn Fft<f32>>)>,
}

impl SpectralTransform {
    pub fn new(len: usize) -> Self {
        let plans = (len > 0).then(|| {
            let mut planner = FftPlanner::<f32>::new();
            (planner.plan_fft_forward(len), planner.plan_fft_inverse(len))
        });
        Self { len, plans }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Transforms a real signal. Shorter input is zero padded, longer input truncated.
    pub fn forward(&self, signal: &[f32]) -> Spectrum {
        let Some((forward, _)) = &self.plans else {
            return Spectrum::default();
        };
        let mut buffer: Vec<Complex<f32>> = (0..self.len)
            .map(|i| Complex::new(signal.get(i).copied().unwrap_or(0.0), 0.0))
            .collect();
        forward.process(&mut buffer);
        Spectrum { bins: buffer }
    }

    /// Inverse transform of a full-length spectrum, returning the real parts.
    ///
    /// Output is not scaled by `1/N` (rustfft convention).
    pub fn inverse_real(&self, bins: &[Complex<f32>]) -> Vec<f32> {
        let Some((_, inverse)) = &self.plans else {
            return Vec::new();
        };
        let mut buffer: Vec<Complex<f32>> = (0..self.len)
            .map(|i| bins.get(i).copied().unwrap_or_default())
            .collect();
        inverse.process(&mut buffer);
        buffer.into_iter().map(|c| c.re).collect()
    }
}

const DECIBEL_FLOOR: f32 = 1e-10;

/// Complex bins of a forward transform, `N` of them for an `N`-sample signal.
#[derive(Clone, Debug, Default)]
pub struct Spectrum {
    bins: Vec<Complex<f32>>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[Complex<f32>] {
        &self.bins
    }

    /// `sqrt(re² + im²)` of bin `k`.
    pub fn magnitude(&self, k: usize) -> f32 {
        self.bins[k].norm()
    }

    /// Magnitudes of the non-negative frequency bins `0..N/2`.
    pub fn half_magnitudes(&self) -> Vec<f32> {
        self.bins[..self.bins.len() / 2].iter().map(|c| c.norm()).collect()
    }

    /// Real/imaginary pairs laid out as `[re0, im0, re1, im1, ...]`.
    pub fn interleaved(&self) -> Vec<f32> {
        self.bins.iter().flat_map(|c| [c.re, c.im]).collect()
    }

    /// Every bin magnitude in decibels (`20·log10`) as a real spectrum, ready
    /// for the inverse transform. Magnitudes are floored at -200 dB.
    pub fn decibels(&self) -> Vec<Complex<f32>> {
        self.bins
            .iter()
            .map(|c| Complex::new(20.0 * c.norm().max(DECIBEL_FLOOR).log10(), 0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn dc_signal_lands_in_bin_zero() {
        let transform = SpectralTransform::new(8);
        let spectrum = transform.forward(&[1.0; 8]);
        assert!((spectrum.magnitude(0) - 8.0).abs() < 1e-4);
        for k in 1..8 {
            assert!(spectrum.magnitude(k) < 1e-4);
        }
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let n = 64;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 5.0 * i as f32 / n as f32).sin())
            .collect();
        let mags = SpectralTransform::new(n).forward(&signal).half_magnitudes();
        assert_eq!(mags.len(), n / 2);
        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 5);
        assert!((mags[5] - n as f32 / 2.0).abs() < 1e-3);
    }

    #[test]
    fn inverse_is_unnormalized() {
        let transform = SpectralTransform::new(16);
        let signal: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let spectrum = transform.forward(&signal);
        let back = transform.inverse_real(spectrum.bins());
        for (orig, restored) in signal.iter().zip(back.iter()) {
            assert!((orig * 16.0 - restored).abs() < 1e-2);
        }
    }

    #[test]
    fn decibels_floor_empty_bins() {
        let spectrum = SpectralTransform::new(8).forward(&[1.0; 8]);
        let db = spectrum.decibels();
        assert!((db[0].re - 20.0 * 8f32.log10()).abs() < 1e-4);
        assert!(db[1..].iter().all(|c| c.re >= -200.0 && c.im == 0.0));
    }

    #[test]
    fn interleaved_pairs() {
        let spectrum = SpectralTransform::new(4).forward(&[1.0, 0.0, 0.0, 0.0]);
        let flat = spectrum.interleaved();
        assert_eq!(flat.len(), 8);
        assert!((flat[0] - 1.0).abs() < 1e-6);
        assert!(flat[1].abs() < 1e-6);
    }

    #[test]
    fn empty_transform_is_empty() {
        let transform = SpectralTransform::new(0);
        assert!(transform.is_empty());
        assert!(transform.forward(&[]).is_empty());
        assert!(transform.inverse_real(&[]).is_empty());
    }
}
