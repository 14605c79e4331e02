use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of the random term added to each score.
pub trait NoiseSource {
    fn sample(&mut self) -> f64;
}

/// Zero-mean Gaussian noise.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: StdRng,
    std_dev: f64,
}

impl GaussianNoise {
    pub fn from_entropy(std_dev: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            std_dev,
        }
    }

    pub fn seeded(seed: u64, std_dev: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            std_dev,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl NoiseSource for GaussianNoise {
    fn sample(&mut self) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * self.std_dev
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self) -> f64 {
        0.0
    }
}

/// Returns the same value on every draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut a = GaussianNoise::seeded(7, 2.0);
        let mut b = GaussianNoise::seeded(7, 2.0);
        for _ in 0..16 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn zero_std_dev_yields_zero() {
        let mut noise = GaussianNoise::seeded(1, 0.0);
        for _ in 0..8 {
            assert_eq!(noise.sample(), 0.0);
        }
    }

    #[test]
    fn sample_spread_tracks_std_dev() {
        let mut noise = GaussianNoise::seeded(42, 2.0);
        let samples: Vec<f64> = (0..5_000).map(|_| noise.sample()).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.2);
        assert!((variance.sqrt() - 2.0).abs() < 0.2);
    }
}
