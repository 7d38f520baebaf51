use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Returns `true` with probability `chance`.
/// Chances outside of `[0, 1]` saturate.
pub(crate) fn gen_bool<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    rng.gen::<f32>() < chance
}

/// Samples a gaussian with the given mean and standard deviation.
///
/// A degenerate deviation (zero, negative or non-finite)
/// yields the mean itself.
pub(crate) fn randn<R: Rng + ?Sized>(rng: &mut R, mean: f32, stdev: f32) -> f32 {
    match Normal::new(mean, stdev) {
        Ok(normal) if stdev > 0.0 => normal.sample(rng),
        _ => mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn gen_bool_saturates() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..100).all(|_| gen_bool(&mut rng, 1.0)));
        assert!((0..100).all(|_| !gen_bool(&mut rng, 0.0)));
    }

    #[test]
    fn randn_degenerate_stdev() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(randn(&mut rng, 3.0, 0.0), 3.0);
        assert_eq!(randn(&mut rng, -1.0, -2.0), -1.0);
        assert_eq!(randn(&mut rng, 0.5, f32::NAN), 0.5);
    }

    #[test]
    fn randn_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<f32> = (0..2000).map(|_| randn(&mut rng, 0.0, 1.0)).collect();
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert!(mean.abs() < 0.1);
        assert!(samples.iter().any(|s| *s != samples[0]));
    }
}
