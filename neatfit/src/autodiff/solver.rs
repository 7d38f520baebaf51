use super::Mat;

/// Statistics about a single solver step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverStats {
    /// Fraction of gradients that were clipped.
    pub ratio_clipped: f32,
}

/// RMSProp parameter solver.
///
/// A decaying cache of squared gradients is kept per
/// parameter position, so the same solver should be fed
/// parameter sets in a consistent order.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    step_cache: Vec<Vec<f32>>,
}

impl Solver {
    pub const DECAY_RATE: f32 = 0.999;
    pub const SMOOTH_EPS: f32 = 1e-8;

    pub fn new() -> Solver {
        Solver::default()
    }

    /// Forgets all cached gradient magnitudes.
    pub fn reset(&mut self) {
        self.step_cache.clear();
    }

    /// Applies one RMSProp update to every parameter and
    /// resets their gradients.
    ///
    /// NaN gradients are treated as zero. Gradients are clipped
    /// to `±clip_value` after updating the cache, and updated
    /// weights to `±10·clip_value`. The update also decays each
    /// weight by `reg_c`.
    ///
    /// # Panics
    /// Panics if an updated weight is NaN.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::{Mat, Solver};
    ///
    /// let mut params = vec![Mat::scalar(1.0), Mat::scalar(-2.0)];
    /// params[0].dw[0] = 0.5;
    ///
    /// let mut solver = Solver::new();
    /// solver.step(params.iter_mut(), 0.01, 0.0, 5.0);
    ///
    /// // The weight moves against its gradient...
    /// assert!(params[0].w[0] < 1.0);
    /// // ...untouched weights stay put, and gradients are consumed.
    /// assert_eq!(params[1].w[0], -2.0);
    /// assert_eq!(params[0].dw[0], 0.0);
    /// ```
    pub fn step<'a, I>(
        &mut self,
        params: I,
        step_size: f32,
        reg_c: f32,
        clip_value: f32,
    ) -> SolverStats
    where
        I: IntoIterator<Item = &'a mut Mat>,
    {
        let (mut num_clipped, mut num_total) = (0usize, 0usize);
        for (k, m) in params.into_iter().enumerate() {
            if self.step_cache.len() <= k {
                self.step_cache.resize_with(k + 1, Vec::new);
            }
            let cache = &mut self.step_cache[k];
            if cache.len() != m.w.len() {
                *cache = vec![0.0; m.w.len()];
            }
            for i in 0..m.w.len() {
                let mut grad = m.dw[i];
                if grad.is_nan() {
                    grad = 0.0;
                }
                cache[i] = cache[i] * Self::DECAY_RATE + (1.0 - Self::DECAY_RATE) * grad * grad;

                if grad.abs() > clip_value {
                    grad = grad.clamp(-clip_value, clip_value);
                    num_clipped += 1;
                }
                num_total += 1;

                m.w[i] += -step_size * grad / cache[i].max(Self::SMOOTH_EPS).sqrt() - reg_c * m.w[i];
                m.dw[i] = 0.0;
                m.w[i] = m.w[i].clamp(-10.0 * clip_value, 10.0 * clip_value);
                assert!(!m.w[i].is_nan(), "solver step produced a NaN weight");
            }
        }
        SolverStats {
            ratio_clipped: if num_total == 0 {
                0.0
            } else {
                num_clipped as f32 / num_total as f32
            },
        }
    }
}
