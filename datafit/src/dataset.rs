//! Synthetic 2-D point clouds for binary classification.

use neatfit::autodiff::Mat;
use neatfit::fitness::DataSet;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use std::f32::consts::PI;

/// Shape of the generated point cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// A disc of positives inside a ring of negatives.
    Circle,
    /// Positives where both coordinates share a sign.
    Xor,
    /// Two gaussian blobs.
    Gaussian,
    /// Two interleaved spirals.
    Spiral,
}

/// Labeled points, one `(x, y)` pair per row.
#[derive(Clone, Debug)]
pub struct Points {
    inputs: Mat,
    labels: Mat,
}

impl Points {
    /// Generates `count` shuffled points of the given shape.
    /// `noise` scales the jitter added to each coordinate.
    pub fn generate<R: Rng + ?Sized>(shape: Shape, count: usize, noise: f32, rng: &mut R) -> Points {
        let mut points = match shape {
            Shape::Circle => circle(count, noise, rng),
            Shape::Xor => xor(count, noise, rng),
            Shape::Gaussian => gaussian(count, noise, rng),
            Shape::Spiral => spiral(count, noise, rng),
        };
        points.shuffle(rng);
        Points::from_rows(&points)
    }

    fn from_rows(rows: &[(f32, f32, f32)]) -> Points {
        let mut inputs = Mat::new(rows.len(), 2);
        let mut labels = Mat::new(rows.len(), 1);
        for (i, (x, y, label)) in rows.iter().enumerate() {
            inputs.set(i, 0, *x);
            inputs.set(i, 1, *y);
            labels.set(i, 0, *label);
        }
        Points { inputs, labels }
    }

    /// Fraction of points labeled 1.
    pub fn positive_share(&self) -> f32 {
        self.labels.w.iter().sum::<f32>() / self.len().max(1) as f32
    }
}

impl DataSet for Points {
    fn inputs(&self) -> &Mat {
        &self.inputs
    }

    fn labels(&self) -> &Mat {
        &self.labels
    }
}

fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f32, stdev: f32) -> f32 {
    Normal::new(mean, stdev).map_or(mean, |n| n.sample(rng))
}

fn circle<R: Rng + ?Sized>(count: usize, noise: f32, rng: &mut R) -> Vec<(f32, f32, f32)> {
    const RADIUS: f32 = 5.0;
    let point = |rng: &mut R, min_r: f32, max_r: f32| {
        let r = rng.gen_range(min_r..max_r);
        let angle = rng.gen_range(0.0..2.0 * PI);
        let (x, y) = (r * angle.sin(), r * angle.cos());
        let label = if x * x + y * y < (RADIUS * 0.5).powi(2) { 1.0 } else { 0.0 };
        let jitter = RADIUS * noise / 3.0;
        (
            x + rng.gen_range(-1.0f32..1.0) * jitter,
            y + rng.gen_range(-1.0f32..1.0) * jitter,
            label,
        )
    };
    let half = count / 2;
    let mut points: Vec<_> = (0..half).map(|_| point(rng, 0.0, RADIUS * 0.5)).collect();
    points.extend((half..count).map(|_| point(rng, RADIUS * 0.75, RADIUS)));
    points
}

fn xor<R: Rng + ?Sized>(count: usize, noise: f32, rng: &mut R) -> Vec<(f32, f32, f32)> {
    (0..count)
        .map(|_| {
            let x = rng.gen_range(-5.0f32..5.0) + normal(rng, 0.0, noise);
            let y = rng.gen_range(-5.0f32..5.0) + normal(rng, 0.0, noise);
            let label = if x * y >= 0.0 { 1.0 } else { 0.0 };
            (x, y, label)
        })
        .collect()
}

fn gaussian<R: Rng + ?Sized>(count: usize, noise: f32, rng: &mut R) -> Vec<(f32, f32, f32)> {
    let stdev = noise + 1.0;
    let half = count / 2;
    (0..count)
        .map(|i| {
            let (center, label) = if i < half { (2.0, 1.0) } else { (-2.0, 0.0) };
            (normal(rng, center, stdev), normal(rng, center, stdev), label)
        })
        .collect()
}

fn spiral<R: Rng + ?Sized>(count: usize, noise: f32, rng: &mut R) -> Vec<(f32, f32, f32)> {
    let half = count / 2;
    let arm = |rng: &mut R, delta: f32, label: f32, n: usize| -> Vec<(f32, f32, f32)> {
        (0..n)
            .map(|i| {
                let progress = i as f32 / half.max(1) as f32;
                let r = progress * 6.0;
                let t = 1.75 * progress * 2.0 * PI + delta;
                let x = r * t.sin() + rng.gen_range(-1.0f32..1.0) * noise;
                let y = r * t.cos() + rng.gen_range(-1.0f32..1.0) * noise;
                (x, y, label)
            })
            .collect()
    };
    let mut points = arm(rng, 0.0, 0.0, half);
    points.extend(arm(rng, PI, 1.0, count - half));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn shapes_are_balanced() {
        let mut rng = StdRng::seed_from_u64(0);
        for shape in [Shape::Circle, Shape::Gaussian, Shape::Spiral] {
            let points = Points::generate(shape, 200, 0.5, &mut rng);
            assert_eq!(points.len(), 200);
            assert_eq!(points.inputs().cols(), 2);
            assert!((points.positive_share() - 0.5).abs() < 1e-6, "{:?}", shape);
        }
    }

    #[test]
    fn xor_labels_follow_quadrants() {
        let points = Points::generate(Shape::Xor, 100, 0.0, &mut StdRng::seed_from_u64(1));
        for row in 0..points.len() {
            let (x, y) = (points.inputs().get(row, 0), points.inputs().get(row, 1));
            let expected = if x * y >= 0.0 { 1.0 } else { 0.0 };
            assert_eq!(points.labels().get(row, 0), expected);
        }
    }

    #[test]
    fn noiseless_circle_separates_by_radius() {
        let points = Points::generate(Shape::Circle, 100, 0.0, &mut StdRng::seed_from_u64(2));
        for row in 0..points.len() {
            let (x, y) = (points.inputs().get(row, 0), points.inputs().get(row, 1));
            let inside = (x * x + y * y).sqrt() < 2.5;
            assert_eq!(points.labels().get(row, 0) == 1.0, inside);
        }
    }
}
