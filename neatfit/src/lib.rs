//! A NeuroEvolution of Augmenting Topologies trainer in which
//! genome weights are refined by gradient descent between
//! generations.
//!
//! Genomes refer to nodes and connections of a [`Registry`] shared
//! by the whole population, and are evaluated by relaxing their
//! (possibly recurrent) graph over a small autodiff engine, so the
//! same evaluation can be backpropagated through. The population is
//! split into sub-populations by k-medoids clustering on genome
//! distance, and each sub-population breeds separately.
//!
//! A fitness function for binary classification data sets is
//! supplied in the [`fitness`] module.
//!
//! [`Registry`]: genomics::Registry
//!
//! # Example usage: Fitting a noisy threshold
//! ```
//! use neatfit::autodiff::Mat;
//! use neatfit::fitness::{accuracy, DataFit, DataSet};
//! use neatfit::genomics::{GeneticConfig, InitialTopology, NodeKind};
//! use neatfit::trainer::{Trainer, TrainerConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! struct Threshold {
//!     inputs: Mat,
//!     labels: Mat,
//! }
//!
//! impl DataSet for Threshold {
//!     fn inputs(&self) -> &Mat {
//!         &self.inputs
//!     }
//!
//!     fn labels(&self) -> &Mat {
//!         &self.labels
//!     }
//! }
//!
//! fn main() {
//!     let xs: Vec<f32> = (0..20).map(|i| i as f32 / 2.0 - 5.0).collect();
//!     let labels = xs.iter().map(|x| if *x > 1.0 { 1.0 } else { 0.0 }).collect();
//!     let data = Threshold {
//!         inputs: Mat::from_vec(20, 1, xs),
//!         labels: Mat::from_vec(20, 1, labels),
//!     };
//!
//!     let genetic_config = GeneticConfig {
//!         initial_topology: InitialTopology::Full,
//!         activation_types: NodeKind::DEFAULT_ACTIVATIONS.to_vec(),
//!         init_weight_magnitude: 0.25,
//!         ..GeneticConfig::zero()
//!     };
//!     let trainer_config = TrainerConfig {
//!         num_populations: NonZeroUsize::new(2).unwrap(),
//!         sub_population_size: NonZeroUsize::new(5).unwrap(),
//!         new_node_rate: 0.2,
//!         new_connection_rate: 0.5,
//!         mutation_rate: 0.9,
//!         mutation_size: 0.005,
//!         extinction_rate: 0.5,
//!         seed: Some(42),
//!         ..TrainerConfig::default()
//!     };
//!
//!     let mut trainer = Trainer::new(trainer_config, genetic_config);
//!     let mut fit = DataFit::new();
//!     let mut rng = StdRng::seed_from_u64(7);
//!
//!     trainer.apply_fitness_fn(|g, r| fit.evaluate(g, r, &data, 0, &mut rng), true);
//!     for _ in 0..3 {
//!         if let Err(e) = trainer.evolve(false) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!         trainer.apply_fitness_fn(|g, r| fit.evaluate(g, r, &data, 50, &mut rng), true);
//!     }
//!
//!     let champion = trainer.best_genome(None);
//!     let score = accuracy(champion, trainer.registry(), data.inputs(), data.labels());
//!     println!("Champion accuracy: {}", score);
//! }
//! ```

pub mod autodiff;
pub mod fitness;
pub mod genomics;
mod rng;
pub mod speciation;
pub mod trainer;

/// Position of a connection in the [`Registry`],
/// used by genes to refer to it.
///
/// [`Registry`]: genomics::Registry
pub type Innovation = usize;
