use crate::genomics::NodeKind;

use std::num::NonZeroUsize;

/// Wiring of the connections registered at start-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitialTopology {
    /// No connections.
    Unconnected,
    /// A single ADD node fed by every input and the bias,
    /// and feeding every output.
    Hub,
    /// Every input and the bias connected to every output.
    Full,
}

/// Configuration data for registry creation
/// and genome generation.
#[derive(Clone, Debug)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Connections every fresh genome starts with.
    pub initial_topology: InitialTopology,
    /// Possible kinds for nodes created by mutation.
    /// If an empty vector is given, new nodes
    /// default to [`Add`].
    ///
    /// [`Add`]: crate::genomics::NodeKind::Add
    pub activation_types: Vec<NodeKind>,
    /// Standard deviation of freshly sampled weights.
    pub init_weight_magnitude: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1. The topology is unconnected.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, InitialTopology, NodeKind};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_topology: InitialTopology::Full,
    ///     activation_types: NodeKind::DEFAULT_ACTIVATIONS.to_vec(),
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_topology: InitialTopology::Unconnected,
            activation_types: vec![],
            init_weight_magnitude: 0.0,
        }
    }

    /// Returns the kind for a node created by mutation,
    /// chosen uniformly from the activation types.
    pub(crate) fn random_activation<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> NodeKind {
        use rand::seq::SliceRandom;
        *self.activation_types.choose(rng).unwrap_or(&NodeKind::Add)
    }
}

impl Default for GeneticConfig {
    /// Two inputs, one output, fully connected,
    /// default activations and unit weight deviation.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_topology: InitialTopology::Full,
            activation_types: NodeKind::DEFAULT_ACTIVATIONS.to_vec(),
            init_weight_magnitude: 1.0,
        }
    }
}
