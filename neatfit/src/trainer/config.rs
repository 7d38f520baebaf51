use std::num::NonZeroUsize;

/// Configuration data for trainer initialization
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainerConfig {
    /// Number of sub-populations (clusters).
    pub num_populations: NonZeroUsize,
    /// Offspring produced per sub-population
    /// each generation.
    pub sub_population_size: NonZeroUsize,
    /// Number of best genomes of all time kept
    /// alongside the population.
    pub hall_of_fame_size: usize,
    /// Chance that a mutated child gets a new node.
    pub new_node_rate: f32,
    /// Chance that a mutated child gets a new connection.
    pub new_connection_rate: f32,
    /// Chance that the worst sub-population is replaced
    /// by offspring of the best one each generation.
    pub extinction_rate: f32,
    /// Chance of each weight of a child being mutated.
    pub mutation_rate: f32,
    /// Deviation of weight mutations.
    pub mutation_size: f32,
    /// Fitness beyond which training is considered done.
    pub target_fitness: f32,
    /// Whether to emit debug logs.
    pub debug_mode: bool,
    /// Seed for the trainer's random generator. Seeded
    /// from entropy if `None`.
    pub seed: Option<u64>,
}

impl TrainerConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use neatfit::trainer::TrainerConfig;
    ///
    /// let cfg = TrainerConfig {
    ///     // Specify some values here...
    ///     mutation_size: 0.5,
    ///     // Default the rest...
    ///     ..TrainerConfig::zero()
    /// };
    /// ```
    pub fn zero() -> TrainerConfig {
        TrainerConfig {
            num_populations: NonZeroUsize::new(1).unwrap(),
            sub_population_size: NonZeroUsize::new(1).unwrap(),
            hall_of_fame_size: 0,
            new_node_rate: 0.0,
            new_connection_rate: 0.0,
            extinction_rate: 0.0,
            mutation_rate: 0.0,
            mutation_size: 0.0,
            target_fitness: 0.0,
            debug_mode: false,
            seed: None,
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> TrainerConfig {
        TrainerConfig {
            num_populations: NonZeroUsize::new(5).unwrap(),
            sub_population_size: NonZeroUsize::new(10).unwrap(),
            hall_of_fame_size: 5,
            new_node_rate: 0.1,
            new_connection_rate: 0.1,
            extinction_rate: 0.5,
            mutation_rate: 0.1,
            mutation_size: 1.0,
            target_fitness: 1e20,
            debug_mode: false,
            seed: None,
        }
    }
}
