//! A Trainer evolves a population of genomes, split
//! into sub-populations by genetic similarity, using a
//! caller-supplied fitness function as the source of
//! selective pressure. The fitness function may also
//! refine weights by gradient descent.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;

use crate::genomics::{Compaction, GeneticConfig, Genome, Registry};
use crate::rng::gen_bool;
use crate::speciation::KMedoids;
pub use config::TrainerConfig;
use errors::*;
use offspring_factory::OffspringFactory;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::error::Error;

/// Fitness given to genomes whose fitness is NaN.
pub const NAN_FITNESS: f32 = -1e20;
/// Upper bound of normalized fitness.
pub const FITNESS_EPSILON: f32 = 1e-10;

/// Where a trainer is in its evaluate/evolve cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainerState {
    /// No fitness has been applied yet.
    Initialized,
    /// Fitness was applied without reclustering.
    FitnessApplied,
    /// Fitness was applied and genomes reclustered.
    Clustered,
    /// A new generation was produced.
    Evolved,
}

/// A population of genomes, with its hall of fame
/// and the registry all of them refer to.
#[derive(Clone, Debug)]
pub struct Trainer {
    config: TrainerConfig,
    genetic_config: GeneticConfig,
    registry: Registry,
    genes: Vec<Genome>,
    hall_of_fame: Vec<Genome>,
    best_of_sub_population: Vec<Genome>,
    force_extinction: bool,
    generation: usize,
    state: TrainerState,
    rng: StdRng,
}

impl Trainer {
    /// Creates a trainer with `num_populations ×
    /// sub_population_size` genomes of the configured
    /// initial topology, each with an extra random connection
    /// and fully mutated weights, randomly assigned to
    /// sub-populations. The hall of fame is built the same
    /// way and assigned to the first sub-population.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::GeneticConfig;
    /// use neatfit::trainer::{Trainer, TrainerConfig};
    ///
    /// let trainer = Trainer::new(
    ///     TrainerConfig {
    ///         seed: Some(42),
    ///         ..TrainerConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    ///
    /// assert_eq!(trainer.genomes().count(), 5 * 10);
    /// assert_eq!(trainer.hall_of_fame().count(), 5);
    /// ```
    pub fn new(config: TrainerConfig, genetic_config: GeneticConfig) -> Trainer {
        let registry = Registry::new(&genetic_config);
        let mut trainer = Trainer::empty(config, genetic_config, registry);
        let cluster_count = trainer.cluster_count();

        let genes = (0..trainer.population_size())
            .map(|_| {
                let cluster = trainer.rng.gen_range(0..cluster_count);
                let mut genome = trainer.random_genome();
                genome.cluster = cluster;
                genome
            })
            .collect();
        let hall_of_fame = (0..trainer.config.hall_of_fame_size)
            .map(|_| trainer.random_genome())
            .collect();
        trainer.genes = genes;
        trainer.hall_of_fame = hall_of_fame;
        trainer
    }

    /// Creates a trainer seeded from a pretrained genome and
    /// the registry it refers to, e.g. as loaded by
    /// [`Genome::from_json`]. Every population member starts as
    /// a copy of `genome` with an extra random connection and
    /// fully mutated weights; hall of fame members are exact
    /// copies.
    ///
    /// The registry's input and output counts take precedence
    /// over those of `genetic_config`.
    pub fn from_genome(
        config: TrainerConfig,
        genetic_config: GeneticConfig,
        registry: Registry,
        genome: &Genome,
    ) -> Trainer {
        let mut trainer = Trainer::empty(config, genetic_config, registry);
        let cluster_count = trainer.cluster_count();

        let genes = (0..trainer.population_size())
            .map(|_| {
                let mut seeded = Genome::empty();
                seeded.copy_genes_from(genome);
                trainer.burst_mutate(&mut seeded);
                seeded.cluster = trainer.rng.gen_range(0..cluster_count);
                seeded
            })
            .collect();
        trainer.genes = genes;
        trainer.hall_of_fame = (0..trainer.config.hall_of_fame_size)
            .map(|_| {
                let mut copy = Genome::empty();
                copy.copy_genes_from(genome);
                copy
            })
            .collect();
        trainer
    }

    fn empty(config: TrainerConfig, genetic_config: GeneticConfig, registry: Registry) -> Trainer {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Trainer {
            config,
            genetic_config,
            registry,
            genes: vec![],
            hall_of_fame: vec![],
            best_of_sub_population: vec![],
            force_extinction: false,
            generation: 0,
            state: TrainerState::Initialized,
            rng,
        }
    }

    fn random_genome(&mut self) -> Genome {
        let mut genome = Genome::new(&self.registry, &self.genetic_config, &mut self.rng);
        self.burst_mutate(&mut genome);
        genome
    }

    /// Adds a random connection and mutates every weight.
    fn burst_mutate(&mut self, genome: &mut Genome) {
        if let Err(e) =
            genome.add_random_connection(&mut self.registry, &self.genetic_config, &mut self.rng)
        {
            log::trace!("skipped initial connection: {}", e);
        }
        genome.mutate_weights(1.0, self.config.mutation_size, &mut self.rng);
        genome.fitness = Genome::UNEVALUATED_FITNESS;
    }

    /// Evaluates every genome, hall of fame member and
    /// sub-population champion with `fitness_fn`, which may
    /// modify the genome's weights (e.g. by backpropagation).
    ///
    /// Fitnesses are then normalized to be strictly negative:
    /// NaN becomes [`NAN_FITNESS`], and other values `f` become
    /// `min(-|f|, -FITNESS_EPSILON)`. All evaluated genomes are
    /// merged into the population sorted by decreasing fitness,
    /// optionally reclustered (if `cluster`), and the hall of
    /// fame and sub-population champions are rebuilt from it.
    ///
    /// Backpropagation is up to the closure. With
    /// [`DataFit::evaluate`], pass `0` cycles to only measure
    /// fitness, or a positive count to train each genome's
    /// weights for that many steps before measuring it.
    ///
    /// [`DataFit::evaluate`]: crate::fitness::DataFit::evaluate
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::GeneticConfig;
    /// use neatfit::trainer::{Trainer, TrainerConfig, TrainerState};
    ///
    /// let mut trainer = Trainer::new(
    ///     TrainerConfig {
    ///         seed: Some(0),
    ///         ..TrainerConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    ///
    /// // Fewer genes is better.
    /// trainer.apply_fitness_fn(|g, _| -(g.gene_count() as f32), true);
    ///
    /// assert_eq!(trainer.state(), TrainerState::Clustered);
    /// assert!(trainer.genomes().all(|g| g.fitness() < 0.0));
    /// ```
    pub fn apply_fitness_fn<F>(&mut self, mut fitness_fn: F, cluster: bool)
    where
        F: FnMut(&mut Genome, &Registry) -> f32,
    {
        let registry = &self.registry;
        for genome in self
            .genes
            .iter_mut()
            .chain(&mut self.hall_of_fame)
            .chain(&mut self.best_of_sub_population)
        {
            genome.fitness = normalize_fitness(fitness_fn(genome, registry));
        }

        let mut pool = std::mem::take(&mut self.genes);
        pool.append(&mut self.hall_of_fame);
        pool.append(&mut self.best_of_sub_population);
        pool.sort_by(|g1, g2| g2.fitness.total_cmp(&g1.fitness));
        self.genes = pool;

        if cluster {
            self.cluster();
        }

        let hall_of_fame = self
            .genes
            .iter()
            .take(self.config.hall_of_fame_size)
            .cloned()
            .collect();
        let best_of_sub_population = (0..self.cluster_count())
            .filter_map(|c| self.genes.iter().find(|g| g.cluster == c))
            .cloned()
            .collect();
        self.hall_of_fame = hall_of_fame;
        self.best_of_sub_population = best_of_sub_population;

        self.state = if cluster {
            TrainerState::Clustered
        } else {
            TrainerState::FitnessApplied
        };
    }

    /// Reassigns every genome's sub-population by
    /// k-medoids clustering over genetic distance.
    fn cluster(&mut self) {
        let registry = &self.registry;
        let partition = KMedoids::new(self.config.num_populations).partition(
            &self.genes,
            |g1, g2| g1.distance(g2, registry),
            &mut self.rng,
        );
        if self.config.debug_mode {
            log::debug!(
                "clustered {} genomes, cost {}, converged: {}",
                self.genes.len(),
                partition.cost,
                partition.converged
            );
        }
        let assignments = partition.assignments(self.genes.len());
        for (genome, cluster) in self.genes.iter_mut().zip(assignments) {
            genome.cluster = cluster;
        }
    }

    /// Produces the next generation: `sub_population_size`
    /// offspring per sub-population, from parents of that
    /// sub-population chosen with probability inversely
    /// proportional to their (negative) fitness.
    ///
    /// Children are mutated structurally and in their weights,
    /// or only in their weights if `weights_only`. Unless
    /// `weights_only`, an extinction event may occur (see
    /// [`extinction_rate`]), where the worst sub-population is
    /// bred from the parents of the best one. Failed matings
    /// are replaced by a mutated copy of the sub-population's
    /// champion.
    ///
    /// Finally, the registry is compacted to what the new
    /// population, the hall of fame and the sub-population
    /// champions use.
    ///
    /// # Errors
    /// Returns an error if fitness has not been applied yet.
    ///
    /// [`extinction_rate`]: TrainerConfig::extinction_rate
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::GeneticConfig;
    /// use neatfit::trainer::{Trainer, TrainerConfig};
    ///
    /// let mut trainer = Trainer::new(
    ///     TrainerConfig {
    ///         seed: Some(7),
    ///         ..TrainerConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    /// assert!(trainer.evolve(false).is_err());
    ///
    /// trainer.apply_fitness_fn(|g, _| -(g.gene_count() as f32), true);
    /// trainer.evolve(false).unwrap();
    ///
    /// assert_eq!(trainer.generation(), 1);
    /// assert_eq!(trainer.genomes().count(), 5 * 10);
    /// ```
    pub fn evolve(&mut self, weights_only: bool) -> Result<(), Box<dyn Error>> {
        if self.state == TrainerState::Initialized {
            return Err(EvolutionError::FitnessNotApplied.into());
        }
        self.generation += 1;

        let extinction = self.roll_extinction(weights_only);
        let offspring = OffspringFactory::new(
            &self.genes,
            &mut self.registry,
            &self.genetic_config,
            &self.config,
            &mut self.rng,
        )
        .generate_offspring(extinction, weights_only);
        self.genes = offspring;

        self.compact();
        self.state = TrainerState::Evolved;
        Ok(())
    }

    /// Decides whether this generation is an extinction event,
    /// returning the `(worst, best)` sub-populations if so.
    /// Weight-only generations never are.
    fn roll_extinction(&mut self, weights_only: bool) -> Option<(usize, usize)> {
        let roll = gen_bool(&mut self.rng, self.config.extinction_rate);
        if weights_only || !(roll || self.force_extinction) {
            return None;
        }
        let (worst, best) = self.worst_and_best_clusters();
        if self.config.debug_mode {
            log::debug!(
                "generation {}: sub-population {} replaced by offspring of {}",
                self.generation,
                worst,
                best
            );
        }
        Some((worst, best))
    }

    /// Returns the sub-populations whose champions are the
    /// worst (first found) and best (last found).
    fn worst_and_best_clusters(&self) -> (usize, usize) {
        let mut worst = (0, f32::INFINITY);
        let mut best = (0, f32::NEG_INFINITY);
        for cluster in 0..self.cluster_count() {
            let members = self.genes.iter().filter(|g| g.cluster == cluster);
            let Some(champion) = members.map(|g| g.fitness).reduce(f32::max) else {
                continue;
            };
            if champion < worst.1 {
                worst = (cluster, champion);
            }
            if champion >= best.1 {
                best = (cluster, champion);
            }
        }
        (worst.0, best.0)
    }

    /// Drops registry entries that no kept genome uses.
    fn compact(&mut self) {
        let compaction = Compaction::build(
            &self.registry,
            self.genes
                .iter()
                .chain(&self.hall_of_fame)
                .chain(&self.best_of_sub_population),
        );
        if self.config.debug_mode {
            log::debug!(
                "compacted registry from {} to {} nodes, {} to {} connections",
                self.registry.node_count(),
                compaction.node_count(),
                self.registry.connection_count(),
                compaction.connection_count()
            );
        }
        compaction.apply_to_registry(&mut self.registry);
        compaction.apply_to_genomes(
            self.genes
                .iter_mut()
                .chain(&mut self.hall_of_fame)
                .chain(&mut self.best_of_sub_population),
        );
    }

    /// Returns the best genome of the given sub-population,
    /// or of the whole population. If the sub-population has
    /// no members, returns the best of the whole population.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::GeneticConfig;
    /// use neatfit::trainer::{Trainer, TrainerConfig};
    ///
    /// let mut trainer = Trainer::new(
    ///     TrainerConfig {
    ///         seed: Some(3),
    ///         ..TrainerConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    /// let mut score = 0.0;
    /// trainer.apply_fitness_fn(|_, _| { score += 1.0; -score }, false);
    ///
    /// assert_eq!(trainer.best_genome(None).fitness(), -1.0);
    /// ```
    pub fn best_genome(&self, cluster: Option<usize>) -> &Genome {
        &self.genes[best_index(&self.genes, cluster)]
    }

    /// Makes the next [`evolve`] an extinction event,
    /// until reset.
    ///
    /// [`evolve`]: Trainer::evolve
    pub fn force_extinction(&mut self) {
        self.force_extinction = true;
    }

    pub fn reset_force_extinction(&mut self) {
        self.force_extinction = false;
    }

    /// Clips the weights of the population and
    /// hall of fame to `±max_weight`.
    ///
    /// # Panics
    /// Panics if any weight is NaN.
    pub fn clip_weights(&mut self, max_weight: f32) {
        for genome in self.genes.iter_mut().chain(&mut self.hall_of_fame) {
            genome.clip_weights(max_weight);
        }
    }

    /// Whether any weight of the population or
    /// hall of fame is NaN.
    pub fn weights_nan(&self) -> bool {
        self.genes
            .iter()
            .chain(&self.hall_of_fame)
            .any(Genome::weights_nan)
    }

    /// Whether the best fitness has reached the
    /// configured target.
    pub fn target_reached(&self) -> bool {
        !self.genes.is_empty() && self.best_genome(None).fitness >= self.config.target_fitness
    }

    /// Returns an iterator over the population.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genes.iter()
    }

    pub fn hall_of_fame(&self) -> impl Iterator<Item = &Genome> {
        self.hall_of_fame.iter()
    }

    /// Returns the champion of each non-empty sub-population,
    /// as of the last fitness application.
    pub fn sub_population_champions(&self) -> impl Iterator<Item = &Genome> {
        self.best_of_sub_population.iter()
    }

    /// Returns the registry every genome refers to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Returns the number of generations evolved.
    pub fn generation(&self) -> usize {
        self.generation
    }

    fn population_size(&self) -> usize {
        self.config.num_populations.get() * self.config.sub_population_size.get()
    }

    fn cluster_count(&self) -> usize {
        self.config.num_populations.get()
    }
}

/// Makes a fitness strictly negative.
fn normalize_fitness(fitness: f32) -> f32 {
    if fitness.is_nan() {
        NAN_FITNESS
    } else {
        (-fitness.abs()).min(-FITNESS_EPSILON)
    }
}

/// Index of the first genome with the highest fitness in
/// the cluster, or in all of `genes` if the cluster is `None`
/// or has no members. 0 if `genes` is empty.
fn best_index(genes: &[Genome], cluster: Option<usize>) -> usize {
    let best_among = |in_cluster: &dyn Fn(&Genome) -> bool| {
        genes
            .iter()
            .enumerate()
            .filter(|(_, g)| in_cluster(g))
            .fold(None, |best: Option<(usize, f32)>, (i, g)| match best {
                Some((_, f)) if f >= g.fitness => best,
                _ => Some((i, g.fitness)),
            })
            .map(|(i, _)| i)
    };
    cluster
        .and_then(|c| best_among(&|g| g.cluster == c))
        .or_else(|| best_among(&|_| true))
        .unwrap_or(0)
}
