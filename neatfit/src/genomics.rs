//! Genomes are the focus of evolution. Each is a sparse
//! selection of the connections held in a shared [`Registry`],
//! with its own weights, which can be evaluated as a computation
//! graph. Genomes grow by mutation, appending nodes and
//! connections to the registry.

mod compaction;
mod config;
mod distance;
mod errors;
mod forward;
mod genes;
mod nodes;
mod registry;
mod serialization;

pub use compaction::Compaction;
pub use config::{GeneticConfig, InitialTopology};
pub use distance::{DISJOINT_FACTOR, EXCESS_FACTOR, WEIGHT_FACTOR};
use errors::*;
pub use errors::{ImportError, MatingError};
pub use forward::{Model, MAX_TICK};
pub use genes::Gene;
pub use nodes::{Combine, NodeKind, NodeOps, UnknownNodeKind};
pub use registry::Registry;

use crate::rng::{gen_bool, randn};
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;

/// A mutable selection of registry connections, with weights.
///
/// Supports Serde for convenient genome saving and loading,
/// although the registry it refers to must be saved alongside
/// it (see [`Genome::to_json`]).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<Gene>,
    pub(crate) fitness: f32,
    pub(crate) cluster: usize,
}

impl Genome {
    /// Fitness of genomes that have not been evaluated yet.
    pub const UNEVALUATED_FITNESS: f32 = -1e20;

    /// Creates a genome expressing the connections of the
    /// configured initial topology. Weights are sampled from
    /// a gaussian with deviation [`init_weight_magnitude`],
    /// except for hub-to-output connections, which start at 1.
    ///
    /// [`init_weight_magnitude`]: GeneticConfig::init_weight_magnitude
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_topology: InitialTopology::Full,
    ///     init_weight_magnitude: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let registry = Registry::new(&config);
    /// let genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
    ///
    /// // Every input and the bias are connected to every output.
    /// assert_eq!(genome.gene_count(), (3 + 1) * 2);
    /// assert!(genome.genes().all(|g| g.enabled()));
    /// ```
    pub fn new<R: Rng + ?Sized>(registry: &Registry, config: &GeneticConfig, rng: &mut R) -> Genome {
        let mut genome = Genome::empty();
        for (innovation, fixed_weight) in registry.initial_innovations(config.initial_topology) {
            let weight =
                fixed_weight.unwrap_or_else(|| randn(rng, 0.0, config.init_weight_magnitude));
            genome.add_gene_unchecked(innovation, weight);
        }
        genome
    }

    /// Creates a genome with no genes.
    pub fn empty() -> Genome {
        Genome {
            genes: vec![],
            fitness: Self::UNEVALUATED_FITNESS,
            cluster: 0,
        }
    }

    /// Add a new gene to the genome.
    /// Returns a reference to the new gene.
    ///
    /// # Panics
    ///
    /// This function will panic if a gene with the same
    /// innovation number already existed in the genome, or
    /// if the innovation number is not in the registry.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// });
    /// let mut genome = Genome::empty();
    ///
    /// let gene = genome.add_gene(&registry, 1, 2.5).clone();
    ///
    /// assert_eq!(genome.gene(1), Some(&gene));
    /// assert_eq!(gene.weight(), 2.5);
    /// ```
    pub fn add_gene(&mut self, registry: &Registry, innovation: Innovation, weight: f32) -> &mut Gene {
        self.check_gene_validity(registry, innovation)
            .unwrap_or_else(|e| panic!("{} in {}", e, self));
        self.add_gene_unchecked(innovation, weight)
    }

    /// Add a new gene to the genome.
    /// Assumes that the gene is not a duplicate
    /// or invalid gene for the genome.
    fn add_gene_unchecked(&mut self, innovation: Innovation, weight: f32) -> &mut Gene {
        self.genes.push(Gene::new(innovation, weight));
        let last = self.genes.len() - 1;
        &mut self.genes[last]
    }

    /// Checks whether a gene is a duplicate or
    /// is invalid for the genome.
    fn check_gene_validity(
        &self,
        registry: &Registry,
        innovation: Innovation,
    ) -> Result<(), GeneValidityError> {
        if self.gene_position(innovation).is_some() {
            Err(GeneValidityError::DuplicateGeneID(innovation))
        } else if innovation >= registry.connection_count() {
            Err(GeneValidityError::NonexistentInnovation(innovation))
        } else {
            Ok(())
        }
    }

    fn gene_position(&self, innovation: Innovation) -> Option<usize> {
        self.genes.iter().position(|g| g.innovation() == innovation)
    }

    /// Induces a _node mutation_ in the genome: a random
    /// enabled gene is disabled, and replaced by a new node
    /// with a random activation and two genes through it.
    /// The gene into the new node gets weight 1 and the gene
    /// out of it gets the old weight.
    ///
    /// Returns the innovation numbers of the new genes and
    /// the index of the new node, as `(in gene, node, out gene)`.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the genome untouched, if
    /// the genome has no enabled genes.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, NodeKind, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     activation_types: vec![NodeKind::Tanh],
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = Registry::new(&config);
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut genome = Genome::new(&registry, &config, &mut rng);
    ///
    /// let (in_gene, node, out_gene) = genome.add_random_node(&mut registry, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(registry.nodes()[node], NodeKind::Tanh);
    /// assert_eq!(genome.gene(in_gene).unwrap().weight(), 1.0);
    /// assert_eq!(genome.genes().filter(|g| !g.enabled()).count(), 1);
    /// # assert_eq!(registry.connection(out_gene).unwrap().0, node);
    /// ```
    pub fn add_random_node<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(Innovation, usize, Innovation), Box<dyn Error>> {
        if self.genes.is_empty() {
            return Err(NodeAdditionMutationError::EmptyGenome.into());
        }
        let enabled: Vec<usize> = (0..self.genes.len())
            .filter(|i| self.genes[*i].enabled())
            .collect();
        if enabled.is_empty() {
            return Err(NodeAdditionMutationError::NoEnabledGene.into());
        }

        let split = &mut self.genes[enabled[rng.gen_range(0..enabled.len())]];
        split.set_enabled(false);
        let old_weight = split.weight();
        let (from, to) = registry.connections()[split.innovation()];

        let node = registry.add_node(config.random_activation(rng));
        let in_gene = registry.push_connection(from, node);
        let out_gene = registry.push_connection(node, to);
        self.add_gene_unchecked(in_gene, 1.0);
        self.add_gene_unchecked(out_gene, old_weight);

        Ok((in_gene, node, out_gene))
    }

    /// Induces a _gene mutation_ in the genome, connecting
    /// two random nodes in use. Outputs are never chosen as
    /// sources, and inputs and bias never as targets.
    ///
    /// An unregistered connection is registered; a registered
    /// connection missing from the genome is added; a disabled
    /// gene is re-enabled. New and re-enabled genes get fresh
    /// random weights. Returns the innovation number of the
    /// affected gene.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the genome untouched, if
    /// both endpoints are the same node, or the connection is
    /// already enabled in the genome.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut registry = Registry::new(&config);
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let mut genome = Genome::empty();
    ///
    /// // With one input, the output is the only target.
    /// let innovation = genome.add_random_connection(&mut registry, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(genome.gene_count(), 1);
    /// assert_eq!(registry.connection(innovation).unwrap().1, registry.output_index());
    /// ```
    pub fn add_random_connection<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, Box<dyn Error>> {
        let in_use = self.nodes_in_use(registry);
        let sources: Vec<usize> = in_use
            .iter()
            .copied()
            .filter(|n| !registry.is_output(*n))
            .collect();
        let targets: Vec<usize> = in_use
            .iter()
            .copied()
            .filter(|n| *n >= registry.output_index())
            .collect();
        let from = sources[rng.gen_range(0..sources.len())];
        let to = targets[rng.gen_range(0..targets.len())];

        if from == to {
            return Err(GeneAdditionMutationError::SameEndpoints(from).into());
        }

        match registry.find_connection(from, to) {
            None => {
                let innovation = registry.add_connection(from, to);
                self.add_gene_unchecked(innovation, randn(rng, 0.0, config.init_weight_magnitude));
                Ok(innovation)
            }
            Some(innovation) => match self.gene_position(innovation) {
                None => {
                    self.add_gene_unchecked(
                        innovation,
                        randn(rng, 0.0, config.init_weight_magnitude),
                    );
                    Ok(innovation)
                }
                Some(position) if !self.genes[position].enabled() => {
                    let gene = &mut self.genes[position];
                    gene.set_weight(randn(rng, 0.0, config.init_weight_magnitude));
                    gene.set_enabled(true);
                    Ok(innovation)
                }
                Some(_) => Err(GeneAdditionMutationError::AlreadyExpressed(innovation).into()),
            },
        }
    }

    /// Induces a _weight mutation_ in the genome: every
    /// weight has a `rate` chance of receiving additive
    /// gaussian noise of deviation `size`.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// };
    /// let registry = Registry::new(&config);
    /// let mut rng = StdRng::seed_from_u64(0);
    /// let mut genome = Genome::new(&registry, &config, &mut rng);
    /// // The zero config has zero weight magnitude.
    /// assert!(genome.genes().all(|g| g.weight() == 0.0));
    ///
    /// genome.mutate_weights(1.0, 0.5, &mut rng);
    ///
    /// assert!(genome.genes().all(|g| g.weight() != 0.0));
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, rate: f32, size: f32, rng: &mut R) {
        for gene in &mut self.genes {
            if gen_bool(rng, rate) {
                gene.set_weight(gene.weight() + randn(rng, 0.0, size));
            }
        }
    }

    /// Lays the genes out by innovation number.
    fn unrolled(&self, connection_count: usize) -> Result<Vec<Option<&Gene>>, MatingError> {
        let mut unrolled = vec![None; connection_count];
        for gene in &self.genes {
            match unrolled.get_mut(gene.innovation()) {
                Some(slot) => *slot = Some(gene),
                None => return Err(MatingError::UnknownInnovation(gene.innovation())),
            }
        }
        Ok(unrolled)
    }

    /// Produces a child aligning both parents' genes by
    /// innovation number. Genes present in one parent are
    /// inherited from it; genes present in both are inherited
    /// from either with equal chance. A gene is disabled in
    /// the child only if it is disabled in every parent
    /// possessing it. The child's genes are sorted by
    /// innovation number.
    ///
    /// # Errors
    ///
    /// Returns an error if either parent references an
    /// innovation missing from the registry.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// });
    /// let mut mom = Genome::empty();
    /// let mut dad = Genome::empty();
    /// mom.add_gene(&registry, 0, 1.0).set_enabled(false);
    /// dad.add_gene(&registry, 0, -1.0);
    /// dad.add_gene(&registry, 1, 3.0).set_enabled(false);
    ///
    /// let child = mom.crossover(&dad, &registry, &mut StdRng::seed_from_u64(0)).unwrap();
    ///
    /// assert_eq!(child.gene_count(), 2);
    /// // Enabled in one parent, so enabled in the child.
    /// assert!(child.gene(0).unwrap().enabled());
    /// // Only the father has it, disabled.
    /// assert!(!child.gene(1).unwrap().enabled());
    /// assert_eq!(child.gene(1).unwrap().weight(), 3.0);
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        other: &Genome,
        registry: &Registry,
        rng: &mut R,
    ) -> Result<Genome, MatingError> {
        let connection_count = registry.connection_count();
        let own = self.unrolled(connection_count)?;
        let others = other.unrolled(connection_count)?;

        let mut child = Genome::empty();
        for (mine, theirs) in own.into_iter().zip(others) {
            let (inherited, enabled) = match (mine, theirs) {
                (None, None) => continue,
                (Some(g), None) | (None, Some(g)) => (g, g.enabled()),
                (Some(g1), Some(g2)) => (
                    if rng.gen::<bool>() { g1 } else { g2 },
                    g1.enabled() || g2.enabled(),
                ),
            };
            let mut gene = *inherited;
            gene.set_enabled(enabled);
            child.genes.push(gene);
        }
        Ok(child)
    }

    /// Returns the indices of the registry nodes touched by
    /// any of the genome's genes, enabled or not, plus every
    /// input, bias and output node, in ascending order.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, Registry};
    ///
    /// let registry = Registry::new(&GeneticConfig::zero());
    ///
    /// // Input, bias and output.
    /// assert_eq!(Genome::empty().nodes_in_use(&registry), vec![0, 1, 2]);
    /// ```
    pub fn nodes_in_use(&self, registry: &Registry) -> Vec<usize> {
        let mut used = vec![false; registry.node_count()];
        for gene in &self.genes {
            let (from, to) = registry.connections()[gene.innovation()];
            used[from] = true;
            used[to] = true;
        }
        (0..registry.node_count())
            .filter(|n| used[*n] || *n < registry.io_count())
            .collect()
    }

    /// Rounds every weight to 4 decimal places.
    pub fn round_weights(&mut self) {
        const PRECISION: f32 = 10000.0;
        for gene in &mut self.genes {
            gene.set_weight((gene.weight() * PRECISION).round() / PRECISION);
        }
    }

    /// Clips every weight to `±max_weight`.
    ///
    /// # Panics
    /// Panics if any weight is NaN.
    pub fn clip_weights(&mut self, max_weight: f32) {
        let max_weight = max_weight.abs();
        for gene in &mut self.genes {
            assert!(!gene.weight().is_nan(), "NaN weight in gene {}", gene.innovation());
            gene.set_weight(gene.weight().clamp(-max_weight, max_weight));
        }
    }

    /// Whether any weight is NaN.
    pub fn weights_nan(&self) -> bool {
        self.genes.iter().any(|g| g.weight().is_nan())
    }

    /// Replaces this genome's genes with copies of `source`'s.
    pub fn copy_genes_from(&mut self, source: &Genome) {
        self.genes.clone_from(&source.genes);
    }

    /// Returns an iterator over the genome's genes,
    /// in insertion order.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Returns the gene with the given innovation number.
    pub fn gene(&self, innovation: Innovation) -> Option<&Gene> {
        self.genes.iter().find(|g| g.innovation() == innovation)
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub(crate) fn genes_mut(&mut self) -> &mut Vec<Gene> {
        &mut self.genes
    }

    /// Returns the genome's fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the index of the cluster the genome belongs to.
    pub fn cluster(&self) -> usize {
        self.cluster
    }

    pub fn set_cluster(&mut self, cluster: usize) {
        self.cluster = cluster;
    }
}

impl Default for Genome {
    fn default() -> Genome {
        Genome::empty()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut genes: Vec<&Gene> = self.genes.iter().collect();
        genes.sort_unstable_by_key(|g| g.innovation());
        f.debug_struct("Genome")
            .field("Genes", &genes)
            .field("Fitness", &self.fitness)
            .field("Cluster", &self.cluster)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;
    use std::num::NonZeroUsize;

    fn config(topology: InitialTopology) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            initial_topology: topology,
            activation_types: NodeKind::DEFAULT_ACTIVATIONS.to_vec(),
            init_weight_magnitude: 1.0,
        }
    }

    #[test]
    fn new_unconnected() {
        let config = config(InitialTopology::Unconnected);
        let registry = Registry::new(&config);
        let genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
        assert!(genome.is_empty());
        assert_eq!(genome.fitness(), Genome::UNEVALUATED_FITNESS);
    }

    #[test]
    fn new_hub() {
        let config = config(InitialTopology::Hub);
        let registry = Registry::new(&config);
        let genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(genome.gene_count(), 4);
        assert_eq!(genome.gene(3).unwrap().weight(), 1.0);
    }

    #[test]
    #[should_panic]
    fn add_gene_duplicate() {
        let registry = Registry::new(&config(InitialTopology::Full));
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 1.0);
        genome.add_gene(&registry, 0, 2.0);
    }

    #[test]
    #[should_panic]
    fn add_gene_unregistered() {
        let registry = Registry::new(&config(InitialTopology::Unconnected));
        Genome::empty().add_gene(&registry, 0, 1.0);
    }

    #[test]
    fn add_random_node_on_empty_genome_is_noop() {
        let config = config(InitialTopology::Unconnected);
        let mut registry = Registry::new(&config);
        let mut genome = Genome::empty();
        let nodes_before = registry.node_count();

        assert!(genome
            .add_random_node(&mut registry, &config, &mut StdRng::seed_from_u64(0))
            .is_err());
        assert_eq!(genome.gene_count(), 0);
        assert_eq!(registry.node_count(), nodes_before);
    }

    #[test]
    fn add_random_node_skips_disabled_genes() {
        let config = config(InitialTopology::Full);
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(5);
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 0.3).set_enabled(false);
        genome.add_gene(&registry, 2, -0.7);

        let (in_gene, node, out_gene) = genome
            .add_random_node(&mut registry, &config, &mut rng)
            .unwrap();

        assert!(!genome.gene(2).unwrap().enabled());
        assert_eq!(registry.connection(in_gene), Some((2, node)));
        assert_eq!(registry.connection(out_gene), Some((node, 3)));
        assert_eq!(genome.gene(out_gene).unwrap().weight(), -0.7);
        assert!(config.activation_types.contains(&registry.nodes()[node]));

        // Nothing to split when every gene is disabled.
        let mut all_disabled = Genome::empty();
        all_disabled.add_gene(&registry, 1, 1.0).set_enabled(false);
        assert!(all_disabled
            .add_random_node(&mut registry, &config, &mut rng)
            .is_err());
    }

    #[test]
    fn add_random_connection_respects_roles() {
        let config = config(InitialTopology::Unconnected);
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let mut genome = Genome::empty();
        for _ in 0..200 {
            let _ = genome.add_random_connection(&mut registry, &config, &mut rng);
            if rng.gen::<f32>() < 0.2 {
                let _ = genome.add_random_node(&mut registry, &config, &mut rng);
            }
        }
        for (from, to) in registry.connections() {
            assert!(!registry.is_output(*from));
            assert!(*to >= registry.output_index());
            assert_ne!(from, to);
        }
        let ids: HashSet<_> = genome.genes().map(|g| g.innovation()).collect();
        assert_eq!(ids.len(), genome.gene_count());
    }

    #[test]
    fn add_random_connection_reenables() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            ..config(InitialTopology::Unconnected)
        };
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(2);
        let mut genome = Genome::empty();
        // Keep trying until input or bias connects to the output.
        let innovation = loop {
            if let Ok(innovation) = genome.add_random_connection(&mut registry, &config, &mut rng) {
                break innovation;
            }
        };
        genome.genes[0].set_enabled(false);
        genome.genes[0].set_weight(123.0);

        let mut reenabled = false;
        for _ in 0..50 {
            if let Ok(id) = genome.add_random_connection(&mut registry, &config, &mut rng) {
                if id == innovation {
                    reenabled = true;
                    break;
                }
            }
        }
        assert!(reenabled);
        let gene = genome.gene(innovation).unwrap();
        assert!(gene.enabled());
        assert_ne!(gene.weight(), 123.0);
    }

    #[test]
    fn mutate_weights_zero_rate() {
        let config = config(InitialTopology::Full);
        let registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(0);
        let mut genome = Genome::new(&registry, &config, &mut rng);
        let before = genome.clone();
        genome.mutate_weights(0.0, 10.0, &mut rng);
        assert_eq!(genome, before);
    }

    #[test]
    fn crossover_bounded_by_parent_union() {
        let config = config(InitialTopology::Full);
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        let mut mom = Genome::new(&registry, &config, &mut rng);
        let mut dad = Genome::new(&registry, &config, &mut rng);
        for _ in 0..5 {
            let _ = mom.add_random_node(&mut registry, &config, &mut rng);
            let _ = dad.add_random_connection(&mut registry, &config, &mut rng);
        }

        let child = mom.crossover(&dad, &registry, &mut rng).unwrap();

        let union: HashSet<_> = mom
            .genes()
            .chain(dad.genes())
            .map(|g| g.innovation())
            .collect();
        assert!(child.gene_count() <= union.len());
        assert!(child.genes().all(|g| union.contains(&g.innovation())));
        assert!(child
            .genes()
            .zip(child.genes().skip(1))
            .all(|(a, b)| a.innovation() < b.innovation()));
        for gene in child.genes() {
            let id = gene.innovation();
            let parents_enabled = [mom.gene(id), dad.gene(id)]
                .iter()
                .flatten()
                .any(|g| g.enabled());
            assert_eq!(gene.enabled(), parents_enabled);
        }
    }

    #[test]
    fn crossover_unknown_innovation() {
        let config = config(InitialTopology::Full);
        let registry = Registry::new(&config);
        let mut stray = Genome::empty();
        stray.genes.push(Gene::new(999, 1.0));
        assert_eq!(
            Genome::empty().crossover(&stray, &registry, &mut StdRng::seed_from_u64(0)),
            Err(MatingError::UnknownInnovation(999))
        );
    }

    #[test]
    fn nodes_in_use_counts_disabled_genes() {
        let config = config(InitialTopology::Full);
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(4);
        let mut genome = Genome::new(&registry, &config, &mut rng);
        let (_, node, _) = genome
            .add_random_node(&mut registry, &config, &mut rng)
            .unwrap();
        assert_eq!(genome.nodes_in_use(&registry), vec![0, 1, 2, 3, node]);
    }

    #[test]
    fn weight_housekeeping() {
        let registry = Registry::new(&config(InitialTopology::Full));
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 1.234_567);
        genome.add_gene(&registry, 1, -80.0);
        genome.round_weights();
        assert_eq!(genome.gene(0).unwrap().weight(), 1.2346);
        genome.clip_weights(50.0);
        assert_eq!(genome.gene(1).unwrap().weight(), -50.0);
        assert!(!genome.weights_nan());
        genome.genes[0].set_weight(f32::NAN);
        assert!(genome.weights_nan());

        let mut copy = Genome::empty();
        copy.copy_genes_from(&genome);
        assert_eq!(copy.gene_count(), 2);
    }

    #[test]
    #[should_panic]
    fn clip_weights_rejects_nan() {
        let registry = Registry::new(&config(InitialTopology::Full));
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, f32::NAN);
        genome.clip_weights(50.0);
    }
}
