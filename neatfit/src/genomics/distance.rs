use super::{Gene, Genome, Registry};

/// Weight of mismatched genes past the end of the
/// shorter genome.
pub const EXCESS_FACTOR: f32 = 10.0;
/// Weight of mismatched genes within both genomes' range.
pub const DISJOINT_FACTOR: f32 = 10.0;
/// Weight of the average weight difference of shared genes.
pub const WEIGHT_FACTOR: f32 = 0.1;

fn presence<'a>(genome: &'a Genome, connection_count: usize) -> Vec<Option<&'a Gene>> {
    let mut present = vec![None; connection_count];
    for gene in genome.genes() {
        present[gene.innovation()] = Some(gene);
    }
    present
}

impl Genome {
    /// Returns the genetic distance between two genomes.
    ///
    /// Genes present in only one genome are _disjoint_ if
    /// their innovation number is at most the last innovation
    /// number of the genome that ends first, and _excess_
    /// otherwise. Both counts are normalized by the larger
    /// number of nodes in use. Genes enabled in both genomes
    /// contribute their average absolute weight difference.
    ///
    /// If one genome is empty, every mismatch is excess.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{
    ///     GeneticConfig, Genome, InitialTopology, Registry, DISJOINT_FACTOR, EXCESS_FACTOR,
    ///     WEIGHT_FACTOR,
    /// };
    /// use std::num::NonZeroUsize;
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// });
    /// let mut genome1 = Genome::empty();
    /// let mut genome2 = Genome::empty();
    ///
    /// // Common gene, weight difference of 2.0.
    /// genome1.add_gene(&registry, 0, 1.0);
    /// genome2.add_gene(&registry, 0, -1.0);
    ///
    /// // Disjoint gene.
    /// genome2.add_gene(&registry, 1, 1.0);
    ///
    /// // Common gene, weight difference of 0.0.
    /// genome1.add_gene(&registry, 2, 1.0);
    /// genome2.add_gene(&registry, 2, 1.0);
    ///
    /// // Excess gene.
    /// genome1.add_gene(&registry, 3, 3.0);
    ///
    /// // 3 inputs, bias and output are in use.
    /// let nodes = 5.0;
    /// let expected = DISJOINT_FACTOR * 1.0 / nodes
    ///     + EXCESS_FACTOR * 1.0 / nodes
    ///     + WEIGHT_FACTOR * (2.0 + 0.0) / 2.0;
    /// assert!((genome1.distance(&genome2, &registry) - expected).abs() < 1e-6);
    /// ```
    pub fn distance(&self, other: &Genome, registry: &Registry) -> f32 {
        let connection_count = registry.connection_count();
        let first = presence(self, connection_count);
        let second = presence(other, connection_count);

        let last_present = |genes: &[Option<&Gene>]| genes.iter().rposition(Option::is_some);
        let split = match (last_present(&first), last_present(&second)) {
            (Some(last1), Some(last2)) => Some(last1.min(last2)),
            _ => None,
        };

        let mut disjoint = 0usize;
        let mut excess = 0usize;
        let mut weight_diff = 0.0;
        let mut shared = 0usize;
        for (i, (g1, g2)) in first.iter().zip(&second).enumerate() {
            match (g1, g2) {
                (Some(g1), Some(g2)) => {
                    if g1.enabled() && g2.enabled() {
                        shared += 1;
                        weight_diff += (g1.weight() - g2.weight()).abs();
                    }
                }
                (None, None) => {}
                _ => match split {
                    Some(split) if i <= split => disjoint += 1,
                    _ => excess += 1,
                },
            }
        }
        if shared > 0 {
            weight_diff /= shared as f32;
        }

        let node_count = self
            .nodes_in_use(registry)
            .len()
            .max(other.nodes_in_use(registry).len()) as f32;
        let disjoint_term = DISJOINT_FACTOR * disjoint as f32 / node_count;
        let excess_term = EXCESS_FACTOR * excess as f32 / node_count;
        let weight_term = WEIGHT_FACTOR * weight_diff;
        let distance = disjoint_term + excess_term + weight_term;

        if distance.is_nan() || distance.abs() > 100.0 {
            log::warn!(
                "large genome distance {} (disjoint {}, excess {}, weight {}, nodes {})",
                distance,
                disjoint_term,
                excess_term,
                weight_term,
                node_count
            );
        }
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, InitialTopology};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn distance_to_self_is_zero() {
        let config = GeneticConfig {
            initial_topology: InitialTopology::Full,
            init_weight_magnitude: 1.0,
            ..GeneticConfig::default()
        };
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(8);
        let mut genome = Genome::new(&registry, &config, &mut rng);
        for _ in 0..10 {
            let _ = genome.add_random_node(&mut registry, &config, &mut rng);
            let _ = genome.add_random_connection(&mut registry, &config, &mut rng);
        }
        assert_eq!(genome.distance(&genome, &registry), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let config = GeneticConfig::default();
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(21);
        let mut a = Genome::new(&registry, &config, &mut rng);
        let mut b = Genome::new(&registry, &config, &mut rng);
        for _ in 0..4 {
            let _ = a.add_random_node(&mut registry, &config, &mut rng);
            let _ = b.add_random_connection(&mut registry, &config, &mut rng);
        }
        let d1 = a.distance(&b, &registry);
        let d2 = b.distance(&a, &registry);
        assert!((d1 - d2).abs() < 1e-6);
        assert!(d1 > 0.0);
    }

    #[test]
    fn empty_genome_mismatches_are_excess() {
        let registry = Registry::new(&GeneticConfig {
            initial_topology: InitialTopology::Full,
            ..GeneticConfig::zero()
        });
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 1.0);
        genome.add_gene(&registry, 1, 1.0);

        // Input, bias and output.
        let expected = EXCESS_FACTOR * 2.0 / 3.0;
        let d = genome.distance(&Genome::empty(), &registry);
        assert!((d - expected).abs() < 1e-6);
        assert_eq!(Genome::empty().distance(&Genome::empty(), &registry), 0.0);
    }

    #[test]
    fn disabled_genes_skip_weight_term() {
        let registry = Registry::new(&GeneticConfig {
            initial_topology: InitialTopology::Full,
            ..GeneticConfig::zero()
        });
        let mut a = Genome::empty();
        let mut b = Genome::empty();
        a.add_gene(&registry, 0, 5.0).set_enabled(false);
        b.add_gene(&registry, 0, -5.0);
        assert_eq!(a.distance(&b, &registry), 0.0);
    }
}
