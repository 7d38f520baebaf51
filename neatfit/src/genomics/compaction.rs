use super::{Gene, Genome, NodeKind, Registry};
use crate::Innovation;

/// A renumbering of a registry that keeps only what a set
/// of genomes uses.
///
/// Connections survive if any of the genomes has them
/// enabled; nodes survive if they are input, bias or output
/// nodes, or an endpoint of a surviving connection. Survivors
/// keep their relative order, so input, bias and output
/// indices do not change.
///
/// # Examples
/// ```
/// use neatfit::genomics::{Compaction, GeneticConfig, Genome, InitialTopology, Registry};
/// use std::num::NonZeroUsize;
///
/// let mut registry = Registry::new(&GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     initial_topology: InitialTopology::Full,
///     ..GeneticConfig::zero()
/// });
/// let mut genome = Genome::empty();
/// genome.add_gene(&registry, 2, 0.5);
///
/// let compaction = Compaction::build(&registry, [&genome]);
/// compaction.apply_to_registry(&mut registry);
/// compaction.apply_to_genomes([&mut genome]);
///
/// assert_eq!(registry.connection_count(), 1);
/// assert_eq!(genome.gene(0).unwrap().weight(), 0.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Compaction {
    node_map: Vec<Option<usize>>,
    connection_map: Vec<Option<Innovation>>,
    nodes: Vec<NodeKind>,
    connections: Vec<(usize, usize)>,
}

impl Compaction {
    /// Builds the renumbering from every genome that
    /// must stay valid.
    ///
    /// # Panics
    /// Panics if a genome has genes missing from the registry.
    pub fn build<'a, I>(registry: &Registry, genomes: I) -> Compaction
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        let mut connection_used = vec![false; registry.connection_count()];
        for genome in genomes {
            for gene in genome.genes().filter(|g| g.enabled()) {
                connection_used[gene.innovation()] = true;
            }
        }

        let mut node_used: Vec<bool> = (0..registry.node_count())
            .map(|n| n < registry.io_count())
            .collect();
        for (id, (from, to)) in registry.connections().iter().enumerate() {
            if connection_used[id] {
                node_used[*from] = true;
                node_used[*to] = true;
            }
        }

        let node_map = renumber(&node_used);
        let connection_map = renumber(&connection_used);

        let nodes = registry
            .nodes()
            .iter()
            .zip(&node_used)
            .filter(|(_, used)| **used)
            .map(|(kind, _)| *kind)
            .collect();
        let connections = registry
            .connections()
            .iter()
            .zip(&connection_used)
            .filter(|(_, used)| **used)
            .filter_map(|((from, to), _)| Some((node_map[*from]?, node_map[*to]?)))
            .collect();

        Compaction {
            node_map,
            connection_map,
            nodes,
            connections,
        }
    }

    /// Returns the new index of an old node, if it survives.
    pub fn translate_node(&self, node: usize) -> Option<usize> {
        self.node_map.get(node).copied().flatten()
    }

    /// Returns the new innovation number of an old
    /// connection, if it survives.
    pub fn translate_connection(&self, innovation: Innovation) -> Option<Innovation> {
        self.connection_map.get(innovation).copied().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Replaces the registry's nodes and connections with
    /// the surviving ones.
    pub fn apply_to_registry(&self, registry: &mut Registry) {
        registry.replace(self.nodes.clone(), self.connections.clone(), &self.node_map);
    }

    /// Renumbers the genomes' genes. Disabled genes and genes
    /// whose connection did not survive are dropped.
    pub fn apply_to_genomes<'a, I>(&self, genomes: I)
    where
        I: IntoIterator<Item = &'a mut Genome>,
    {
        for genome in genomes {
            let genes: Vec<Gene> = genome
                .genes()
                .filter(|g| g.enabled())
                .filter_map(|g| {
                    let mut gene = *g;
                    gene.set_innovation(self.translate_connection(g.innovation())?);
                    Some(gene)
                })
                .collect();
            *genome.genes_mut() = genes;
        }
    }
}

/// Maps every used slot to its rank among used slots.
fn renumber(used: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    used.iter()
        .map(|u| {
            u.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Mat;
    use crate::genomics::{GeneticConfig, InitialTopology};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn renumber_ranks() {
        assert_eq!(
            renumber(&[true, false, true, true, false]),
            vec![Some(0), None, Some(1), Some(2), None]
        );
    }

    #[test]
    fn compaction_preserves_outputs() {
        let config = GeneticConfig {
            initial_topology: InitialTopology::Full,
            ..GeneticConfig::default()
        };
        let mut registry = Registry::new(&config);
        let mut rng = StdRng::seed_from_u64(17);
        let mut pool: Vec<Genome> = (0..6)
            .map(|_| Genome::new(&registry, &config, &mut rng))
            .collect();
        for _ in 0..8 {
            for genome in &mut pool {
                let _ = genome.add_random_node(&mut registry, &config, &mut rng);
                let _ = genome.add_random_connection(&mut registry, &config, &mut rng);
            }
        }
        // A discarded genome leaves unused innovations behind.
        let mut discarded = pool.pop().unwrap();
        for _ in 0..5 {
            let _ = discarded.add_random_node(&mut registry, &config, &mut rng);
        }

        let input = Mat::from_vec(3, 2, vec![0.1, -0.4, 1.0, 0.3, -2.0, 0.7]);
        let before: Vec<Vec<f32>> = pool.iter().map(|g| g.predict(&registry, &input)).collect();
        let (old_nodes, old_connections) = (registry.node_count(), registry.connection_count());

        let compaction = Compaction::build(&registry, &pool);
        compaction.apply_to_registry(&mut registry);
        compaction.apply_to_genomes(&mut pool);

        assert!(registry.node_count() < old_nodes);
        assert!(registry.connection_count() < old_connections);
        for (genome, expected) in pool.iter().zip(before) {
            assert!(genome.genes().all(|g| g.enabled()));
            assert!(genome.genes().all(|g| g.innovation() < registry.connection_count()));
            let after = genome.predict(&registry, &input);
            for (a, b) in after.iter().zip(&expected) {
                assert!((a - b).abs() < 1e-5, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn io_nodes_survive() {
        let config = GeneticConfig::zero();
        let mut registry = Registry::new(&config);
        let compaction = Compaction::build(&registry, std::iter::empty());
        compaction.apply_to_registry(&mut registry);
        assert_eq!(registry.node_count(), registry.io_count());
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(compaction.translate_node(2), Some(2));
    }
}
