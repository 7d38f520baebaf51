use super::*;
use crate::genomics::MatingError;

/// Selection slack, keeping the best genome from
/// being picked every time.
const SELECTION_SLACK: f32 = 0.01;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a trainer's
/// next generation according to the specified configs.
pub(super) struct OffspringFactory<'a> {
    parents: &'a [Genome],
    registry: &'a mut Registry,
    genetic_config: &'a GeneticConfig,
    config: &'a TrainerConfig,
    rng: &'a mut StdRng,
}

impl<'a> OffspringFactory<'a> {
    pub(super) fn new(
        parents: &'a [Genome],
        registry: &'a mut Registry,
        genetic_config: &'a GeneticConfig,
        config: &'a TrainerConfig,
        rng: &'a mut StdRng,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            parents,
            registry,
            genetic_config,
            config,
            rng,
        }
    }

    /// Generate `sub_population_size` offspring for each
    /// sub-population. On extinction `(worst, best)`, the
    /// worst sub-population's offspring have parents from
    /// the best one.
    pub(super) fn generate_offspring(
        &mut self,
        extinction: Option<(usize, usize)>,
        weights_only: bool,
    ) -> Vec<Genome> {
        let cluster_count = self.config.num_populations.get();
        let offspring_count = self.config.sub_population_size.get();
        let mut offspring = Vec::with_capacity(cluster_count * offspring_count);

        for cluster in 0..cluster_count {
            let parent_cluster = match extinction {
                Some((worst, best)) if worst == cluster => best,
                _ => cluster,
            };
            for _ in 0..offspring_count {
                let mut child = self
                    .mate(parent_cluster, weights_only)
                    .unwrap_or_else(|e| {
                        if self.config.debug_mode {
                            log::debug!("mating in sub-population {} failed: {}", cluster, e);
                        }
                        self.mutated_champion(cluster)
                    });
                child.cluster = cluster;
                offspring.push(child);
            }
        }

        offspring
    }

    /// Cross over two parents of the sub-population and
    /// mutate the child.
    fn mate(&mut self, cluster: usize, weights_only: bool) -> Result<Genome, MatingError> {
        let mom = self.pick_parent(cluster)?;
        let dad = self.pick_parent(cluster)?;
        let parents = self.parents;
        let mut child = parents[mom].crossover(&parents[dad], self.registry, self.rng)?;
        if weights_only {
            child.mutate_weights(self.config.mutation_rate, self.config.mutation_size, self.rng);
        } else {
            self.apply_mutations(&mut child);
        }
        Ok(child)
    }

    /// A mutated copy of the sub-population's champion.
    fn mutated_champion(&mut self, cluster: usize) -> Genome {
        let mut child = self.parents[best_index(self.parents, Some(cluster))].clone();
        child.fitness = Genome::UNEVALUATED_FITNESS;
        self.apply_mutations(&mut child);
        child
    }

    /// Picks a member of the sub-population with chance
    /// proportional to `1 / (slack - fitness)`.
    ///
    /// Fitnesses are assumed strictly negative.
    fn pick_parent(&mut self, cluster: usize) -> Result<usize, MatingError> {
        let weights: Vec<(usize, f32)> = self
            .parents
            .iter()
            .enumerate()
            .filter(|(_, g)| g.cluster == cluster)
            .map(|(i, g)| (i, 1.0 / (SELECTION_SLACK - g.fitness)))
            .collect();
        let total: f32 = weights.iter().map(|(_, w)| w).sum();

        let mut x = self.rng.gen::<f32>();
        for (i, w) in &weights {
            x -= w / total;
            if x <= 0.0 {
                return Ok(*i);
            }
        }
        // Rounding may leave `x` slightly positive.
        weights
            .last()
            .map(|(i, _)| *i)
            .ok_or(MatingError::NoEligibleParent(cluster))
    }

    /// Structural mutations by chance, then weight mutations.
    fn apply_mutations(&mut self, genome: &mut Genome) {
        if gen_bool(self.rng, self.config.new_node_rate) {
            if let Err(e) = genome.add_random_node(self.registry, self.genetic_config, self.rng) {
                log::trace!("skipped node mutation: {}", e);
            }
        }
        if gen_bool(self.rng, self.config.new_connection_rate) {
            if let Err(e) = genome.add_random_connection(self.registry, self.genetic_config, self.rng)
            {
                log::trace!("skipped connection mutation: {}", e);
            }
        }
        genome.mutate_weights(self.config.mutation_rate, self.config.mutation_size, self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Gene;
    use crate::Innovation;

    fn parents() -> Vec<Genome> {
        [(-1.0, 0), (-100.0, 0), (-5.0, 1)]
            .into_iter()
            .map(|(fitness, cluster)| {
                let mut genome = Genome::empty();
                genome.set_fitness(fitness);
                genome.set_cluster(cluster);
                genome
            })
            .collect()
    }

    #[test]
    fn selection_favors_fitter_parents() {
        let parents = parents();
        let mut registry = Registry::new(&GeneticConfig::zero());
        let genetic_config = GeneticConfig::zero();
        let config = TrainerConfig::zero();
        let mut rng = StdRng::seed_from_u64(0);
        let mut factory =
            OffspringFactory::new(&parents, &mut registry, &genetic_config, &config, &mut rng);

        let mut picks = [0; 3];
        for _ in 0..1000 {
            picks[factory.pick_parent(0).unwrap()] += 1;
        }
        assert_eq!(picks[2], 0);
        assert!(picks[0] > 900);
        assert!(picks[1] > 0);

        assert_eq!(factory.pick_parent(1), Ok(2));
        assert_eq!(
            factory.pick_parent(7),
            Err(MatingError::NoEligibleParent(7))
        );
    }

    /// Sub-population 0 carries connection `input -> output`,
    /// sub-population 1 only `bias -> output`.
    fn distinct_parents() -> (Vec<Genome>, Registry, Innovation, Innovation) {
        let mut registry = Registry::new(&GeneticConfig::zero());
        let shared = registry.add_connection(0, registry.output_index());
        let other = registry.add_connection(registry.bias_index(), registry.output_index());

        let mut parents = parents();
        parents[0].add_gene(&registry, shared, 1.0);
        parents[1].add_gene(&registry, shared, 2.0);
        parents[2].add_gene(&registry, other, 3.0);
        (parents, registry, shared, other)
    }

    fn innovations(genome: &Genome) -> Vec<Innovation> {
        genome.genes().map(Gene::innovation).collect()
    }

    #[test]
    fn extinct_sub_population_is_bred_from_best() {
        let (parents, mut registry, shared, other) = distinct_parents();
        let genetic_config = GeneticConfig::zero();
        let config = TrainerConfig {
            num_populations: std::num::NonZeroUsize::new(2).unwrap(),
            sub_population_size: std::num::NonZeroUsize::new(5).unwrap(),
            ..TrainerConfig::zero()
        };
        let mut rng = StdRng::seed_from_u64(1);

        let regular =
            OffspringFactory::new(&parents, &mut registry, &genetic_config, &config, &mut rng)
                .generate_offspring(None, false);
        assert!(regular
            .iter()
            .filter(|g| g.cluster() == 1)
            .all(|g| innovations(g) == vec![other]));

        let offspring =
            OffspringFactory::new(&parents, &mut registry, &genetic_config, &config, &mut rng)
                .generate_offspring(Some((1, 0)), false);
        assert_eq!(offspring.len(), 10);
        assert_eq!(offspring.iter().filter(|g| g.cluster() == 1).count(), 5);
        assert!(offspring.iter().all(|g| innovations(g) == vec![shared]));
    }

    #[test]
    fn empty_sub_populations_fall_back_to_champions() {
        let (parents, mut registry, shared, _) = distinct_parents();
        let genetic_config = GeneticConfig::zero();
        let config = TrainerConfig {
            num_populations: std::num::NonZeroUsize::new(3).unwrap(),
            sub_population_size: std::num::NonZeroUsize::new(2).unwrap(),
            ..TrainerConfig::zero()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let offspring =
            OffspringFactory::new(&parents, &mut registry, &genetic_config, &config, &mut rng)
                .generate_offspring(Some((1, 0)), false);

        assert_eq!(offspring.len(), 6);
        assert_eq!(
            offspring.iter().map(Genome::cluster).collect::<Vec<_>>(),
            vec![0, 0, 1, 1, 2, 2]
        );

        // Sub-population 2 has no parents: its children are
        // unmutated copies of the overall champion.
        let champion = &parents[0];
        for child in offspring.iter().filter(|g| g.cluster() == 2) {
            assert_eq!(
                child.genes().collect::<Vec<_>>(),
                champion.genes().collect::<Vec<_>>()
            );
            assert_eq!(innovations(child), vec![shared]);
            assert_eq!(child.gene(shared).unwrap().weight(), 1.0);
            assert_eq!(child.fitness(), Genome::UNEVALUATED_FITNESS);
        }
    }
}
