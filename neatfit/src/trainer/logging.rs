use super::Trainer;
use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones the champion of each sub-population.
    SubPopulationChampions,
    /// Clones only the trainer's best genome.
    TrainerChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a trainer.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub sub_population_count: usize,
    pub fitness: Stats,
    pub gene_count: Stats,
    pub node_count: Stats,
    pub registry_nodes: usize,
    pub registry_connections: usize,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tsub_population_count: {:?}\n\
            \tfitness: {:?}\n\
            \tgene_count: {:?}\n\
            \tnode_count: {:?}\n\
            \tregistry_nodes: {:?}\n\
            \tregistry_connections: {:?}\n\
            }}",
            &self.generation_number,
            &self.sub_population_count,
            &self.fitness,
            &self.gene_count,
            &self.node_count,
            &self.registry_nodes,
            &self.registry_connections
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All statistics of an empty sequence are NaN.
    ///
    /// # Examples
    /// ```
    /// use neatfit::trainer::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f32::NAN,
                minimum: f32::NAN,
                mean: f32::NAN,
                median: f32::NAN,
            };
        }
        data.sort_unstable_by(f32::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a trainer.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Every genome, grouped by sub-population.
    SubPopulations(Vec<(usize, Vec<Genome>)>),
    /// Only the champion of each sub-population.
    SubPopulationChampions(Vec<(usize, Genome)>),
    /// Only the trainer's best genome.
    TrainerChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a trainer over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use neatfit::trainer::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a trainer.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::GeneticConfig;
    /// use neatfit::trainer::{Trainer, TrainerConfig};
    /// use neatfit::trainer::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::TrainerChampion);
    /// let trainer = Trainer::new(TrainerConfig::default(), GeneticConfig::default());
    ///
    /// logger.log(&trainer);
    ///
    /// assert_eq!(logger.iter().count(), 1);
    /// ```
    pub fn log(&mut self, trainer: &Trainer) {
        let cluster_count = trainer.config().num_populations.get();
        let registry = trainer.registry();
        let sub_populations: Vec<(usize, Vec<&Genome>)> = (0..cluster_count)
            .map(|c| (c, trainer.genomes().filter(|g| g.cluster() == c).collect::<Vec<_>>()))
            .filter(|(_, members)| !members.is_empty())
            .collect();

        self.logs.push(Log {
            generation_number: trainer.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::SubPopulations(
                    sub_populations
                        .iter()
                        .map(|(c, members)| (*c, members.iter().copied().cloned().collect()))
                        .collect(),
                ),
                ReportingLevel::SubPopulationChampions => {
                    GenerationMemberRecord::SubPopulationChampions(
                        sub_populations
                            .iter()
                            .map(|(c, _)| (*c, trainer.best_genome(Some(*c)).clone()))
                            .collect(),
                    )
                }
                ReportingLevel::TrainerChampion => {
                    GenerationMemberRecord::TrainerChampion(trainer.best_genome(None).clone())
                }
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            sub_population_count: sub_populations.len(),
            fitness: Stats::from(trainer.genomes().map(Genome::fitness)),
            gene_count: Stats::from(trainer.genomes().map(|g| g.gene_count() as f32)),
            node_count: Stats::from(
                trainer
                    .genomes()
                    .map(|g| g.nodes_in_use(registry).len() as f32),
            ),
            registry_nodes: registry.node_count(),
            registry_connections: registry.connection_count(),
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use neatfit::trainer::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// Returns the latest snapshot.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;
    use crate::trainer::TrainerConfig;

    #[test]
    fn even_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn empty_stats() {
        assert!(Stats::from(std::iter::empty()).mean.is_nan());
    }

    #[test]
    fn logs_sub_populations() {
        let mut trainer = Trainer::new(
            TrainerConfig {
                seed: Some(10),
                ..TrainerConfig::default()
            },
            GeneticConfig::default(),
        );
        trainer.apply_fitness_fn(|g, _| -(g.gene_count() as f32), true);

        let mut logger = EvolutionLogger::new(ReportingLevel::AllGenomes);
        logger.log(&trainer);
        let log = logger.last().unwrap();

        match &log.generation_sample {
            GenerationMemberRecord::SubPopulations(groups) => {
                let logged: usize = groups.iter().map(|(_, members)| members.len()).sum();
                assert_eq!(logged, trainer.genomes().count());
                assert_eq!(groups.len(), log.sub_population_count);
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert!(log.fitness.maximum < 0.0);
        assert!(log.node_count.minimum >= 4.0);
    }
}
