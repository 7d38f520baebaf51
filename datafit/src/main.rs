//! Evolves classifiers for synthetic 2-D point clouds.

mod dataset;

use dataset::{Points, Shape};

use neatfit::fitness::{accuracy, total_error, DataFit, DataSet};
use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, NodeKind};
use neatfit::trainer::logging::{EvolutionLogger, ReportingLevel};
use neatfit::trainer::{Trainer, TrainerConfig};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use std::error::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Largest weight magnitude kept between generations.
const MAX_WEIGHT: f32 = 50.0;

#[derive(Parser)]
#[command(name = "datafit")]
#[command(about = "Evolve and backprop NEAT classifiers on synthetic point clouds")]
struct Args {
    /// Point cloud to classify
    #[arg(long, value_enum, default_value = "circle")]
    shape: Shape,

    /// Points in each of the train and test sets
    #[arg(
        long,
        default_value = "200",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    points: usize,

    /// Coordinate noise
    #[arg(long, default_value = "0.5")]
    noise: f32,

    /// Number of generations
    #[arg(short, long, default_value = "10")]
    generations: usize,

    /// Backprop steps per genome per generation
    #[arg(short, long, default_value = "600")]
    backprop_cycles: usize,

    /// Number of sub-populations
    #[arg(long, default_value = "5")]
    populations: usize,

    /// Offspring per sub-population
    #[arg(long, default_value = "20")]
    sub_population_size: usize,

    /// Seed for data generation and evolution
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a genome previously written with --output
    #[arg(long)]
    import: Option<PathBuf>,

    /// Write the champion's JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let train = Points::generate(args.shape, args.points, args.noise, &mut rng);
    let test = Points::generate(args.shape, args.points, args.noise, &mut rng);
    info!(
        "Generated {:?} data: {} train, {} test points ({:.0}% positive)",
        args.shape,
        train.len(),
        test.len(),
        train.positive_share() * 100.0
    );

    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).ok_or("no inputs")?,
        initial_topology: InitialTopology::Full,
        activation_types: NodeKind::DEFAULT_ACTIVATIONS.to_vec(),
        init_weight_magnitude: 0.25,
        ..GeneticConfig::zero()
    };
    let trainer_config = TrainerConfig {
        num_populations: NonZeroUsize::new(args.populations).ok_or("need at least one population")?,
        sub_population_size: NonZeroUsize::new(args.sub_population_size)
            .ok_or("sub-populations cannot be empty")?,
        new_node_rate: 0.2,
        new_connection_rate: 0.5,
        mutation_rate: 0.9,
        mutation_size: 0.005,
        extinction_rate: 0.5,
        debug_mode: log_level >= tracing::Level::DEBUG,
        seed: args.seed,
        ..TrainerConfig::default()
    };

    let mut trainer = match &args.import {
        Some(path) => {
            let (registry, genome, description) = Genome::from_json(&std::fs::read_to_string(path)?)?;
            info!("Imported genome from {:?}: {}", path, description);
            Trainer::from_genome(trainer_config, genetic_config, registry, &genome)
        }
        None => Trainer::new(trainer_config, genetic_config),
    };

    let mut fit = DataFit::new();
    let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    trainer.apply_fitness_fn(|g, r| fit.evaluate(g, r, &train, 0, &mut rng), true);

    for _ in 0..args.generations {
        logger.log(&trainer);
        if let Some(log) = logger.last() {
            info!(
                "generation {}: best fitness {:.4}, median genes {}, {} sub-populations",
                log.generation_number,
                log.fitness.maximum,
                log.gene_count.median,
                log.sub_population_count
            );
        }

        trainer.evolve(false)?;
        trainer.apply_fitness_fn(
            |g, r| fit.evaluate(g, r, &train, args.backprop_cycles, &mut rng),
            true,
        );

        if trainer.weights_nan() {
            warn!("NaN weights after generation {}", trainer.generation());
            return Err("training diverged".into());
        }
        trainer.clip_weights(MAX_WEIGHT);
    }

    let registry = trainer.registry();
    let mut champion = trainer.best_genome(None).clone();
    champion.round_weights();
    let train_accuracy = accuracy(&champion, registry, train.inputs(), train.labels());
    let test_accuracy = accuracy(&champion, registry, test.inputs(), test.labels());
    info!(
        "champion: fitness {:.4}, {} genes, train error {:.4}",
        champion.fitness(),
        champion.gene_count(),
        total_error(&champion, registry, &train)
    );
    println!("train accuracy: {:.3}", train_accuracy);
    println!("test accuracy: {:.3}", test_accuracy);

    let description = format!(
        "{:?} classifier, generation {}, test accuracy {:.3}",
        args.shape,
        trainer.generation(),
        test_accuracy
    );
    let json = champion.to_json(registry, &description)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Champion written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_count_must_be_positive() {
        assert!(Args::try_parse_from(["datafit", "--points", "0"]).is_err());
        let args = Args::try_parse_from(["datafit", "--points", "1"]).unwrap();
        assert_eq!(args.points, 1);
        assert_eq!(Args::try_parse_from(["datafit"]).unwrap().points, 200);
    }
}
