//! A reference fitness function for binary classification.
//! Genomes are scored by logistic error on a labeled data set,
//! optionally after refining their weights by backpropagation,
//! and penalized for their size.

use crate::autodiff::{Mat, Solver};
use crate::genomics::{Genome, Registry};

use rand::Rng;

/// A labeled data set for binary classification.
pub trait DataSet {
    /// Inputs, one sample per row.
    fn inputs(&self) -> &Mat;

    /// Labels (0 or 1), one per row, as a single column.
    fn labels(&self) -> &Mat;

    fn len(&self) -> usize {
        self.inputs().rows()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples `size` rows uniformly, with replacement.
    ///
    /// # Panics
    /// Panics if the data set is empty.
    fn sample<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> (Mat, Mat) {
        let (inputs, labels) = (self.inputs(), self.labels());
        let mut batch_inputs = Mat::new(size, inputs.cols());
        let mut batch_labels = Mat::new(size, 1);
        for row in 0..size {
            let sample = rng.gen_range(0..self.len());
            for col in 0..inputs.cols() {
                batch_inputs.set(row, col, inputs.get(sample, col));
            }
            batch_labels.set(row, 0, labels.get(sample, 0));
        }
        (batch_inputs, batch_labels)
    }
}

/// Scores genomes by negative penalized logistic error.
///
/// Owns the [`Solver`] used for backpropagation, whose
/// gradient cache is shared by every genome it trains.
#[derive(Clone, Debug)]
pub struct DataFit {
    /// Solver step size.
    pub learn_rate: f32,
    /// Solver weight decay.
    pub reg_c: f32,
    /// Solver gradient clip.
    pub clip_value: f32,
    /// Backprop steps between checkpoints.
    pub check_interval: usize,
    /// Samples per backprop step.
    pub batch_size: usize,
    /// Penalty per square root of hidden nodes in use.
    pub penalty_node_factor: f32,
    /// Penalty per square root of genes.
    pub penalty_connection_factor: f32,
    solver: Solver,
}

impl Default for DataFit {
    fn default() -> DataFit {
        DataFit {
            learn_rate: 0.01,
            reg_c: 0.001,
            clip_value: 5.0,
            check_interval: 20,
            batch_size: 10,
            penalty_node_factor: 0.0,
            penalty_connection_factor: 0.03,
            solver: Solver::new(),
        }
    }
}

impl DataFit {
    pub fn new() -> DataFit {
        DataFit::default()
    }

    /// Returns the genome's fitness on `data`: its average
    /// logistic error, negated and scaled up by a size penalty
    /// (see [`DataFit::penalty_factor`]).
    ///
    /// With `backprop_cycles > 0`, the genome's weights are
    /// first trained for up to that many minibatch steps. Every
    /// `check_interval` steps the error on the whole data set is
    /// compared with the last checkpoint; training stops and the
    /// checkpoint is restored if it got worse. The genome never
    /// ends up with a higher error than it started with.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::Mat;
    /// use neatfit::fitness::{DataFit, DataSet};
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// struct Identity(Mat, Mat);
    ///
    /// impl DataSet for Identity {
    ///     fn inputs(&self) -> &Mat { &self.0 }
    ///     fn labels(&self) -> &Mat { &self.1 }
    /// }
    ///
    /// let data = Identity(
    ///     Mat::from_vec(4, 1, vec![-2.0, -1.0, 1.0, 2.0]),
    ///     Mat::from_vec(4, 1, vec![0.0, 0.0, 1.0, 1.0]),
    /// );
    /// let config = GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     init_weight_magnitude: 0.5,
    ///     ..GeneticConfig::zero()
    /// };
    /// let registry = Registry::new(&config);
    /// let mut genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
    /// let mut fit = DataFit::new();
    /// let mut rng = StdRng::seed_from_u64(1);
    ///
    /// let before = fit.evaluate(&mut genome, &registry, &data, 0, &mut rng);
    /// let after = fit.evaluate(&mut genome, &registry, &data, 200, &mut rng);
    ///
    /// assert!(before < 0.0);
    /// assert!(after >= before);
    /// ```
    pub fn evaluate<D, R>(
        &mut self,
        genome: &mut Genome,
        registry: &Registry,
        data: &D,
        backprop_cycles: usize,
        rng: &mut R,
    ) -> f32
    where
        D: DataSet,
        R: Rng + ?Sized,
    {
        let initial_error = total_error(genome, registry, data);
        let mut error = initial_error;

        if backprop_cycles > 0 {
            let original = genome.clone();
            let mut checkpoint = genome.clone();
            let mut checkpoint_error = initial_error;

            for cycle in 0..backprop_cycles {
                self.backprop_step(genome, registry, data, rng);

                if cycle > 0 && cycle % self.check_interval.max(1) == 0 {
                    let current = total_error(genome, registry, data);
                    if current > checkpoint_error {
                        genome.copy_genes_from(&checkpoint);
                        break;
                    }
                    checkpoint_error = current;
                    checkpoint.copy_genes_from(genome);
                }
            }

            error = total_error(genome, registry, data);
            if error > checkpoint_error {
                error = checkpoint_error;
                genome.copy_genes_from(&checkpoint);
            }
            if error > initial_error {
                error = initial_error;
                genome.copy_genes_from(&original);
                log::trace!("backprop did not improve genome");
            }
        }

        -error * self.penalty_factor(genome, registry)
    }

    /// One minibatch gradient step on the genome's weights.
    fn backprop_step<D, R>(&mut self, genome: &mut Genome, registry: &Registry, data: &D, rng: &mut R)
    where
        D: DataSet,
        R: Rng + ?Sized,
    {
        let (inputs, labels) = data.sample(self.batch_size, rng);
        let mut model = genome.setup_model(registry, self.batch_size, true);
        model.set_input(registry, &inputs);
        genome.forward(registry, &mut model);

        let output = model.outputs(registry)[0];
        let graph = model.graph_mut();
        let prediction = graph.sigmoid(output);
        let size = self.batch_size as f32;
        let predictions = graph.mat_mut(prediction);
        predictions.dw = predictions
            .w
            .iter()
            .zip(&labels.w)
            .map(|(y, t)| (y - t) / size)
            .collect();
        graph.backward();

        self.solver.step(
            model.parameters_mut(),
            self.learn_rate,
            self.reg_c,
            self.clip_value,
        );
        genome.update_model_weights(&model);
    }

    /// Returns `1 + node_factor·√hidden + connection_factor·√genes`,
    /// where `hidden` counts the nodes in use beyond the
    /// inputs, bias and outputs of the registry's layout,
    /// whatever its input and output counts.
    pub fn penalty_factor(&self, genome: &Genome, registry: &Registry) -> f32 {
        let hidden = genome
            .nodes_in_use(registry)
            .len()
            .saturating_sub(registry.io_count()) as f32;
        let genes = genome.gene_count() as f32;
        1.0 + self.penalty_node_factor * hidden.sqrt()
            + self.penalty_connection_factor * genes.sqrt()
    }

    /// Forgets the solver's gradient history.
    pub fn reset_solver(&mut self) {
        self.solver.reset();
    }
}

/// Logistic error of a single prediction.
pub fn logistic_error(prediction: f32, label: f32) -> f32 {
    -(label * prediction.ln() + (1.0 - label) * (1.0 - prediction).ln())
}

/// Average logistic error of the genome's predictions
/// on the whole data set.
pub fn total_error<D: DataSet>(genome: &Genome, registry: &Registry, data: &D) -> f32 {
    let predictions = genome.predict(registry, data.inputs());
    predictions
        .iter()
        .zip(&data.labels().w)
        .map(|(y, t)| logistic_error(*y, *t))
        .sum::<f32>()
        / data.len() as f32
}

/// Fraction of samples whose rounded prediction matches
/// their label.
///
/// # Examples
/// ```
/// use neatfit::autodiff::Mat;
/// use neatfit::fitness::accuracy;
/// use neatfit::genomics::{GeneticConfig, Genome, Registry};
///
/// // An unconnected genome always predicts 0.5, which rounds up.
/// let registry = Registry::new(&GeneticConfig::zero());
/// let inputs = Mat::from_vec(4, 1, vec![0.0, 1.0, 2.0, 3.0]);
/// let labels = Mat::from_vec(4, 1, vec![1.0, 0.0, 1.0, 1.0]);
///
/// assert_eq!(accuracy(&Genome::empty(), &registry, &inputs, &labels), 0.75);
/// ```
pub fn accuracy(genome: &Genome, registry: &Registry, inputs: &Mat, labels: &Mat) -> f32 {
    let predictions = genome.predict(registry, inputs);
    let correct = predictions
        .iter()
        .zip(&labels.w)
        .filter(|(y, t)| if **y >= 0.5 { **t == 1.0 } else { **t == 0.0 })
        .count();
    correct as f32 / predictions.len() as f32
}
