use super::{Combine, Genome, NodeKind, Registry};
use crate::autodiff::{Graph, Mat, MatId};
use crate::Innovation;

/// Maximum number of relaxation passes in a forward
/// evaluation.
pub const MAX_TICK: usize = 100;

/// A genome instantiated as a computation graph.
///
/// Holds one `batch_size × 1` matrix per registry node and
/// one `1 × 1` parameter per registry connection. Parameters
/// of connections the genome lacks hold weight 0.
///
/// Inputs must be set with [`Model::set_input`] before
/// calling [`Genome::forward`], which replaces node values
/// with computed ones.
#[derive(Debug)]
pub struct Model {
    graph: Graph,
    nodes: Vec<MatId>,
    connections: Vec<MatId>,
    batch_size: usize,
}

impl Model {
    /// Writes one batch of input values. Column `i` of
    /// `input` feeds input node `i`. Bias nodes are set to 1.
    ///
    /// # Panics
    /// Panics if `input` is not `batch_size × input_count`.
    pub fn set_input(&mut self, registry: &Registry, input: &Mat) {
        assert!(
            input.rows() == self.batch_size && input.cols() == registry.input_count(),
            "input is {}x{}, expected {}x{}",
            input.rows(),
            input.cols(),
            self.batch_size,
            registry.input_count()
        );
        for (index, kind) in registry.nodes().iter().enumerate() {
            let node = self.graph.mat_mut(self.nodes[index]);
            match kind {
                NodeKind::Input => {
                    for row in 0..input.rows() {
                        node.w[row] = input.get(row, index);
                    }
                }
                NodeKind::Bias => node.set_all(1.0),
                _ => {}
            }
        }
    }

    /// Returns the current value of each output node.
    pub fn outputs(&self, registry: &Registry) -> Vec<MatId> {
        (registry.output_index()..registry.io_count())
            .map(|o| self.nodes[o])
            .collect()
    }

    /// Returns the current value of the given node.
    pub fn node(&self, index: usize) -> MatId {
        self.nodes[index]
    }

    /// Returns the weight parameter of the given connection.
    pub fn connection(&self, innovation: Innovation) -> MatId {
        self.connections[innovation]
    }

    /// Returns the weight parameters, one per registry
    /// connection, in innovation order.
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Mat> {
        self.graph.params_mut()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Enabled inbound connections of every node, and the
/// nodes they touch.
struct Wiring {
    inbound: Vec<Vec<Innovation>>,
    live: Vec<usize>,
}

impl Wiring {
    fn new(genome: &Genome, registry: &Registry) -> Wiring {
        let mut enabled: Vec<Innovation> = genome
            .genes()
            .filter(|g| g.enabled())
            .map(|g| g.innovation())
            .collect();
        enabled.sort_unstable();

        let mut inbound = vec![vec![]; registry.node_count()];
        let mut is_live = vec![false; registry.node_count()];
        for innovation in enabled {
            let (from, to) = registry.connections()[innovation];
            inbound[to].push(innovation);
            is_live[from] = true;
            is_live[to] = true;
        }
        let live = (0..registry.node_count()).filter(|n| is_live[*n]).collect();

        Wiring { inbound, live }
    }
}

/// Which nodes have received a value.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Touched(Vec<bool>);

impl Touched {
    /// Inputs and bias.
    fn initial(registry: &Registry) -> Touched {
        Touched(
            registry
                .nodes()
                .iter()
                .map(|k| matches!(k, NodeKind::Input | NodeKind::Bias))
                .collect(),
        )
    }

    /// Marks every node with an enabled connection from a
    /// touched node. Nodes marked in this pass do not
    /// propagate further until the next one.
    fn spread(&self, wiring: &Wiring, registry: &Registry) -> Touched {
        let mut next = self.clone();
        for (node, inbound) in wiring.inbound.iter().enumerate() {
            if !self.0[node]
                && inbound
                    .iter()
                    .any(|c| self.0[registry.connections()[*c].0])
            {
                next.0[node] = true;
            }
        }
        next
    }

    fn covers(&self, nodes: &[usize]) -> bool {
        nodes.iter().all(|n| self.0[*n])
    }

    fn agrees_on(&self, other: &Touched, nodes: &[usize]) -> bool {
        nodes.iter().all(|n| self.0[*n] == other.0[*n])
    }
}

/// Recomputes every touched node that has inbound
/// connections, in index order.
fn tick(model: &mut Model, wiring: &Wiring, registry: &Registry, touched: &Touched) {
    for (node, inbound) in wiring.inbound.iter().enumerate() {
        if !touched.0[node] || inbound.is_empty() {
            continue;
        }
        let ops = registry.nodes()[node].ops();
        let graph = &mut model.graph;

        let mut folded: Option<MatId> = None;
        for &innovation in inbound {
            let (from, _) = registry.connections()[innovation];
            let mut term = graph.mul(model.nodes[from], model.connections[innovation]);
            if let Some(edge) = ops.edge {
                term = graph.unary(edge, term);
            }
            folded = Some(match (folded, ops.combine) {
                (None, _) => term,
                (Some(acc), Combine::Sum) => graph.add(acc, term),
                (Some(acc), Combine::Product) => graph.eltmul(acc, term),
            });
        }
        let Some(mut value) = folded else { continue };

        if let Some(activation) = ops.activation {
            value = graph.unary(activation, value);
        }
        if ops.square {
            value = graph.eltmul(value, value);
        }
        model.nodes[node] = value;
    }
}

impl Genome {
    /// Instantiates the genome as a computation graph for
    /// batches of `batch_size` rows. Pass `needs_backprop`
    /// to allow a backward pass over the graph.
    ///
    /// # Panics
    /// Panics if the genome has genes missing from the registry.
    pub fn setup_model(&self, registry: &Registry, batch_size: usize, needs_backprop: bool) -> Model {
        let mut weights = vec![0.0; registry.connection_count()];
        for gene in self.genes() {
            assert!(
                gene.innovation() < weights.len(),
                "gene {} missing from registry",
                gene.innovation()
            );
            weights[gene.innovation()] = gene.weight();
        }

        let mut graph = Graph::new(needs_backprop);
        let connections = weights
            .into_iter()
            .map(|w| graph.insert_param(Mat::scalar(w)))
            .collect();
        let nodes = (0..registry.node_count())
            .map(|_| graph.insert(Mat::new(batch_size, 1)))
            .collect();

        Model {
            graph,
            nodes,
            connections,
            batch_size,
        }
    }

    /// Evaluates the model by relaxation: values spread from
    /// inputs and bias along enabled connections, one hop per
    /// pass, until every node touched by an enabled gene has
    /// a value, a pass reaches no new node, or [`MAX_TICK`]
    /// passes have run. Cycles are thus allowed.
    ///
    /// Outputs nothing reaches keep the value 0.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::Mat;
    /// use neatfit::genomics::{GeneticConfig, Genome, InitialTopology, Registry};
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// });
    /// let mut genome = Genome::empty();
    /// genome.add_gene(&registry, 0, 2.0); // input -> output
    /// genome.add_gene(&registry, 1, 0.5); // bias -> output
    ///
    /// let mut model = genome.setup_model(&registry, 2, false);
    /// model.set_input(&registry, &Mat::from_vec(2, 1, vec![1.0, -1.0]));
    /// genome.forward(&registry, &mut model);
    ///
    /// let output = model.outputs(&registry)[0];
    /// assert_eq!(model.graph().mat(output).w, vec![2.5, -1.5]);
    /// ```
    pub fn forward(&self, registry: &Registry, model: &mut Model) {
        assert_eq!(
            model.nodes.len(),
            registry.node_count(),
            "model built for another registry"
        );
        let wiring = Wiring::new(self, registry);

        let mut touched = Touched::initial(registry);
        let mut previous = Touched(vec![false; registry.node_count()]);
        for _ in 0..MAX_TICK {
            touched = touched.spread(&wiring, registry);
            tick(model, &wiring, registry, &touched);
            if touched.covers(&wiring.live) || touched.agrees_on(&previous, &wiring.live) {
                break;
            }
            previous = touched.clone();
        }
    }

    /// Copies trained weights from the model back into the
    /// genome's enabled genes.
    pub fn update_model_weights(&mut self, model: &Model) {
        for gene in self.genes_mut().iter_mut().filter(|g| g.enabled()) {
            let param = model.connections[gene.innovation()];
            gene.set_weight(model.graph.mat(param).w[0]);
        }
    }

    /// Evaluates a batch of inputs, returning the sigmoid of
    /// the first output for each row.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::Mat;
    /// use neatfit::genomics::{GeneticConfig, Genome, Registry};
    ///
    /// let registry = Registry::new(&GeneticConfig::zero());
    /// let predictions = Genome::empty().predict(&registry, &Mat::from_vec(1, 1, vec![4.0]));
    ///
    /// assert_eq!(predictions, vec![0.5]);
    /// ```
    pub fn predict(&self, registry: &Registry, input: &Mat) -> Vec<f32> {
        let mut model = self.setup_model(registry, input.rows(), false);
        model.set_input(registry, input);
        self.forward(registry, &mut model);
        let output = model.outputs(registry)[0];
        let prediction = model.graph.sigmoid(output);
        model.graph.mat(prediction).w.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, InitialTopology};
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    fn two_input_registry() -> Registry {
        Registry::new(&GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            initial_topology: InitialTopology::Full,
            ..GeneticConfig::zero()
        })
    }

    fn output_values(genome: &Genome, registry: &Registry, input: &Mat) -> Vec<f32> {
        let mut model = genome.setup_model(registry, input.rows(), false);
        model.set_input(registry, input);
        genome.forward(registry, &mut model);
        let output = model.outputs(registry)[0];
        model.graph().mat(output).w.clone()
    }

    #[test]
    fn zero_weights_predict_half() {
        let config = GeneticConfig {
            initial_topology: InitialTopology::Full,
            ..GeneticConfig::zero()
        };
        let registry = Registry::new(&config);
        let genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(genome.gene_count(), 2);
        let predictions = genome.predict(&registry, &Mat::from_vec(2, 1, vec![3.0, -7.0]));
        assert_eq!(predictions, vec![0.5, 0.5]);
    }

    #[test]
    fn zero_weighted_inputs_predict_half() {
        let registry = two_input_registry();
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 0.0);
        genome.add_gene(&registry, 1, 0.0);

        let input = Mat::from_vec(1, 2, vec![1.0, 1.0]);
        assert_eq!(output_values(&genome, &registry, &input), vec![0.0]);
        assert_eq!(genome.predict(&registry, &input), vec![0.5]);
    }

    #[test]
    fn linear_genome() {
        let registry = two_input_registry();
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 2.0);
        genome.add_gene(&registry, 1, -1.0);
        genome.add_gene(&registry, 2, 0.5);

        let values = output_values(&genome, &registry, &Mat::from_vec(1, 2, vec![1.0, 3.0]));
        assert_eq!(values, vec![2.0 - 3.0 + 0.5]);
    }

    #[test]
    fn disabled_genes_are_ignored() {
        let registry = two_input_registry();
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 2.0);
        genome.add_gene(&registry, 1, 5.0).set_enabled(false);

        let values = output_values(&genome, &registry, &Mat::from_vec(1, 2, vec![1.0, 1.0]));
        assert_eq!(values, vec![2.0]);
    }

    #[test]
    fn hidden_node_kinds() {
        // Terms into the hidden node are 1.0 and 0.5.
        let gaussian = |x: f32| (-x * x / 2.0).exp();
        let cases = [
            (NodeKind::Tanh, 1.5f32.tanh()),
            (NodeKind::Mult, 0.5),
            (NodeKind::Square, 2.25),
            (NodeKind::MultiGaussian, gaussian(1.0) * gaussian(0.5)),
        ];
        for (kind, expected) in cases {
            let mut registry = two_input_registry();
            let hidden = registry.add_node(kind);
            let a = registry.add_connection(0, hidden);
            let b = registry.add_connection(2, hidden);
            let c = registry.add_connection(hidden, registry.output_index());

            let mut genome = Genome::empty();
            genome.add_gene(&registry, a, 2.0);
            genome.add_gene(&registry, b, 0.5);
            genome.add_gene(&registry, c, 1.0);

            let values = output_values(&genome, &registry, &Mat::from_vec(1, 2, vec![0.5, 0.0]));
            assert!(
                (values[0] - expected).abs() < 1e-6,
                "{:?}: {} vs {}",
                kind,
                values[0],
                expected
            );
        }
    }

    #[test]
    fn recurrent_genome_terminates() {
        let mut registry = two_input_registry();
        let h1 = registry.add_node(NodeKind::Tanh);
        let h2 = registry.add_node(NodeKind::Tanh);
        let output = registry.output_index();
        let mut genome = Genome::empty();
        for (from, to) in [(0, h1), (h1, h2), (h2, h1), (h2, output)] {
            let id = registry.add_connection(from, to);
            genome.add_gene(&registry, id, 0.7);
        }

        let values = output_values(&genome, &registry, &Mat::from_vec(1, 2, vec![1.0, 0.0]));
        assert!(values[0].is_finite());
        assert!(values[0] != 0.0);
    }

    #[test]
    fn unreachable_island_terminates() {
        let mut registry = two_input_registry();
        let h1 = registry.add_node(NodeKind::Add);
        let h2 = registry.add_node(NodeKind::Add);
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 1.0);
        for (from, to) in [(h1, h2), (h2, h1)] {
            let id = registry.add_connection(from, to);
            genome.add_gene(&registry, id, 1.0);
        }

        let values = output_values(&genome, &registry, &Mat::from_vec(1, 2, vec![4.0, 0.0]));
        assert_eq!(values, vec![4.0]);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let mut registry = two_input_registry();
        let hidden = registry.add_node(NodeKind::Sigmoid);
        let output = registry.output_index();
        let mut genome = Genome::empty();
        for (from, to, w) in [(0, hidden, 0.3), (1, hidden, -0.8), (hidden, output, 1.5), (2, output, 0.2)] {
            let id = registry.add_connection(from, to);
            genome.add_gene(&registry, id, w);
        }
        let input = Mat::from_vec(2, 2, vec![0.5, 1.0, -1.0, 2.0]);
        let loss = |g: &Genome| -> f32 {
            output_values(g, &registry, &input).iter().sum()
        };

        let mut model = genome.setup_model(&registry, 2, true);
        model.set_input(&registry, &input);
        genome.forward(&registry, &mut model);
        let out = model.outputs(&registry)[0];
        model.graph_mut().mat_mut(out).dw = vec![1.0, 1.0];
        model.graph_mut().backward();

        let eps = 1e-2;
        for gene in genome.genes() {
            let id = gene.innovation();
            let analytic = model.graph().mat(model.connection(id)).dw[0];
            let mut plus = genome.clone();
            plus.genes_mut().iter_mut().find(|g| g.innovation() == id).unwrap().set_weight(gene.weight() + eps);
            let mut minus = genome.clone();
            minus.genes_mut().iter_mut().find(|g| g.innovation() == id).unwrap().set_weight(gene.weight() - eps);
            let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
            assert!((analytic - numeric).abs() < 1e-2, "gene {}: {} vs {}", id, analytic, numeric);
        }
    }

    #[test]
    fn update_model_weights_copies_enabled() {
        let registry = two_input_registry();
        let mut genome = Genome::empty();
        genome.add_gene(&registry, 0, 1.0);
        genome.add_gene(&registry, 1, 1.0).set_enabled(false);
        let mut model = genome.setup_model(&registry, 1, true);
        for param in model.parameters_mut() {
            param.w[0] = 9.0;
        }
        genome.update_model_weights(&model);
        assert_eq!(genome.gene(0).unwrap().weight(), 9.0);
        assert_eq!(genome.gene(1).unwrap().weight(), 1.0);
    }
}
