use crate::genomics::{GeneticConfig, InitialTopology, NodeKind};
use crate::Innovation;

use ahash::RandomState;
use std::collections::hash_map::{Entry, HashMap};

/// A `Registry` is the arena of nodes and connections
/// shared by every genome of a population.
///
/// Nodes are laid out as `[inputs.., bias, outputs.., hidden..]`.
/// The position of a connection in the registry is its innovation
/// number, which genomes use to refer to it. Both sequences only
/// grow, except when rebuilt by [`Compaction`].
///
/// [`Compaction`]: crate::genomics::Compaction
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    nodes: Vec<NodeKind>,
    connections: Vec<(usize, usize)>,
    connection_index: HashMap<(usize, usize), Innovation, RandomState>,
    input_count: usize,
    output_count: usize,
    hub: Option<usize>,
    render_mode: u8,
}

impl Registry {
    /// Creates a new registry with the input, bias and output
    /// nodes, and the connections of the configured initial
    /// topology.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, InitialTopology, NodeKind, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     initial_topology: InitialTopology::Full,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert_eq!(
    ///     registry.nodes(),
    ///     &[NodeKind::Input, NodeKind::Input, NodeKind::Bias, NodeKind::Output]
    /// );
    /// assert_eq!(registry.output_index(), 3);
    /// // Both inputs and the bias feed the output.
    /// assert_eq!(registry.connections(), &[(0, 3), (1, 3), (2, 3)]);
    /// ```
    pub fn new(config: &GeneticConfig) -> Registry {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let mut nodes = vec![NodeKind::Input; input_count];
        nodes.push(NodeKind::Bias);
        nodes.extend(std::iter::repeat(NodeKind::Output).take(output_count));

        let mut registry = Registry {
            nodes,
            connections: vec![],
            connection_index: HashMap::default(),
            input_count,
            output_count,
            hub: None,
            render_mode: 0,
        };
        let output_index = registry.output_index();

        match config.initial_topology {
            InitialTopology::Unconnected => {}
            InitialTopology::Full => {
                for o in 0..output_count {
                    for i in 0..=input_count {
                        registry.add_connection(i, output_index + o);
                    }
                }
            }
            InitialTopology::Hub => {
                let hub = registry.add_node(NodeKind::Add);
                registry.hub = Some(hub);
                for i in 0..=input_count {
                    registry.add_connection(i, hub);
                }
                for o in 0..output_count {
                    registry.add_connection(hub, output_index + o);
                }
            }
        }

        registry
    }

    /// Rebuilds a registry from its parts, as read from
    /// a genome document. The layout is assumed valid.
    pub(crate) fn from_parts(
        nodes: Vec<NodeKind>,
        connections: Vec<(usize, usize)>,
        input_count: usize,
        output_count: usize,
        render_mode: u8,
    ) -> Registry {
        let mut registry = Registry {
            nodes,
            connections,
            connection_index: HashMap::default(),
            input_count,
            output_count,
            hub: None,
            render_mode,
        };
        registry.reindex();
        registry
    }

    /// Rebuilds the endpoint lookup table. Only the first
    /// of duplicate endpoint pairs is indexed.
    pub(crate) fn reindex(&mut self) {
        self.connection_index.clear();
        for (id, pair) in self.connections.iter().enumerate() {
            self.connection_index.entry(*pair).or_insert(id);
        }
    }

    /// Appends a node of the given kind, returning its index.
    pub(crate) fn add_node(&mut self, kind: NodeKind) -> usize {
        self.nodes.push(kind);
        self.nodes.len() - 1
    }

    /// Registers a connection between two nodes, returning
    /// its innovation number, or the previously assigned
    /// number if the connection already existed.
    ///
    /// # Panics
    /// Panics if either endpoint is not a registered node.
    pub(crate) fn add_connection(&mut self, from: usize, to: usize) -> Innovation {
        assert!(
            from < self.nodes.len() && to < self.nodes.len(),
            "connection between nonexistent node(s) {} -> {}",
            from,
            to
        );
        match self.connection_index.entry((from, to)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                self.connections.push((from, to));
                *entry.insert(self.connections.len() - 1)
            }
        }
    }

    /// Registers a connection that is always new, even if an
    /// identical pair exists. Node splits create their
    /// connections this way.
    pub(crate) fn push_connection(&mut self, from: usize, to: usize) -> Innovation {
        let id = self.connections.len();
        self.connections.push((from, to));
        self.connection_index.entry((from, to)).or_insert(id);
        id
    }

    /// Returns the innovation number of the connection
    /// between `from` and `to`, if registered.
    pub fn find_connection(&self, from: usize, to: usize) -> Option<Innovation> {
        self.connection_index.get(&(from, to)).copied()
    }

    /// Returns the innovation numbers a fresh genome expresses,
    /// together with their fixed weights, if any.
    ///
    /// Connections of the initial topology that were compacted
    /// away are skipped.
    pub(crate) fn initial_innovations(
        &self,
        topology: InitialTopology,
    ) -> Vec<(Innovation, Option<f32>)> {
        let output_index = self.output_index();
        match topology {
            InitialTopology::Unconnected => vec![],
            InitialTopology::Full => (0..self.output_count)
                .flat_map(|o| (0..=self.input_count).map(move |i| (i, output_index + o)))
                .filter_map(|(from, to)| self.find_connection(from, to))
                .map(|id| (id, None))
                .collect(),
            InitialTopology::Hub => match self.hub {
                Some(hub) => (0..=self.input_count)
                    .filter_map(|i| self.find_connection(i, hub))
                    .map(|id| (id, None))
                    .chain(
                        (0..self.output_count)
                            .filter_map(|o| self.find_connection(hub, output_index + o))
                            .map(|id| (id, Some(1.0))),
                    )
                    .collect(),
                None => vec![],
            },
        }
    }

    /// Replaces nodes and connections with their compacted
    /// versions. `node_map` maps old node indices to new ones.
    pub(crate) fn replace(
        &mut self,
        nodes: Vec<NodeKind>,
        connections: Vec<(usize, usize)>,
        node_map: &[Option<usize>],
    ) {
        self.nodes = nodes;
        self.connections = connections;
        self.hub = self.hub.and_then(|h| node_map.get(h).copied().flatten());
        self.reindex();
    }

    pub fn nodes(&self) -> &[NodeKind] {
        &self.nodes
    }

    /// Registered connections as `(from, to)` node pairs,
    /// indexed by innovation number.
    pub fn connections(&self) -> &[(usize, usize)] {
        &self.connections
    }

    /// Returns the endpoints of a connection.
    pub fn connection(&self, innovation: Innovation) -> Option<(usize, usize)> {
        self.connections.get(innovation).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Index of the bias node.
    pub fn bias_index(&self) -> usize {
        self.input_count
    }

    /// Index of the first output node.
    pub fn output_index(&self) -> usize {
        self.input_count + 1
    }

    /// Number of input, bias and output nodes,
    /// which lead the node sequence.
    pub fn io_count(&self) -> usize {
        self.input_count + 1 + self.output_count
    }

    /// Whether the node at `index` is an output.
    pub fn is_output(&self, index: usize) -> bool {
        (self.output_index()..self.io_count()).contains(&index)
    }

    /// Opaque rendering tag preserved through export.
    pub fn render_mode(&self) -> u8 {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, render_mode: u8) {
        self.render_mode = render_mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn config(topology: InitialTopology) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_topology: topology,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn unconnected_layout() {
        let registry = Registry::new(&config(InitialTopology::Unconnected));
        assert_eq!(registry.node_count(), 5);
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.bias_index(), 2);
        assert_eq!(registry.output_index(), 3);
        assert!(registry.is_output(3) && registry.is_output(4));
        assert!(!registry.is_output(2) && !registry.is_output(5));
        assert!(registry
            .initial_innovations(InitialTopology::Unconnected)
            .is_empty());
    }

    #[test]
    fn full_layout_is_output_major() {
        let registry = Registry::new(&config(InitialTopology::Full));
        assert_eq!(
            registry.connections(),
            &[(0, 3), (1, 3), (2, 3), (0, 4), (1, 4), (2, 4)]
        );
        let initial = registry.initial_innovations(InitialTopology::Full);
        assert_eq!(initial.len(), 6);
        assert!(initial.iter().enumerate().all(|(i, (id, w))| *id == i && w.is_none()));
    }

    #[test]
    fn hub_layout() {
        let registry = Registry::new(&config(InitialTopology::Hub));
        assert_eq!(registry.nodes()[5], NodeKind::Add);
        assert_eq!(
            registry.connections(),
            &[(0, 5), (1, 5), (2, 5), (5, 3), (5, 4)]
        );
        let weights: Vec<Option<f32>> = registry
            .initial_innovations(InitialTopology::Hub)
            .into_iter()
            .map(|(_, w)| w)
            .collect();
        assert_eq!(weights, vec![None, None, None, Some(1.0), Some(1.0)]);
    }

    #[test]
    fn add_connection_reuses_innovations() {
        let mut registry = Registry::new(&config(InitialTopology::Unconnected));
        let a = registry.add_connection(0, 3);
        let b = registry.add_connection(1, 3);
        assert_eq!(registry.add_connection(0, 3), a);
        assert_ne!(a, b);
        assert_eq!(registry.find_connection(1, 3), Some(b));
        assert_eq!(registry.find_connection(3, 1), None);

        let c = registry.push_connection(0, 3);
        assert_ne!(c, a);
        assert_eq!(registry.find_connection(0, 3), Some(a));
    }

    #[test]
    #[should_panic]
    fn add_connection_to_missing_node() {
        Registry::new(&config(InitialTopology::Unconnected)).add_connection(0, 99);
    }
}
