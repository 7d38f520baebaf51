use super::{Gene, Genome, ImportError, NodeKind, Registry};

use serde::{Deserialize, Serialize};

/// Self-contained JSON form of a genome, together with the
/// registry it refers to.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenomeDocument {
    nodes: Vec<NodeKind>,
    connections: Vec<(usize, usize)>,
    n_input: usize,
    n_output: usize,
    #[serde(default)]
    render_mode: u8,
    output_index: usize,
    genome: Vec<Gene>,
    #[serde(default)]
    description: String,
}

impl GenomeDocument {
    fn check_layout(&self) -> Result<(), ImportError> {
        let malformed = |reason: String| Err(ImportError::MalformedLayout(reason));

        if self.n_input == 0 || self.n_output == 0 {
            return malformed(format!(
                "{} inputs and {} outputs",
                self.n_input, self.n_output
            ));
        }
        if self.output_index != self.n_input + 1 {
            return malformed(format!(
                "output index {} with {} inputs",
                self.output_index, self.n_input
            ));
        }
        let io_count = self.output_index + self.n_output;
        if self.nodes.len() < io_count {
            return malformed(format!("{} nodes, need at least {}", self.nodes.len(), io_count));
        }
        for (index, kind) in self.nodes.iter().enumerate() {
            let expected = if index < self.n_input {
                Some(NodeKind::Input)
            } else if index == self.n_input {
                Some(NodeKind::Bias)
            } else if index < io_count {
                Some(NodeKind::Output)
            } else {
                None
            };
            let valid = match expected {
                Some(expected) => *kind == expected,
                None => !kind.is_io(),
            };
            if !valid {
                return malformed(format!("unexpected {:?} node at index {}", kind, index));
            }
        }
        if let Some((from, to)) = self
            .connections
            .iter()
            .find(|(from, to)| *from >= self.nodes.len() || *to >= self.nodes.len())
        {
            return malformed(format!("connection {} -> {} to nonexistent node", from, to));
        }

        let mut seen = vec![false; self.connections.len()];
        for gene in &self.genome {
            match seen.get_mut(gene.innovation()) {
                None => return Err(ImportError::UnknownInnovation(gene.innovation())),
                Some(true) => {
                    return malformed(format!("duplicate gene {}", gene.innovation()));
                }
                Some(seen) => *seen = true,
            }
        }
        Ok(())
    }
}

impl Genome {
    /// Serializes the genome, the registry and a free-form
    /// description into a single JSON document.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self, registry: &Registry, description: &str) -> Result<String, serde_json::Error> {
        serde_json::to_string(&GenomeDocument {
            nodes: registry.nodes().to_vec(),
            connections: registry.connections().to_vec(),
            n_input: registry.input_count(),
            n_output: registry.output_count(),
            render_mode: registry.render_mode(),
            output_index: registry.output_index(),
            genome: self.genes().copied().collect(),
            description: description.to_string(),
        })
    }

    /// Deserializes a document written by [`Genome::to_json`],
    /// returning the registry it carries, the genome and its
    /// description. The registry replaces whatever registry
    /// the caller was using.
    ///
    /// # Errors
    /// Returns an error if the document is not valid JSON,
    /// if its node layout is not `[inputs.., bias, outputs..,
    /// hidden..]`, or if a gene is duplicated or refers to a
    /// missing connection.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::{GeneticConfig, Genome, Registry};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::default();
    /// let registry = Registry::new(&config);
    /// let genome = Genome::new(&registry, &config, &mut StdRng::seed_from_u64(0));
    ///
    /// let json = genome.to_json(&registry, "saved").unwrap();
    /// let (loaded_registry, loaded, description) = Genome::from_json(&json).unwrap();
    ///
    /// assert_eq!(loaded_registry.connections(), registry.connections());
    /// assert_eq!(loaded.gene_count(), genome.gene_count());
    /// assert_eq!(description, "saved");
    ///
    /// assert!(Genome::from_json("{}").is_err());
    /// ```
    pub fn from_json(data: &str) -> Result<(Registry, Genome, String), ImportError> {
        let document: GenomeDocument = serde_json::from_str(data)?;
        document.check_layout()?;

        let registry = Registry::from_parts(
            document.nodes,
            document.connections,
            document.n_input,
            document.n_output,
            document.render_mode,
        );
        let mut genome = Genome::empty();
        *genome.genes_mut() = document.genome;

        Ok((registry, genome, document.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Mat;
    use crate::genomics::GeneticConfig;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn round_trip_preserves_predictions() {
        let config = GeneticConfig::default();
        let mut registry = Registry::new(&config);
        registry.set_render_mode(2);
        let mut rng = StdRng::seed_from_u64(6);
        let mut genome = Genome::new(&registry, &config, &mut rng);
        for _ in 0..6 {
            let _ = genome.add_random_node(&mut registry, &config, &mut rng);
            let _ = genome.add_random_connection(&mut registry, &config, &mut rng);
        }

        let json = genome.to_json(&registry, "round trip").unwrap();
        let (loaded_registry, loaded, description) = Genome::from_json(&json).unwrap();

        assert_eq!(description, "round trip");
        assert_eq!(loaded_registry.nodes(), registry.nodes());
        assert_eq!(loaded_registry.render_mode(), 2);
        for (a, b) in loaded.genes().zip(genome.genes()) {
            assert_eq!(a.innovation(), b.innovation());
            assert_eq!(a.enabled(), b.enabled());
            assert!((a.weight() - b.weight()).abs() < 1e-4);
        }

        let input = Mat::from_vec(2, 2, vec![0.2, -0.6, 1.5, 0.9]);
        let before = genome.predict(&registry, &input);
        let after = loaded.predict(&loaded_registry, &input);
        for (a, b) in after.iter().zip(&before) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn document_keys() {
        let registry = Registry::new(&GeneticConfig::zero());
        let json = Genome::empty().to_json(&registry, "").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in [
            "nodes",
            "connections",
            "nInput",
            "nOutput",
            "renderMode",
            "outputIndex",
            "genome",
            "description",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn missing_render_mode_defaults_to_zero() {
        let json = r#"{"nodes":[0,2,1],"connections":[[0,2]],"nInput":1,"nOutput":1,
            "outputIndex":2,"genome":[[0,0.5,1]]}"#;
        let (registry, genome, description) = Genome::from_json(json).unwrap();
        assert_eq!(registry.render_mode(), 0);
        assert_eq!(genome.gene(0).unwrap().weight(), 0.5);
        assert_eq!(description, "");
    }

    #[test]
    fn rejects_malformed_documents() {
        let unknown_innovation = r#"{"nodes":[0,2,1],"connections":[[0,2]],"nInput":1,"nOutput":1,
            "outputIndex":2,"genome":[[4,0.5,1]]}"#;
        assert!(matches!(
            Genome::from_json(unknown_innovation),
            Err(ImportError::UnknownInnovation(4))
        ));

        let bad_output_index = r#"{"nodes":[0,2,1],"connections":[],"nInput":1,"nOutput":1,
            "outputIndex":1,"genome":[]}"#;
        assert!(matches!(
            Genome::from_json(bad_output_index),
            Err(ImportError::MalformedLayout(_))
        ));

        let dangling = r#"{"nodes":[0,2,1],"connections":[[0,7]],"nInput":1,"nOutput":1,
            "outputIndex":2,"genome":[]}"#;
        assert!(matches!(
            Genome::from_json(dangling),
            Err(ImportError::MalformedLayout(_))
        ));

        assert!(matches!(Genome::from_json("[1, 2"), Err(ImportError::Json(_))));
    }
}
