use crate::Innovation;

use serde::{Deserialize, Serialize};

/// Genes are the principal components of genomes.
/// Each refers to a registry connection by its
/// innovation number, and carries the connection's
/// weight within the genome.
///
/// Genes serialize as `[innovation, weight, enabled]`,
/// with `enabled` written as `1` or `0`.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "LooseGeneRecord", into = "GeneRecord")]
pub struct Gene {
    innovation: Innovation,
    weight: f32,
    enabled: bool,
}

#[derive(Serialize)]
struct GeneRecord(Innovation, f32, u8);

/// Imported flags may be written as floats.
#[derive(Deserialize)]
struct LooseGeneRecord(Innovation, f32, f32);

impl From<LooseGeneRecord> for Gene {
    fn from(LooseGeneRecord(innovation, weight, enabled): LooseGeneRecord) -> Gene {
        Gene {
            innovation,
            weight,
            enabled: enabled != 0.0,
        }
    }
}

impl From<Gene> for GeneRecord {
    fn from(gene: Gene) -> GeneRecord {
        GeneRecord(
            gene.innovation,
            gene.weight,
            if gene.enabled { 1 } else { 0 },
        )
    }
}

impl Gene {
    /// Returns a new _enabled_ gene.
    ///
    /// # Examples
    /// ```
    /// use neatfit::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// assert_eq!(gene.weight(), 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(innovation: Innovation, weight: f32) -> Gene {
        Gene {
            innovation,
            weight,
            enabled: true,
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Whether the gene is expressed in the
    /// genome's phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_innovation(&mut self, innovation: Innovation) {
        self.innovation = innovation;
    }
}
