use crate::Innovation;

use std::error::Error;
use std::fmt;

/// An error type indicating the gene being
/// added is invalid for the genome.
#[derive(Debug)]
pub(crate) enum GeneValidityError {
    /// The genome already has a gene with this innovation.
    DuplicateGeneID(Innovation),
    /// The innovation is not in the registry.
    NonexistentInnovation(Innovation),
}

/// An error type indicating a failure
/// to carry out a node addition mutation.
#[derive(Debug)]
pub(crate) enum NodeAdditionMutationError {
    /// The genome was empty.
    EmptyGenome,
    /// The genome had no enabled gene to split.
    NoEnabledGene,
}

/// An error type indicating a failure
/// to carry out a gene addition mutation.
#[derive(Debug)]
pub(crate) enum GeneAdditionMutationError {
    /// Both chosen endpoints were the same node.
    SameEndpoints(usize),
    /// The chosen connection is already expressed in the genome.
    AlreadyExpressed(Innovation),
}

/// An error type indicating a failure to produce
/// offspring from two parents.
#[derive(Debug, PartialEq, Eq)]
pub enum MatingError {
    /// No parent could be selected from the cluster.
    NoEligibleParent(usize),
    /// A parent referenced an innovation missing from the registry.
    UnknownInnovation(Innovation),
}

/// An error type indicating a failure to import
/// a genome document.
#[derive(Debug)]
pub enum ImportError {
    /// The document is not valid JSON for a genome.
    Json(serde_json::Error),
    /// The node and connection layout is inconsistent.
    MalformedLayout(String),
    /// A gene referenced an innovation missing from the document.
    UnknownInnovation(Innovation),
}

impl fmt::Display for GeneValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGeneID(id) => write!(f, "duplicate gene insertion with id {}", id),
            Self::NonexistentInnovation(id) => {
                write!(f, "gene insertion with unregistered innovation {}", id)
            }
        }
    }
}

impl fmt::Display for NodeAdditionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGenome => write!(f, "node mutation on empty genome"),
            Self::NoEnabledGene => write!(f, "node mutation on genome without enabled genes"),
        }
    }
}

impl fmt::Display for GeneAdditionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameEndpoints(node) => {
                write!(f, "gene mutation chose node {} as both endpoints", node)
            }
            Self::AlreadyExpressed(id) => {
                write!(f, "gene mutation chose already expressed gene {}", id)
            }
        }
    }
}

impl fmt::Display for MatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleParent(cluster) => {
                write!(f, "no eligible parent in cluster {}", cluster)
            }
            Self::UnknownInnovation(id) => {
                write!(f, "parent references unregistered innovation {}", id)
            }
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "invalid genome document: {}", e),
            Self::MalformedLayout(reason) => write!(f, "malformed genome layout: {}", reason),
            Self::UnknownInnovation(id) => {
                write!(f, "gene references unregistered innovation {}", id)
            }
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> ImportError {
        ImportError::Json(e)
    }
}

impl Error for GeneValidityError {}
impl Error for NodeAdditionMutationError {}
impl Error for GeneAdditionMutationError {}
impl Error for MatingError {}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}
