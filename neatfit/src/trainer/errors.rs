use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub(crate) enum EvolutionError {
    FitnessNotApplied,
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FitnessNotApplied => write!(f, "attempted evolution before applying fitness"),
        }
    }
}

impl Error for EvolutionError {}
