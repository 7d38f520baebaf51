//! Dense matrices, a recording computation graph for
//! reverse-mode differentiation, and the RMSProp solver
//! that consumes the gradients it produces.
//!
//! A [`Graph`] owns every matrix taking part in a computation
//! as an arena, handing out [`MatId`]s. Operations applied through
//! the graph are recorded on a data-only tape, which [`Graph::backward`]
//! replays in reverse.
mod graph;
mod mat;
mod solver;

pub use graph::{Graph, MatId, Op, UnaryOp};
pub use mat::Mat;
pub use solver::{Solver, SolverStats};
