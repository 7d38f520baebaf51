use crate::autodiff::UnaryOp;

use serde::{Deserialize, Serialize};

use std::convert::TryFrom;
use std::fmt;

/// The kind of a registry node. It is fixed at creation,
/// and determines how the node combines its inbound
/// connections during forward evaluation.
///
/// Kinds serialize as their integer codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NodeKind {
    Input,
    Output,
    Bias,
    Sigmoid,
    Tanh,
    Relu,
    Gaussian,
    Sin,
    Cos,
    Abs,
    /// Product of the weighted inputs.
    Mult,
    /// Sum of the weighted inputs.
    Add,
    /// Product of the gaussians of the weighted inputs.
    MultiGaussian,
    /// Square of the sum of the weighted inputs.
    Square,
}

/// How a node folds its weighted inbound terms together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    Sum,
    Product,
}

/// Evaluation recipe of a node kind: every inbound term
/// `source × weight` optionally goes through `edge`, the
/// terms are folded by `combine`, and the result optionally
/// goes through `activation` and is then squared if `square`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeOps {
    pub combine: Combine,
    pub edge: Option<UnaryOp>,
    pub activation: Option<UnaryOp>,
    pub square: bool,
}

impl NodeOps {
    const fn sum(activation: Option<UnaryOp>) -> NodeOps {
        NodeOps {
            combine: Combine::Sum,
            edge: None,
            activation,
            square: false,
        }
    }
}

impl NodeKind {
    /// Activation kinds used by default for new hidden nodes.
    pub const DEFAULT_ACTIVATIONS: [NodeKind; 9] = [
        NodeKind::Sigmoid,
        NodeKind::Tanh,
        NodeKind::Relu,
        NodeKind::Gaussian,
        NodeKind::Sin,
        NodeKind::Abs,
        NodeKind::Mult,
        NodeKind::Square,
        NodeKind::Add,
    ];

    /// Every activation kind.
    pub const ALL_ACTIVATIONS: [NodeKind; 11] = [
        NodeKind::Sigmoid,
        NodeKind::Tanh,
        NodeKind::Relu,
        NodeKind::Gaussian,
        NodeKind::Sin,
        NodeKind::Cos,
        NodeKind::Mult,
        NodeKind::Abs,
        NodeKind::Add,
        NodeKind::MultiGaussian,
        NodeKind::Square,
    ];

    /// A small activation set, for simple problems.
    pub const MINIMAL_ACTIVATIONS: [NodeKind; 4] =
        [NodeKind::Relu, NodeKind::Tanh, NodeKind::Gaussian, NodeKind::Add];

    /// Returns the kind's evaluation recipe.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::UnaryOp;
    /// use neatfit::genomics::{Combine, NodeKind};
    ///
    /// let ops = NodeKind::MultiGaussian.ops();
    /// assert_eq!(ops.combine, Combine::Product);
    /// assert_eq!(ops.edge, Some(UnaryOp::Gaussian));
    ///
    /// assert_eq!(NodeKind::Tanh.ops().activation, Some(UnaryOp::Tanh));
    /// assert!(NodeKind::Square.ops().square);
    /// ```
    pub fn ops(self) -> NodeOps {
        match self {
            Self::Input | Self::Output | Self::Bias | Self::Add => NodeOps::sum(None),
            Self::Sigmoid => NodeOps::sum(Some(UnaryOp::Sigmoid)),
            Self::Tanh => NodeOps::sum(Some(UnaryOp::Tanh)),
            Self::Relu => NodeOps::sum(Some(UnaryOp::Relu)),
            Self::Gaussian => NodeOps::sum(Some(UnaryOp::Gaussian)),
            Self::Sin => NodeOps::sum(Some(UnaryOp::Sin)),
            Self::Cos => NodeOps::sum(Some(UnaryOp::Cos)),
            Self::Abs => NodeOps::sum(Some(UnaryOp::Abs)),
            Self::Mult => NodeOps {
                combine: Combine::Product,
                ..NodeOps::sum(None)
            },
            Self::MultiGaussian => NodeOps {
                combine: Combine::Product,
                edge: Some(UnaryOp::Gaussian),
                ..NodeOps::sum(None)
            },
            Self::Square => NodeOps {
                square: true,
                ..NodeOps::sum(None)
            },
        }
    }

    /// Whether the kind is one of the fixed input, bias
    /// or output kinds.
    pub fn is_io(self) -> bool {
        matches!(self, Self::Input | Self::Output | Self::Bias)
    }

    /// The kind's integer code.
    pub fn code(self) -> u8 {
        self.into()
    }
}

/// An error type indicating an unknown node kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownNodeKind(pub u8);

impl fmt::Display for UnknownNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node kind code {}", self.0)
    }
}

impl std::error::Error for UnknownNodeKind {}

impl TryFrom<u8> for NodeKind {
    type Error = UnknownNodeKind;

    fn try_from(code: u8) -> Result<NodeKind, UnknownNodeKind> {
        use NodeKind::*;
        Ok(match code {
            0 => Input,
            1 => Output,
            2 => Bias,
            3 => Sigmoid,
            4 => Tanh,
            5 => Relu,
            6 => Gaussian,
            7 => Sin,
            8 => Cos,
            9 => Abs,
            10 => Mult,
            11 => Add,
            12 => MultiGaussian,
            13 => Square,
            _ => return Err(UnknownNodeKind(code)),
        })
    }
}

impl From<NodeKind> for u8 {
    fn from(kind: NodeKind) -> u8 {
        use NodeKind::*;
        match kind {
            Input => 0,
            Output => 1,
            Bias => 2,
            Sigmoid => 3,
            Tanh => 4,
            Relu => 5,
            Gaussian => 6,
            Sin => 7,
            Cos => 8,
            Abs => 9,
            Mult => 10,
            Add => 11,
            MultiGaussian => 12,
            Square => 13,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..14u8 {
            let kind = NodeKind::try_from(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(NodeKind::try_from(14), Err(UnknownNodeKind(14)));
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&vec![NodeKind::Input, NodeKind::Square]).unwrap();
        assert_eq!(json, "[0,13]");
        let kinds: Vec<NodeKind> = serde_json::from_str("[2,12]").unwrap();
        assert_eq!(kinds, vec![NodeKind::Bias, NodeKind::MultiGaussian]);
        assert!(serde_json::from_str::<NodeKind>("99").is_err());
    }

    #[test]
    fn io_kinds_are_plain_sums() {
        for kind in [NodeKind::Input, NodeKind::Output, NodeKind::Bias, NodeKind::Add] {
            assert!(NodeKind::is_io(kind) || kind == NodeKind::Add);
            assert_eq!(kind.ops(), NodeOps::sum(None));
        }
    }

    #[test]
    fn activation_presets_exclude_io() {
        assert!(NodeKind::ALL_ACTIVATIONS
            .iter()
            .chain(&NodeKind::DEFAULT_ACTIVATIONS)
            .chain(&NodeKind::MINIMAL_ACTIVATIONS)
            .all(|k| !k.is_io()));
    }
}
