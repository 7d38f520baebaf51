use super::Mat;

use std::fmt;

/// Handle to a matrix owned by a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatId(usize);

impl MatId {
    /// Position of the matrix in its graph's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Elementwise nonlinearities supported by a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Sin,
    Cos,
    /// `exp(-x²/2)`.
    Gaussian,
    Tanh,
    Sigmoid,
    Relu,
    Abs,
}

impl UnaryOp {
    /// Evaluates the nonlinearity at `x`.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::UnaryOp;
    ///
    /// assert_eq!(UnaryOp::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(UnaryOp::Gaussian.apply(0.0), 1.0);
    /// assert_eq!(UnaryOp::Relu.apply(-3.0), 0.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Gaussian => (-x * x / 2.0).exp(),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Relu => x.max(0.0),
            Self::Abs => x.abs(),
        }
    }

    /// Derivative at input `x`, where `y` is the
    /// already computed output at `x`.
    fn derivative(self, x: f32, y: f32) -> f32 {
        match self {
            Self::Sin => x.cos(),
            Self::Cos => -x.sin(),
            Self::Gaussian => -x * y,
            Self::Tanh => 1.0 - y * y,
            Self::Sigmoid => y * (1.0 - y),
            Self::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Abs => {
                if x > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// A recorded operation, with its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Matrix product.
    Mul(MatId, MatId),
    /// Elementwise sum.
    Add(MatId, MatId),
    /// Elementwise product.
    EltMul(MatId, MatId),
    /// Elementwise nonlinearity.
    Unary(UnaryOp, MatId),
}

#[derive(Clone, Copy, Debug)]
struct TapeEntry {
    op: Op,
    out: MatId,
}

/// An arena of matrices with a tape of the operations
/// that produced them.
///
/// Every operation allocates a fresh output matrix. If the
/// graph was created with `needs_backprop`, the operation is
/// also recorded so that [`backward`] can propagate the output
/// gradients into the operands' gradient buffers.
///
/// [`backward`]: Graph::backward
pub struct Graph {
    mats: Vec<Mat>,
    params: Vec<bool>,
    tape: Vec<TapeEntry>,
    needs_backprop: bool,
    backpropagated: bool,
}

impl Graph {
    /// Returns an empty graph. When `needs_backprop` is
    /// `false` nothing is recorded, and [`backward`] may
    /// not be called.
    ///
    /// [`backward`]: Graph::backward
    pub fn new(needs_backprop: bool) -> Graph {
        Graph {
            mats: vec![],
            params: vec![],
            tape: vec![],
            needs_backprop,
            backpropagated: false,
        }
    }

    pub fn needs_backprop(&self) -> bool {
        self.needs_backprop
    }

    /// Moves a matrix into the graph.
    pub fn insert(&mut self, mat: Mat) -> MatId {
        self.mats.push(mat);
        self.params.push(false);
        MatId(self.mats.len() - 1)
    }

    /// Moves a trainable matrix into the graph. Parameters
    /// are iterated by [`params_mut`] in insertion order.
    ///
    /// [`params_mut`]: Graph::params_mut
    pub fn insert_param(&mut self, mat: Mat) -> MatId {
        let id = self.insert(mat);
        self.params[id.0] = true;
        id
    }

    pub fn mat(&self, id: MatId) -> &Mat {
        &self.mats[id.0]
    }

    pub fn mat_mut(&mut self, id: MatId) -> &mut Mat {
        &mut self.mats[id.0]
    }

    /// Iterates mutably over the parameters, in insertion order.
    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut Mat> {
        self.mats
            .iter_mut()
            .zip(&self.params)
            .filter_map(|(m, is_param)| if *is_param { Some(m) } else { None })
    }

    /// Number of matrices owned by the graph.
    pub fn len(&self) -> usize {
        self.mats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mats.is_empty()
    }

    /// Iterates over the recorded operations, in forward order.
    pub fn recorded_ops(&self) -> impl Iterator<Item = &Op> {
        self.tape.iter().map(|e| &e.op)
    }

    fn record(&mut self, op: Op, out: Mat) -> MatId {
        let out = self.insert(out);
        if self.needs_backprop {
            self.tape.push(TapeEntry { op, out });
        }
        out
    }

    /// Matrix product of `a` (`n ⨯ k`) and `b` (`k ⨯ d`).
    ///
    /// # Panics
    /// Panics if the inner dimensions differ.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::{Graph, Mat};
    ///
    /// let mut g = Graph::new(false);
    /// let a = g.insert(Mat::from_vec(2, 1, vec![1.0, 2.0]));
    /// let b = g.insert(Mat::scalar(3.0));
    /// let c = g.mul(a, b);
    ///
    /// assert_eq!(g.mat(c).w, vec![3.0, 6.0]);
    /// ```
    pub fn mul(&mut self, a: MatId, b: MatId) -> MatId {
        let (m1, m2) = (&self.mats[a.0], &self.mats[b.0]);
        assert_eq!(
            m1.cols(),
            m2.rows(),
            "matmul dimensions misaligned: {}x{} * {}x{}",
            m1.rows(),
            m1.cols(),
            m2.rows(),
            m2.cols()
        );
        let (n, k, d) = (m1.rows(), m1.cols(), m2.cols());
        let mut out = Mat::new(n, d);
        for i in 0..n {
            for j in 0..d {
                out.w[d * i + j] = (0..k).map(|t| m1.w[k * i + t] * m2.w[d * t + j]).sum();
            }
        }
        self.record(Op::Mul(a, b), out)
    }

    /// Elementwise sum.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn add(&mut self, a: MatId, b: MatId) -> MatId {
        let out = self.zip_with(a, b, |x, y| x + y);
        self.record(Op::Add(a, b), out)
    }

    /// Elementwise product.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn eltmul(&mut self, a: MatId, b: MatId) -> MatId {
        let out = self.zip_with(a, b, |x, y| x * y);
        self.record(Op::EltMul(a, b), out)
    }

    fn zip_with(&self, a: MatId, b: MatId, f: impl Fn(f32, f32) -> f32) -> Mat {
        let (m1, m2) = (&self.mats[a.0], &self.mats[b.0]);
        assert!(
            m1.same_shape(m2),
            "elementwise operands differ in shape: {}x{} vs {}x{}",
            m1.rows(),
            m1.cols(),
            m2.rows(),
            m2.cols()
        );
        let values = m1.w.iter().zip(&m2.w).map(|(x, y)| f(*x, *y)).collect();
        Mat::from_vec(m1.rows(), m1.cols(), values)
    }

    /// Applies an elementwise nonlinearity.
    pub fn unary(&mut self, op: UnaryOp, a: MatId) -> MatId {
        let m = &self.mats[a.0];
        let out = Mat::from_vec(m.rows(), m.cols(), m.w.iter().map(|x| op.apply(*x)).collect());
        self.record(Op::Unary(op, a), out)
    }

    pub fn sin(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Sin, a)
    }

    pub fn cos(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Cos, a)
    }

    pub fn gaussian(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Gaussian, a)
    }

    pub fn tanh(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Tanh, a)
    }

    pub fn sigmoid(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Sigmoid, a)
    }

    pub fn relu(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Relu, a)
    }

    pub fn abs(&mut self, a: MatId) -> MatId {
        self.unary(UnaryOp::Abs, a)
    }

    /// Replays the tape in reverse, accumulating the gradients
    /// of every output into the gradients of its operands.
    ///
    /// Gradients are accumulated, never reset; callers seed
    /// the final outputs' `dw` beforehand.
    ///
    /// # Panics
    /// Panics if the graph does not record operations, or if
    /// it was already backpropagated.
    pub fn backward(&mut self) {
        assert!(self.needs_backprop, "backward() on a graph without backprop");
        assert!(!self.backpropagated, "backward() called twice on one forward pass");
        self.backpropagated = true;
        for i in (0..self.tape.len()).rev() {
            let entry = self.tape[i];
            self.backprop_entry(entry);
        }
    }

    fn backprop_entry(&mut self, entry: TapeEntry) {
        let out = &self.mats[entry.out.0];
        match entry.op {
            Op::Add(a, b) => {
                let grads = out.dw.clone();
                self.accumulate(a, &grads);
                self.accumulate(b, &grads);
            }
            Op::EltMul(a, b) => {
                let (m1, m2) = (&self.mats[a.0], &self.mats[b.0]);
                let ga: Vec<f32> = m2.w.iter().zip(&out.dw).map(|(w, g)| w * g).collect();
                let gb: Vec<f32> = m1.w.iter().zip(&out.dw).map(|(w, g)| w * g).collect();
                self.accumulate(a, &ga);
                self.accumulate(b, &gb);
            }
            Op::Mul(a, b) => {
                let (m1, m2) = (&self.mats[a.0], &self.mats[b.0]);
                let (n, k, d) = (m1.rows(), m1.cols(), m2.cols());
                let mut ga = vec![0.0; n * k];
                let mut gb = vec![0.0; k * d];
                for i in 0..n {
                    for j in 0..d {
                        let g = out.dw[d * i + j];
                        for t in 0..k {
                            ga[k * i + t] += m2.w[d * t + j] * g;
                            gb[d * t + j] += m1.w[k * i + t] * g;
                        }
                    }
                }
                self.accumulate(a, &ga);
                self.accumulate(b, &gb);
            }
            Op::Unary(op, a) => {
                let m = &self.mats[a.0];
                let grads: Vec<f32> = m
                    .w
                    .iter()
                    .zip(&out.w)
                    .zip(&out.dw)
                    .map(|((x, y), g)| op.derivative(*x, *y) * g)
                    .collect();
                self.accumulate(a, &grads);
            }
        }
    }

    fn accumulate(&mut self, id: MatId, grads: &[f32]) {
        for (dw, g) in self.mats[id.0].dw.iter_mut().zip(grads) {
            *dw += g;
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("mats", &self.mats.len())
            .field("params", &self.params.iter().filter(|p| **p).count())
            .field("tape", &self.tape.len())
            .field("needs_backprop", &self.needs_backprop)
            .finish()
    }
}
