/// A dense, row-major matrix of values together with
/// an equally-shaped gradient buffer. Both buffers
/// start zeroed.
#[derive(Clone, PartialEq, Debug)]
pub struct Mat {
    rows: usize,
    cols: usize,
    /// Values, in row-major order.
    pub w: Vec<f32>,
    /// Accumulated gradients, in row-major order.
    pub dw: Vec<f32>,
}

impl Mat {
    /// Returns a zero-filled `rows ⨯ cols` matrix.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::Mat;
    ///
    /// let m = Mat::new(3, 2);
    ///
    /// assert_eq!(m.rows(), 3);
    /// assert_eq!(m.cols(), 2);
    /// assert!(m.w.iter().chain(&m.dw).all(|v| *v == 0.0));
    /// ```
    pub fn new(rows: usize, cols: usize) -> Mat {
        Mat {
            rows,
            cols,
            w: vec![0.0; rows * cols],
            dw: vec![0.0; rows * cols],
        }
    }

    /// Returns a `rows ⨯ cols` matrix holding the
    /// passed row-major values.
    ///
    /// # Panics
    /// Panics if `values.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f32>) -> Mat {
        assert_eq!(
            values.len(),
            rows * cols,
            "{} values cannot fill a {}x{} matrix",
            values.len(),
            rows,
            cols
        );
        Mat {
            rows,
            cols,
            dw: vec![0.0; values.len()],
            w: values,
        }
    }

    /// Returns a `1 ⨯ 1` matrix holding `value`.
    pub fn scalar(value: f32) -> Mat {
        Mat::from_vec(1, 1, vec![value])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether both matrices have the same dimensions.
    pub fn same_shape(&self, other: &Mat) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    fn index_of(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    /// Returns the value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.w[self.index_of(row, col)]
    }

    /// Sets the value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use neatfit::autodiff::Mat;
    ///
    /// let mut m = Mat::new(2, 2);
    /// m.set(1, 0, 4.0);
    ///
    /// assert_eq!(m.get(1, 0), 4.0);
    /// assert_eq!(m.w, vec![0.0, 0.0, 4.0, 0.0]);
    /// ```
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        let i = self.index_of(row, col);
        self.w[i] = value;
    }

    /// Sets every value to `value`.
    pub fn set_all(&mut self, value: f32) {
        self.w.iter_mut().for_each(|w| *w = value);
    }

    /// Returns the values of row `row`.
    pub fn row(&self, row: usize) -> &[f32] {
        assert!(row < self.rows, "row {} out of bounds", row);
        &self.w[row * self.cols..(row + 1) * self.cols]
    }

    /// Resets all gradients to zero.
    pub fn zero_grad(&mut self) {
        self.dw.iter_mut().for_each(|g| *g = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_is_row_major() {
        let m = Mat::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.get(0, 2), 3.0);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.dw, vec![0.0; 6]);
    }

    #[test]
    #[should_panic]
    fn from_vec_wrong_length() {
        Mat::from_vec(2, 2, vec![1.0]);
    }

    #[test]
    #[should_panic]
    fn get_out_of_bounds() {
        Mat::new(2, 2).get(0, 2);
    }

    #[test]
    fn set_all_and_zero_grad() {
        let mut m = Mat::new(2, 1);
        m.dw = vec![3.0, -1.0];
        m.set_all(0.5);
        m.zero_grad();
        assert_eq!(m.w, vec![0.5, 0.5]);
        assert_eq!(m.dw, vec![0.0, 0.0]);
    }
}
