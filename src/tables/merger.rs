use std::fmt::Debug;

use ndarray::prelude::*;

use crate::{
    error::Result,
    semirings::{Marginalizer, Semiring},
    utils::MI,
};

use super::Table;

/// A reusable combiner of factor tables.
///
/// Combines any number of tables over a super-scope and, in the same pass,
/// collapses one variable through a marginalizer. Scratch buffers are kept
/// between calls so repeated merges amortize their allocations.
#[derive(Clone, Debug, Default)]
pub struct Merger<Y> {
    digits: Vec<usize>,
    offsets: Vec<isize>,
    strides: Vec<isize>,
    resets: Vec<isize>,
    elim_strides: Vec<usize>,
    cells: Vec<Y>,
}

impl<Y: Clone + Debug> Merger<Y> {
    /// Construct a new merger.
    ///
    /// # Returns
    ///
    /// A new `Merger` instance.
    ///
    pub fn new() -> Self {
        Self {
            digits: Vec::new(),
            offsets: Vec::new(),
            strides: Vec::new(),
            resets: Vec::new(),
            elim_strides: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Prepare the per-input stride and reset tables over the output scope.
    fn prepare(&mut self, inputs: &[&Table<Y>], out_scope: &[(usize, usize)]) {
        let width = out_scope.len();

        self.digits.clear();
        self.digits.resize(width, 0);
        self.offsets.clear();
        self.offsets.resize(inputs.len(), 0);

        self.strides.clear();
        self.resets.clear();
        for input in inputs {
            // The stride of an out-of-scope variable is zero.
            let row = self.strides.len();
            self.strides
                .extend(out_scope.iter().map(|&(x, _)| input.step_size(x) as isize));
            // The reset of digit `j` re-zeroes every digit below it.
            let mut rollback = 0;
            for (j, &(_, dom_size)) in out_scope.iter().enumerate() {
                let stride = self.strides[row + j];
                self.resets.push(stride - rollback);
                rollback += (dom_size as isize - 1) * stride;
            }
        }
    }

    /// Advance the mixed-radix odometer, updating the per-input offsets.
    fn advance(&mut self, inputs: usize, out_scope: &[(usize, usize)]) {
        let width = out_scope.len();
        for j in 0..width {
            self.digits[j] += 1;
            if self.digits[j] < out_scope[j].1 {
                for i in 0..inputs {
                    self.offsets[i] += self.resets[i * width + j];
                }
                return;
            }
            self.digits[j] = 0;
        }
    }

    /// Combine tables over an output scope, collapsing one variable.
    ///
    /// Every input scope must be a subset of `out_scope ∪ {elim_var}`. The
    /// marginalizer is invoked once per output cell, in flat order, with the
    /// combined values of every position of the eliminated variable.
    ///
    /// # Arguments
    ///
    /// * `ops` - The semiring.
    /// * `inputs` - The tables to combine.
    /// * `out_scope` - The output `(variable, domain size)` pairs, strictly
    ///   increasing, not containing `elim_var`.
    /// * `elim_var` - The variable to collapse.
    /// * `elim_dom_size` - The domain size of the collapsed variable.
    /// * `marginalizer` - The reducer collapsing `elim_var`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthOverflow`] if the output size overflows.
    ///
    /// # Returns
    ///
    /// The merged table over `out_scope`.
    ///
    /// [`Error::LengthOverflow`]: crate::error::Error::LengthOverflow
    pub fn merge<S>(
        &mut self,
        ops: &S,
        inputs: &[&Table<S::Value>],
        out_scope: &[(usize, usize)],
        elim_var: usize,
        elim_dom_size: usize,
        marginalizer: &mut dyn Marginalizer<S::Value>,
    ) -> Result<Table<S::Value>>
    where
        S: Semiring<Value = Y>,
    {
        debug_assert!(
            !out_scope.iter().any(|&(x, _)| x == elim_var),
            "Output scope must not contain the eliminated variable"
        );

        self.prepare(inputs, out_scope);
        self.elim_strides.clear();
        self.elim_strides
            .extend(inputs.iter().map(|input| input.step_size(elim_var)));

        let out_index = MI::new(out_scope.iter().map(|&(_, d)| d))?;
        let mut values = Vec::with_capacity(out_index.size());

        for out in 0..out_index.size() {
            // Combine the inputs for every position of the eliminated variable.
            self.cells.clear();
            for d in 0..elim_dom_size {
                let mut cell = ops.combine_identity();
                for (i, input) in inputs.iter().enumerate() {
                    let flat = self.offsets[i] as usize + d * self.elim_strides[i];
                    cell = ops.combine(&cell, &input.values()[flat]);
                }
                self.cells.push(cell);
            }
            // Collapse them into the output cell.
            values.push(marginalizer.marginalize(out, &self.cells));

            self.advance(inputs.len(), out_scope);
        }

        Table::new(out_scope.iter().copied(), Array1::from_vec(values))
    }

    /// Combine tables over an output scope without collapsing any variable.
    ///
    /// Every input scope must be a subset of `out_scope`.
    ///
    /// # Arguments
    ///
    /// * `ops` - The semiring.
    /// * `inputs` - The tables to combine.
    /// * `out_scope` - The output `(variable, domain size)` pairs.
    ///
    /// # Errors
    ///
    /// [`Error::LengthOverflow`] if the output size overflows.
    ///
    /// # Returns
    ///
    /// The combined table over `out_scope`.
    ///
    /// [`Error::LengthOverflow`]: crate::error::Error::LengthOverflow
    pub fn product<S>(
        &mut self,
        ops: &S,
        inputs: &[&Table<S::Value>],
        out_scope: &[(usize, usize)],
    ) -> Result<Table<S::Value>>
    where
        S: Semiring<Value = Y>,
    {
        self.prepare(inputs, out_scope);

        let out_index = MI::new(out_scope.iter().map(|&(_, d)| d))?;
        let mut values = Vec::with_capacity(out_index.size());

        for _ in 0..out_index.size() {
            let mut cell = ops.combine_identity();
            for (i, input) in inputs.iter().enumerate() {
                cell = ops.combine(&cell, &input.values()[self.offsets[i] as usize]);
            }
            values.push(cell);

            self.advance(inputs.len(), out_scope);
        }

        Table::new(out_scope.iter().copied(), Array1::from_vec(values))
    }
}
