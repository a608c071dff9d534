mod count_min;
pub use count_min::*;

mod dummy;
pub use dummy::*;

mod log_sum_product;
pub use log_sum_product::*;

mod min_sum;
pub use min_sum::*;

use std::fmt::Debug;

use rand::RngCore;

use crate::error::Result;

/// A trait for the pluggable algebra driving bucket elimination.
///
/// The engine never inspects a semiring's internals: it only combines cell
/// values, asks for marginalizers, and initializes solution objects.
pub trait Semiring {
    /// The value type carried in table cells.
    type Value: Clone + Debug;
    /// The semiring-specific solution object.
    type Solution: Solution<Self::Value>;

    /// Apply the associative, commutative combination operator.
    ///
    /// # Arguments
    ///
    /// * `x` - The first operand.
    /// * `y` - The second operand.
    ///
    /// # Returns
    ///
    /// The combined value.
    ///
    fn combine(&self, x: &Self::Value, y: &Self::Value) -> Self::Value;

    /// Return the unit of the combination operator.
    ///
    /// # Returns
    ///
    /// The combination identity.
    ///
    fn combine_identity(&self) -> Self::Value;

    /// Construct a reducer collapsing one variable out of a merged table.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the semiring cannot marginalize.
    ///
    /// # Returns
    ///
    /// A boxed marginalizer.
    ///
    /// [`Error::OperationUnavailable`]: crate::error::Error::OperationUnavailable
    fn marginalizer(&self) -> Result<Box<dyn Marginalizer<Self::Value>>>;

    /// Construct a reducer that additionally records, per output assignment,
    /// the state needed to choose a value for the eliminated variable on the
    /// downward pass.
    ///
    /// # Arguments
    ///
    /// * `sep_vars` - The separator variables, strictly increasing.
    /// * `sep_dom_sizes` - The domain sizes of the separator variables.
    /// * `out_var` - The variable being eliminated.
    /// * `out_dom_size` - The domain size of the eliminated variable.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the semiring cannot solve, or
    /// [`Error::LengthOverflow`] if the separator size overflows.
    ///
    /// # Returns
    ///
    /// A boxed solvable marginalizer.
    ///
    /// [`Error::OperationUnavailable`]: crate::error::Error::OperationUnavailable
    /// [`Error::LengthOverflow`]: crate::error::Error::LengthOverflow
    fn solvable_marginalizer(
        &self,
        sep_vars: &[usize],
        sep_dom_sizes: &[usize],
        out_var: usize,
        out_dom_size: usize,
    ) -> Result<Box<dyn SolvableMarginalizer<Self::Value, Self::Solution>>>;

    /// Initialize an empty solution object.
    ///
    /// # Arguments
    ///
    /// * `dom_sizes` - The domain sizes of all variables.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the semiring has no solutions.
    ///
    /// # Returns
    ///
    /// A new solution object.
    ///
    /// [`Error::OperationUnavailable`]: crate::error::Error::OperationUnavailable
    fn init_solution(&self, dom_sizes: &[usize]) -> Result<Self::Solution>;
}

/// A reducer collapsing the eliminated variable into one output cell.
pub trait Marginalizer<Y> {
    /// Reduce the cells of the eliminated variable for one output cell.
    ///
    /// # Arguments
    ///
    /// * `out_index` - The flat index of the output cell.
    /// * `cells` - The combined values, one per domain index of the
    ///   eliminated variable.
    ///
    /// # Returns
    ///
    /// The reduced value.
    ///
    fn marginalize(&mut self, out_index: usize, cells: &[Y]) -> Y;
}

/// A marginalizer that can invert itself during the downward pass.
///
/// One instance serves one (node, separator) pair: the upward pass populates
/// per-output records through [`Marginalizer::marginalize`], the downward
/// pass reads them back through [`SolvableMarginalizer::solve`].
pub trait SolvableMarginalizer<Y, S>: Marginalizer<Y> {
    /// Complete the partial solution by choosing the eliminated variable.
    ///
    /// # Arguments
    ///
    /// * `solution` - The solution to extend; its separator variables must
    ///   already be assigned.
    /// * `rng` - The uniform `[0, 1)` source, unused by deterministic
    ///   semirings.
    ///
    /// # Errors
    ///
    /// [`Error::InternalError`] if the recorded state is inconsistent.
    ///
    /// [`Error::InternalError`]: crate::error::Error::InternalError
    fn solve(&self, solution: &mut S, rng: &mut dyn RngCore) -> Result<()>;
}

impl<Y, S> Marginalizer<Y> for Box<dyn SolvableMarginalizer<Y, S>> {
    #[inline]
    fn marginalize(&mut self, out_index: usize, cells: &[Y]) -> Y {
        (**self).marginalize(out_index, cells)
    }
}

/// A trait for semiring-specific solution objects.
pub trait Solution<Y> {
    /// Assign a value to a variable in every partial assignment.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    /// * `value` - The domain index to assign.
    ///
    fn assign(&mut self, x: usize, value: usize);

    /// Seed the solution with the problem value.
    ///
    /// # Arguments
    ///
    /// * `value` - The combined root and clamped-factor contributions.
    ///
    fn seed(&mut self, value: &Y);
}

/// An uninhabited solution for semirings that cannot solve.
#[derive(Clone, Copy, Debug)]
pub enum NoSolution {}

impl<Y> Solution<Y> for NoSolution {
    fn assign(&mut self, _x: usize, _value: usize) {
        match *self {}
    }

    fn seed(&mut self, _value: &Y) {
        match *self {}
    }
}
